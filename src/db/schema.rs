//! Schema resource loading and statement splitting.
//!
//! The schema file is an opaque batch of DDL. It is only split into
//! statements so that execution can stop and report at statement granularity.
//! Splitting follows the mysql client's rules closely enough for schema
//! files: quoted strings and identifiers, `#`, `-- ` and `/* */` comments,
//! and `DELIMITER` lines for trigger or routine bodies.

use crate::error::BootstrapError;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DELIMITER: &str = ";";
const DELIMITER_KEYWORD: &str = "delimiter";

/// One statement of the schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position within the file.
    pub ordinal: usize,
    /// 1-based line on which the statement's first token appears.
    pub line: usize,
    pub sql: String,
}

impl Statement {
    /// First line of the statement, shortened for log output.
    pub fn summary(&self) -> String {
        let first = self.sql.lines().next().unwrap_or_default().trim();
        if first.chars().count() > 60 {
            let cut: String = first.chars().take(57).collect();
            format!("{cut}...")
        } else {
            first.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    path: PathBuf,
    statements: Vec<Statement>,
}

impl SchemaDefinition {
    /// Read the whole resource into memory and split it.
    pub fn load(path: &Path) -> Result<Self, BootstrapError> {
        let text = fs::read_to_string(path).map_err(|source| BootstrapError::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_sql(path, &text))
    }

    pub fn from_sql(path: impl Into<PathBuf>, sql: &str) -> Self {
        Self {
            path: path.into(),
            statements: split_statements(sql),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexer {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split `sql` into statements. Comment-only fragments are dropped.
pub fn split_statements(sql: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut delimiter = DEFAULT_DELIMITER.to_string();
    let mut state = Lexer::Normal;
    let mut start = 0;
    let mut line = 1;
    // line of the first non-comment token of the pending statement
    let mut first_line: Option<usize> = None;
    let mut i = 0;

    while i < sql.len() {
        let rest = &sql[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        let width = c.len_utf8();

        match state {
            Lexer::Normal => {
                if first_line.is_none() && starts_with_delimiter_directive(rest) {
                    let eol = rest.find('\n').map_or(sql.len(), |n| i + n);
                    if let Some(d) = sql[i + DELIMITER_KEYWORD.len()..eol]
                        .split_whitespace()
                        .next()
                    {
                        delimiter = d.to_string();
                    }
                    i = eol;
                    start = eol;
                    continue;
                }
                if rest.starts_with(delimiter.as_str()) {
                    if let Some(at) = first_line.take() {
                        push_statement(&mut statements, &sql[start..i], at);
                    }
                    i += delimiter.len();
                    start = i;
                    continue;
                }
                match c {
                    '\'' | '"' | '`' => {
                        first_line.get_or_insert(line);
                        state = Lexer::Quoted(c);
                    }
                    '#' => state = Lexer::LineComment,
                    '-' if is_dash_comment(rest) => state = Lexer::LineComment,
                    '/' if rest.starts_with("/*") => {
                        // `/*! ... */` is executed by MySQL, so it counts as content
                        if rest.starts_with("/*!") {
                            first_line.get_or_insert(line);
                        }
                        state = Lexer::BlockComment;
                        i += 2;
                        continue;
                    }
                    _ if !c.is_whitespace() => {
                        first_line.get_or_insert(line);
                    }
                    _ => {}
                }
            }
            Lexer::Quoted(quote) => {
                if c == '\\' && quote != '`' {
                    i += width;
                    if let Some(escaped) = sql[i..].chars().next() {
                        if escaped == '\n' {
                            line += 1;
                        }
                        i += escaped.len_utf8();
                    }
                    continue;
                }
                if c == quote {
                    state = Lexer::Normal;
                }
            }
            Lexer::LineComment => {
                if c == '\n' {
                    state = Lexer::Normal;
                }
            }
            Lexer::BlockComment => {
                if rest.starts_with("*/") {
                    state = Lexer::Normal;
                    i += 2;
                    continue;
                }
            }
        }

        if c == '\n' {
            line += 1;
        }
        i += width;
    }

    if let Some(at) = first_line {
        push_statement(&mut statements, &sql[start..], at);
    }
    statements
}

fn push_statement(statements: &mut Vec<Statement>, text: &str, line: usize) {
    let sql = text.trim();
    if sql.is_empty() {
        return;
    }
    statements.push(Statement {
        ordinal: statements.len() + 1,
        line,
        sql: sql.to_string(),
    });
}

/// `-- ` only starts a comment when followed by whitespace or end of input.
fn is_dash_comment(rest: &str) -> bool {
    rest.starts_with("--") && rest[2..].chars().next().is_none_or(char::is_whitespace)
}

fn starts_with_delimiter_directive(rest: &str) -> bool {
    let len = DELIMITER_KEYWORD.len();
    rest.get(..len)
        .is_some_and(|word| word.eq_ignore_ascii_case(DELIMITER_KEYWORD))
        && rest[len..]
            .chars()
            .next()
            .is_none_or(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
