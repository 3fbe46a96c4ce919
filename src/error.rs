use sqlx::Error as SqlxError;
use sqlx::mysql::MySqlDatabaseError;
use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// MySQL error numbers that mean "authenticated, but not allowed".
const PRIVILEGE_ERRORS: &[u16] = &[
    1044, // ER_DBACCESS_DENIED_ERROR
    1045, // ER_ACCESS_DENIED_ERROR
    1142, // ER_TABLEACCESS_DENIED_ERROR
    1143, // ER_COLUMNACCESS_DENIED_ERROR
    1227, // ER_SPECIFIC_ACCESS_DENIED_ERROR
    1370, // ER_PROCACCESS_DENIED_ERROR
];

/// Standard SQLSTATE for insufficient privilege, for drivers other than MySQL.
const SQLSTATE_INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(#[source] SqlxError),

    #[error("permission denied while trying to {action}: {source}")]
    Permission {
        action: String,
        #[source]
        source: SqlxError,
    },

    #[error("cannot read schema file {}: {source}", .path.display())]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "statement #{ordinal} (line {line}) failed after {applied} statement(s) were applied: {source}"
    )]
    Statement {
        ordinal: usize,
        line: usize,
        applied: usize,
        #[source]
        source: SqlxError,
    },

    #[error("failed to {action}: {source}")]
    Database {
        action: String,
        #[source]
        source: SqlxError,
    },
}

/// Coarse error category, stable for callers that only care about the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Connection,
    Permission,
    ResourceNotFound,
    Statement,
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::Config(_) => ErrorKind::Config,
            BootstrapError::Connection(_) => ErrorKind::Connection,
            BootstrapError::Permission { .. } => ErrorKind::Permission,
            BootstrapError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            BootstrapError::Statement { .. } | BootstrapError::Database { .. } => {
                ErrorKind::Statement
            }
        }
    }

    /// Classify a driver error raised while creating or selecting the database.
    pub fn from_database(action: impl Into<String>, err: SqlxError) -> Self {
        if is_connection_failure(&err) {
            return BootstrapError::Connection(err);
        }
        if is_permission_denied(&err) {
            return BootstrapError::Permission {
                action: action.into(),
                source: err,
            };
        }
        BootstrapError::Database {
            action: action.into(),
            source: err,
        }
    }

    /// Classify a driver error raised by a schema statement.
    pub fn from_statement(ordinal: usize, line: usize, applied: usize, err: SqlxError) -> Self {
        if is_connection_failure(&err) {
            return BootstrapError::Connection(err);
        }
        if is_permission_denied(&err) {
            return BootstrapError::Permission {
                action: format!("execute statement #{ordinal} (line {line})"),
                source: err,
            };
        }
        BootstrapError::Statement {
            ordinal,
            line,
            applied,
            source: err,
        }
    }
}

pub fn is_privilege_error(number: u16) -> bool {
    PRIVILEGE_ERRORS.contains(&number)
}

/// Privilege check on the server's error identity: the MySQL error number
/// when available, the SQLSTATE otherwise.
pub fn is_privilege_failure(mysql_number: Option<u16>, sqlstate: Option<&str>) -> bool {
    match mysql_number {
        Some(number) => is_privilege_error(number),
        None => sqlstate == Some(SQLSTATE_INSUFFICIENT_PRIVILEGE),
    }
}

fn is_permission_denied(err: &SqlxError) -> bool {
    let SqlxError::Database(db_err) = err else {
        return false;
    };
    let number = db_err
        .try_downcast_ref::<MySqlDatabaseError>()
        .map(MySqlDatabaseError::number);
    is_privilege_failure(number, db_err.code().as_deref())
}

fn is_connection_failure(err: &SqlxError) -> bool {
    matches!(
        err,
        SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::Protocol(_)
            | SqlxError::Configuration(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed
    )
}
