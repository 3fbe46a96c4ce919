use crate::config::ConnectionConfig;
use crate::db::mysql::MySqlConnector;
use crate::db::schema::SchemaDefinition;
use crate::error::BootstrapError;
use crate::service::server::{
    Connector, DATABASE_CHARSET, DATABASE_COLLATION, DatabaseEncoding, SchemaServer,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub database: String,
    pub statements_applied: usize,
    /// Encoding read back from the server, when it could be read.
    pub encoding: Option<DatabaseEncoding>,
}

/// Bootstrap a MySQL server: ensure the database exists, then apply the schema.
pub async fn run(
    config: &ConnectionConfig,
    schema_path: &Path,
) -> Result<BootstrapReport, BootstrapError> {
    run_with(&MySqlConnector, config, schema_path).await
}

/// Same as [`run`], against any [`Connector`].
///
/// The schema file is read before connecting, so a missing file never
/// reaches the server. Once connected, the connection is closed on every
/// path. Statements run one at a time and are not rolled back on failure:
/// MySQL commits DDL implicitly.
pub async fn run_with<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    schema_path: &Path,
) -> Result<BootstrapReport, BootstrapError> {
    config.validate()?;

    let schema = SchemaDefinition::load(schema_path)?;
    info!(
        path = %schema.path().display(),
        statements = schema.statements().len(),
        "loaded schema"
    );
    if schema.is_empty() {
        warn!(path = %schema.path().display(), "schema file contains no statements");
    }

    info!(
        host = %config.host,
        port = config.port,
        user = %config.username,
        charset = %config.charset,
        "connecting to database server"
    );
    let mut server = connector
        .connect(config)
        .await
        .map_err(BootstrapError::Connection)?;

    let outcome = provision(&mut server, &config.database, &schema).await;

    if let Err(e) = server.close().await {
        warn!(error = %e, "failed to close database connection cleanly");
    }
    outcome
}

async fn provision<S: SchemaServer>(
    server: &mut S,
    database: &str,
    schema: &SchemaDefinition,
) -> Result<BootstrapReport, BootstrapError> {
    server
        .create_database(database, DATABASE_CHARSET, DATABASE_COLLATION)
        .await
        .map_err(|e| BootstrapError::from_database(format!("create database `{database}`"), e))?;
    debug!(database, "database present");

    server
        .use_database(database)
        .await
        .map_err(|e| BootstrapError::from_database(format!("select database `{database}`"), e))?;

    let mut applied = 0;
    for statement in schema.statements() {
        debug!(
            ordinal = statement.ordinal,
            line = statement.line,
            sql = %statement.summary(),
            "executing statement"
        );
        if let Err(e) = server.execute(statement).await {
            if applied > 0 {
                warn!(applied, "statements before the failing one remain applied");
            }
            return Err(BootstrapError::from_statement(
                statement.ordinal,
                statement.line,
                applied,
                e,
            ));
        }
        applied += 1;
    }
    info!(database, applied, "schema applied");

    let encoding = match server.database_encoding(database).await {
        Ok(encoding) => encoding,
        Err(e) => {
            warn!(database, error = %e, "could not read back database encoding");
            None
        }
    };
    match &encoding {
        Some(enc) if enc.is_expected() => {
            debug!(database, charset = %enc.charset, collation = %enc.collation, "encoding verified");
        }
        // CREATE DATABASE IF NOT EXISTS leaves an existing database untouched
        Some(enc) => {
            warn!(
                database,
                charset = %enc.charset,
                collation = %enc.collation,
                expected_charset = DATABASE_CHARSET,
                expected_collation = DATABASE_COLLATION,
                "existing database has a different default encoding"
            );
        }
        None => {
            warn!(database, "database not listed in information_schema");
        }
    }

    Ok(BootstrapReport {
        database: database.to_string(),
        statements_applied: applied,
        encoding,
    })
}
