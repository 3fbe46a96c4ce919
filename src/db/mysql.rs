use crate::config::ConnectionConfig;
use crate::db::schema::Statement;
use crate::service::server::{Connector, DatabaseEncoding, SchemaServer, quote_identifier};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Error as SqlxError};

/// Connects to a MySQL or MariaDB server over a single connection.
///
/// A pool is not used: `USE` only affects the session that issued it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl Connector for MySqlConnector {
    type Server = MySqlServer;

    async fn connect(&self, config: &ConnectionConfig) -> Result<MySqlServer, SqlxError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .charset(&config.charset);
        let conn = MySqlConnection::connect_with(&options).await?;
        Ok(MySqlServer { conn })
    }
}

pub struct MySqlServer {
    conn: MySqlConnection,
}

impl SchemaServer for MySqlServer {
    async fn create_database(
        &mut self,
        name: &str,
        charset: &str,
        collation: &str,
    ) -> Result<(), SqlxError> {
        let sql = format!(
            "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET {charset} COLLATE {collation}",
            quote_identifier(name)
        );
        sqlx::raw_sql(&sql).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn use_database(&mut self, name: &str) -> Result<(), SqlxError> {
        let sql = format!("USE {}", quote_identifier(name));
        sqlx::raw_sql(&sql).execute(&mut self.conn).await?;
        Ok(())
    }

    // text protocol: CREATE TRIGGER and friends cannot be prepared
    async fn execute(&mut self, statement: &Statement) -> Result<(), SqlxError> {
        sqlx::raw_sql(&statement.sql).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn database_encoding(
        &mut self,
        name: &str,
    ) -> Result<Option<DatabaseEncoding>, SqlxError> {
        // CAST: MySQL 8 reports information_schema columns as binary strings
        let row: Option<(String, String)> = sqlx::query_as(
            r#"SELECT CAST(DEFAULT_CHARACTER_SET_NAME AS CHAR),
                      CAST(DEFAULT_COLLATION_NAME AS CHAR)
               FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?"#,
        )
        .bind(name)
        .fetch_optional(&mut self.conn)
        .await?;
        Ok(row.map(|(charset, collation)| DatabaseEncoding { charset, collation }))
    }

    async fn close(self) -> Result<(), SqlxError> {
        self.conn.close().await
    }
}
