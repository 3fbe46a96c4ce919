//! The seam between the bootstrapper and a database server.
//!
//! Operations return raw driver errors; the bootstrapper classifies them
//! because only it knows which step failed.

use crate::config::ConnectionConfig;
use crate::db::schema::Statement;
use sqlx::Error as SqlxError;

pub const DATABASE_CHARSET: &str = "utf8mb4";
pub const DATABASE_COLLATION: &str = "utf8mb4_unicode_ci";

/// Default encoding of a database as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEncoding {
    pub charset: String,
    pub collation: String,
}

impl DatabaseEncoding {
    pub fn is_expected(&self) -> bool {
        self.charset.eq_ignore_ascii_case(DATABASE_CHARSET)
            && self.collation.eq_ignore_ascii_case(DATABASE_COLLATION)
    }
}

/// Opens a server-level connection (no database selected).
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Server: SchemaServer;

    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Server, SqlxError>;
}

#[allow(async_fn_in_trait)]
pub trait SchemaServer {
    async fn create_database(
        &mut self,
        name: &str,
        charset: &str,
        collation: &str,
    ) -> Result<(), SqlxError>;

    /// Make `name` the default database for the rest of the session.
    async fn use_database(&mut self, name: &str) -> Result<(), SqlxError>;

    async fn execute(&mut self, statement: &Statement) -> Result<(), SqlxError>;

    /// `None` when the server has no such database.
    async fn database_encoding(
        &mut self,
        name: &str,
    ) -> Result<Option<DatabaseEncoding>, SqlxError>;

    async fn close(self) -> Result<(), SqlxError>;
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
