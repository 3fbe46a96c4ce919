//! Database access: the schema resource and the MySQL server implementation.
//!
//! Layout:
//! - `schema.rs`: loading the schema file and splitting it into statements
//! - `mysql.rs`: `Connector`/`SchemaServer` over a single sqlx MySQL connection

pub mod mysql;
pub mod schema;

pub use mysql::{MySqlConnector, MySqlServer};
pub use schema::{SchemaDefinition, Statement, split_statements};
