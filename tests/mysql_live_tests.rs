//! Runs against a real MySQL/MariaDB server.
//!
//! `cargo test -- --ignored` with `SCHEMA_BOOTSTRAP_TEST_HOST`, `_PORT`,
//! `_USER` and `_PASSWORD` pointing at a server where the user may create
//! and drop databases.

use schema_bootstrap::config::ConnectionConfig;
use schema_bootstrap::{BootstrapError, ErrorKind, run};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(format!("SCHEMA_BOOTSTRAP_TEST_{key}")).unwrap_or_else(|_| default.to_string())
}

fn live_config() -> ConnectionConfig {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    ConnectionConfig {
        host: env_or("HOST", "127.0.0.1"),
        port: env_or("PORT", "3306").parse().expect("invalid port"),
        username: env_or("USER", "root"),
        password: env_or("PASSWORD", ""),
        database: format!("bootstrap_test_{}_{}", std::process::id(), nanos % 1_000_000_000),
        ..ConnectionConfig::default()
    }
}

async fn admin(cfg: &ConnectionConfig) -> MySqlConnection {
    let options = MySqlConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password);
    MySqlConnection::connect_with(&options)
        .await
        .expect("failed to connect to test server")
}

async fn drop_database(cfg: &ConnectionConfig) {
    let mut conn = admin(cfg).await;
    let sql = format!("DROP DATABASE IF EXISTS `{}`", cfg.database);
    sqlx::raw_sql(&sql)
        .execute(&mut conn)
        .await
        .expect("failed to drop test database");
    let _ = conn.close().await;
}

async fn table_columns(cfg: &ConnectionConfig, table: &str) -> Vec<String> {
    let mut conn = admin(cfg).await;
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS
           WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"#,
    )
    .bind(&cfg.database)
    .bind(table)
    .fetch_all(&mut conn)
    .await
    .expect("column query failed");
    let _ = conn.close().await;
    rows.into_iter().map(|(name,)| name).collect()
}

fn schema_file(sql: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp schema");
    file.write_all(sql.as_bytes())
        .expect("failed to write temp schema");
    file
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn runs_twice_and_creates_utf8mb4_database() {
    let cfg = live_config();
    let schema = schema_file(
        "CREATE TABLE IF NOT EXISTS foo (id INT PRIMARY KEY, label VARCHAR(64) NOT NULL);\n",
    );

    let first = run(&cfg, schema.path()).await;
    let second = run(&cfg, schema.path()).await;
    let columns = table_columns(&cfg, "foo").await;
    // clean up before asserting so a failure leaves nothing behind
    drop_database(&cfg).await;

    let first = first.expect("first run failed");
    let second = second.expect("second run failed");
    assert_eq!(first.statements_applied, 1);
    assert_eq!(first, second);
    let encoding = second.encoding.clone().expect("encoding missing");
    assert_eq!(encoding.charset, "utf8mb4");
    assert_eq!(encoding.collation, "utf8mb4_unicode_ci");
    assert_eq!(columns, vec!["id", "label"]);
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn statements_before_a_failure_stay_applied() {
    let cfg = live_config();
    let schema = schema_file(
        "CREATE TABLE first_ok (id INT);\nCREATE TABEL broken (id INT);\nCREATE TABLE never (id INT);\n",
    );

    let result = run(&cfg, schema.path()).await;
    let kept = table_columns(&cfg, "first_ok").await;
    let skipped = table_columns(&cfg, "never").await;
    drop_database(&cfg).await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Statement);
    assert!(matches!(
        err,
        BootstrapError::Statement {
            ordinal: 2,
            line: 2,
            applied: 1,
            ..
        }
    ));
    assert_eq!(kept, vec!["id"]);
    assert!(skipped.is_empty());
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn wrong_password_is_a_connection_error() {
    let cfg = ConnectionConfig {
        password: "definitely-not-the-password".to_string(),
        ..live_config()
    };
    let schema = schema_file("CREATE TABLE IF NOT EXISTS foo (id INT);");

    let err = run(&cfg, schema.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}
