use clap::Parser;
use mimalloc::MiMalloc;
use schema_bootstrap::{BootstrapConfig, BootstrapError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, long_about = None)]
#[clap(about = "Create a MySQL database if missing and apply a schema file to it")]
struct Cli {
    /// configuration file path, by default ./bootstrap.toml is used when present
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// schema file to apply, defaults to database/schema.sql
    #[clap(short, long)]
    schema: Option<PathBuf>,

    /// database server host
    #[clap(long)]
    host: Option<String>,

    /// database server port
    #[clap(short = 'P', long)]
    port: Option<u16>,

    /// user to connect as
    #[clap(short, long)]
    user: Option<String>,

    /// name of the database to create and populate
    #[clap(short, long)]
    database: Option<String>,

    /// log filter used when RUST_LOG is not set
    #[clap(long)]
    loglevel: Option<String>,
}

impl Cli {
    fn apply(self, cfg: &mut BootstrapConfig) {
        if let Some(schema) = self.schema {
            cfg.schema_path = schema;
        }
        if let Some(host) = self.host {
            cfg.database.host = host;
        }
        if let Some(port) = self.port {
            cfg.database.port = port;
        }
        if let Some(user) = self.user {
            cfg.database.username = user;
        }
        if let Some(database) = self.database {
            cfg.database.database = database;
        }
        if let Some(loglevel) = self.loglevel {
            cfg.loglevel = loglevel;
        }
    }
}

fn init_tracing(loglevel: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(loglevel));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();
}

fn fail(err: &BootstrapError) -> ExitCode {
    eprintln!("Database setup failed: {err}");
    ExitCode::FAILURE
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = match BootstrapConfig::load(cli.config.as_deref()) {
        Ok(mut cfg) => {
            cli.apply(&mut cfg);
            cfg
        }
        Err(e) => return fail(&e),
    };

    init_tracing(&cfg.loglevel);

    info!(
        host = %cfg.database.host,
        port = cfg.database.port,
        database = %cfg.database.database,
        schema = %cfg.schema_path.display(),
        loglevel = %cfg.loglevel
    );

    match schema_bootstrap::run(&cfg.database, &cfg.schema_path).await {
        Ok(report) => {
            info!(
                database = %report.database,
                statements = report.statements_applied,
                "bootstrap finished"
            );
            println!("Database setup completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(kind = ?e.kind(), "bootstrap failed");
            fail(&e)
        }
    }
}
