use anyhow::Result;
use clap::{Parser, Subcommand};
use socialgraph::db::{migrate, Db};
use socialgraph::server::{AppState, HttpServer};
use socialgraph::{Config, ResetOrchestrator, SqliteGraphStore};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "socialgraph")]
#[command(about = "Serve and reset the people/relationship graph", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Replace the dataset with a freshly generated sample
    Reset {
        /// Relationships to generate (defaults to generator.default_relation_count)
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Verify the database schema
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Verify) {
        Command::Serve => run_http_server().await?,
        Command::Reset { count } => run_reset(count).await?,
        Command::Verify => run_schema_verification().await?,
    }

    Ok(())
}

/// Load config and bring the database schema up to date
async fn open_database() -> Result<(Config, Db)> {
    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    let db = Db::new(config.db_path());
    let migrations_dir = Path::new("migrations");
    db.with_connection(|conn| {
        migrate::run_migrations(conn, migrations_dir)
    }).await?;

    Ok((config, db))
}

/// Run HTTP server
async fn run_http_server() -> Result<()> {
    log::info!("Starting SocialGraph HTTP Server v{}", env!("CARGO_PKG_VERSION"));

    let (config, db) = open_database().await?;
    let store = Arc::new(SqliteGraphStore::new(db.clone()));
    let resetter = ResetOrchestrator::new(store.clone(), config.generator.clone()).with_audit(db);

    let state = AppState::new(store, resetter, &config);
    HttpServer::new(state, &config).run(config.server.port).await?;

    Ok(())
}

/// Run a single reset from the command line
async fn run_reset(count: Option<usize>) -> Result<()> {
    let (config, db) = open_database().await?;
    let store = Arc::new(SqliteGraphStore::new(db.clone()));
    let resetter = ResetOrchestrator::new(store, config.generator.clone()).with_audit(db);

    let count = count.unwrap_or_else(|| resetter.default_relation_count());
    let status = resetter.reset(count).await?;
    log::info!(
        "Reset {} complete: {} of {} requested relationships stored",
        status.reset_id,
        status.written,
        status.requested
    );
    Ok(())
}

/// Run database schema verification
async fn run_schema_verification() -> Result<()> {
    use socialgraph::error::SocialGraphError;

    log::info!("Starting SocialGraph v{}", env!("CARGO_PKG_VERSION"));
    let (_config, db) = open_database().await?;

    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        let expected_tables = ["people", "relationships", "reset_log", "schema_migrations"];
        let mut all_tables_exist = true;
        for table in &expected_tables {
            if tables.iter().any(|t| t == table) {
                log::debug!("✓ Table exists: {}", table);
            } else {
                log::error!("Missing table: {}", table);
                all_tables_exist = false;
            }
        }
        if !all_tables_exist {
            return Err(SocialGraphError::Config("Not all required tables exist".to_string()));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(SocialGraphError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(SocialGraphError::Config(format!("Database integrity check failed: {}", integrity)));
        }
        log::info!("✓ Database integrity: OK");

        Ok(())
    }).await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
