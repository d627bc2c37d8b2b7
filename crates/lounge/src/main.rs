use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod agenda;
mod auth;
mod calendar;
mod config;
mod db;
mod error;
mod html;
mod server;
mod types;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "lounge")]
#[command(about = "Track study lounge students, their assignments and a shared event calendar")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// SQLite database file (overrides LOUNGE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Print the Monday-first grid for a month
    Calendar {
        year: i32,
        /// Month number, 1-12
        month: u32,
    },

    /// Create the database and apply pending migrations
    InitDb,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower_http=warn".parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match args.command.unwrap_or(Commands::Serve { port: 8080 }) {
        Commands::Serve { port } => {
            let mut config = Config::from_env()?;
            if let Some(db) = args.db {
                config.db_path = db;
            }
            server::serve(port, config).await?;
        }
        Commands::Calendar { year, month } => {
            let grid = calendar::build_month_grid(year, month)?;
            print!("{}", grid);
        }
        Commands::InitDb => {
            let db_path = args.db.unwrap_or_else(Config::db_path_from_env);
            let conn = db::init_db(&db_path)?;
            let students = db::list_students(&conn)?.len();
            let assignments = db::count_assignments(&conn)?;
            info!(
                path = %db_path.display(),
                students = students,
                assignments = assignments,
                "Database ready"
            );
        }
    }

    Ok(())
}
