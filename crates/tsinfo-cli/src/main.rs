mod fetch;
mod panel;
mod watch;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tsinfo")]
#[command(about = "TeamSpirit attendance panel: fetch, extract and project working hours")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the attendance page, reconcile its frames and save the record
    Fetch {
        /// Print the record as JSON instead of the panel
        #[arg(long)]
        json: bool,
    },
    /// Extract attendance from saved HTML snapshots, one file per frame
    Extract {
        /// Snapshot files in frame scan order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Day whose clock-in row to read (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Also replace the stored record with the result
        #[arg(long)]
        save: bool,

        /// Print the record as JSON instead of the panel
        #[arg(long)]
        json: bool,
    },
    /// Show the stored record with live projections (default)
    Status {
        /// Print the stored record as JSON instead of the panel
        #[arg(long)]
        json: bool,
    },
    /// Keep the panel on screen, ticking and refreshing until ctrl-c
    Watch {
        /// Only follow the store; never fetch the page
        #[arg(long)]
        no_refresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tsinfo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(env = %config.env, ?config, "configuration loaded");

    match cli.command {
        Some(Commands::Fetch { json }) => fetch::run_fetch(&config, json).await,
        Some(Commands::Extract {
            files,
            date,
            save,
            json,
        }) => fetch::run_extract(&config, files, date, save, json).await,
        Some(Commands::Status { json }) => fetch::run_status(&config, json).await,
        None => fetch::run_status(&config, false).await,
        Some(Commands::Watch { no_refresh }) => {
            let runner = if no_refresh {
                None
            } else {
                Some(fetch::build_http_runner(&config)?)
            };
            watch::run_watch(&config, runner).await
        }
    }
}
