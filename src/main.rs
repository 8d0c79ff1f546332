use clap::Parser;
use homeboard_storage::http::{self, AppState};
use homeboard_storage::storage::documents;
use homeboard_storage::storage::scheduler::{self, BackupService};
use homeboard_storage::storage::settings::BackupSettings;
use homeboard_storage::storage::validate::validate_writable_dir;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the dashboard's JSON documents and photos
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    validate_writable_dir(&args.data_dir)?;
    documents::seed_defaults(&args.data_dir)?;

    let settings = BackupSettings::load(args.data_dir.join("experience.json"));
    let service = Arc::new(BackupService::new(&args.data_dir));
    tokio::spawn(scheduler::run_schedule(service.clone(), settings));

    let state = AppState {
        service,
        photos_dir: args.data_dir.join("photos"),
        data_dir: args.data_dir,
    };

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}
