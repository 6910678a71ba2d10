use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use sentiview_app::cli::Cli;
use sentiview_logging::{sv_error, LogDestination};

const LOG_FILENAME: &str = "sentiview.log";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_path = cli.state_dir.join(LOG_FILENAME);
    if let Err(err) = std::fs::create_dir_all(&cli.state_dir) {
        eprintln!("Warning: Could not create {:?}: {}", cli.state_dir, err);
    }
    let (destination, level) = if cli.verbose {
        (LogDestination::Both(log_path), LevelFilter::Debug)
    } else {
        (LogDestination::File(log_path), LevelFilter::Info)
    };
    sentiview_logging::initialize(destination, level);

    match sentiview_app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            sv_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
