//! car-worker - Reference car data worker
//!
//! Watches `command.json` in its working directory, answers in
//! `result.json`, and keeps the inventory in `cars_data.txt`.
//!
//! Usage:
//!   car-worker [--dir <dir>] [--data <file>] [--poll-interval-ms <ms>]

use carbridge::backend::{WorkerLoop, DEFAULT_DATA_FILE};
use carbridge::bridge::{Mailbox, DEFAULT_COMMAND_FILE, DEFAULT_RESULT_FILE};
use carbridge::logging;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "car-worker")]
#[command(about = "Reference car data worker for the carbridge file mailbox")]
#[command(version)]
struct Args {
    /// Directory holding the mailbox files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Inventory file (relative paths are resolved against --dir)
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data: PathBuf,

    /// Pause between reads of the command file
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Command file name
    #[arg(long, default_value = DEFAULT_COMMAND_FILE)]
    command_file: String,

    /// Result file name
    #[arg(long, default_value = DEFAULT_RESULT_FILE)]
    result_file: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init_logging("info") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mailbox = match Mailbox::open(&args.dir, &args.command_file, &args.result_file) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "cannot open mailbox");
            return ExitCode::FAILURE;
        }
    };

    let data_path = args.dir.join(&args.data);
    let mut worker = match WorkerLoop::open(mailbox, data_path).await {
        Ok(w) => w.with_poll_interval(Duration::from_millis(args.poll_interval_ms.max(1))),
        Err(e) => {
            tracing::error!(error = %e, "cannot load inventory");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    worker.run(shutdown).await;
    ExitCode::SUCCESS
}

/// Cancel `token` on Ctrl-C, or on SIGTERM where available.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}
