use batchdl_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // File log under the XDG state dir; stderr if that is not writable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}), logging to stderr", err);
    }

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("batchdl error: {:#}", err);
        std::process::exit(1);
    }
}
