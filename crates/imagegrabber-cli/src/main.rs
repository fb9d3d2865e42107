use imagegrabber_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; never fail the run over it.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args() {
        tracing::error!("run aborted: {:#}", err);
        eprintln!("imagegrabber error: {:#}", err);
        std::process::exit(1);
    }
}
