//! Treasury Engine CLI
//!
//! Replays transfers and reconciliations from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- containers.csv operations.csv > balances.csv
//! cargo run -- --transfers-out transfers.csv --reconciliations-out recs.csv containers.csv operations.csv
//! cargo run -- --epsilon 0.05 --fee-precision 3 --log-level info containers.csv operations.csv
//! ```
//!
//! Final balances go to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success, including when individual operations were rejected
//! - 1: Error (missing arguments, file not found, malformed containers file, etc.)

use std::process;
use treasury_engine::{cli, logging, replay};

fn main() {
    let args = cli::parse_args();
    logging::init_logging(&args.log_level);

    let mut output = std::io::stdout();
    if let Err(e) = replay::run(&args, &mut output) {
        tracing::error!(code = e.code(), "replay failed: {}", e);
        process::exit(1);
    }
}
