// CLASSIFICATION: COMMUNITY
// Filename: tlc.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Entry point for the tlc binary.

use tlc::cli::{self, args::Cli};
use tlc::logging;

fn main() {
    let cli = Cli::try_parse_ordered(std::env::args_os()).unwrap_or_else(|e| e.exit());
    logging::init(cli.verbose);
    match cli::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::error!("{:#}", err);
            eprintln!("tlc: {:#}", err);
            std::process::exit(2);
        }
    }
}
