//! `reftx` — a CLI front-end for the transaction planner/executor in
//! `reftx-core`, wired to modest filesystem-backed collaborators.

#![deny(unsafe_code)]
#![forbid(unused_must_use)]

mod catalog;
mod cli;
mod logging;
mod oci;
mod prompt;
mod remotes;
mod state;

use clap::Parser;

fn main() {
    let args = cli::Cli::parse();
    logging::initialize_tracing(args.verbose);
    if let Err(err) = cli::run(args) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
