//! Sagitta CLI binary.

use clap::Parser;
use sagitta::cli::{args::*, commands::*};
use std::process;

fn main() {
    let args = SagittaArgs::parse();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
