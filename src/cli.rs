// Author: Dustin Pilgrim
// License: MIT

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version = env!("CARGO_PKG_VERSION"),
    about = "Session idle-timeout watchdog",
    long_about = "Reads activity signals (e.g. `keydown`, `mousemove input#email`) and \
                  commands (`:start :stop :pause :resume :reset :extend :state`) from stdin, \
                  one per line, and reports the session countdown."
)]
pub struct Args {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action)]
    pub verbose: bool,

    #[arg(long, action)]
    pub no_console: bool,

    /// Print status as JSON lines instead of text.
    #[arg(long, action)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Load and validate the configuration, then print it")]
    Check {
        #[arg(long)]
        json: bool,
    },
}
