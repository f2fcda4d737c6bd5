// Author: Dustin Pilgrim
// License: MIT

mod app;
mod cli;

use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Args::parse();

    if args.command.is_some() {
        return app::command::run(args);
    }

    app::watch_mode::run(args).await
}
