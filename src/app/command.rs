// Author: Dustin Pilgrim
// License: MIT

use eyre::WrapErr;

use crate::cli::{Args, Command};

pub fn run(args: Args) -> eyre::Result<()> {
    let Some(cmd) = args.command else {
        return Ok(());
    };

    match cmd {
        Command::Check { json } => {
            let settings = vigil::config::load_settings(args.config.as_deref())
                .wrap_err("config check failed")?;

            if json || args.json {
                println!("{}", serde_json::to_string_pretty(&settings.to_json())?);
            } else {
                print!("{}", settings.pretty_print());
            }
            Ok(())
        }
    }
}
