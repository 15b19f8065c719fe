// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, install logging, run the command.
// - Returns `anyhow::Result` so failures end with a message and exit code 1.

use clap::Parser;
use slyft_cli::{cli::Cli, commands, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug)?;
    commands::run(cli)
}
