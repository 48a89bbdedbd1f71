// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments and hand them to the UI flow.
// - Any error ends the process with a non-zero exit code.

use clap::Parser;
use magnet2qb::{cli::Cli, ui};

fn main() -> anyhow::Result<()> {
    ui::run(Cli::parse())
}
