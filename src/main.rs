mod cmd;

use clap::Parser;
use cmd::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cmd::init_logging(cli.verbose);
    match &cli.command {
        Commands::Show(a) => a.run(),
        Commands::Rank(a) => a.run(),
        Commands::Cuts(a) => a.run(),
        Commands::Prune(a) => a.run(),
    }
}
