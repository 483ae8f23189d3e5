//! `usermgr`: manage the accounts of an EnChat deployment.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
