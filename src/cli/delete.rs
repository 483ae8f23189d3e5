use std::path::Path;

use dialoguer::Confirm;
use tracing::instrument;
use usermgr::Directory;

use crate::cli::{connect, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The name of the account to delete
    username: String,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let connection = connect(config_path)?;

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete account {}?", self.username))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Cancelled".dim());
                return Ok(());
            }
        }

        Directory::new(&connection).delete(&self.username)?;

        println!(
            "{}",
            format!("✅ Deleted account {}", self.username).success()
        );
        Ok(())
    }
}
