use std::path::Path;

use dialoguer::Password;
use tracing::instrument;
use usermgr::Directory;

use crate::cli::{connect, read_password_line, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The name of the account to create
    username: String,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    password_stdin: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let connection = connect(config_path)?;

        let password = if self.password_stdin {
            read_password_line()?
        } else {
            Password::new()
                .with_prompt(format!("Password for {}", self.username))
                .with_confirmation("Repeat password", "Passwords do not match")
                .allow_empty_password(true)
                .interact()?
        };

        Directory::new(&connection).create(&self.username, &password)?;

        println!(
            "{}",
            format!("✅ Created account {}", self.username).success()
        );
        Ok(())
    }
}
