use std::path::Path;

use dialoguer::Password;
use tracing::instrument;
use usermgr::Directory;

use crate::cli::{connect, read_password_line, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The current name of the account
    username: String,

    /// Give the account a new name
    #[arg(long, value_name = "NEW_USERNAME")]
    rename: Option<String>,

    /// Read the new password from the first line of stdin instead of
    /// prompting (an empty line keeps the current password)
    #[arg(long, conflicts_with = "keep_password")]
    password_stdin: bool,

    /// Keep the current password without prompting
    #[arg(long)]
    keep_password: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let connection = connect(config_path)?;
        let new_username = self.rename.as_deref().unwrap_or(&self.username);

        let new_password = if self.keep_password {
            String::new()
        } else if self.password_stdin {
            read_password_line()?
        } else {
            Password::new()
                .with_prompt("New password (leave empty to keep current password)")
                .with_confirmation("Repeat password", "Passwords do not match")
                .allow_empty_password(true)
                .interact()?
        };

        Directory::new(&connection).update(
            &self.username,
            new_username,
            Some(new_password.as_str()),
        )?;

        let mut changes = Vec::new();
        if new_username != self.username {
            changes.push(format!("renamed to {new_username}"));
        }
        if !new_password.is_empty() {
            changes.push("password changed".to_string());
        }

        if changes.is_empty() {
            println!("{}", format!("No changes to {}", self.username).dim());
        } else {
            println!(
                "{}",
                format!("✅ Updated {}: {}", self.username, changes.join(", ")).success()
            );
        }
        Ok(())
    }
}
