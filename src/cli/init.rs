use std::path::Path;

use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Connection string of the MongoDB deployment holding the accounts
    #[arg(long, value_name = "URL")]
    store_url: String,
}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Configuration already exists at {} (remove it first to start over)",
                config_path.display()
            );
        }

        let config = usermgr::Config::new(self.store_url)?;
        config
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", config_path.display()))?;

        println!(
            "{}",
            format!("✅ Created {}", config_path.display()).success()
        );
        println!();
        println!("Next steps:");
        println!("  usermgr check");
        println!("  usermgr add <USERNAME>");

        Ok(())
    }
}
