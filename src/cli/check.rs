use std::path::Path;

use tracing::instrument;

use crate::cli::{connect, terminal::Colorize};

#[derive(Debug, Default, clap::Parser)]
pub struct Command {}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let connection = connect(config_path)?;
        let accounts = usermgr::Directory::new(&connection).list()?;

        println!(
            "{}",
            format!(
                "✅ Connected to {}.{} ({} account(s))",
                usermgr::storage::DATABASE,
                usermgr::storage::COLLECTION,
                accounts.len()
            )
            .success()
        );

        connection.disconnect();
        Ok(())
    }
}
