use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use tracing::instrument;
use usermgr::{AccountSummary, Directory};

use crate::cli::{connect, terminal::Colorize};

/// Placeholder shown in the password column; hashes are never fetched.
const MASKED_PASSWORD: &str = "******";

#[derive(Debug, Default, clap::Parser)]
pub struct Command {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Print one username per line without headers.
    #[arg(long, short, conflicts_with = "output")]
    quiet: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let connection = connect(config_path)?;
        let accounts = Directory::new(&connection).list()?;

        if self.quiet {
            for account in &accounts {
                println!("{}", account.username);
            }
            return Ok(());
        }

        match self.output {
            OutputFormat::Table => render_table(&accounts),
            OutputFormat::Json => render_json(&accounts)?,
        }
        Ok(())
    }
}

fn render_table(accounts: &[AccountSummary]) {
    if accounts.is_empty() {
        println!("{}", "No accounts registered".dim());
        return;
    }

    let width = accounts
        .iter()
        .map(|account| account.username.chars().count())
        .chain(std::iter::once("Username".len()))
        .max()
        .unwrap_or_default();

    println!("{:<width$}  Password", "Username");
    println!("{:-<width$}  {:-<8}", "", "");
    for account in accounts {
        println!("{:<width$}  {}", account.username, MASKED_PASSWORD.dim());
    }
    println!();
    println!("{}", format!("{} account(s)", accounts.len()).info());
}

fn render_json(accounts: &[AccountSummary]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), accounts)
        .context("failed to render json output")?;
    println!();
    Ok(())
}
