use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
};

mod add;
mod check;
mod delete;
mod edit;
mod init;
mod list;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use usermgr::{Config, Connection, MongoStore, domain::DEFAULT_CONFIG_FILE};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.unwrap_or_default().run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Write a new configuration file
    Init(init::Command),

    /// Check the configuration and the store connection
    Check(check::Command),

    /// List registered accounts (default)
    List(list::Command),

    /// Create a new account
    Add(add::Command),

    /// Rename an account or change its password
    Edit(edit::Command),

    /// Delete an account
    Delete(delete::Command),
}

impl Default for Command {
    fn default() -> Self {
        Self::List(list::Command::default())
    }
}

impl Command {
    fn run(self, config: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(config)?,
            Self::Check(command) => command.run(config)?,
            Self::List(command) => command.run(config)?,
            Self::Add(command) => command.run(config)?,
            Self::Edit(command) => command.run(config)?,
            Self::Delete(command) => command.run(config)?,
        }
        Ok(())
    }
}

/// Loads the configuration and connects to the store it names.
fn connect(config_path: &Path) -> anyhow::Result<Connection<MongoStore>> {
    let config = Config::load(config_path)?;

    let spinner = terminal::spinner("Connecting to the user store...");
    let connection = usermgr::connect(config.store_url());
    spinner.finish_and_clear();

    Ok(connection?)
}

/// Reads a single password line from stdin, without the trailing newline.
fn read_password_line() -> anyhow::Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
