//! Domain models for account management.
//!
//! This module contains the account types, the credential hashing scheme and
//! the configuration the tool is started with.

/// Account records and validated usernames.
pub mod account;
pub use account::{Account, AccountSummary, AccountUpdate, EmptyUsernameError, Username};

mod config;
pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE};

pub mod credential;
pub use credential::{CredentialHasher, PasswordHash, Sha256Hasher};
