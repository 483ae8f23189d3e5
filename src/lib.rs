//! Account directory management for the EnChat user store.
//!
//! Accounts live in the `users` collection of the `en_chat` database. The
//! typical flow is to load a [`Config`], [`connect`] to the store it names,
//! and run account operations through a [`Directory`]:
//!
//! ```no_run
//! use std::path::Path;
//!
//! use usermgr::{Config, Directory, connect};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(Path::new("config.toml"))?;
//! let connection = connect(config.store_url())?;
//! let directory = Directory::new(&connection);
//!
//! directory.create("bob", "hunter2")?;
//! for account in directory.list()? {
//!     println!("{}", account.username);
//! }
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub use domain::{
    Account, AccountSummary, Config, ConfigError, CredentialHasher, PasswordHash, Sha256Hasher,
    Username,
};

/// Store backends, connection handling and the account directory.
pub mod storage;
pub use storage::{
    AccountStore, ConnectError, Connection, Directory, MemoryStore, MongoStore, RepositoryError,
    StoreError, connect,
};
