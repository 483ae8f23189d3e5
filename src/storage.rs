//! Store access for the account directory.
//!
//! The [`AccountStore`] trait is the document-level interface a backend has
//! to provide. [`Connection`] wraps a backend that has passed verification,
//! and the [`Directory`] runs the account operations against it.

use uuid::Uuid;

use crate::domain::{Account, AccountSummary, AccountUpdate};

pub mod directory;
/// In-memory backend for tests and embedding.
pub mod memory;
pub mod mongo;

pub use directory::{Directory, RepositoryError};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Logical database holding the user collection.
pub const DATABASE: &str = "en_chat";

/// Collection holding one document per account.
pub const COLLECTION: &str = "users";

/// Document-level operations on the user collection.
///
/// Each method maps to a single store round trip. Implementations must not
/// retry, cache, or reorder; the [`Directory`] builds its guarantees on top
/// of these primitives.
pub trait AccountStore {
    /// Checks that the store answers at all.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be reached.
    fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a probe marker document identified by `token`.
    ///
    /// # Errors
    ///
    /// Fails if the write is rejected.
    fn insert_marker(&self, token: &str) -> Result<(), StoreError>;

    /// Deletes the probe marker identified by `token`, returning the number of
    /// documents removed.
    ///
    /// # Errors
    ///
    /// Fails if the delete is rejected.
    fn delete_marker(&self, token: &str) -> Result<u64, StoreError>;

    /// Asks the store to reject a second account with an existing username.
    ///
    /// # Errors
    ///
    /// Fails if the constraint cannot be created, for example because the
    /// collection already contains duplicates.
    fn ensure_unique_usernames(&self) -> Result<(), StoreError>;

    /// Returns every account with the password field excluded from the query.
    ///
    /// # Errors
    ///
    /// Fails on transport errors.
    fn usernames(&self) -> Result<Vec<AccountSummary>, StoreError>;

    /// Checks whether an account named `username` exists, without reading
    /// its password.
    ///
    /// # Errors
    ///
    /// Fails on transport errors.
    fn exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Looks up a single account by username.
    ///
    /// # Errors
    ///
    /// Fails on transport errors.
    fn find(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Inserts a new account document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a uniqueness constraint is
    /// violated, or another error on transport failure.
    fn insert(&self, account: &Account) -> Result<(), StoreError>;

    /// Applies `update` to the account named `username`, returning whether an
    /// account matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a uniqueness constraint is
    /// violated, or another error on transport failure.
    fn update(&self, username: &str, update: &AccountUpdate) -> Result<bool, StoreError>;

    /// Deletes at most one account named `username`, returning the number of
    /// documents removed.
    ///
    /// # Errors
    ///
    /// Fails on transport errors.
    fn delete(&self, username: &str) -> Result<u64, StoreError>;

    /// Releases the backend's resources. Backends without any have nothing
    /// to do.
    fn shutdown(self)
    where
        Self: Sized,
    {
    }
}

/// Failures reported by an [`AccountStore`] backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// A write would have broken a uniqueness constraint.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The store refused the credentials or the operation.
    #[error("access denied: {0}")]
    Unauthorized(String),

    /// Any other backend or transport failure.
    #[error("store operation failed: {0}")]
    Backend(String),
}

/// Errors that can occur while establishing a [`Connection`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The connection string was rejected before any network traffic.
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),

    /// The store could not be reached over the network.
    #[error("failed to connect to the store: {0}")]
    Unreachable(#[source] StoreError),

    /// The store was reachable but rejected the credentials, or the
    /// write/delete probe failed.
    #[error("store probe failed: {0}")]
    ProbeFailed(#[source] StoreError),
}

/// A verified handle to the user collection.
///
/// A `Connection` only exists once the backend has answered a ping and has
/// accepted (and removed) a probe document, so holding one means the
/// collection is both reachable and writable.
#[derive(Debug)]
pub struct Connection<S> {
    store: S,
}

impl<S: AccountStore> Connection<S> {
    /// Verifies `store` and wraps it in a `Connection`.
    ///
    /// Makes a single attempt; the caller decides whether to retry.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::Unreachable`] if the store does not answer
    /// - [`ConnectError::ProbeFailed`] if the store rejects the credentials,
    ///   or the probe document cannot be written or removed
    pub fn establish(store: S) -> Result<Self, ConnectError> {
        store.ping().map_err(|e| match e {
            StoreError::Unauthorized(_) => ConnectError::ProbeFailed(e),
            _ => ConnectError::Unreachable(e),
        })?;
        probe(&store)?;

        if let Err(e) = store.ensure_unique_usernames() {
            tracing::warn!(
                "Could not enforce unique usernames in the store ({e}); duplicate checks \
                 are not atomic"
            );
        }

        tracing::info!("Connected to {DATABASE}.{COLLECTION}");
        Ok(Self { store })
    }

    /// Closes the connection, shutting the backend down before returning.
    pub fn disconnect(self) {
        tracing::debug!("Disconnecting from {DATABASE}.{COLLECTION}");
        self.store.shutdown();
    }
}

impl<S> Connection<S> {
    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}

/// Connects to the MongoDB deployment at `store_url`.
///
/// # Errors
///
/// See [`MongoStore::open`] and [`Connection::establish`].
pub fn connect(store_url: &str) -> Result<Connection<MongoStore>, ConnectError> {
    let store = MongoStore::open(store_url)?;
    Connection::establish(store)
}

/// Writes and removes a throwaway document to prove the collection is
/// writable.
fn probe(store: &impl AccountStore) -> Result<(), ConnectError> {
    let token = Uuid::new_v4().to_string();
    tracing::debug!("Probing store with marker {token}");

    store
        .insert_marker(&token)
        .map_err(ConnectError::ProbeFailed)?;

    match store.delete_marker(&token) {
        Ok(0) => Err(ConnectError::ProbeFailed(StoreError::Backend(format!(
            "probe marker {token} could not be found for cleanup"
        )))),
        Ok(_) => Ok(()),
        Err(e) => Err(ConnectError::ProbeFailed(e)),
    }
}
