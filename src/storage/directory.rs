//! The account directory
//!
//! The [`Directory`] implements list, create, update, and delete on top of
//! a verified [`Connection`]. It holds no state of its own beyond the borrowed
//! connection and the credential hasher, so every change is visible to the
//! next call straight away.

use tracing::instrument;

use super::{AccountStore, Connection, StoreError};
use crate::domain::{
    Account, AccountSummary, AccountUpdate, CredentialHasher, EmptyUsernameError, Sha256Hasher,
    Username,
};

/// Account operations against the user collection.
///
/// A `Directory` can only be built from a [`Connection`], so no operation can
/// run against an unverified store.
#[derive(Debug)]
pub struct Directory<'c, S, H = Sha256Hasher> {
    connection: &'c Connection<S>,
    hasher: H,
}

impl<'c, S: AccountStore> Directory<'c, S> {
    /// Opens the directory on `connection` with the default hasher.
    #[must_use]
    pub const fn new(connection: &'c Connection<S>) -> Self {
        Self::with_hasher(connection, Sha256Hasher)
    }
}

impl<'c, S: AccountStore, H: CredentialHasher> Directory<'c, S, H> {
    /// Opens the directory on `connection`, hashing passwords with `hasher`.
    #[must_use]
    pub const fn with_hasher(connection: &'c Connection<S>, hasher: H) -> Self {
        Self { connection, hasher }
    }

    /// Lists every account.
    ///
    /// Passwords are excluded at the query, not stripped afterwards. The order
    /// is whatever the store returns and must not be relied upon.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Store`] on transport failure.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<AccountSummary>, RepositoryError> {
        let accounts = self.store().usernames()?;
        tracing::debug!("Listed {} account(s)", accounts.len());
        Ok(accounts)
    }

    /// Creates an account, storing only the hash of `password`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::InvalidInput`] if `username` is empty
    /// - [`RepositoryError::DuplicateUsername`] if the username is taken
    /// - [`RepositoryError::Store`] on transport failure
    ///
    /// Without a unique constraint in the store, two concurrent creates of
    /// the same username can both pass the existence check.
    #[instrument(skip(self, password))]
    pub fn create(&self, username: &str, password: &str) -> Result<(), RepositoryError> {
        let username = Username::try_from(username)?;

        if self.store().exists(&username)? {
            return Err(RepositoryError::DuplicateUsername(username.to_string()));
        }

        let account = Account {
            username: username.to_string(),
            password_hash: self.hasher.hash(password),
        };
        self.store()
            .insert(&account)
            .map_err(|e| duplicate_or_store(e, &username))?;

        tracing::info!("Created account '{username}'");
        Ok(())
    }

    /// Renames an account and optionally rotates its password.
    ///
    /// The username is always set to `new_username`. The stored hash is only
    /// replaced when `new_password` is present and non-empty; there is no way
    /// to set an empty password through this operation.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::InvalidInput`] if `new_username` is empty
    /// - [`RepositoryError::NotFound`] if no account is named `old_username`
    /// - [`RepositoryError::DuplicateUsername`] if `new_username` belongs to
    ///   another account
    /// - [`RepositoryError::Store`] on transport failure
    #[instrument(skip(self, new_password))]
    pub fn update(
        &self,
        old_username: &str,
        new_username: &str,
        new_password: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let new_username = Username::try_from(new_username)?;

        if !self.store().exists(old_username)? {
            return Err(RepositoryError::NotFound(old_username.to_string()));
        }

        if new_username.as_str() != old_username && self.store().exists(&new_username)? {
            return Err(RepositoryError::DuplicateUsername(new_username.to_string()));
        }

        let password_hash = new_password
            .filter(|password| !password.is_empty())
            .map(|password| self.hasher.hash(password));
        let rotated = password_hash.is_some();

        let update = AccountUpdate {
            username: new_username,
            password_hash,
        };
        let matched = self
            .store()
            .update(old_username, &update)
            .map_err(|e| duplicate_or_store(e, &update.username))?;

        // The account may have been deleted between the lookup and the write.
        if !matched {
            return Err(RepositoryError::NotFound(old_username.to_string()));
        }

        tracing::info!(
            password_rotated = rotated,
            "Updated account '{old_username}' -> '{}'",
            update.username
        );
        Ok(())
    }

    /// Deletes the account named `username`.
    ///
    /// Deleting an account that does not exist succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Store`] on transport failure.
    #[instrument(skip(self))]
    pub fn delete(&self, username: &str) -> Result<(), RepositoryError> {
        let deleted = self.store().delete(username)?;
        if deleted == 0 {
            tracing::debug!("No account named '{username}' to delete");
        } else {
            tracing::info!("Deleted account '{username}'");
        }
        Ok(())
    }

    const fn store(&self) -> &S {
        self.connection.store()
    }
}

fn duplicate_or_store(error: StoreError, username: &Username) -> RepositoryError {
    match error {
        StoreError::DuplicateKey(_) => RepositoryError::DuplicateUsername(username.to_string()),
        other => RepositoryError::Store(other),
    }
}

/// Errors returned by [`Directory`] operations.
///
/// All of these are recoverable; the caller can correct the input and try
/// again.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// An account with this username already exists.
    #[error("an account named '{0}' already exists")]
    DuplicateUsername(String),

    /// No account with this username exists.
    #[error("no account named '{0}'")]
    NotFound(String),

    /// The input was rejected before reaching the store.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] EmptyUsernameError),

    /// The store failed while carrying out the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::{PasswordHash, credential::hash},
        storage::MemoryStore,
    };

    fn connect(seed: &[(&str, &str)]) -> Connection<MemoryStore> {
        Connection::establish(accounts(seed)).unwrap()
    }

    fn stored_hash(connection: &Connection<MemoryStore>, username: &str) -> Option<PasswordHash> {
        connection
            .store()
            .accounts()
            .into_iter()
            .find(|account| account.username == username)
            .map(|account| account.password_hash)
    }

    fn usernames(directory: &Directory<'_, MemoryStore>) -> Vec<String> {
        directory
            .list()
            .unwrap()
            .into_iter()
            .map(|summary| summary.username)
            .collect()
    }

    /// Answers existence checks from `snapshot` and everything else from
    /// `live`, as if another client changed the collection between a
    /// lookup and the following write.
    #[derive(Debug)]
    struct StaleStore {
        snapshot: MemoryStore,
        live: MemoryStore,
    }

    impl AccountStore for StaleStore {
        fn ping(&self) -> Result<(), StoreError> {
            self.live.ping()
        }
        fn insert_marker(&self, token: &str) -> Result<(), StoreError> {
            self.live.insert_marker(token)
        }
        fn delete_marker(&self, token: &str) -> Result<u64, StoreError> {
            self.live.delete_marker(token)
        }
        fn ensure_unique_usernames(&self) -> Result<(), StoreError> {
            self.live.ensure_unique_usernames()
        }
        fn usernames(&self) -> Result<Vec<AccountSummary>, StoreError> {
            self.live.usernames()
        }
        fn exists(&self, username: &str) -> Result<bool, StoreError> {
            self.snapshot.exists(username)
        }
        fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
            self.snapshot.find(username)
        }
        fn insert(&self, account: &Account) -> Result<(), StoreError> {
            self.live.insert(account)
        }
        fn update(&self, username: &str, update: &AccountUpdate) -> Result<bool, StoreError> {
            self.live.update(username, update)
        }
        fn delete(&self, username: &str) -> Result<u64, StoreError> {
            self.live.delete(username)
        }
    }

    fn accounts(accounts: &[(&str, &str)]) -> MemoryStore {
        MemoryStore::with_accounts(accounts.iter().map(|(username, password)| Account {
            username: (*username).to_string(),
            password_hash: hash(password),
        }))
    }

    fn connect_stale(snapshot: &[(&str, &str)], live: &[(&str, &str)]) -> Connection<StaleStore> {
        Connection::establish(StaleStore {
            snapshot: accounts(snapshot),
            live: accounts(live),
        })
        .unwrap()
    }

    #[test]
    fn list_of_empty_collection_is_empty() {
        let connection = connect(&[]);
        let directory = Directory::new(&connection);

        assert!(directory.list().unwrap().is_empty());
    }

    #[test]
    fn list_returns_every_account() {
        let connection = connect(&[("alice", "a"), ("bob", "b")]);
        let directory = Directory::new(&connection);

        let mut names = usernames(&directory);
        names.sort();

        assert_eq!(names, ["alice", "bob"]);
    }

    #[test_case("hunter2"; "ordinary password")]
    #[test_case("a"; "single character")]
    #[test_case("pässwörd 🔒"; "unicode")]
    fn create_stores_hash_not_plaintext(password: &str) {
        let connection = connect(&[]);
        let directory = Directory::new(&connection);

        directory.create("alice", password).unwrap();

        let stored = stored_hash(&connection, "alice").unwrap();
        assert_ne!(stored.as_str(), password);
        assert_eq!(stored, hash(password));
    }

    #[test]
    fn create_accepts_empty_password() {
        let connection = connect(&[]);
        let directory = Directory::new(&connection);

        directory.create("alice", "").unwrap();

        assert_eq!(stored_hash(&connection, "alice"), Some(hash("")));
    }

    #[test]
    fn create_rejects_empty_username() {
        let connection = connect(&[]);
        let directory = Directory::new(&connection);

        let error = directory.create("", "pw").unwrap_err();

        assert_eq!(error, RepositoryError::InvalidInput(EmptyUsernameError));
        assert!(connection.store().accounts().is_empty());
    }

    #[test_case("original"; "same password")]
    #[test_case("different"; "different password")]
    fn create_rejects_existing_username(password: &str) {
        let connection = connect(&[("alice", "original")]);
        let directory = Directory::new(&connection);

        let error = directory.create("alice", password).unwrap_err();

        assert_eq!(error, RepositoryError::DuplicateUsername("alice".into()));
        assert_eq!(connection.store().accounts().len(), 1);
        assert_eq!(stored_hash(&connection, "alice"), Some(hash("original")));
    }

    #[test]
    fn create_maps_constraint_violation_to_duplicate() {
        let connection = connect_stale(&[], &[("alice", "original")]);
        let directory = Directory::new(&connection);

        let error = directory.create("alice", "other").unwrap_err();

        assert_eq!(error, RepositoryError::DuplicateUsername("alice".into()));
        assert_eq!(connection.store().live.accounts().len(), 1);
    }

    #[test]
    fn update_with_empty_password_renames_and_keeps_hash() {
        let connection = connect(&[("alice", "secret")]);
        let directory = Directory::new(&connection);

        directory.update("alice", "alice2", Some("")).unwrap();

        assert_eq!(usernames(&directory), ["alice2"]);
        assert_eq!(stored_hash(&connection, "alice2"), Some(hash("secret")));
    }

    #[test]
    fn update_without_password_renames_and_keeps_hash() {
        let connection = connect(&[("alice", "secret")]);
        let directory = Directory::new(&connection);

        directory.update("alice", "alice2", None).unwrap();

        assert_eq!(stored_hash(&connection, "alice2"), Some(hash("secret")));
    }

    #[test]
    fn update_with_password_rotates_hash_and_keeps_name() {
        let connection = connect(&[("alice2", "secret")]);
        let directory = Directory::new(&connection);

        directory.update("alice2", "alice2", Some("newpw")).unwrap();

        assert_eq!(usernames(&directory), ["alice2"]);
        assert_eq!(stored_hash(&connection, "alice2"), Some(hash("newpw")));
    }

    #[test]
    fn update_of_missing_account_is_not_found() {
        let connection = connect(&[("alice", "secret")]);
        let directory = Directory::new(&connection);

        let error = directory.update("bob", "robert", Some("pw")).unwrap_err();

        assert_eq!(error, RepositoryError::NotFound("bob".into()));
        assert_eq!(usernames(&directory), ["alice"]);
    }

    #[test]
    fn update_rejects_empty_new_username() {
        let connection = connect(&[("alice", "secret")]);
        let directory = Directory::new(&connection);

        let error = directory.update("alice", "", None).unwrap_err();

        assert_eq!(error, RepositoryError::InvalidInput(EmptyUsernameError));
        assert_eq!(usernames(&directory), ["alice"]);
    }

    #[test]
    fn update_of_account_deleted_after_lookup_is_not_found() {
        let connection = connect_stale(&[("alice", "secret")], &[]);
        let directory = Directory::new(&connection);

        let error = directory.update("alice", "alice2", Some("pw")).unwrap_err();

        assert_eq!(error, RepositoryError::NotFound("alice".into()));
        assert!(connection.store().live.accounts().is_empty());
    }

    #[test]
    fn update_maps_constraint_violation_to_duplicate() {
        let connection = connect_stale(&[("alice", "a")], &[("alice", "a"), ("bob", "b")]);
        let directory = Directory::new(&connection);

        let error = directory.update("alice", "bob", None).unwrap_err();

        assert_eq!(error, RepositoryError::DuplicateUsername("bob".into()));
        let mut names: Vec<_> = connection
            .store()
            .live
            .accounts()
            .into_iter()
            .map(|account| account.username)
            .collect();
        names.sort();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn update_rejects_rename_onto_existing_account() {
        let connection = connect(&[("alice", "a"), ("bob", "b")]);
        let directory = Directory::new(&connection);

        let error = directory.update("alice", "bob", Some("x")).unwrap_err();

        assert_eq!(error, RepositoryError::DuplicateUsername("bob".into()));
        assert_eq!(stored_hash(&connection, "alice"), Some(hash("a")));
        assert_eq!(stored_hash(&connection, "bob"), Some(hash("b")));
    }

    #[test]
    fn delete_removes_account() {
        let connection = connect(&[("alice", "a"), ("bob", "b")]);
        let directory = Directory::new(&connection);

        directory.delete("alice").unwrap();

        assert_eq!(usernames(&directory), ["bob"]);
    }

    #[test]
    fn delete_is_idempotent() {
        let connection = connect(&[("alice", "a")]);
        let directory = Directory::new(&connection);

        directory.delete("ghost").unwrap();
        assert_eq!(connection.store().accounts().len(), 1);

        directory.delete("alice").unwrap();
        directory.delete("alice").unwrap();
        assert!(connection.store().accounts().is_empty());
    }

    #[test]
    fn store_failures_surface_as_store_errors() {
        let connection = connect(&[("alice", "a")]);
        let directory = Directory::new(&connection);
        connection.store().set_simulate_write_error(true);

        let error = directory.create("bob", "b").unwrap_err();
        assert!(matches!(error, RepositoryError::Store(StoreError::Backend(_))));

        connection.store().set_unreachable(true);
        assert!(matches!(
            directory.list().unwrap_err(),
            RepositoryError::Store(_)
        ));
        assert!(matches!(
            directory.delete("alice").unwrap_err(),
            RepositoryError::Store(_)
        ));
    }

    #[test]
    fn custom_hasher_is_used_for_create_and_update() {
        struct Reversed;

        impl CredentialHasher for Reversed {
            fn hash(&self, plaintext: &str) -> PasswordHash {
                PasswordHash::from_stored(plaintext.chars().rev().collect())
            }
        }

        let connection = connect(&[]);
        let directory = Directory::with_hasher(&connection, Reversed);

        directory.create("alice", "abc").unwrap();
        assert_eq!(
            stored_hash(&connection, "alice").unwrap().as_str(),
            "cba"
        );

        directory.update("alice", "alice", Some("xyz")).unwrap();
        assert_eq!(
            stored_hash(&connection, "alice").unwrap().as_str(),
            "zyx"
        );
    }
}
