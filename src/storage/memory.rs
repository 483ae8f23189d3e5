use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use super::{AccountStore, StoreError};
use crate::domain::{Account, AccountSummary, AccountUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Document {
    Account(Account),
    Marker(String),
}

/// In-memory account store.
///
/// Behaves like a single collection: documents keep insertion order, account
/// documents and probe markers share the same space, and a unique username
/// constraint is only enforced once [`AccountStore::ensure_unique_usernames`]
/// has been called. Failure injection switches let tests drive the error
/// paths of the connector and repository.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    unique_usernames: AtomicBool,
    unreachable: AtomicBool,
    simulate_auth_error: AtomicBool,
    simulate_write_error: AtomicBool,
    simulate_delete_error: AtomicBool,
    simulate_index_error: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `accounts`, bypassing any
    /// uniqueness checks.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        store
            .documents()
            .extend(accounts.into_iter().map(Document::Account));
        store
    }

    /// Makes every operation fail as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Makes every operation fail as if the credentials were rejected.
    pub fn set_simulate_auth_error(&self, simulate: bool) {
        self.simulate_auth_error.store(simulate, Ordering::SeqCst);
    }

    /// Makes inserts and updates fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Makes deletes fail.
    pub fn set_simulate_delete_error(&self, simulate: bool) {
        self.simulate_delete_error.store(simulate, Ordering::SeqCst);
    }

    /// Makes creating the unique username constraint fail.
    pub fn set_simulate_index_error(&self, simulate: bool) {
        self.simulate_index_error.store(simulate, Ordering::SeqCst);
    }

    /// Returns every stored account document, including its password hash.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.documents()
            .iter()
            .filter_map(|doc| match doc {
                Document::Account(account) => Some(account.clone()),
                Document::Marker(_) => None,
            })
            .collect()
    }

    /// Returns the number of probe markers currently stored.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.documents()
            .iter()
            .filter(|doc| matches!(doc, Document::Marker(_)))
            .count()
    }

    /// Returns whether the unique username constraint is active.
    #[must_use]
    pub fn has_unique_usernames(&self) -> bool {
        self.unique_usernames.load(Ordering::SeqCst)
    }

    fn documents(&self) -> MutexGuard<'_, Vec<Document>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated network error".to_string()));
        }
        if self.simulate_auth_error.load(Ordering::SeqCst) {
            return Err(StoreError::Unauthorized(
                "Simulated authentication failure".to_string(),
            ));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn check_deletable(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.simulate_delete_error.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated delete error".to_string()));
        }
        Ok(())
    }

    fn position(documents: &[Document], username: &str) -> Option<usize> {
        documents.iter().position(
            |doc| matches!(doc, Document::Account(account) if account.username == username),
        )
    }

    fn duplicate_key(username: &str) -> StoreError {
        StoreError::DuplicateKey(format!("username \"{username}\" already exists"))
    }
}

impl AccountStore for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    fn insert_marker(&self, token: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.documents().push(Document::Marker(token.to_string()));
        Ok(())
    }

    fn delete_marker(&self, token: &str) -> Result<u64, StoreError> {
        self.check_deletable()?;
        let mut documents = self.documents();
        let found = documents
            .iter()
            .position(|doc| matches!(doc, Document::Marker(t) if t == token));
        Ok(found.map_or(0, |index| {
            documents.remove(index);
            1
        }))
    }

    fn ensure_unique_usernames(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.simulate_index_error.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated index error".to_string()));
        }

        let accounts = self.accounts();
        for (i, account) in accounts.iter().enumerate() {
            if accounts[..i].iter().any(|a| a.username == account.username) {
                return Err(Self::duplicate_key(&account.username));
            }
        }

        self.unique_usernames.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn usernames(&self) -> Result<Vec<AccountSummary>, StoreError> {
        self.check_reachable()?;
        Ok(self
            .documents()
            .iter()
            .filter_map(|doc| match doc {
                Document::Account(account) => Some(AccountSummary::new(account.username.clone())),
                Document::Marker(_) => None,
            })
            .collect())
    }

    fn exists(&self, username: &str) -> Result<bool, StoreError> {
        self.check_reachable()?;
        Ok(Self::position(&self.documents(), username).is_some())
    }

    fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.check_reachable()?;
        let documents = self.documents();
        Ok(Self::position(&documents, username).and_then(|index| match &documents[index] {
            Document::Account(account) => Some(account.clone()),
            Document::Marker(_) => None,
        }))
    }

    fn insert(&self, account: &Account) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut documents = self.documents();
        if self.has_unique_usernames() && Self::position(&documents, &account.username).is_some() {
            return Err(Self::duplicate_key(&account.username));
        }
        documents.push(Document::Account(account.clone()));
        Ok(())
    }

    fn update(&self, username: &str, update: &AccountUpdate) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut documents = self.documents();
        let Some(index) = Self::position(&documents, username) else {
            return Ok(false);
        };

        let clashes = documents.iter().enumerate().any(|(i, doc)| {
            i != index
                && matches!(doc, Document::Account(other) if other.username == update.username.as_str())
        });
        if self.has_unique_usernames() && clashes {
            return Err(Self::duplicate_key(&update.username));
        }

        if let Document::Account(account) = &mut documents[index] {
            account.username = update.username.to_string();
            if let Some(hash) = &update.password_hash {
                account.password_hash = hash.clone();
            }
        }
        Ok(true)
    }

    fn delete(&self, username: &str) -> Result<u64, StoreError> {
        self.check_deletable()?;
        let mut documents = self.documents();
        Ok(Self::position(&documents, username).map_or(0, |index| {
            documents.remove(index);
            1
        }))
    }
}
