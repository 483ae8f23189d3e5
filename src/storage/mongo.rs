//! MongoDB backed account store.
//!
//! Account documents have the shape `{ username, password }`, where
//! `password` holds the hex hash produced by the credential hasher. This is
//! the layout the chat server authenticates against.

use std::fmt;

use mongodb::{
    IndexModel,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    sync::{Client, Collection},
};
use serde::{Deserialize, Serialize};

use super::{AccountStore, COLLECTION, ConnectError, DATABASE, StoreError};
use crate::domain::{Account, AccountSummary, AccountUpdate, PasswordHash};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Server error codes for rejected credentials and missing privileges.
const UNAUTHORIZED_CODE: i32 = 13;
const AUTHENTICATION_FAILED_CODE: i32 = 18;

const USERNAME_FIELD: &str = "username";
const PASSWORD_FIELD: &str = "password";
const MARKER_FIELD: &str = "usermgr_probe";

#[derive(Debug, Serialize, Deserialize)]
struct AccountDocument {
    username: String,
    #[serde(rename = "password")]
    password_hash: String,
}

impl From<&Account> for AccountDocument {
    fn from(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            password_hash: account.password_hash.as_str().to_string(),
        }
    }
}

impl From<AccountDocument> for Account {
    fn from(doc: AccountDocument) -> Self {
        Self {
            username: doc.username,
            password_hash: PasswordHash::from_stored(doc.password_hash),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsernameDocument {
    username: String,
}

/// Account store backed by the `en_chat.users` collection of a MongoDB
/// deployment.
pub struct MongoStore {
    client: Client,
    users: Collection<AccountDocument>,
}

impl MongoStore {
    /// Creates a client for `store_url` and selects the user collection.
    ///
    /// The driver connects lazily, so this does not touch the network for
    /// plain `mongodb://` URLs. `mongodb+srv://` URLs are resolved through
    /// DNS here.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InvalidUrl`] if the connection string is rejected
    /// - [`ConnectError::Unreachable`] if SRV resolution fails
    pub fn open(store_url: &str) -> Result<Self, ConnectError> {
        let client = Client::with_uri_str(store_url).map_err(|e| {
            if matches!(*e.kind, ErrorKind::InvalidArgument { .. }) {
                ConnectError::InvalidUrl(e.to_string())
            } else {
                ConnectError::Unreachable(e.into())
            }
        })?;
        let users = client.database(DATABASE).collection(COLLECTION);
        Ok(Self { client, users })
    }

    fn raw(&self) -> Collection<Document> {
        self.users.clone_with_type()
    }
}

impl fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("database", &DATABASE)
            .field("collection", &COLLECTION)
            .finish_non_exhaustive()
    }
}

impl AccountStore for MongoStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(DATABASE)
            .run_command(doc! { "ping": 1 })
            .run()?;
        Ok(())
    }

    fn insert_marker(&self, token: &str) -> Result<(), StoreError> {
        self.raw().insert_one(doc! { MARKER_FIELD: token }).run()?;
        Ok(())
    }

    fn delete_marker(&self, token: &str) -> Result<u64, StoreError> {
        let result = self.raw().delete_one(doc! { MARKER_FIELD: token }).run()?;
        Ok(result.deleted_count)
    }

    fn ensure_unique_usernames(&self) -> Result<(), StoreError> {
        // Sparse, so documents without a username (probe markers, foreign
        // documents) are not indexed as null and cannot collide.
        let options = IndexOptions::builder().unique(true).sparse(true).build();
        let index = IndexModel::builder()
            .keys(doc! { USERNAME_FIELD: 1 })
            .options(options)
            .build();
        self.users.create_index(index).run()?;
        Ok(())
    }

    fn usernames(&self) -> Result<Vec<AccountSummary>, StoreError> {
        let cursor = self
            .users
            .clone_with_type::<UsernameDocument>()
            .find(doc! { USERNAME_FIELD: { "$exists": true } })
            .projection(doc! { "_id": 0, USERNAME_FIELD: 1 })
            .run()?;

        cursor
            .map(|doc| {
                doc.map(|d| AccountSummary::new(d.username))
                    .map_err(StoreError::from)
            })
            .collect()
    }

    fn exists(&self, username: &str) -> Result<bool, StoreError> {
        let count = self
            .users
            .count_documents(doc! { USERNAME_FIELD: username })
            .limit(1)
            .run()?;
        Ok(count > 0)
    }

    fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let doc = self
            .users
            .find_one(doc! { USERNAME_FIELD: username })
            .run()?;
        Ok(doc.map(Account::from))
    }

    fn insert(&self, account: &Account) -> Result<(), StoreError> {
        self.users
            .insert_one(AccountDocument::from(account))
            .run()?;
        Ok(())
    }

    fn update(&self, username: &str, update: &AccountUpdate) -> Result<bool, StoreError> {
        let mut set = doc! { USERNAME_FIELD: update.username.as_str() };
        if let Some(hash) = &update.password_hash {
            set.insert(PASSWORD_FIELD, hash.as_str());
        }

        let result = self
            .users
            .update_one(doc! { USERNAME_FIELD: username }, doc! { "$set": set })
            .run()?;
        Ok(result.matched_count > 0)
    }

    fn delete(&self, username: &str) -> Result<u64, StoreError> {
        let result = self
            .users
            .delete_one(doc! { USERNAME_FIELD: username })
            .run()?;
        Ok(result.deleted_count)
    }

    fn shutdown(self) {
        let Self { client, users } = self;
        drop(users);
        client.shutdown().run();
    }
}

impl From<MongoError> for StoreError {
    fn from(error: MongoError) -> Self {
        match *error.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref failure))
                if failure.code == DUPLICATE_KEY_CODE =>
            {
                Self::DuplicateKey(failure.message.clone())
            }
            ErrorKind::Authentication { .. } => Self::Unauthorized(error.to_string()),
            ErrorKind::Command(ref failure)
                if matches!(
                    failure.code,
                    UNAUTHORIZED_CODE | AUTHENTICATION_FAILED_CODE
                ) =>
            {
                Self::Unauthorized(error.to_string())
            }
            _ => Self::Backend(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_document_uses_server_field_names() {
        let account = Account {
            username: "alice".to_string(),
            password_hash: crate::domain::credential::hash("pw"),
        };

        let doc = mongodb::bson::to_document(&AccountDocument::from(&account)).unwrap();

        assert_eq!(doc.get_str(USERNAME_FIELD).unwrap(), "alice");
        assert_eq!(
            doc.get_str(PASSWORD_FIELD).unwrap(),
            account.password_hash.as_str()
        );
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn account_document_round_trips_into_account() {
        let doc = doc! { "username": "bob", "password": "abc123" };

        let stored: AccountDocument = mongodb::bson::from_document(doc).unwrap();
        let account = Account::from(stored);

        assert_eq!(account.username, "bob");
        assert_eq!(account.password_hash.as_str(), "abc123");
    }

    #[test]
    fn malformed_url_is_rejected_without_network() {
        let error = MongoStore::open("not-a-mongodb-url").unwrap_err();

        assert!(matches!(error, ConnectError::InvalidUrl(_)));
    }
}
