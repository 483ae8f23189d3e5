use std::{fmt, ops::Deref};

use non_empty_string::NonEmptyString;
use serde::Serialize;

use crate::domain::credential::PasswordHash;

/// A validated, non-empty account name.
///
/// No other restrictions are placed on the content; the chat server accepts
/// any username an operator registers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(NonEmptyString);

impl Username {
    /// Creates a new `Username`.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyUsernameError`] if the string is empty.
    pub fn new(s: String) -> Result<Self, EmptyUsernameError> {
        NonEmptyString::new(s)
            .map(Self)
            .map_err(|_| EmptyUsernameError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for Username {
    type Error = EmptyUsernameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Username {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an empty string is used as a username.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("username must not be empty")]
pub struct EmptyUsernameError;

/// A stored account: the username and the hash of its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The account name.
    pub username: String,
    /// One-way hash of the account password.
    pub password_hash: PasswordHash,
}

/// The password-free view of an account returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// The account name.
    pub username: String,
}

impl AccountSummary {
    /// Creates a summary for the given username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// The fields written by an account update.
///
/// The username is always written. The password hash is only written when
/// present; `None` leaves the stored hash untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    /// The username the account will have after the update.
    pub username: Username,
    /// The replacement password hash, if the password is being rotated.
    pub password_hash: Option<PasswordHash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rejects_empty_string() {
        assert_eq!(Username::new(String::new()), Err(EmptyUsernameError));
    }

    #[test]
    fn username_keeps_content_verbatim() {
        let username = Username::try_from(" Alice ").unwrap();
        assert_eq!(username.as_str(), " Alice ");
        assert_eq!(username.to_string(), " Alice ");
    }

    #[test]
    fn summary_serializes_username_only() {
        let summary = AccountSummary::new("bob");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "bob" }));
    }
}
