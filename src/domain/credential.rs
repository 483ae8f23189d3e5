//! One-way password hashing.
//!
//! Plaintext passwords never reach the store; the repository passes them
//! through a [`CredentialHasher`] first. The default [`Sha256Hasher`] produces
//! the unsalted, lowercase hex SHA-256 digest that the chat server compares
//! against at login, so accounts created here can sign in there.
//!
//! Unsalted digests are open to precomputed-table attacks. Moving to a
//! salted or memory-hard scheme means implementing [`CredentialHasher`] and
//! migrating the stored hashes together with the chat server.

use std::fmt;

use sha2::{Digest, Sha256};

/// The stored form of a password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a hash that was read back from the store.
    #[must_use]
    pub const fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the hash, returning the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deterministic one-way transform from a plaintext password to its stored
/// form.
pub trait CredentialHasher {
    /// Hashes `plaintext`.
    ///
    /// Must be total: every input, including the empty string, produces a
    /// hash.
    fn hash(&self, plaintext: &str) -> PasswordHash;
}

/// Unsalted SHA-256, rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, plaintext: &str) -> PasswordHash {
        let digest = Sha256::digest(plaintext.as_bytes());
        PasswordHash(format!("{digest:x}"))
    }
}

/// Hashes `plaintext` with the default [`Sha256Hasher`].
#[must_use]
pub fn hash(plaintext: &str) -> PasswordHash {
    Sha256Hasher.hash(plaintext)
}
