//! Credential file loading
//!
//! The remote service authenticates every listing and authorization call with an
//! opaque session token copied from a browser. The token is kept out of logs.

use std::fmt;
use std::path::Path;

/// Opaque session credential sent with every authenticated request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token, rejecting blank values
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(token))
    }

    /// Read the credential from a file
    ///
    /// A missing, unreadable, or blank file is an error; the exporter cannot do
    /// anything without a session.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CredentialError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::new(contents).map_err(|_| CredentialError::Empty)
    }

    /// Raw token value for request headers
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Credential loading errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// File missing or unreadable
    #[error("cannot read credential file {path}: {reason}")]
    Unreadable {
        /// Credential file path
        path: String,
        /// Underlying IO failure
        reason: String,
    },

    /// File present but blank
    #[error("credential file is empty; paste the session cookie into it")]
    Empty,
}
