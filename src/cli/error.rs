//! CLI error types and conversions

use crate::catalog::CatalogError;
use crate::credential::CredentialError;
use crate::fetcher::FetcherError;
use crate::ledger::LedgerError;

/// Fatal export errors
///
/// Anything reaching this type ends the process with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Credential error
    #[error("credential error: {0}")]
    CredentialError(#[from] CredentialError),

    /// Ledger error
    #[error("ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    /// Catalog error
    #[error("catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output directory could not be prepared
    #[error("output error: {0}")]
    OutputError(String),
}

impl CliError {
    /// Whether the export stopped because shutdown was requested
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CliError::CatalogError(CatalogError::Cancelled { .. }))
    }
}
