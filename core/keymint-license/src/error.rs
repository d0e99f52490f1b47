//! Error types for the issuance engine.

use thiserror::Error;

/// Result type for issuance operations.
pub type IssueResult<T> = Result<T, IssueError>;

/// Issuance-specific errors.
///
/// Every variant aborts the one issuance that hit it; nothing is retried.
/// A failed ledger write is not represented here: the code has already
/// been produced at that point, so the ledger logs and swallows it.
#[derive(Debug, Error)]
pub enum IssueError {
    /// A required input field was empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The expiry date is not a YYYY-MM-DD calendar date.
    #[error("invalid expiry date {0:?}: expected YYYY-MM-DD")]
    DateFormat(String),

    /// The expiry date falls outside the configured issuance window.
    #[error("expiry date {requested} is more than {max_months} month(s) ahead")]
    LeadTimeExceeded {
        /// The requested expiry date.
        requested: String,
        /// The configured maximum lead time, in months.
        max_months: u32,
    },

    /// Neither an inline PEM nor a readable key file is configured.
    #[error("no signing key configured")]
    KeyMissing,

    /// The resolved key bytes contain no PEM block.
    #[error("signing key is not PEM encoded")]
    KeyFormat,

    /// The PEM decoded but is not a usable PKCS#1 RSA private key.
    #[error("signing key is not a valid PKCS#1 RSA private key")]
    InvalidKey(#[source] rsa::pkcs1::Error),

    /// The RSA signing operation itself failed.
    #[error("signature generation failed")]
    Signing(#[source] rsa::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The envelope could not be compressed.
    #[error("envelope encoding failed")]
    Encoding(#[source] std::io::Error),
}

impl IssueError {
    /// True for errors caused by the request rather than the deployment.
    ///
    /// The transport maps client errors to 400-class statuses and the rest
    /// to 500-class.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::DateFormat(_) | Self::LeadTimeExceeded { .. }
        )
    }
}

/// Errors from [`decode`](crate::decode), the activation-code inverse.
///
/// These never occur on the issuance path; they exist for tests and tooling
/// that unpack a produced code.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The code or an envelope field is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a gzip stream.
    #[error("invalid gzip data: {0}")]
    Gzip(#[source] std::io::Error),

    /// The decompressed bytes are not a JSON envelope.
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}
