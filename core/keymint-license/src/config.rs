//! Engine configuration, constructed explicitly at startup.

use std::path::PathBuf;

use crate::payload::ExpiryPolicy;

/// Where the signing key comes from.
///
/// Inline PEM content takes precedence over the file path when both are
/// configured and the inline content is non-empty. The key is re-resolved on
/// every issuance, so rotating either source takes effect without a restart.
#[derive(Debug, Clone, Default)]
pub struct KeySource {
    /// PEM content supplied directly (typically from an environment variable).
    pub inline_pem: Option<String>,
    /// Path to a PEM file on local disk.
    pub pem_file: Option<PathBuf>,
}

impl KeySource {
    /// A source backed by inline PEM content only.
    pub fn inline(pem: impl Into<String>) -> Self {
        Self {
            inline_pem: Some(pem.into()),
            pem_file: None,
        }
    }

    /// A source backed by a PEM file only.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            inline_pem: None,
            pem_file: Some(path.into()),
        }
    }

    /// True when neither source is usable.
    #[must_use]
    pub fn is_unconfigured(&self) -> bool {
        self.inline_pem
            .as_deref()
            .is_none_or(|pem| pem.trim().is_empty())
            && self.pem_file.is_none()
    }
}

/// Everything the issuance engine needs, passed to [`Issuer::new`].
///
/// [`Issuer::new`]: crate::Issuer::new
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Signing key source.
    pub key: KeySource,
    /// Expiry interpretation and issuance-window policy.
    pub policy: ExpiryPolicy,
    /// Path of the durable audit ledger file.
    pub ledger_path: PathBuf,
}
