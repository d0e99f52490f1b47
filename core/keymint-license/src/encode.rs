//! Activation-code packing.
//!
//! `encode` is the last step of issuance; [`decode`] is its exact inverse,
//! used by tests and operational tooling, never by the issuance path.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, IssueError, IssueResult};

/// The wire envelope. Both fields are standard-alphabet base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// base64 of the canonical payload JSON bytes.
    pub data: String,
    /// base64 of the signature over the SHA-256 digest of those bytes.
    pub signature: String,
}

/// Packs payload and signature into the portable activation code:
/// JSON envelope, gzip, base64.
///
/// Compression-level and gzip-header metadata may vary between builds;
/// decodability does not depend on them.
pub fn encode(payload_bytes: &[u8], signature: &[u8]) -> IssueResult<String> {
    let envelope = SignedEnvelope {
        data: BASE64.encode(payload_bytes),
        signature: BASE64.encode(signature),
    };
    let json = serde_json::to_vec(&envelope)?;

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&json).map_err(IssueError::Encoding)?;
    let compressed = gz.finish().map_err(IssueError::Encoding)?;

    Ok(BASE64.encode(compressed))
}

/// Unpacks an activation code into `(payload bytes, signature bytes)`.
///
/// The inverse of [`encode`]: base64-decode, gunzip, parse the envelope,
/// base64-decode each field. Verifying the signature against a public key
/// is the caller's concern.
///
/// # Errors
///
/// [`DecodeError`] when any layer of the code is malformed.
pub fn decode(code: &str) -> Result<(Vec<u8>, Vec<u8>), DecodeError> {
    let compressed = BASE64.decode(code.trim())?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(DecodeError::Gzip)?;

    let envelope: SignedEnvelope = serde_json::from_slice(&json)?;
    let payload = BASE64.decode(&envelope.data)?;
    let signature = BASE64.decode(&envelope.signature)?;
    Ok((payload, signature))
}
