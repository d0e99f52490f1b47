//! Canonical payload signing.

use rand::rngs::OsRng;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::error::{IssueError, IssueResult};

/// Signs the canonical payload bytes.
///
/// SHA-256 digest first, then an RSA PKCS#1 v1.5 signature over the digest.
/// The signature is deterministic given digest and key; the OS RNG feeds
/// the implementation's blinding.
///
/// # Errors
///
/// [`IssueError::Signing`] on any failure inside the RSA operation. Fatal
/// for the one request, never retried.
pub fn sign(payload_bytes: &[u8], key: &RsaPrivateKey) -> IssueResult<Vec<u8>> {
    let digest = Sha256::digest(payload_bytes);
    key.sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(IssueError::Signing)
}
