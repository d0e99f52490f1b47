//! Shared test helpers for issuance tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use keymint_license::{ExpiryPolicy, Issuer, IssuerConfig, KeySource};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::Verifier;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tempfile::TempDir;

/// One 2048-bit key per test binary; RSA key generation is too slow to
/// repeat per test.
pub fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate test key")
    })
}

/// The test key as PKCS#1 PEM, the form the engine resolves.
pub fn test_key_pem() -> String {
    test_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("encode test key")
        .to_string()
}

/// A fixed issuance instant: 2024-01-01 12:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// An issuer signing with the shared test key, UTC expiry policy, no cap,
/// ledger under `dir`.
pub fn test_issuer(dir: &TempDir) -> Issuer {
    issuer_with_policy(
        dir,
        ExpiryPolicy {
            preferred_zone: "UTC".to_string(),
            max_lead_months: None,
        },
    )
}

pub fn issuer_with_policy(dir: &TempDir, policy: ExpiryPolicy) -> Issuer {
    Issuer::new(IssuerConfig {
        key: KeySource::inline(test_key_pem()),
        policy,
        ledger_path: dir.path().join("history.json"),
    })
}

/// An issuer with no key configured at all.
pub fn keyless_issuer(dir: &TempDir) -> Issuer {
    Issuer::new(IssuerConfig {
        key: KeySource::default(),
        policy: ExpiryPolicy::default(),
        ledger_path: dir.path().join("history.json"),
    })
}

/// Verifies `signature` over `payload_bytes` against the test public key.
pub fn verifies(payload_bytes: &[u8], signature: &[u8]) -> bool {
    let verifying_key = VerifyingKey::<Sha256>::new(RsaPublicKey::from(test_key()));
    Signature::try_from(signature)
        .map(|sig| verifying_key.verify(payload_bytes, &sig).is_ok())
        .unwrap_or(false)
}
