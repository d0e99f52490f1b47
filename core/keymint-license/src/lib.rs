//! License issuance and audit engine for Keymint.
//!
//! This crate turns a validated `(machine id, expiry date)` pair into a
//! signed, portable activation code that installed software can verify
//! offline against a distributed RSA public key, and records every issuance
//! in a durable audit ledger.
//!
//! # Pipeline
//!
//! One [`Issuer::issue`] call runs the whole chain:
//!
//! 1. validate the input fields
//! 2. resolve the signing key from the configured [`KeySource`]
//! 3. canonicalize the payload and compute its end-of-day expiry
//! 4. SHA-256 + RSA PKCS#1 v1.5 sign the canonical bytes
//! 5. pack `(payload, signature)` into the activation code
//! 6. append the issuance to the [`HistoryLedger`]
//!
//! # Activation Code Format
//!
//! `base64( gzip( {"data": base64(payload), "signature": base64(sig)} ) )`
//!
//! The payload is the canonical JSON `{"machine_id": ..., "expiry_utc": ...}`;
//! the signature covers the SHA-256 digest of those exact bytes. [`decode`]
//! is the documented inverse, for tests and operational tooling.

mod config;
mod encode;
mod error;
mod history;
mod issuer;
mod key;
mod payload;
mod signer;

pub use config::{IssuerConfig, KeySource};
pub use encode::{SignedEnvelope, decode};
pub use error::{DecodeError, IssueError, IssueResult};
pub use history::{HistoryLedger, HistoryRecord};
pub use issuer::Issuer;
pub use payload::{ExpiryPolicy, LicensePayload};
