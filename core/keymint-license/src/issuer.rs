//! The issuance pipeline.

use chrono::{DateTime, Utc};

use crate::config::{IssuerConfig, KeySource};
use crate::encode;
use crate::error::IssueResult;
use crate::history::{HistoryLedger, HistoryRecord};
use crate::key;
use crate::payload::{self, ExpiryPolicy, LicensePayload};
use crate::signer;

/// The issuance engine. One instance per process, shared across requests;
/// the only internal lock is the ledger's.
#[derive(Debug)]
pub struct Issuer {
    key: KeySource,
    policy: ExpiryPolicy,
    ledger: HistoryLedger,
}

impl Issuer {
    /// Builds the engine and loads the audit ledger. Call once at startup.
    pub fn new(config: IssuerConfig) -> Self {
        Self {
            ledger: HistoryLedger::load(config.ledger_path),
            key: config.key,
            policy: config.policy,
        }
    }

    /// Issues an activation code for `machine_id`, valid through end of day
    /// of `expiry_date` (YYYY-MM-DD) in the configured zone.
    pub fn issue(&self, machine_id: &str, expiry_date: &str) -> IssueResult<String> {
        self.issue_at(machine_id, expiry_date, Utc::now())
    }

    /// Like [`issue`](Self::issue), with the issuance instant supplied by
    /// the caller.
    pub fn issue_at(
        &self,
        machine_id: &str,
        expiry_date: &str,
        now: DateTime<Utc>,
    ) -> IssueResult<String> {
        // Field validation first, key resolution second, date parsing third:
        // a missing key must not hide a bad request, and a bad date must not
        // hide a missing key.
        payload::require_fields(machine_id, expiry_date)?;
        let signing_key = key::resolve(&self.key)?;

        let payload = LicensePayload::build(machine_id, expiry_date, now, &self.policy)?;
        let payload_bytes = payload.canonical_bytes()?;
        let signature = signer::sign(&payload_bytes, &signing_key)?;
        let code = encode::encode(&payload_bytes, &signature)?;

        let zone = self.policy.resolve_zone();
        self.ledger.append(HistoryRecord {
            timestamp: now
                .with_timezone(&zone)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            machine_id: machine_id.to_string(),
            expiry_date: expiry_date.to_string(),
            code: code.clone(),
        });

        tracing::info!(machine_id, expiry_date, "issued activation code");
        Ok(code)
    }

    /// The audit ledger backing this engine.
    #[must_use]
    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// The expiry policy in effect.
    #[must_use]
    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }
}
