//! Payload canonicalization and expiry computation.
//!
//! The payload's serde field order is its canonical JSON order: the exact
//! bytes produced by [`LicensePayload::canonical_bytes`] are what gets
//! hashed, signed, and embedded, and a verifier must re-derive them
//! byte-for-byte.

use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{IssueError, IssueResult};

/// How expiry dates are interpreted.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    /// IANA name of the zone the expiry date (and ledger timestamps) are
    /// interpreted in. Unknown names fall back to UTC.
    pub preferred_zone: String,
    /// Maximum months between issuance and expiry. `None` disables the cap.
    pub max_lead_months: Option<u32>,
}

impl ExpiryPolicy {
    /// Zone the original deployments issue in.
    pub const DEFAULT_ZONE: &'static str = "Asia/Shanghai";

    /// Resolves the preferred zone, falling back to UTC when the name is
    /// not in the bundled zone database. The two-step resolution is
    /// deliberate: the fallback outcome is observable here rather than
    /// buried inside the expiry computation.
    #[must_use]
    pub fn resolve_zone(&self) -> Tz {
        Tz::from_str(&self.preferred_zone).unwrap_or(Tz::UTC)
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            preferred_zone: Self::DEFAULT_ZONE.to_string(),
            max_lead_months: None,
        }
    }
}

/// The canonical license payload.
///
/// Immutable once built; lives for the duration of one issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    /// The client machine identifier the license is bound to.
    pub machine_id: String,
    /// Last valid second of the license, as UTC unix seconds. Always the
    /// requested date's 23:59:59 in the resolved zone.
    pub expiry_utc: i64,
}

impl LicensePayload {
    /// Validates the inputs and computes the end-of-day expiry.
    ///
    /// # Errors
    ///
    /// [`IssueError::MissingField`] for empty inputs,
    /// [`IssueError::DateFormat`] for an unparseable date,
    /// [`IssueError::LeadTimeExceeded`] when the date falls outside the
    /// configured issuance window relative to `now`.
    pub fn build(
        machine_id: &str,
        expiry_date: &str,
        now: DateTime<Utc>,
        policy: &ExpiryPolicy,
    ) -> IssueResult<Self> {
        require_fields(machine_id, expiry_date)?;

        let date = NaiveDate::parse_from_str(expiry_date, "%Y-%m-%d")
            .map_err(|_| IssueError::DateFormat(expiry_date.to_string()))?;
        let zone = policy.resolve_zone();

        if let Some(max_months) = policy.max_lead_months {
            let horizon = now.with_timezone(&zone).date_naive() + Months::new(max_months);
            if date > horizon {
                return Err(IssueError::LeadTimeExceeded {
                    requested: expiry_date.to_string(),
                    max_months,
                });
            }
        }

        let midnight = local_midnight(zone, date)
            .ok_or_else(|| IssueError::DateFormat(expiry_date.to_string()))?;
        let end_of_day = midnight + Duration::hours(24) - Duration::seconds(1);

        Ok(Self {
            machine_id: machine_id.to_string(),
            expiry_utc: end_of_day.with_timezone(&Utc).timestamp(),
        })
    }

    /// The exact bytes that are hashed, signed, and embedded in the
    /// envelope.
    pub fn canonical_bytes(&self) -> IssueResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Rejects empty inputs before any other work.
pub(crate) fn require_fields(machine_id: &str, expiry_date: &str) -> IssueResult<()> {
    if machine_id.is_empty() {
        return Err(IssueError::MissingField("machine_id"));
    }
    if expiry_date.is_empty() {
        return Err(IssueError::MissingField("expiry"));
    }
    Ok(())
}

/// First instant of `date` in `zone`.
///
/// Midnight can sit inside a DST gap; step forward hour by hour until an
/// instant exists. `None` only for a calendar day the zone skipped
/// entirely.
fn local_midnight(zone: Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    for hour in 0..24 {
        let naive = date.and_time(NaiveTime::MIN) + Duration::hours(hour);
        match zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return Some(dt),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest),
            LocalResult::None => continue,
        }
    }
    None
}
