//! The issuance audit ledger.
//!
//! An in-memory ordered sequence mirrored to a JSON file. The mutex is held
//! across both the in-memory push and the full-file rewrite, so concurrent
//! appends cannot interleave on disk. Semantically append-only; the durable
//! form is a full snapshot, not a byte-level log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// One issuance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Issuance time, `%Y-%m-%d %H:%M:%S` in the engine's resolved zone.
    pub timestamp: String,
    /// The machine identifier the code was issued for.
    pub machine_id: String,
    /// The requested expiry date, as received (YYYY-MM-DD).
    pub expiry_date: String,
    /// The activation code that was returned to the caller.
    pub code: String,
}

/// Best-effort audit ledger; the activation code itself is the system of
/// record for correctness.
#[derive(Debug)]
pub struct HistoryLedger {
    path: PathBuf,
    records: Mutex<Vec<HistoryRecord>>,
}

impl HistoryLedger {
    /// Loads the ledger from `path`. Call once, before serving requests.
    ///
    /// An absent or unreadable file starts an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<HistoryRecord>>(&bytes) {
                Ok(records) => {
                    tracing::info!(
                        count = records.len(),
                        path = %path.display(),
                        "loaded issuance history"
                    );
                    records
                }
                Err(err) => {
                    tracing::warn!(%err, path = %path.display(), "ignoring malformed history file");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Appends a record and rewrites the durable mirror.
    ///
    /// A failed disk write is logged and swallowed: the activation code has
    /// already been produced and must still reach the caller.
    pub fn append(&self, record: HistoryRecord) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        if let Err(err) = self.persist(&records) {
            tracing::warn!(%err, path = %self.path.display(), "failed to persist issuance history");
        }
    }

    fn persist(&self, records: &[HistoryRecord]) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(records).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }

    /// Snapshot of all records, in issuance order.
    #[must_use]
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded issuances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the durable mirror file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
