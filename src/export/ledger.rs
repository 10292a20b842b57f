//! Password-tracking ledger.
//!
//! Every export appends one entry to a JSON array on disk recording when the
//! file was produced and which password, if any, protects it. The file is
//! read, extended, and rewritten whole on each call (not an append-only
//! log) and carries no file locking, so concurrent exporters can race.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::{DatadeskError, Result};

/// File name of the ledger inside the tracker directory.
pub const LEDGER_FILE_NAME: &str = "password_tracker.json";

/// Password value recorded when protection was skipped.
pub const UNPROTECTED: &str = "Unprotected";

/// One export event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "Request Date")]
    pub request_date: String,

    #[serde(rename = "File Name")]
    pub file_name: String,

    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "Password")]
    pub password: String,
}

/// The on-disk password ledger.
#[derive(Debug, Clone)]
pub struct PasswordLedger {
    path: PathBuf,
}

impl PasswordLedger {
    /// Creates a ledger handle over `<tracker_dir>/password_tracker.json`.
    pub fn new(tracker_dir: impl AsRef<Path>) -> Self {
        Self {
            path: tracker_dir.as_ref().join(LEDGER_FILE_NAME),
        }
    }

    /// Returns the path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry, creating the ledger file if absent.
    pub fn append(&self, entry: LedgerEntry) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);
        self.write_all(&entries)
    }

    /// Reads every entry currently in the ledger. A missing or empty file
    /// reads as no entries.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            DatadeskError::ledger(format!("Failed to read {}: {e}", self.path.display()))
        })?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            DatadeskError::ledger(format!("Malformed ledger {}: {e}", self.path.display()))
        })
    }

    fn write_all(&self, entries: &[LedgerEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatadeskError::ledger(format!(
                    "Failed to create tracker directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        // The ledger is pretty-printed with a 4-space indent on every write.
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(entries, &mut serializer).map_err(|e| {
            DatadeskError::ledger(format!("Failed to serialize ledger entries: {e}"))
        })?;

        std::fs::write(&self.path, buf).map_err(|e| {
            DatadeskError::ledger(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        debug!(ledger = %self.path.display(), count = entries.len(), "ledger updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(file_name: &str, password: &str) -> LedgerEntry {
        LedgerEntry {
            request_date: "2024-03-01 09:15:00".to_string(),
            file_name: file_name.to_string(),
            path: "/reports/output_data".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_append_creates_file() {
        let dir = tempdir().unwrap();
        let ledger = PasswordLedger::new(dir.path());

        ledger.append(entry("report.xlsx", UNPROTECTED)).unwrap();

        assert!(ledger.path().exists());
        assert_eq!(ledger.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_append_preserves_call_order() {
        let dir = tempdir().unwrap();
        let ledger = PasswordLedger::new(dir.path());

        ledger.append(entry("first.xlsx", UNPROTECTED)).unwrap();
        ledger.append(entry("second.xlsx", "hp093015")).unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "first.xlsx");
        assert_eq!(entries[1].file_name, "second.xlsx");
        assert_eq!(entries[1].password, "hp093015");
    }

    #[test]
    fn test_ledger_uses_documented_field_names() {
        let dir = tempdir().unwrap();
        let ledger = PasswordLedger::new(dir.path());
        ledger.append(entry("report.xlsx", UNPROTECTED)).unwrap();

        let raw = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(raw.contains("\"Request Date\""));
        assert!(raw.contains("\"File Name\""));
        assert!(raw.contains("\"Path\""));
        assert!(raw.contains("\"Password\""));
        // 4-space indent on every write.
        assert!(raw.contains("\n    {"));
    }

    #[test]
    fn test_empty_file_reads_as_no_entries() {
        let dir = tempdir().unwrap();
        let ledger = PasswordLedger::new(dir.path());
        std::fs::write(ledger.path(), "").unwrap();

        assert!(ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_ledger_is_an_error() {
        let dir = tempdir().unwrap();
        let ledger = PasswordLedger::new(dir.path());
        std::fs::write(ledger.path(), "{not json").unwrap();

        assert!(matches!(
            ledger.entries().unwrap_err(),
            DatadeskError::Ledger(_)
        ));
    }
}
