//! Export pipeline.
//!
//! Consumes a tabular result and produces a spreadsheet on disk, an optional
//! protection pass, and exactly one password-ledger entry per call. The
//! database handle is released before any file I/O starts.

mod ledger;
mod workbook;

pub use ledger::{LedgerEntry, PasswordLedger, LEDGER_FILE_NAME, UNPROTECTED};
pub use workbook::write_table;

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::db::{QueryBackend, Table};
use crate::error::{DatadeskError, Result};

/// Fixed permission level granted to each authorized identity.
const PERMISSION_LEVEL: u32 = 15;

/// How an exported file is protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protection {
    /// No protection; the ledger records "Unprotected".
    None,
    /// Password protection: the key is `tag` + time-of-day to the second.
    Password { tag: String },
    /// Permission grants for an explicit list of authorized identities.
    Permissions { users: Vec<String> },
}

/// Collaborator that applies protection to a finished workbook.
///
/// The actual spreadsheet-application automation is platform-specific and
/// lives outside this crate; the default hook only records intent.
pub trait ProtectionHook: Send + Sync {
    /// Re-saves the file at `path` under `password`.
    fn protect_with_password(&self, path: &Path, password: &str) -> Result<()>;

    /// Grants the fixed permission level to each identity on the open
    /// workbook before the final save.
    fn grant_permissions(&self, path: &Path, users: &[String]) -> Result<()>;
}

/// Default hook: logs what a host-application collaborator would do.
#[derive(Debug, Clone, Default)]
pub struct LoggingProtectionHook;

impl ProtectionHook for LoggingProtectionHook {
    fn protect_with_password(&self, path: &Path, _password: &str) -> Result<()> {
        info!(file = %path.display(), "password protection requested; host application hook not installed");
        Ok(())
    }

    fn grant_permissions(&self, path: &Path, users: &[String]) -> Result<()> {
        info!(
            file = %path.display(),
            users = users.len(),
            level = PERMISSION_LEVEL,
            "permission grants requested; host application hook not installed"
        );
        Ok(())
    }
}

/// Writes tabular results to workbooks and keeps the ledger current.
pub struct Exporter {
    output_dir: PathBuf,
    ledger: PasswordLedger,
    hook: Box<dyn ProtectionHook>,
}

impl Exporter {
    /// Creates an exporter writing under `output_dir` and tracking under
    /// `tracker_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, tracker_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ledger: PasswordLedger::new(tracker_dir),
            hook: Box::new(LoggingProtectionHook),
        }
    }

    /// Replaces the protection collaborator.
    pub fn with_hook(mut self, hook: Box<dyn ProtectionHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Returns the ledger this exporter appends to.
    pub fn ledger(&self) -> &PasswordLedger {
        &self.ledger
    }

    /// Exports `table` to a workbook, applies protection, and appends the
    /// ledger entry. Returns the path of the written file.
    pub fn export(
        &self,
        table: &Table,
        file_name: Option<&str>,
        protection: Protection,
    ) -> Result<PathBuf> {
        let file_name = file_name
            .map(String::from)
            .unwrap_or_else(default_file_name);
        let output_path = self.output_dir.join(&file_name);

        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            DatadeskError::export(format!(
                "Failed to create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        // Remove any stale file before saving the fresh export.
        if output_path.exists() {
            std::fs::remove_file(&output_path).map_err(|e| {
                DatadeskError::export(format!(
                    "Failed to remove existing file {}: {e}",
                    output_path.display()
                ))
            })?;
        }

        write_table(table, &output_path)?;

        let password = match &protection {
            Protection::None => None,
            Protection::Password { tag } => {
                let password = generate_password(tag);
                self.hook.protect_with_password(&output_path, &password)?;
                Some(password)
            }
            Protection::Permissions { users } => {
                self.hook.grant_permissions(&output_path, users)?;
                None
            }
        };

        // One ledger entry per export, written after the file is finalized.
        self.ledger.append(LedgerEntry {
            request_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            file_name: file_name.clone(),
            path: self.output_dir.display().to_string(),
            password: password.unwrap_or_else(|| UNPROTECTED.to_string()),
        })?;

        info!(file = %output_path.display(), "export complete");
        Ok(output_path)
    }
}

/// Releases the database handle, then runs the export.
///
/// The workbook writer never holds a live connection open: close failures
/// abort the export rather than leaking the handle past it.
pub async fn release_then_export(
    handle: Box<dyn QueryBackend>,
    exporter: &Exporter,
    table: &Table,
    file_name: Option<&str>,
    protection: Protection,
) -> Result<PathBuf> {
    handle.close().await?;
    exporter.export(table, file_name, protection)
}

/// Generates a protection key: the caller's tag plus the current
/// time-of-day to the second.
pub fn generate_password(tag: &str) -> String {
    format!("{tag}{}", Local::now().format("%H%M%S"))
}

/// Default export file name: `Output Report YYYY-MM-DD.xlsx`.
pub fn default_file_name() -> String {
    format!("Output Report {}.xlsx", Local::now().format("%Y-%m-%d"))
}
