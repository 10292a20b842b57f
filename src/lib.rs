//! Datadesk - a lightweight analytics-reporting toolkit.
//!
//! Connect to a named database provider, run a query from a file or inline
//! text, export the result to a spreadsheet, and track protection keys in a
//! ledger. This library exposes the core modules for use in integration
//! tests and embedding callers.

pub mod config;
pub mod db;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod logging;
pub mod provider;
pub mod query;
pub mod vault;

pub use config::{Config, Workspace};
pub use db::{connect, probe_connection, QueryBackend, Table};
pub use descriptor::{ConnectionDescriptor, SessionParams};
pub use error::{DatadeskError, Result};
pub use export::{Exporter, Protection};
pub use provider::Provider;
pub use query::QueryRunner;
pub use vault::{resolve, CredentialSet, CredentialStore, KeyringStore, MemoryStore};
