//! Database abstraction layer for Datadesk.
//!
//! Provides a trait-based interface over the two backend families: classic
//! engines addressed by a connection URI, and warehouse sessions addressed
//! by a structured parameter set.

mod engine;
mod mock;
mod types;
mod warehouse;

pub use engine::Engine;
pub use mock::{FailingBackend, MockBackend};
pub use types::{ColumnInfo, Row, Table, Value};
pub use warehouse::WarehouseSession;

use async_trait::async_trait;

use crate::descriptor::ConnectionDescriptor;
use crate::error::Result;

/// Trait defining the interface for live query backends.
///
/// A handle is created by [`connect`], held for one logical task, and
/// explicitly closed after the last query of that task. Handles must not be
/// shared across concurrent tasks; the library adds no locking of its own.
#[async_trait]
pub trait QueryBackend: Send + Sync + std::fmt::Debug {
    /// Runs a read query and returns its tabular result.
    async fn fetch(&self, sql: &str) -> Result<Table>;

    /// Runs a side-effecting statement, returning no result.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Opens and immediately closes a trial connection.
    ///
    /// Never raises: any failure during the probe reads as `false`.
    async fn probe(&self) -> bool;

    /// Releases the live connection or session state.
    async fn close(&self) -> Result<()>;
}

/// Creates a query backend for the given descriptor.
///
/// This is the central factory function for connections. Dispatch is on the
/// descriptor shape; a new provider only needs a descriptor-shape mapping,
/// not a new branch here.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Box<dyn QueryBackend>> {
    match descriptor {
        ConnectionDescriptor::Uri(uri) => {
            let engine = Engine::connect(uri).await?;
            Ok(Box::new(engine))
        }
        ConnectionDescriptor::Session(params) => {
            let session = WarehouseSession::open(&params.normalize())?;
            Ok(Box::new(session))
        }
    }
}

/// Liveness check on an existing handle.
///
/// Thin, documented wrapper around [`QueryBackend::probe`]: opens and closes
/// a trial connection, downgrading any exception to `false`. This is the one
/// place in the crate where a failure is swallowed.
pub async fn probe_connection(handle: &dyn QueryBackend) -> bool {
    handle.probe().await
}
