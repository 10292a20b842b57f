//! Mock query backends for testing.
//!
//! Provides in-memory backends so the resolver, runner, and export pipeline
//! can be exercised without a live database.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::db::{ColumnInfo, QueryBackend, Table, Value};
use crate::error::{DatadeskError, Result};

/// A mock backend that returns predefined results and records every piece
/// of SQL it was asked to run.
#[derive(Debug)]
pub struct MockBackend {
    canned: Option<Table>,
    executed: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Creates a new mock backend with a default single-row result.
    pub fn new() -> Self {
        Self {
            canned: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock backend that answers every fetch with `table`.
    pub fn with_table(table: Table) -> Self {
        Self {
            canned: Some(table),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Returns every SQL text this backend has seen, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.executed.lock().expect("mock lock poisoned").clone()
    }

    fn record(&self, sql: &str) {
        self.executed
            .lock()
            .expect("mock lock poisoned")
            .push(sql.to_string());
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn fetch(&self, sql: &str) -> Result<Table> {
        self.record(sql);

        if let Some(table) = &self.canned {
            return Ok(table.clone());
        }

        let columns = vec![ColumnInfo::new("result", "text")];
        let rows = vec![vec![Value::String(format!("Mock result for: {sql}"))]];
        Ok(Table::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.record(sql);
        Ok(())
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A backend where every operation fails, for error-path testing.
#[derive(Debug)]
pub struct FailingBackend {
    message: String,
}

impl FailingBackend {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryBackend for FailingBackend {
    async fn fetch(&self, _sql: &str) -> Result<Table> {
        Err(DatadeskError::query(self.message.clone()))
    }

    async fn execute(&self, _sql: &str) -> Result<()> {
        Err(DatadeskError::query(self.message.clone()))
    }

    async fn probe(&self) -> bool {
        false
    }

    async fn close(&self) -> Result<()> {
        Err(DatadeskError::connection(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetch_records_sql() {
        let backend = MockBackend::new();
        let table = backend.fetch("SELECT 1").await.unwrap();
        assert_eq!(table.row_count, 1);
        assert_eq!(backend.seen(), vec!["SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_canned_table() {
        let canned = Table::with_data(
            vec![ColumnInfo::new("id", "integer")],
            vec![vec![Value::Int(7)]],
        );
        let backend = MockBackend::with_table(canned);

        let table = backend.fetch("SELECT id FROM t").await.unwrap();
        assert_eq!(table.rows[0][0], Value::Int(7));
    }

    #[tokio::test]
    async fn test_mock_execute_records_in_order() {
        let backend = MockBackend::new();
        backend.execute("CREATE TABLE a (x int)").await.unwrap();
        backend.execute("DROP TABLE a").await.unwrap();
        assert_eq!(
            backend.seen(),
            vec![
                "CREATE TABLE a (x int)".to_string(),
                "DROP TABLE a".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = FailingBackend::new("engine offline");
        assert!(backend.fetch("SELECT 1").await.is_err());
        assert!(!backend.probe().await);
    }
}
