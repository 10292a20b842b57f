//! Query resolution and execution.
//!
//! A query reference is either the stem of a `.sql` file under the configured
//! query directory or literal SQL text. Resolution checks the file system
//! once, substitutes named placeholders, and hands the final text to the
//! backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::db::{QueryBackend, Table};
use crate::error::{DatadeskError, Result};

/// Placeholder pattern: `{name}` where name is an identifier.
const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)\}";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"))
}

/// Where a resolved query's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// Read from `<query_dir>/<name>.sql`.
    File(PathBuf),
    /// The reference itself was the SQL text.
    Literal,
}

/// A query reference resolved to executable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub text: String,
    pub source: QuerySource,
}

/// Resolves a query reference against the query directory.
///
/// If `<query_dir>/<query_ref>.sql` exists its contents become the query
/// text; otherwise the reference is treated as literal SQL. The existence
/// check happens exactly once, here.
pub fn resolve_query(query_dir: &Path, query_ref: &str) -> Result<ResolvedQuery> {
    let candidate = query_dir.join(format!("{query_ref}.sql"));

    if candidate.exists() {
        let text = std::fs::read_to_string(&candidate).map_err(|e| {
            DatadeskError::query(format!(
                "Failed to read query file {}: {e}",
                candidate.display()
            ))
        })?;
        debug!(file = %candidate.display(), "resolved query from file");
        return Ok(ResolvedQuery {
            text,
            source: QuerySource::File(candidate),
        });
    }

    Ok(ResolvedQuery {
        text: query_ref.to_string(),
        source: QuerySource::Literal,
    })
}

/// Substitutes `{name}` placeholders in the query text.
///
/// With an empty parameter map the text passes through verbatim, placeholders
/// and all. With a non-empty map every placeholder must resolve; the first
/// unresolved name fails the whole substitution.
pub fn substitute(text: &str, params: &HashMap<String, String>) -> Result<String> {
    if params.is_empty() {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = &caps[1];

        let value = params
            .get(name)
            .ok_or_else(|| DatadeskError::parameter(name))?;

        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out)
}

/// Runs resolved queries against one live backend handle.
pub struct QueryRunner<'a> {
    backend: &'a dyn QueryBackend,
    query_dir: PathBuf,
}

impl<'a> QueryRunner<'a> {
    /// Creates a runner over the given backend and query directory.
    pub fn new(backend: &'a dyn QueryBackend, query_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            query_dir: query_dir.into(),
        }
    }

    /// Resolves and runs a read query, returning its tabular result.
    pub async fn run(
        &self,
        query_ref: &str,
        params: &HashMap<String, String>,
    ) -> Result<Table> {
        let sql = self.prepare(query_ref, params)?;
        self.backend.fetch(&sql).await
    }

    /// Resolves and runs a side-effecting statement.
    pub async fn execute(
        &self,
        query_ref: &str,
        params: &HashMap<String, String>,
    ) -> Result<()> {
        let sql = self.prepare(query_ref, params)?;
        self.backend.execute(&sql).await
    }

    fn prepare(&self, query_ref: &str, params: &HashMap<String, String>) -> Result<String> {
        let resolved = resolve_query(&self.query_dir, query_ref)?;
        substitute(&resolved.text, params)
    }
}
