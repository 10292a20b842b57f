//! Warehouse session backend.
//!
//! The columnar warehouse has no classic engine semantics: work happens
//! inside a short-lived session against the account's REST endpoint. A
//! session is opened for each query call and closed immediately after the
//! query completes, a deliberate behavioral difference from the reusable
//! engine backends.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::db::{ColumnInfo, QueryBackend, Row, Table, Value};
use crate::descriptor::SessionParams;
use crate::error::{DatadeskError, Result};

/// Default timeout for REST requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Account host suffix for the warehouse endpoint.
const ACCOUNT_DOMAIN: &str = "snowflakecomputing.com";

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const LOGOUT_PATH: &str = "/session/logout-request";

/// Warehouse session handle.
///
/// Holds the normalized parameter set and an HTTP client; the actual
/// login/logout pair happens inside each query call.
#[derive(Debug)]
pub struct WarehouseSession {
    client: Client,
    account: String,
    user: String,
    authenticator: String,
    password: Option<String>,
    schema: Option<String>,
    warehouse: Option<String>,
    base_url: String,
}

impl WarehouseSession {
    /// Opens a session handle from a normalized parameter set.
    ///
    /// Expects the keys produced by [`SessionParams::normalize`]: `account`,
    /// `user`, `authenticator`, and optionally `password`, `schema`,
    /// `warehouse`.
    pub fn open(params: &SessionParams) -> Result<Self> {
        let account = params
            .get("account")
            .ok_or_else(|| DatadeskError::connection("Session parameters carry no account"))?
            .to_string();
        let user = params
            .get("user")
            .ok_or_else(|| DatadeskError::connection("Session parameters carry no user"))?
            .to_string();
        let authenticator = params
            .get("authenticator")
            .unwrap_or(crate::descriptor::EXTERNAL_BROWSER)
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DatadeskError::connection(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("https://{account}.{ACCOUNT_DOMAIN}"),
            account,
            user,
            authenticator,
            password: params.get("password").map(String::from),
            schema: params.get("schema").map(String::from),
            warehouse: params.get("warehouse").map(String::from),
        })
    }

    /// Overrides the account endpoint, for proxies and tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the account name this session targets.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Opens a server-side session, returning its token.
    async fn login(&self) -> Result<String> {
        let request = LoginRequest {
            data: LoginRequestData {
                login_name: self.user.clone(),
                password: self.password.clone(),
                authenticator: self.authenticator.clone(),
                account_name: self.account.clone(),
            },
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, LOGIN_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| DatadeskError::connection(format!("Warehouse login failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DatadeskError::connection(format!("Warehouse login failed: {e}")))?;

        if !status.is_success() {
            return Err(parse_login_error(status, &body));
        }

        let parsed: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            DatadeskError::connection(format!("Malformed warehouse login response: {e}"))
        })?;

        if !parsed.success {
            return Err(DatadeskError::connection(format!(
                "Warehouse rejected the session: {}",
                parsed.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        parsed
            .data
            .map(|d| d.token)
            .ok_or_else(|| DatadeskError::connection("Warehouse login returned no session token"))
    }

    /// Closes a server-side session. Best effort: a failed logout is logged,
    /// not raised, since the query result is already in hand.
    async fn logout(&self, token: &str) {
        let result = self
            .client
            .post(format!("{}{}", self.base_url, LOGOUT_PATH))
            .header("Authorization", session_auth_header(token))
            .send()
            .await;

        if let Err(e) = result {
            warn!(account = %self.account, "warehouse logout failed: {e}");
        }
    }

    /// Runs one statement inside a fresh session.
    async fn run_statement(&self, sql: &str) -> Result<QueryResponseData> {
        let token = self.login().await?;

        let request = QueryRequest {
            sql_text: sql.to_string(),
            schema: self.schema.clone(),
            warehouse: self.warehouse.clone(),
        };

        let outcome = self
            .client
            .post(format!("{}{}", self.base_url, QUERY_PATH))
            .header("Authorization", session_auth_header(&token))
            .json(&request)
            .send()
            .await;

        // One session per query: the session closes no matter how the
        // statement fared.
        let result = match outcome {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) if status.is_success() => parse_query_response(&body),
                    Ok(body) => Err(DatadeskError::query(format!(
                        "Warehouse returned {status}: {body}"
                    ))),
                    Err(e) => Err(DatadeskError::query(format!(
                        "Failed to read warehouse response: {e}"
                    ))),
                }
            }
            Err(e) => Err(DatadeskError::query(format!(
                "Warehouse statement failed: {e}"
            ))),
        };

        self.logout(&token).await;
        result
    }
}

#[async_trait]
impl QueryBackend for WarehouseSession {
    async fn fetch(&self, sql: &str) -> Result<Table> {
        let start = Instant::now();
        let data = self.run_statement(sql).await?;
        let mut table = table_from_rowset(data.rowtype, data.rowset);
        table.execution_time = start.elapsed();
        Ok(table)
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.run_statement(sql).await.map(|_| ())
    }

    async fn probe(&self) -> bool {
        match self.login().await {
            Ok(token) => {
                self.logout(&token).await;
                true
            }
            Err(_) => false,
        }
    }

    async fn close(&self) -> Result<()> {
        // Sessions never outlive a query call; there is nothing held open.
        debug!(account = %self.account, "warehouse handle released");
        Ok(())
    }
}

fn session_auth_header(token: &str) -> String {
    format!("Snowflake Token=\"{token}\"")
}

fn parse_login_error(status: reqwest::StatusCode, body: &str) -> DatadeskError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return DatadeskError::connection(
            "Warehouse authentication failed. Check the stored credentials.",
        );
    }
    DatadeskError::connection(format!("Warehouse login returned {status}: {body}"))
}

fn parse_query_response(body: &str) -> Result<QueryResponseData> {
    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| DatadeskError::query(format!("Malformed warehouse response: {e}")))?;

    if !parsed.success {
        return Err(DatadeskError::query(
            parsed
                .message
                .unwrap_or_else(|| "Warehouse reported failure without a message".to_string()),
        ));
    }

    Ok(parsed.data.unwrap_or_default())
}

/// Builds a [`Table`] from the warehouse rowtype/rowset wire shape,
/// preserving column order.
fn table_from_rowset(rowtype: Vec<RowType>, rowset: Vec<Vec<serde_json::Value>>) -> Table {
    let columns: Vec<ColumnInfo> = rowtype
        .into_iter()
        .map(|c| ColumnInfo::new(c.name, c.column_type))
        .collect();

    let rows: Vec<Row> = rowset
        .into_iter()
        .map(|row| row.into_iter().map(convert_json_value).collect())
        .collect();

    Table::with_data(columns, rows)
}

fn convert_json_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest {
    data: LoginRequestData,
}

#[derive(Debug, Serialize)]
struct LoginRequestData {
    #[serde(rename = "LOGIN_NAME")]
    login_name: String,
    #[serde(rename = "PASSWORD", skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(rename = "AUTHENTICATOR")]
    authenticator: String,
    #[serde(rename = "ACCOUNT_NAME")]
    account_name: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    message: Option<String>,
    data: Option<LoginResponseData>,
}

#[derive(Debug, Deserialize)]
struct LoginResponseData {
    token: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    #[serde(rename = "sqlText")]
    sql_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    success: bool,
    message: Option<String>,
    data: Option<QueryResponseData>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponseData {
    #[serde(default)]
    rowtype: Vec<RowType>,
    #[serde(default)]
    rowset: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}
