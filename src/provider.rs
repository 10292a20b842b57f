//! Supported database providers.
//!
//! Each provider carries its credential-key convention, its descriptor
//! family, and its URL scheme as data, so adding a provider is a matter of
//! extending the enum rather than touching dispatch sites.

use serde::{Deserialize, Serialize};

use crate::error::{DatadeskError, Result};

/// The canonical provider identifiers, in the order they are documented.
pub const SUPPORTED_PROVIDERS: &[&str] = &[
    "mssql",
    "mysql",
    "teradata",
    "postgresql",
    "sqlite",
    "snowflake",
    "snowflakeSSO",
];

/// Which shape of connection descriptor a provider family uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFamily {
    /// Classic engine backends addressed by a connection URI.
    Uri,
    /// Warehouse backends addressed by a structured parameter set.
    Session,
}

/// Supported database and warehouse backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Mssql,
    Mysql,
    Teradata,
    Postgresql,
    Sqlite,
    Snowflake,
    /// Snowflake with browser-based single sign-on.
    SnowflakeSso,
}

impl Provider {
    /// Returns the provider as its canonical identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mssql => "mssql",
            Self::Mysql => "mysql",
            Self::Teradata => "teradata",
            Self::Postgresql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Snowflake => "snowflake",
            Self::SnowflakeSso => "snowflakeSSO",
        }
    }

    /// Parses a provider from a string, case-insensitively.
    ///
    /// Fails with [`DatadeskError::UnsupportedProvider`] before any secret
    /// store or network access can happen.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mssql" => Ok(Self::Mssql),
            "mysql" => Ok(Self::Mysql),
            "teradata" => Ok(Self::Teradata),
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "sqlite" => Ok(Self::Sqlite),
            "snowflake" => Ok(Self::Snowflake),
            "snowflakesso" => Ok(Self::SnowflakeSso),
            _ => Err(DatadeskError::unsupported_provider(s, SUPPORTED_PROVIDERS)),
        }
    }

    /// Returns the descriptor family this provider belongs to.
    pub fn family(&self) -> DescriptorFamily {
        match self {
            Self::Snowflake | Self::SnowflakeSso => DescriptorFamily::Session,
            _ => DescriptorFamily::Uri,
        }
    }

    /// Returns the URL scheme for URI-family providers.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Mssql => "mssql",
            Self::Mysql => "mysql",
            Self::Teradata => "teradatasql",
            Self::Postgresql => "postgres",
            Self::Sqlite => "sqlite",
            // Session-family providers never build a URI; the scheme is only
            // used for logging.
            Self::Snowflake | Self::SnowflakeSso => "snowflake",
        }
    }

    /// Returns the secret-store key names expected for this provider.
    ///
    /// The convention is `{provider}_{field}` over the provider's canonical
    /// lowercase identifier.
    pub fn credential_keys(&self) -> [String; 5] {
        let p = self.as_str().to_lowercase();
        [
            format!("{p}_username"),
            format!("{p}_password"),
            format!("{p}_host"),
            format!("{p}_port"),
            format!("{p}_database"),
        ]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
