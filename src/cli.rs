//! Command-line argument parsing for Datadesk.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use datadesk::error::{DatadeskError, Result};
use datadesk::export::Protection;

/// A lightweight analytics-reporting toolkit.
#[derive(Parser, Debug)]
#[command(name = "datadesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace root holding the query/output/tracker directories
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a read query and export the result to a spreadsheet
    Run {
        /// Provider to connect to (e.g. postgresql, snowflake)
        #[arg(short = 'P', long, value_name = "PROVIDER")]
        provider: String,

        /// Query reference: a .sql file stem under the query directory, or
        /// literal SQL text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Named placeholder value, key=value (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Output file name (defaults to "Output Report YYYY-MM-DD.xlsx")
        #[arg(short = 'o', long, value_name = "FILE")]
        out: Option<String>,

        /// Password-protect the exported file
        #[arg(long)]
        protect: bool,

        /// Override the configured password tag
        #[arg(long, value_name = "TAG", requires = "protect")]
        tag: Option<String>,

        /// Grant workbook access to an identity instead of a password
        /// (repeatable)
        #[arg(long = "grant", value_name = "USER", conflicts_with = "protect")]
        grants: Vec<String>,
    },

    /// Run a side-effecting statement, returning no result
    Exec {
        /// Provider to connect to
        #[arg(short = 'P', long, value_name = "PROVIDER")]
        provider: String,

        /// Query reference: file stem or literal SQL
        #[arg(value_name = "QUERY")]
        query: String,

        /// Named placeholder value, key=value (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Check whether a provider connection can be opened
    Probe {
        /// Provider to probe
        #[arg(short = 'P', long, value_name = "PROVIDER")]
        provider: String,
    },

    /// Create the conventional workspace directories under the root
    Init,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(datadesk::Config::default_path)
    }
}

/// Parses repeated `key=value` arguments into a parameter map.
pub fn parse_params(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for pair in raw {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            DatadeskError::config(format!("Invalid parameter '{pair}'. Expected key=value"))
        })?;
        if key.is_empty() {
            return Err(DatadeskError::config(format!(
                "Invalid parameter '{pair}'. Expected key=value"
            )));
        }
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

/// Derives the protection mode from the run flags.
pub fn protection_from_flags(
    protect: bool,
    tag: Option<&str>,
    configured_tag: &str,
    grants: &[String],
) -> Protection {
    if protect {
        Protection::Password {
            tag: tag.unwrap_or(configured_tag).to_string(),
        }
    } else if !grants.is_empty() {
        Protection::Permissions {
            users: grants.to_vec(),
        }
    } else {
        Protection::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_run_command() {
        let cli = parse_args(&[
            "datadesk", "run", "-P", "postgresql", "orders", "-p", "id=7", "-o", "orders.xlsx",
        ]);

        match cli.command {
            Command::Run {
                provider,
                query,
                params,
                out,
                protect,
                ..
            } => {
                assert_eq!(provider, "postgresql");
                assert_eq!(query, "orders");
                assert_eq!(params, vec!["id=7".to_string()]);
                assert_eq!(out, Some("orders.xlsx".to_string()));
                assert!(!protect);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_run_with_literal_sql() {
        let cli = parse_args(&["datadesk", "run", "-P", "sqlite", "SELECT 1"]);
        match cli.command {
            Command::Run { query, .. } => assert_eq!(query, "SELECT 1"),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_exec_command() {
        let cli = parse_args(&["datadesk", "exec", "-P", "mysql", "cleanup", "-p", "batch=42"]);
        match cli.command {
            Command::Exec {
                provider, params, ..
            } => {
                assert_eq!(provider, "mysql");
                assert_eq!(params, vec!["batch=42".to_string()]);
            }
            _ => panic!("expected exec command"),
        }
    }

    #[test]
    fn test_parse_probe_command() {
        let cli = parse_args(&["datadesk", "probe", "-P", "snowflakeSSO"]);
        match cli.command {
            Command::Probe { provider } => assert_eq!(provider, "snowflakeSSO"),
            _ => panic!("expected probe command"),
        }
    }

    #[test]
    fn test_parse_init_with_root() {
        let cli = parse_args(&["datadesk", "--root", "/reports", "init"]);
        assert_eq!(cli.root, Some(PathBuf::from("/reports")));
        assert!(matches!(cli.command, Command::Init));
    }

    #[test]
    fn test_protect_conflicts_with_grant() {
        let result = Cli::try_parse_from([
            "datadesk", "run", "-P", "mssql", "orders", "--protect", "--grant", "a@b.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_requires_protect() {
        let result = Cli::try_parse_from(["datadesk", "run", "-P", "mssql", "orders", "--tag", "hp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_params_valid() {
        let params = parse_params(&["id=7".to_string(), "region=EMEA".to_string()]).unwrap();
        assert_eq!(params.get("id"), Some(&"7".to_string()));
        assert_eq!(params.get("region"), Some(&"EMEA".to_string()));
    }

    #[test]
    fn test_parse_params_allows_equals_in_value() {
        let params = parse_params(&["filter=a=b".to_string()]).unwrap();
        assert_eq!(params.get("filter"), Some(&"a=b".to_string()));
    }

    #[test]
    fn test_parse_params_rejects_malformed() {
        assert!(parse_params(&["no-equals".to_string()]).is_err());
        assert!(parse_params(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_protection_from_flags() {
        assert_eq!(
            protection_from_flags(false, None, "rpt", &[]),
            Protection::None
        );
        assert_eq!(
            protection_from_flags(true, None, "rpt", &[]),
            Protection::Password {
                tag: "rpt".to_string()
            }
        );
        assert_eq!(
            protection_from_flags(true, Some("hp"), "rpt", &[]),
            Protection::Password {
                tag: "hp".to_string()
            }
        );
        assert_eq!(
            protection_from_flags(false, None, "rpt", &["a@b.com".to_string()]),
            Protection::Permissions {
                users: vec!["a@b.com".to_string()]
            }
        );
    }
}
