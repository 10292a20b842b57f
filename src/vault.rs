//! Credential resolution from the OS keyring.
//!
//! Connection secrets are looked up by a `{provider}_{field}` key convention
//! against a [`CredentialStore`]. The store is a capability passed into
//! resolution so tests substitute an in-memory fake rather than touching
//! real secrets.

use std::collections::HashMap;

use keyring::Entry;
use tracing::debug;

use crate::error::{DatadeskError, Result};
use crate::provider::Provider;

const SERVICE_NAME: &str = "datadesk";

/// Read-only lookup of secrets by key.
pub trait CredentialStore: Send + Sync {
    /// Returns the secret for `key`, or `None` if no such key exists.
    ///
    /// A store that cannot be reached at all fails with
    /// [`DatadeskError::SecretStoreUnavailable`]; a missing key is not an
    /// error at this level.
    fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Credential store backed by the OS keyring.
#[derive(Debug, Clone, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, key).map_err(|e| {
            DatadeskError::store_unavailable(format!("Failed to access keyring: {e}"))
        })?;

        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(DatadeskError::store_unavailable(format!(
                "Failed to read keyring entry: {e}"
            ))),
        }
    }
}

/// In-memory credential store for tests and scripted setups.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Populates the five conventional keys for a provider in one call.
    pub fn with_provider(
        mut self,
        provider: Provider,
        username: &str,
        password: &str,
        host: &str,
        port: &str,
        database: &str,
    ) -> Self {
        let [user_key, pass_key, host_key, port_key, db_key] = provider.credential_keys();
        self.insert(user_key, username);
        self.insert(pass_key, password);
        self.insert(host_key, host);
        self.insert(port_key, port);
        self.insert(db_key, database);
        self
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }
}

/// A fully resolved set of connection secrets for one provider.
///
/// All five fields are guaranteed present and non-empty; a partial set is
/// never constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub database: String,
}

/// Resolves the credential set for `provider` from `store`.
///
/// Looks up the five conventional keys and fails with
/// [`DatadeskError::IncompleteCredentials`] listing every key that is missing
/// or empty. Store-unreachable errors propagate unchanged.
pub fn resolve(provider: Provider, store: &dyn CredentialStore) -> Result<CredentialSet> {
    let keys = provider.credential_keys();
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();

    for key in &keys {
        match store.get(key)? {
            Some(value) if !value.trim().is_empty() => values.push(value),
            _ => {
                missing.push(key.clone());
                values.push(String::new());
            }
        }
    }

    if !missing.is_empty() {
        return Err(DatadeskError::incomplete_credentials(
            provider.as_str(),
            missing,
        ));
    }

    debug!(provider = provider.as_str(), "resolved credentials");

    let mut values = values.into_iter();
    Ok(CredentialSet {
        username: values.next().unwrap_or_default(),
        password: values.next().unwrap_or_default(),
        host: values.next().unwrap_or_default(),
        port: values.next().unwrap_or_default(),
        database: values.next().unwrap_or_default(),
    })
}

/// Masks a secret for display, showing only the last 4 characters.
pub fn mask_secret(secret: &str) -> String {
    if secret.len() <= 4 {
        "*".repeat(secret.len())
    } else {
        format!("{}...{}", "*".repeat(4), &secret[secret.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_store(provider: Provider) -> MemoryStore {
        MemoryStore::new().with_provider(
            provider,
            "analyst",
            "s3cret",
            "db.internal",
            "5432",
            "reporting",
        )
    }

    #[test]
    fn test_resolve_returns_all_five_fields() {
        let store = populated_store(Provider::Postgresql);
        let creds = resolve(Provider::Postgresql, &store).unwrap();

        assert_eq!(creds.username, "analyst");
        assert_eq!(creds.password, "s3cret");
        assert_eq!(creds.host, "db.internal");
        assert_eq!(creds.port, "5432");
        assert_eq!(creds.database, "reporting");
    }

    #[test]
    fn test_resolve_every_supported_provider() {
        for id in crate::provider::SUPPORTED_PROVIDERS {
            let provider = Provider::parse(id).unwrap();
            let store = populated_store(provider);
            assert!(
                resolve(provider, &store).is_ok(),
                "resolution failed for {id}"
            );
        }
    }

    #[test]
    fn test_resolve_names_each_missing_key() {
        let provider = Provider::Mysql;
        let [user_key, pass_key, ..] = provider.credential_keys();

        for key in provider.credential_keys() {
            let mut store = populated_store(provider);
            store.entries.remove(&key);

            let err = resolve(provider, &store).unwrap_err();
            match err {
                DatadeskError::IncompleteCredentials { missing, .. } => {
                    assert_eq!(missing, vec![key.clone()]);
                }
                other => panic!("expected IncompleteCredentials, got {other:?}"),
            }
        }

        // Two gaps are reported together, not one at a time.
        let mut store = populated_store(provider);
        store.entries.remove(&user_key);
        store.entries.remove(&pass_key);
        let err = resolve(provider, &store).unwrap_err();
        assert!(err.to_string().contains("mysql_username"));
        assert!(err.to_string().contains("mysql_password"));
    }

    #[test]
    fn test_resolve_treats_empty_value_as_missing() {
        let provider = Provider::Teradata;
        let mut store = populated_store(provider);
        store.insert("teradata_password", "   ");

        let err = resolve(provider, &store).unwrap_err();
        assert!(err.to_string().contains("teradata_password"));
    }

    #[test]
    fn test_store_unavailable_propagates() {
        struct DownStore;
        impl CredentialStore for DownStore {
            fn get(&self, _key: &str) -> Result<Option<String>> {
                Err(DatadeskError::store_unavailable("keyring daemon not running"))
            }
        }

        let err = resolve(Provider::Sqlite, &DownStore).unwrap_err();
        assert!(matches!(err, DatadeskError::SecretStoreUnavailable(_)));
    }

    #[test]
    fn test_mask_secret_short() {
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn test_mask_secret_long() {
        assert_eq!(mask_secret("sk-1234567890abcdef"), "****...cdef");
    }
}
