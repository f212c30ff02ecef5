use std::collections::HashMap;
use std::env;

use crate::connection_string;
use crate::constants::*;
use crate::Result;

/// Config carries all the configuration for the blob store.
///
/// Configuration is injected explicitly: construct a value (or load one from
/// the environment) and hand it to [`ContainerClient::new`][crate::ContainerClient::new].
/// Nothing in this crate reads global state after that point.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - the connection string in env value [`AZURE_STORAGE_CONNECTION_STRING`]
    /// - env value [`AZBLOB_ACCOUNT_NAME`]
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - the connection string in env value [`AZURE_STORAGE_CONNECTION_STRING`]
    /// - env value [`AZBLOB_ACCOUNT_KEY`]
    pub account_key: Option<String>,
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - the connection string in env value [`AZURE_STORAGE_CONNECTION_STRING`]
    /// - env value [`AZBLOB_ENDPOINT`]
    ///
    /// Defaults to `https://{account_name}.blob.core.windows.net` when unset.
    pub endpoint: Option<String>,
    /// `container` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value [`AZBLOB_CONTAINER`]
    ///
    /// Defaults to [`DEFAULT_CONTAINER`] when unset.
    pub container: Option<String>,
}

impl Config {
    /// Load config from a connection string.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        connection_string::parse(conn_str)
    }

    /// Load config from env.
    pub fn from_env(mut self) -> Result<Self> {
        let envs = env::vars().collect::<HashMap<_, _>>();

        if let Some(v) = envs.get(AZURE_STORAGE_CONNECTION_STRING) {
            let parsed = connection_string::parse(v)?;
            self.account_name = parsed.account_name.or(self.account_name);
            self.account_key = parsed.account_key.or(self.account_key);
            self.endpoint = parsed.endpoint.or(self.endpoint);
        }

        if let Some(v) = envs.get(AZBLOB_ACCOUNT_NAME) {
            self.account_name = Some(v.to_string());
        }

        if let Some(v) = envs.get(AZBLOB_ACCOUNT_KEY) {
            self.account_key = Some(v.to_string());
        }

        if let Some(v) = envs.get(AZBLOB_ENDPOINT) {
            self.endpoint = Some(v.to_string());
        }

        if let Some(v) = envs.get(AZBLOB_CONTAINER) {
            self.container = Some(v.to_string());
        }

        Ok(self)
    }
}
