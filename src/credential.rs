use std::fmt::{Debug, Formatter};

use crate::hash::base64_decode;
use crate::utils::Redact;
use crate::{Config, Error, Result};

/// Credential that holds the storage account name and key.
///
/// This is the only credential type the store supports: the account key is
/// required both to sign the container create call and to mint SAS tokens.
#[derive(Clone)]
pub struct Credential {
    /// Azure storage account name.
    pub account_name: String,
    /// Azure storage account key, base64 encoded.
    pub account_key: String,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_name", &Redact::from(&self.account_name))
            .field("account_key", &Redact::from(&self.account_key))
            .finish()
    }
}

impl Credential {
    /// Resolve a credential from config.
    ///
    /// Fails with `CredentialInvalid` when the account name or key is missing,
    /// or when the key is not valid base64.
    pub fn from_config(config: &Config) -> Result<Self> {
        let account_name = config
            .account_name
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::credential_invalid("account name is missing"))?;
        let account_key = config
            .account_key
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::credential_invalid("account key is missing"))?;

        // The key is used as HMAC input after base64 decoding; reject
        // undecodable keys here instead of on the first signing call.
        base64_decode(&account_key)
            .map_err(|e| Error::credential_invalid("account key is not valid base64").with_source(e))?;

        Ok(Self {
            account_name,
            account_key,
        })
    }

    /// Check if the credential is usable.
    pub fn is_valid(&self) -> bool {
        !self.account_name.is_empty() && !self.account_key.is_empty()
    }
}
