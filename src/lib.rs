//! Store images in a single Azure Blob Storage container, scoped by
//! short-lived SAS (Shared Access Signature) tokens.
//!
//! This crate does three things:
//!
//! - mints time-boxed, permission-scoped container SAS URLs ({read, write,
//!   list}, one hour validity, no start restriction),
//! - uploads, lists and downloads blobs in that container over the Blob REST
//!   API, with every operation scoped by a freshly minted SAS,
//! - generates unique, sortable blob names from a UTC timestamp and a random
//!   UUID.
//!
//! # Example
//!
//! ```rust,no_run
//! use picstash::{Config, ContainerClient, ReqwestHttpSend};
//!
//! #[tokio::main]
//! async fn main() -> picstash::Result<()> {
//!     // Configuration is injected; from_env reads
//!     // AZURE_STORAGE_CONNECTION_STRING and the AZBLOB_* overrides.
//!     let config = Config::default().from_env()?;
//!     let store = ContainerClient::new(&config, ReqwestHttpSend::default())?;
//!
//!     // Create-if-absent, then hand out a one-hour delegated URL.
//!     let url = store.issue_container_url().await?;
//!     println!("container SAS URL: {url}");
//!
//!     // Upload, list, download.
//!     let name = store.upload(&b"jpeg bytes"[..]).await?;
//!     for blob in store.list().await? {
//!         println!("{blob}");
//!     }
//!     let content = store.download(&name).await?;
//!     assert_eq!(&content[..], b"jpeg bytes");
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod constants;

mod error;
pub use error::{Error, ErrorKind, Result};

mod config;
pub use config::Config;
mod connection_string;

mod credential;
pub use credential::Credential;

mod sas;
pub use sas::ContainerSharedAccessSignature;

mod sign;

mod name;
pub use name::unique_blob_name;

mod transport;
pub use transport::{HttpSend, ReqwestHttpSend};

mod client;
pub use client::{ContainerClient, SAS_VALIDITY};
