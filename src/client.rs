//! The container client: SAS issuance plus the three blob operations.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Method, Request, Response, StatusCode};
use log::debug;
use percent_encoding::percent_encode;
use serde::Deserialize;

use crate::constants::*;
use crate::name::unique_blob_name;
use crate::sas::ContainerSharedAccessSignature;
use crate::sign::sign_shared_key;
use crate::time;
use crate::time::DateTime;
use crate::transport::HttpSend;
use crate::{Config, Credential, Error, Result};

/// How long a freshly minted SAS stays valid.
pub const SAS_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Client for a single blob container.
///
/// Every blob operation mints its own short-lived SAS before talking to the
/// service; tokens are never cached or shared across calls. The client holds
/// no mutable state, so it is cheap to clone and safe to use concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use picstash::{Config, ContainerClient, ReqwestHttpSend};
///
/// #[tokio::main]
/// async fn main() -> picstash::Result<()> {
///     let config = Config::default().from_env()?;
///     let store = ContainerClient::new(&config, ReqwestHttpSend::default())?;
///
///     store.ensure_container().await?;
///     let name = store.upload(&b"jpeg bytes"[..]).await?;
///     let content = store.download(&name).await?;
///     println!("stored {} ({} bytes)", name, content.len());
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct ContainerClient {
    credential: Credential,
    endpoint: String,
    container: String,
    http: Arc<dyn HttpSend>,
}

impl ContainerClient {
    /// Create a client from config and a transport.
    ///
    /// Resolves the credential, endpoint and container once; fails with
    /// `CredentialInvalid` when the config carries no usable account key.
    /// No network traffic happens here.
    pub fn new(config: &Config, http: impl HttpSend) -> Result<Self> {
        let credential = Credential::from_config(config)?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.blob.core.windows.net", credential.account_name))
            .trim_end_matches('/')
            .to_string();
        let container = config
            .container
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string());

        Ok(Self {
            credential,
            endpoint,
            container,
            http: Arc::new(http),
        })
    }

    /// The container this client operates on.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Ensure the container exists.
    ///
    /// Idempotent create-if-absent: `409 Conflict` from the service means the
    /// container is already there and is treated as success. This is the only
    /// call that signs with the account key directly; a container SAS cannot
    /// authorize container creation.
    pub async fn ensure_container(&self) -> Result<()> {
        let url = format!("{}?restype=container", self.container_url());
        let req = Request::builder()
            .method(Method::PUT)
            .uri(&url)
            .header(X_MS_VERSION, AZURE_VERSION)
            .header(CONTENT_LENGTH, 0)
            .body(Bytes::new())?;

        let (mut parts, body) = req.into_parts();
        sign_shared_key(&mut parts, &self.credential, time::now())?;

        let resp = self.send(Request::from_parts(parts, body)).await?;
        match resp.status() {
            StatusCode::CREATED => {
                debug!("container {} created", self.container);
                Ok(())
            }
            // Already exists; create-if-absent succeeded.
            StatusCode::CONFLICT => Ok(()),
            _ => Err(service_error("create container", resp)),
        }
    }

    /// Ensure the container exists, then return its URL with a fresh SAS
    /// query string appended.
    ///
    /// The returned URL authorizes read, write and list on the container for
    /// one hour from issuance. An expired URL fails at the service, not
    /// locally.
    pub async fn issue_container_url(&self) -> Result<String> {
        self.ensure_container().await?;
        self.signed_container_url(time::now())
    }

    /// Upload `content` as a new blob under a generated unique name.
    ///
    /// On success the blob is durably stored under the returned name and is
    /// immediately listable and downloadable. The advertised content length
    /// is the buffer's exact length.
    pub async fn upload(&self, content: impl Into<Bytes>) -> Result<String> {
        let content = content.into();
        let name = unique_blob_name();
        let url = format!("{}?{}", self.blob_url(&name), self.fresh_sas_query()?);

        debug!("uploading {} bytes as {}", content.len(), name);

        let req = Request::builder()
            .method(Method::PUT)
            .uri(&url)
            .header(X_MS_VERSION, AZURE_VERSION)
            .header(X_MS_BLOB_TYPE, "BlockBlob")
            .header(CONTENT_LENGTH, content.len())
            .body(content)?;

        let resp = self.send(req).await?;
        if resp.status() != StatusCode::CREATED {
            return Err(service_error("upload blob", resp));
        }

        Ok(name)
    }

    /// List the names of every blob currently in the container.
    ///
    /// Follows continuation markers until the enumeration is exhausted, so
    /// the full listing is materialized. Order is whatever the service
    /// returns; it is not guaranteed to be chronological.
    pub async fn list(&self) -> Result<Vec<String>> {
        let sas = self.fresh_sas_query()?;

        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut url = format!(
                "{}?restype=container&comp=list&{}",
                self.container_url(),
                sas
            );
            if let Some(m) = &marker {
                url.push_str("&marker=");
                url.extend(form_urlencoded::byte_serialize(m.as_bytes()));
            }

            let req = Request::builder()
                .method(Method::GET)
                .uri(&url)
                .header(X_MS_VERSION, AZURE_VERSION)
                .body(Bytes::new())?;

            let resp = self.send(req).await?;
            if resp.status() != StatusCode::OK {
                return Err(service_error("list blobs", resp));
            }

            let body = String::from_utf8(resp.into_body().to_vec())?;
            let page: ListBlobsResponse = quick_xml::de::from_str(&body)
                .map_err(|e| Error::unexpected("failed to parse list response").with_source(e))?;

            names.extend(
                page.blobs
                    .unwrap_or_default()
                    .blob
                    .into_iter()
                    .map(|b| b.name),
            );

            marker = page.next_marker.filter(|m| !m.is_empty());
            if marker.is_none() {
                break;
            }
        }

        debug!("listed {} blobs in {}", names.len(), self.container);
        Ok(names)
    }

    /// Download the full content of the blob named `name`.
    ///
    /// Fetches the blob's metadata first; the returned buffer's length is the
    /// service's authoritative content length. A missing blob is an explicit
    /// [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] error.
    pub async fn download(&self, name: &str) -> Result<Bytes> {
        let url = format!("{}?{}", self.blob_url(name), self.fresh_sas_query()?);

        // Get-metadata step: the authoritative length lives on the blob.
        let req = Request::builder()
            .method(Method::HEAD)
            .uri(&url)
            .header(X_MS_VERSION, AZURE_VERSION)
            .body(Bytes::new())?;
        let resp = self.send(req).await?;
        let expected_len = match resp.status() {
            StatusCode::OK => resp
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok()),
            StatusCode::NOT_FOUND => {
                return Err(Error::not_found(format!("blob {name} does not exist")))
            }
            _ => return Err(service_error("get blob properties", resp)),
        };

        let req = Request::builder()
            .method(Method::GET)
            .uri(&url)
            .header(X_MS_VERSION, AZURE_VERSION)
            .body(Bytes::new())?;
        let resp = self.send(req).await?;
        let content = match resp.status() {
            StatusCode::OK => resp.into_body(),
            // Deleted between the metadata call and this one.
            StatusCode::NOT_FOUND => {
                return Err(Error::not_found(format!("blob {name} does not exist")))
            }
            _ => return Err(service_error("download blob", resp)),
        };

        if let Some(len) = expected_len {
            if content.len() as u64 != len {
                return Err(Error::unexpected(format!(
                    "short read of blob {name}: got {} bytes, blob has {len}",
                    content.len()
                )));
            }
        }

        Ok(content)
    }

    fn container_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.container)
    }

    fn blob_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            self.container,
            percent_encode(name.as_bytes(), &BLOB_NAME_ENCODE_SET)
        )
    }

    /// Mint a SAS expiring [`SAS_VALIDITY`] from now.
    fn fresh_sas_query(&self) -> Result<String> {
        let validity = chrono::TimeDelta::from_std(SAS_VALIDITY)
            .map_err(|e| Error::unexpected("SAS validity out of range").with_source(e))?;
        self.sas_query(time::now() + validity)
    }

    fn sas_query(&self, expiry: DateTime) -> Result<String> {
        let sas = ContainerSharedAccessSignature::new(
            self.credential.account_name.clone(),
            self.credential.account_key.clone(),
            self.container.clone(),
            expiry,
        );

        Ok(sas
            .token()?
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"))
    }

    /// Pure minting step: container URL plus a SAS expiring one hour after `now`.
    fn signed_container_url(&self, now: DateTime) -> Result<String> {
        let validity = chrono::TimeDelta::from_std(SAS_VALIDITY)
            .map_err(|e| Error::unexpected("SAS validity out of range").with_source(e))?;
        Ok(format!(
            "{}?{}",
            self.container_url(),
            self.sas_query(now + validity)?
        ))
    }

    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        self.http
            .http_send(req)
            .await
            .map_err(|e| Error::unexpected("request to blob service failed").with_source(e))
    }
}

fn service_error(op: &str, resp: Response<Bytes>) -> Error {
    let status = resp.status();
    let snippet: String = String::from_utf8_lossy(resp.body()).chars().take(256).collect();
    Error::unexpected(format!("{op} failed with status {status}: {snippet}"))
}

/// Body of `GET ?restype=container&comp=list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBlobsResponse {
    blobs: Option<Blobs>,
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Blobs {
    #[serde(default, rename = "Blob")]
    blob: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobItem {
    name: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::hash::base64_encode;

    fn test_client() -> ContainerClient {
        #[derive(Debug)]
        struct NoSend;

        #[async_trait::async_trait]
        impl HttpSend for NoSend {
            async fn http_send(
                &self,
                _: http::Request<Bytes>,
            ) -> anyhow::Result<http::Response<Bytes>> {
                unreachable!("test client must not touch the network")
            }
        }

        let config = Config {
            account_name: Some("testaccount".to_string()),
            account_key: Some(base64_encode(b"key")),
            ..Default::default()
        };
        ContainerClient::new(&config, NoSend).unwrap()
    }

    #[test]
    fn test_default_endpoint_and_container() {
        let client = test_client();
        assert_eq!(
            client.container_url(),
            "https://testaccount.blob.core.windows.net/foodimages"
        );
    }

    #[test]
    fn test_blob_url_encodes_name() {
        let client = test_client();
        assert_eq!(
            client.blob_url("03-01-2024 12:00:00_id.jpg"),
            "https://testaccount.blob.core.windows.net/foodimages/03-01-2024%2012%3A00%3A00_id.jpg"
        );
    }

    #[test]
    fn test_signed_container_url_expires_in_one_hour() {
        let client = test_client();
        let now = DateTime::from_str("2024-03-01T12:00:00Z").unwrap();

        let url = client.signed_container_url(now).unwrap();
        assert!(url.starts_with("https://testaccount.blob.core.windows.net/foodimages?sv="));
        assert!(url.contains("se=2024-03-01T13%3A00%3A00Z"));
        assert!(url.contains("sp=rwl"));
        assert!(url.contains("sr=c"));
    }

    #[test]
    fn test_parse_list_response() {
        let content = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://testaccount.blob.core.windows.net/" ContainerName="foodimages">
  <Blobs>
    <Blob>
      <Name>03-01-2024 12:00:00_aaaa.jpg</Name>
      <Properties>
        <Content-Length>10</Content-Length>
        <BlobType>BlockBlob</BlobType>
      </Properties>
    </Blob>
    <Blob>
      <Name>03-01-2024 12:00:01_bbbb.jpg</Name>
      <Properties>
        <Content-Length>20</Content-Length>
        <BlobType>BlockBlob</BlobType>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;

        let parsed: ListBlobsResponse = quick_xml::de::from_str(content).unwrap();
        let names: Vec<String> = parsed
            .blobs
            .unwrap_or_default()
            .blob
            .into_iter()
            .map(|b| b.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "03-01-2024 12:00:00_aaaa.jpg".to_string(),
                "03-01-2024 12:00:01_bbbb.jpg".to_string()
            ]
        );
        assert!(parsed.next_marker.filter(|m| !m.is_empty()).is_none());
    }

    #[test]
    fn test_parse_empty_list_response() {
        let content = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://testaccount.blob.core.windows.net/" ContainerName="foodimages">
  <Blobs />
</EnumerationResults>"#;

        let parsed: ListBlobsResponse = quick_xml::de::from_str(content).unwrap();
        assert!(parsed.blobs.unwrap_or_default().blob.is_empty());
    }
}
