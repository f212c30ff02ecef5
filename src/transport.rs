//! The HTTP seam between the store and the blob service.

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::Client;

/// HttpSend is used to send http requests to the blob service.
///
/// The store only ever talks to the service through this trait, so tests can
/// substitute an in-memory fake for the real endpoint.
#[async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> anyhow::Result<http::Response<Bytes>>;
}

/// Production [`HttpSend`] backed by a [`reqwest::Client`].
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> anyhow::Result<http::Response<Bytes>> {
        let req = reqwest::Request::try_from(req)?;
        let resp: http::Response<_> = self.client.execute(req).await?.into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body).await.map(|buf| buf.to_bytes())?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
