//! HTTP GET primitive used by the fetcher.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::error::FetchError;

// == Response ==
/// Status, headers and full body of one GET.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns a response header as text; lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// == HttpGet Trait ==
/// Performs a GET with caller-supplied request headers.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(
        &self,
        host: &str,
        path: &str,
        headers: &[(&str, String)],
    ) -> Result<HttpResponse, FetchError>;
}

// == Reqwest Client ==
/// [`HttpGet`] over a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    scheme: String,
}

impl ReqwestClient {
    /// Creates a client requesting `{scheme}://{host}{path}`.
    pub fn new(scheme: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            scheme: scheme.into(),
        })
    }

    fn url(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }
}

#[async_trait]
impl HttpGet for ReqwestClient {
    async fn get(
        &self,
        host: &str,
        path: &str,
        headers: &[(&str, String)],
    ) -> Result<HttpResponse, FetchError> {
        let url = self.url(host, path);
        let mut request = self.client.get(&url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(%url, status, size = body.len(), "GET complete");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
