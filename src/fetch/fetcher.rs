//! Conditional-GET orchestration around the shared cache.

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::{
    md5_hex, HttpGet, HttpResponse, SharedCache, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use crate::cache::CacheStore;
use crate::error::FetchError;

// == Fetch Outcome ==
/// Where a fetched body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Origin sent the body (200)
    Network,
    /// Origin confirmed our copy (304)
    Cache,
}

/// Result of one fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub source: FetchSource,
    pub body: Bytes,
    /// MD5 of `body` as lowercase hex
    pub digest: String,
}

impl FetchOutcome {
    fn new(source: FetchSource, body: Bytes) -> Self {
        let digest = md5_hex(&body);
        Self {
            source,
            body,
            digest,
        }
    }

    pub fn from_cache(&self) -> bool {
        self.source == FetchSource::Cache
    }
}

// == File Fetcher ==
/// Fetches paths from one host, caching validators and bodies so repeat
/// fetches of unchanged files cost a 304.
pub struct FileFetcher<C> {
    client: C,
    cache: SharedCache,
    host: String,
}

impl<C: HttpGet> FileFetcher<C> {
    pub fn new(client: C, cache: SharedCache, host: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            host: host.into(),
        }
    }

    /// Creates a fetcher with its own cache of `capacity` bytes.
    pub fn with_capacity(
        client: C,
        capacity: usize,
        host: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let store = CacheStore::new(capacity)?;
        Ok(Self::new(client, super::shared(store), host))
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Fetch ==
    /// Fetches `path`, sending cached validators when both are known.
    ///
    /// A 304 whose body has since been evicted is retried once without
    /// validators. Statuses other than 200 and 304 are errors.
    pub async fn fetch(&self, path: &str) -> Result<FetchOutcome, FetchError> {
        let conditional = self.conditional_headers(path).await;
        let response = self.client.get(&self.host, path, &conditional).await?;

        match response.status {
            200 => {
                self.store_response(path, &response).await;
                info!(path, size = response.body.len(), "Fetched and cached");
                Ok(FetchOutcome::new(FetchSource::Network, response.body))
            }
            304 => {
                let cached = {
                    let mut cache = self.cache.write().await;
                    let body = cache.get_file(path);
                    if body.is_some() {
                        Self::store_validators(&mut cache, path, &response);
                    }
                    body
                };

                match cached {
                    Some(body) => {
                        info!(path, size = body.len(), "Cache hit");
                        Ok(FetchOutcome::new(FetchSource::Cache, body))
                    }
                    None => {
                        warn!(path, "Not modified but body no longer cached, refetching");
                        self.fetch_unconditional(path).await
                    }
                }
            }
            other => Err(FetchError::UnexpectedStatus(other)),
        }
    }

    async fn fetch_unconditional(&self, path: &str) -> Result<FetchOutcome, FetchError> {
        let response = self.client.get(&self.host, path, &[]).await?;
        if response.status != 200 {
            return Err(FetchError::UnexpectedStatus(response.status));
        }

        self.store_response(path, &response).await;
        info!(path, size = response.body.len(), "Fetched and cached");
        Ok(FetchOutcome::new(FetchSource::Network, response.body))
    }

    /// `If-None-Match` / `If-Modified-Since`, only when both validators are
    /// cached and non-empty.
    async fn conditional_headers(&self, path: &str) -> Vec<(&'static str, String)> {
        let mut cache = self.cache.write().await;
        let etag = cache.get_header(path, ETAG).unwrap_or_default();
        let last_modified = cache.get_header(path, LAST_MODIFIED).unwrap_or_default();

        if etag.is_empty() || last_modified.is_empty() {
            return Vec::new();
        }
        vec![(IF_NONE_MATCH, etag), (IF_MODIFIED_SINCE, last_modified)]
    }

    /// Replaces the cached copy with a 200 response. Validators the response
    /// omits are dropped so a later fetch does not send stale ones.
    async fn store_response(&self, path: &str, response: &HttpResponse) {
        let mut cache = self.cache.write().await;
        for name in [ETAG, LAST_MODIFIED] {
            if response.header(name).is_none() && cache.remove_header(path, name).is_some() {
                debug!(path, header = name, "Dropped validator missing from response");
            }
        }
        Self::store_validators(&mut cache, path, response);
        if let Err(err) = cache.set_file(path, response.body.clone()) {
            warn!(path, error = %err, "Body not cached");
        }
    }

    /// Rejected writes are logged; the fetch still succeeds.
    fn store_validators(cache: &mut CacheStore, path: &str, response: &HttpResponse) {
        for name in [ETAG, LAST_MODIFIED] {
            let Some(value) = response.header(name) else {
                continue;
            };
            if let Err(err) = cache.set_header(path, name, value) {
                warn!(path, header = name, error = %err, "Validator not cached");
            }
        }
    }
}
