use std::sync::{Arc, Mutex};

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use sentiview_core::TtlCache;
use sentiview_logging::{sv_debug, sv_warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::map_reqwest_error;
use crate::{ApiError, ApiErrorKind, ClientSettings, TokenStore};

/// Read-through cache shared by every client built from the same handle.
pub type SharedCache = Arc<Mutex<TtlCache<Value>>>;

pub fn new_shared_cache(settings: &ClientSettings) -> SharedCache {
    Arc::new(Mutex::new(TtlCache::new(settings.cache_ttl)))
}

/// Single egress point: auth header, JSON in and out, error normalisation
/// and cache bookkeeping.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: Url,
    tokens: TokenStore,
    cache: SharedCache,
    settings: ClientSettings,
}

impl HttpClient {
    pub fn new(settings: ClientSettings, tokens: TokenStore) -> Result<Self, ApiError> {
        let cache = new_shared_cache(&settings);
        Self::with_cache(settings, tokens, cache)
    }

    pub fn with_cache(
        settings: ClientSettings,
        tokens: TokenStore,
        cache: SharedCache,
    ) -> Result<Self, ApiError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base,
            tokens,
            cache,
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET with an optional cache key. Hits are served without touching the
    /// network; misses populate the cache after a successful fetch, unless a
    /// write invalidated the key while the request was in flight.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cache_key: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut stamp = None;
        if let Some(key) = cache_key {
            let cache = self.lock_cache();
            if let Some(value) = cache.get(key) {
                drop(cache);
                sv_debug!("Cache hit for {}", key);
                return decode(value);
            }
            stamp = Some(cache.stamp(key));
        }

        let url = self.url(path, &[])?;
        let value = self.send(Method::GET, url, None).await?;
        if let (Some(key), Some(stamp)) = (cache_key, stamp) {
            if !self.lock_cache().set_if_unchanged(key, value.clone(), stamp) {
                sv_debug!("Not caching {}: invalidated during the fetch", key);
            }
        }
        decode(value)
    }

    /// GET with query parameters. Never cached.
    pub async fn fetch_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        decode(self.send(Method::GET, url, None).await?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        invalidate: &[String],
    ) -> Result<T, ApiError> {
        self.write(Method::POST, path, body, invalidate).await
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        invalidate: &[String],
    ) -> Result<T, ApiError> {
        self.write(Method::PATCH, path, body, invalidate).await
    }

    async fn write<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        invalidate: &[String],
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        let value = self.send(method, url, Some(payload)).await?;
        // Invalidate before handing control back so the next read is fresh.
        {
            let mut cache = self.lock_cache();
            for key in invalidate {
                cache.invalidate(key);
            }
        }
        decode(value)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = self.tokens.get() {
            request = request.header(AUTHORIZATION, self.settings.auth_scheme.header_value(&token));
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(|err| {
            sv_warn!("{} {} failed: {}", method, url, err);
            map_reqwest_error(err)
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        sv_debug!("{} {} -> {}", method, url, status.as_u16());

        if !status.is_success() {
            if status.as_u16() == 401 {
                self.tokens.clear();
            }
            let detail = error_detail(&bytes);
            sv_warn!(
                "{} {} returned {} ({})",
                method,
                url,
                status.as_u16(),
                detail.as_deref().unwrap_or("no detail")
            );
            return Err(ApiError::from_status(status.as_u16(), detail));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, TtlCache<Value>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
}

/// Pull a human-readable reason out of an error body.
fn error_detail(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    match &value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => ["detail", "error", "message"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(|v| match v {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }),
        _ => None,
    }
}
