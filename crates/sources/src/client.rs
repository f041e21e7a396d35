use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::SourceError;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Longest slice of an error body kept in [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 256;

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Client builder shared by every provider. Callers layer proxy and pool
/// settings on top before building.
pub fn create_client_builder(timeout: Option<Duration>) -> reqwest::ClientBuilder {
    install_rustls_provider();

    let mut builder = Client::builder()
        .user_agent(DEFAULT_UA)
        .pool_idle_timeout(Duration::from_secs(90));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

pub fn default_client() -> Result<Client, SourceError> {
    Ok(create_client_builder(Some(Duration::from_secs(30))).build()?)
}

/// Thin wrapper binding a `reqwest::Client` to one provider's base URL and
/// default headers.
///
/// Responses go through [`check_status`], so every provider reports
/// authorization failures and rate limits the same way.
#[derive(Debug, Clone)]
pub struct ApiClient {
    // name of the provider, e.g. "helix", "7tv"
    pub name: &'static str,
    pub base_url: String,
    pub client: Client,
    headers: HeaderMap,
}

impl ApiClient {
    pub fn new(name: &'static str, base_url: impl Into<String>, client: Client) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        Self {
            name,
            base_url: base_url.into(),
            client,
            headers,
        }
    }

    pub fn add_header_typed<K: Into<HeaderName>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.headers.insert(key.into(), value);
            }
            Err(e) => {
                debug!(provider = self.name, error = %e, "Invalid header value; skipping");
            }
        }
    }

    pub fn add_header_str<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => self.add_header_typed(name, value),
            Err(e) => {
                debug!(provider = self.name, error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Join a path onto the base URL. Absolute URLs pass through untouched.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .headers(self.headers.clone())
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .headers(self.headers.clone())
    }

    /// Send `request` and decode a JSON body, mapping non-2xx statuses into
    /// typed errors.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        let body = self.send_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send `request` and return the raw body of a successful response.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, SourceError> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        trace!(provider = self.name, %status, "body: {}", body);

        check_status(status, &headers, &body)?;
        Ok(body)
    }
}

/// Classify a response status.
pub fn check_status(status: StatusCode, headers: &HeaderMap, body: &str) -> Result<(), SourceError> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unauthorized {
            status: status.as_u16(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited {
            retry_after: rate_limit_hint(headers),
        }),
        _ => {
            let mut body = body.to_string();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            Err(SourceError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// How long to back off after a 429.
///
/// `Retry-After` holds seconds; Helix sends `Ratelimit-Reset` as an epoch
/// timestamp instead.
pub fn rate_limit_hint(headers: &HeaderMap) -> Option<Duration> {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    if let Some(secs) = header_u64("retry-after") {
        return Some(Duration::from_secs(secs));
    }

    let reset = header_u64("ratelimit-reset")?;
    let now = Utc::now().timestamp().max(0) as u64;
    Some(Duration::from_secs(reset.saturating_sub(now)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("test", "https://api.example.com/v1/", default_client().unwrap())
    }

    #[test]
    fn test_url_join() {
        let api = client();
        assert_eq!(api.url("/streams"), "https://api.example.com/v1/streams");
        assert_eq!(api.url("streams"), "https://api.example.com/v1/streams");
        assert_eq!(api.url(""), "https://api.example.com/v1/");
        assert_eq!(
            api.url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let mut api = client();
        api.add_header_str("Client-Id", "abc");
        api.add_header_str("bad header", "x");
        api.add_header_str("X-Test", "line\nbreak");
        assert_eq!(api.headers().get("client-id").unwrap(), "abc");
        assert!(api.headers().get("x-test").is_none());
    }

    #[test]
    fn test_check_status() {
        let headers = HeaderMap::new();
        assert!(check_status(StatusCode::OK, &headers, "").is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, &headers, ""),
            Err(SourceError::Unauthorized { status: 401 })
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, &headers, ""),
            Err(SourceError::Unauthorized { status: 403 })
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, &headers, "oops"),
            Err(SourceError::Status { status: 502, ref body }) if body == "oops"
        ));
    }

    #[test]
    fn test_check_status_truncates_body() {
        let body = "x".repeat(1000);
        let Err(SourceError::Status { body, .. }) =
            check_status(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new(), &body)
        else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), MAX_ERROR_BODY);
    }

    #[test]
    fn test_rate_limit_hint() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from_static("7"));
        assert_eq!(rate_limit_hint(&headers), Some(Duration::from_secs(7)));

        let mut headers = HeaderMap::new();
        let reset = (Utc::now().timestamp() + 30).to_string();
        headers.insert("Ratelimit-Reset", HeaderValue::from_str(&reset).unwrap());
        let hint = rate_limit_hint(&headers).unwrap();
        assert!(hint <= Duration::from_secs(30) && hint >= Duration::from_secs(28));

        let Err(SourceError::RateLimited { retry_after }) =
            check_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), "")
        else {
            panic!("expected rate limit");
        };
        assert!(retry_after.is_none());
    }
}
