use std::time::Duration;

use tracing::warn;
use xtra_sources::create_client_builder;

use crate::config::ProxyConfig;
use crate::{Error, Result};

/// Apply `proxy_config` to an existing `reqwest::ClientBuilder`.
///
/// - `enabled = false` => no proxy at all, environment included
/// - `url = Some(..)` => that proxy, with basic auth when credentials are set
/// - `url = None` + `use_system_proxy` => reqwest's environment defaults
/// - otherwise => no proxy
pub fn apply_proxy_config(
    builder: reqwest::ClientBuilder,
    proxy_config: &ProxyConfig,
) -> reqwest::ClientBuilder {
    if !proxy_config.enabled {
        return builder.no_proxy();
    }

    if let Some(url) = proxy_config.url.as_deref() {
        return match reqwest::Proxy::all(url) {
            Ok(mut proxy) => {
                if let (Some(username), Some(password)) = (
                    proxy_config.username.as_ref(),
                    proxy_config.password.as_ref(),
                ) {
                    proxy = proxy.basic_auth(username, password);
                }
                builder.proxy(proxy)
            }
            Err(error) => {
                warn!(proxy_url = %url, error = %error, "Invalid proxy URL; disabling proxy");
                builder.no_proxy()
            }
        };
    }

    if proxy_config.use_system_proxy {
        return builder;
    }
    builder.no_proxy()
}

/// The one HTTP client every provider shares.
pub fn build_http_client(
    proxy_config: &ProxyConfig,
    timeout: Option<Duration>,
) -> Result<reqwest::Client> {
    let builder = apply_proxy_config(create_client_builder(timeout), proxy_config);
    builder
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}
