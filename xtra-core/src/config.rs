//! Process configuration, read from the environment.
//!
//! `.env` files are honoured through `dotenvy` by the binary before
//! [`AppConfig::from_env`] runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use xtra_sources::Session;
use xtra_sources::session::WEB_CLIENT_ID;

use crate::paging::{ApiPref, ApiPrefs, DEFAULT_PAGE_SIZE, FeatureKey};
use crate::{Error, Result};

const ENV_PREFIX: &str = "XTRA_";

fn default_database_url() -> String {
    "sqlite:xtra.db?mode=rwc".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_client_id() -> String {
    WEB_CLIENT_ID.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Proxy settings for outgoing HTTP requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Honour `HTTP(S)_PROXY` from the environment when no URL is set.
    #[serde(default)]
    pub use_system_proxy: bool,
}

impl ProxyConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn system() -> Self {
        Self {
            enabled: true,
            use_system_proxy: true,
            ..Self::default()
        }
    }

    /// Explicit proxy. Credentials embedded in the URL are split out.
    pub fn with_url(raw: &str) -> Result<Self> {
        let mut url = url::Url::parse(raw)
            .map_err(|e| Error::config(format!("invalid proxy URL '{raw}': {e}")))?;
        let username = Some(url.username().to_string()).filter(|u| !u.is_empty());
        let password = url.password().map(str::to_string);
        // set_username/set_password only fail for cannot-be-a-base URLs
        let _ = url.set_username("");
        let _ = url.set_password(None);
        Ok(Self {
            enabled: true,
            url: Some(url.to_string()),
            username,
            password,
            use_system_proxy: false,
        })
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Tracing filter directive applied after startup, e.g. `xtra_core=debug`.
    pub log_filter: Option<String>,
    /// Client id sent to Helix.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    pub helix_token: Option<String>,
    pub gql_token: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    #[serde(default)]
    pub api_prefs: ApiPrefs,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            download_dir: default_download_dir(),
            log_dir: default_log_dir(),
            log_filter: None,
            client_id: default_client_id(),
            helix_token: None,
            gql_token: None,
            user_id: None,
            user_login: None,
            api_prefs: ApiPrefs::default(),
            http_timeout_secs: default_http_timeout_secs(),
            page_size: default_page_size(),
            proxy: ProxyConfig::disabled(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary `XTRA_*` lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(v) = get("DATABASE_URL") {
            config.database_url = v;
        }
        if let Some(v) = get("DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LOG_DIR") {
            config.log_dir = PathBuf::from(v);
        }
        config.log_filter = get("LOG_FILTER");
        if let Some(v) = get("CLIENT_ID") {
            config.client_id = v;
        }
        config.helix_token = get("HELIX_TOKEN");
        config.gql_token = get("GQL_TOKEN");
        config.user_id = get("USER_ID");
        config.user_login = get("USER_LOGIN");

        if let Some(v) = get("API_PREF") {
            config.api_prefs.default = ApiPref::parse(&v)?;
        }
        for key in FeatureKey::iter() {
            let name = format!("API_PREF_{}", key.as_str().to_ascii_uppercase());
            if let Some(v) = get(&name) {
                config.api_prefs.overrides.insert(key, ApiPref::parse(&v)?);
            }
        }

        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = v
                .parse()
                .map_err(|_| Error::config(format!("invalid XTRA_HTTP_TIMEOUT_SECS '{v}'")))?;
        }
        if let Some(v) = get("PAGE_SIZE") {
            config.page_size = v
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::config(format!("invalid XTRA_PAGE_SIZE '{v}'")))?;
        }
        if let Some(v) = get("PROXY_URL") {
            config.proxy = if v.eq_ignore_ascii_case("system") {
                ProxyConfig::system()
            } else {
                ProxyConfig::with_url(&v)?
            };
        }
        Ok(config)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        (self.http_timeout_secs > 0).then(|| Duration::from_secs(self.http_timeout_secs))
    }

    /// Session context handed to the provider clients.
    pub fn session(&self) -> Session {
        let mut session = Session::anonymous(&self.client_id);
        if let Some(token) = &self.helix_token {
            session = session.with_helix_token(token);
        }
        if let Some(token) = &self.gql_token {
            session = session.with_gql_token(token);
        }
        if let (Some(id), Some(login)) = (&self.user_id, &self.user_login) {
            session = session.with_user(id, login);
        }
        session
    }
}
