//! Upstream providers and the user's preference order among them.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{Error, Result};

/// An upstream API a page can be sourced from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Gql,
    Helix,
}

/// Continuation token tagged with the provider that issued it.
///
/// Tokens are opaque and only meaningful to their issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor {
    pub provider: ApiProvider,
    pub token: String,
}

impl PageCursor {
    pub fn new(provider: ApiProvider, token: impl Into<String>) -> Self {
        Self {
            provider,
            token: token.into(),
        }
    }
}

/// Ordered, duplicate-free provider preference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiPref(Vec<ApiProvider>);

impl ApiPref {
    pub fn new(providers: impl IntoIterator<Item = ApiProvider>) -> Self {
        let mut list = Vec::new();
        for provider in providers {
            if !list.contains(&provider) {
                list.push(provider);
            }
        }
        Self(list)
    }

    /// Parse a comma separated list such as `gql,helix`.
    pub fn parse(s: &str) -> Result<Self> {
        let providers = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<ApiProvider>()
                    .map_err(|_| Error::config(format!("unknown API provider '{p}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        if providers.is_empty() {
            return Err(Error::config("API preference list is empty"));
        }
        Ok(Self::new(providers))
    }

    pub fn providers(&self) -> &[ApiProvider] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ApiPref {
    fn default() -> Self {
        Self::new(ApiProvider::iter())
    }
}

impl TryFrom<String> for ApiPref {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ApiPref> for String {
    fn from(pref: ApiPref) -> Self {
        pref.0
            .iter()
            .map(|p| <&'static str>::from(*p))
            .collect::<Vec<_>>()
            .join(",")
    }
}
