//! Provider-independent item types.
//!
//! Helix and GraphQL describe the same objects with different field names and
//! nesting; both clients normalize into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of normalized items plus the provider's continuation token.
///
/// `cursor == None` marks the end of the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        // Providers send empty strings instead of omitting the field.
        let cursor = cursor.filter(|c| !c.is_empty());
        Self { items, cursor }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub channel_id: String,
    pub channel_login: String,
    pub channel_name: String,
    pub title: String,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub viewer_count: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    /// Template URL with `{width}`/`{height}` placeholders.
    pub thumbnail_url: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub channel_id: String,
    pub channel_login: String,
    pub channel_name: String,
    pub title: String,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub broadcast_type: Option<BroadcastType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub is_live: bool,
    pub followed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub box_art_url: Option<String>,
    pub viewer_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSort {
    #[default]
    Time,
    Trending,
    Views,
}

impl VideoSort {
    pub fn helix(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Trending => "trending",
            Self::Views => "views",
        }
    }

    pub fn gql(self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::Trending => "TRENDING",
            Self::Views => "VIEWS",
        }
    }
}

/// Helix only; GraphQL has no period filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoPeriod {
    #[default]
    All,
    Day,
    Week,
    Month,
}

impl VideoPeriod {
    pub fn helix(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastType {
    #[default]
    All,
    Archive,
    Highlight,
    Upload,
}

impl BroadcastType {
    pub fn helix(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Archive => "archive",
            Self::Highlight => "highlight",
            Self::Upload => "upload",
        }
    }

    /// `None` means "no filter".
    pub fn gql(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Archive => Some("ARCHIVE"),
            Self::Highlight => Some("HIGHLIGHT"),
            Self::Upload => Some("UPLOAD"),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "archive" => Some(Self::Archive),
            "highlight" => Some(Self::Highlight),
            "upload" => Some(Self::Upload),
            _ => None,
        }
    }
}

/// Channel identity needed by providers that key on id or on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub login: String,
}

impl ChannelRef {
    pub fn new(id: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmoteSource {
    SevenTv,
    Bttv,
    Ffz,
    Twitch,
}

impl EmoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenTv => "7tv",
            Self::Bttv => "bttv",
            Self::Ffz => "ffz",
            Self::Twitch => "twitch",
        }
    }
}

impl std::fmt::Display for EmoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emote {
    pub name: String,
    pub url: String,
    pub source: EmoteSource,
    pub animated: bool,
}

/// Fill a `{width}x{height}` thumbnail template.
pub fn sized_thumbnail(template: &str, width: u32, height: u32) -> String {
    let (w, h) = (width.to_string(), height.to_string());
    template
        .replace("%{width}", &w)
        .replace("%{height}", &h)
        .replace("{width}", &w)
        .replace("{height}", &h)
}

/// Parse a Helix duration such as `1h2m3s` into seconds.
pub fn parse_helix_duration(s: &str) -> Option<u64> {
    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        total += match c {
            'h' => value * 3600,
            'm' => value * 60,
            's' => value,
            _ => return None,
        };
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

pub(crate) fn parse_timestamp(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_empty_cursor_is_end() {
        let page: Page<u8> = Page::new(vec![1], Some(String::new()));
        assert!(page.is_last());
        let page: Page<u8> = Page::new(vec![1], Some("abc".into()));
        assert!(!page.is_last());
    }

    #[test]
    fn test_parse_helix_duration() {
        assert_eq!(parse_helix_duration("1h2m3s"), Some(3723));
        assert_eq!(parse_helix_duration("45s"), Some(45));
        assert_eq!(parse_helix_duration("10m"), Some(600));
        assert_eq!(parse_helix_duration("12"), None);
        assert_eq!(parse_helix_duration("3d"), None);
    }

    #[test]
    fn test_sized_thumbnail() {
        assert_eq!(
            sized_thumbnail("https://x/y-{width}x{height}.jpg", 320, 180),
            "https://x/y-320x180.jpg"
        );
        assert_eq!(
            sized_thumbnail("https://x/y-%{width}x%{height}.jpg", 320, 180),
            "https://x/y-320x180.jpg"
        );
    }

    #[test]
    fn test_broadcast_type_parse() {
        assert_eq!(BroadcastType::parse("Archive"), Some(BroadcastType::Archive));
        assert_eq!(BroadcastType::Archive.gql(), Some("ARCHIVE"));
        assert_eq!(BroadcastType::All.gql(), None);
        assert_eq!(BroadcastType::parse("live"), None);
    }
}
