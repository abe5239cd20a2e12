use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One chapter record exactly as the upstream feed returns it.
///
/// Deserialization never fails on a wrongly-typed field: such fields read as
/// absent so that one bad record cannot sink the page it arrived on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: ChapterAttributes,
    #[serde(default, deserialize_with = "lenient")]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterAttributes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub chapter: Option<f32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub translated_language: Option<String>,
    #[serde(default)]
    pub external_url: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publish_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

impl RawItem {
    /// Declared ordinal; 0 stands for "unknown".
    pub fn declared_number(&self) -> f32 {
        match self.attributes.chapter {
            Some(n) if n.is_finite() => n,
            _ => 0.0,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(&self.attributes.external_url, Some(v) if !v.is_null())
    }

    pub fn language(&self) -> Option<&str> {
        self.attributes.translated_language.as_deref()
    }

    pub fn group_name(&self) -> Option<String> {
        self.relationships
            .iter()
            .find(|r| r.kind == "scanlation_group")
            .and_then(|r| r.attributes.as_ref())
            .and_then(|attrs| attrs.get("name"))
            .and_then(|name| name.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// One slice of the paginated feed.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<RawItem>,
    pub total: usize,
}

impl Page {
    pub fn empty(total: usize) -> Self {
        Self {
            items: Vec::new(),
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedChapter {
    pub id: i64,
    pub name: String,
    pub number: i32,
    pub volume: Option<String>,
    pub branch: Option<String>,
    pub scanlator: Option<String>,
    pub upload_date: Option<DateTime<Utc>>,
    /// Upstream chapter id.
    pub url: String,
}

/// Title record as returned by `/manga/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MangaRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: MangaAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Map<String, Value>,
    /// One single-locale object per alternative title.
    #[serde(default, deserialize_with = "lenient")]
    pub alt_titles: Vec<Map<String, Value>>,
    // upstream sends [] instead of {} when there is no description
    #[serde(default, deserialize_with = "lenient")]
    pub description: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content_rating: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MangaState {
    Ongoing,
    Finished,
    Paused,
    Abandoned,
}

impl MangaState {
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "ongoing" => Some(MangaState::Ongoing),
            "completed" => Some(MangaState::Finished),
            "hiatus" => Some(MangaState::Paused),
            "cancelled" => Some(MangaState::Abandoned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MangaDetails {
    pub id: String,
    pub title: Option<String>,
    pub alt_title: Option<String>,
    pub description: Option<String>,
    pub state: Option<MangaState>,
    pub content_rating: Option<String>,
    pub is_nsfw: bool,
    pub chapters: Vec<ResolvedChapter>,
}

/// Stable 64-bit id for an upstream key, namespaced by source.
pub fn generate_uid(source: &str, key: &str) -> i64 {
    let mut h: i64 = 1125899906842597;
    for c in source.chars().chain(key.chars()) {
        h = h.wrapping_mul(31).wrapping_add(c as i64);
    }
    h
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

// upstream sends ordinals as strings ("12.5"); plain numbers are accepted too
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().map(|n| n as f32),
        serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}
