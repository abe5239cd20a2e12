//! Locale handling for multi-language upstream fields.
//!
//! Upstream text fields (titles, descriptions) arrive as JSON objects keyed by
//! language tag, and the same language may be keyed as `pt`, `pt-br` or
//! `pt-BR` depending on who entered it. Lookups here treat those spellings as
//! one key.

use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    language: String,
    region: Option<String>,
}

impl LanguageTag {
    pub fn new(language: &str, region: Option<&str>) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            region: region.map(|r| r.to_ascii_uppercase()),
        }
    }

    /// Accepts `en`, `pt-BR`, `pt_br`, `es-la`. Returns `None` for blank input.
    pub fn parse(tag: &str) -> Option<Self> {
        let mut parts = tag.trim().split(['-', '_']);
        let language = parts.next().filter(|l| !l.is_empty())?;
        if !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let region = parts.next().filter(|r| !r.is_empty());
        Some(Self::new(language, region))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Full `language-REGION` form, or just the language when there is no region.
    pub fn tag(&self) -> String {
        match &self.region {
            Some(region) => format!("{}-{}", self.language, region),
            None => self.language.clone(),
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Picks the best string out of a locale-keyed text object.
#[derive(Debug, Clone)]
pub struct LocaleSelector {
    preferred: Vec<LanguageTag>,
    fallback: String,
}

impl LocaleSelector {
    pub fn new(preferred: Vec<LanguageTag>, fallback: impl Into<String>) -> Self {
        Self {
            preferred,
            fallback: fallback.into(),
        }
    }

    pub fn preferred(&self) -> &[LanguageTag] {
        &self.preferred
    }

    pub fn select<'a>(&self, texts: &'a Map<String, Value>) -> Option<&'a str> {
        select_text(texts, &self.preferred, &self.fallback)
    }
}

/// Preferred locales in rank order (language, then language-region), then the
/// fallback tag, then whatever string comes first in the object.
pub fn select_text<'a>(
    texts: &'a Map<String, Value>,
    preferred: &[LanguageTag],
    fallback: &str,
) -> Option<&'a str> {
    for locale in preferred {
        if let Some(text) = lookup(texts, locale.language()) {
            return Some(text);
        }
        if locale.region().is_some() {
            if let Some(text) = lookup(texts, &locale.tag()) {
                return Some(text);
            }
        }
    }
    lookup(texts, fallback).or_else(|| texts.values().find_map(non_empty_str))
}

fn lookup<'a>(texts: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    if let Some(text) = texts.get(key).and_then(non_empty_str) {
        return Some(text);
    }
    let wanted = normalize_key(key);
    texts
        .iter()
        .find(|(k, _)| normalize_key(k) == wanted)
        .and_then(|(_, v)| non_empty_str(v))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// Native, title-cased name of a language tag, used as a branch label.
pub fn display_name(tag: &str) -> String {
    let Some(parsed) = LanguageTag::parse(tag) else {
        return tag.to_string();
    };
    let full = parsed.tag().to_ascii_lowercase();
    if let Some(name) = native_name(&full) {
        return title_case(name);
    }
    match (native_name(parsed.language()), parsed.region()) {
        (Some(name), Some(region)) => format!("{} ({})", title_case(name), region),
        (Some(name), None) => title_case(name),
        (None, _) => tag.to_string(),
    }
}

fn native_name(tag: &str) -> Option<&'static str> {
    let name = match tag {
        "ar" => "العربية",
        "bg" => "български",
        "bn" => "বাংলা",
        "ca" => "català",
        "cs" => "čeština",
        "da" => "dansk",
        "de" => "Deutsch",
        "el" => "Ελληνικά",
        "en" => "English",
        "es" => "español",
        "es-la" => "español (Latinoamérica)",
        "fa" => "فارسی",
        "fi" => "suomi",
        "fr" => "français",
        "he" => "עברית",
        "hi" => "हिन्दी",
        "hu" => "magyar",
        "id" => "Indonesia",
        "it" => "italiano",
        "ja" => "日本語",
        "ja-ro" => "日本語 (Rōmaji)",
        "ko" => "한국어",
        "ko-ro" => "한국어 (Romaja)",
        "lt" => "lietuvių",
        "ms" => "Melayu",
        "my" => "မြန်မာ",
        "nl" => "Nederlands",
        "no" => "norsk",
        "pl" => "polski",
        "pt" => "português",
        "pt-br" => "português (Brasil)",
        "ro" => "română",
        "ru" => "русский",
        "sv" => "svenska",
        "th" => "ไทย",
        "tl" => "Filipino",
        "tr" => "Türkçe",
        "uk" => "українська",
        "vi" => "Tiếng Việt",
        "zh" => "中文",
        "zh-hk" => "中文 (香港)",
        "zh-ro" => "中文 (Pinyin)",
        _ => return None,
    };
    Some(name)
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
