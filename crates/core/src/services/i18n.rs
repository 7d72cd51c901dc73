//! Translation catalog and language negotiation.
//!
//! Catalogs are embedded at build time. Lookups fall back from the requested
//! language to English and then to the key itself.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

use aac_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Supported site languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Chinese (default).
    #[default]
    Zh,
    /// English (fallback catalog).
    En,
    /// Japanese.
    Ja,
    /// Korean.
    Ko,
    /// French.
    Fr,
    /// German.
    De,
    /// Portuguese.
    Pt,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Self; 7] = [
        Self::Zh,
        Self::En,
        Self::Ja,
        Self::Ko,
        Self::Fr,
        Self::De,
        Self::Pt,
    ];

    /// Returns the language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Pt => "pt",
        }
    }

    /// Returns the language's name in itself.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::Zh => "中文",
            Self::En => "English",
            Self::Ja => "日本語",
            Self::Ko => "한국어",
            Self::Fr => "Français",
            Self::De => "Deutsch",
            Self::Pt => "Português",
        }
    }

    /// Parse a language tag, ignoring case and region (`en-US`, `ZH_cn`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let primary = value.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.code() == primary)
    }

    /// Pick the preferred supported language from an `Accept-Language` header.
    #[must_use]
    pub fn negotiate(header: &str) -> Option<Self> {
        let mut ranked: Vec<(f32, Self)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let lang = Self::parse(parts.next()?)?;
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok())?;
                (quality > 0.0).then_some((quality, lang))
            })
            .collect();

        // Stable sort keeps header order among equal weights
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.first().map(|(_, lang)| *lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::BadRequest(format!("Unsupported language: {s}")))
    }
}

const EMBEDDED: [(Language, &str); 7] = [
    (Language::Zh, include_str!("../../locales/zh.json")),
    (Language::En, include_str!("../../locales/en.json")),
    (Language::Ja, include_str!("../../locales/ja.json")),
    (Language::Ko, include_str!("../../locales/ko.json")),
    (Language::Fr, include_str!("../../locales/fr.json")),
    (Language::De, include_str!("../../locales/de.json")),
    (Language::Pt, include_str!("../../locales/pt.json")),
];

/// Read-only translation catalog for every supported language.
#[derive(Debug, Clone)]
pub struct Translator {
    catalogs: HashMap<Language, HashMap<String, String>>,
}

impl Translator {
    /// Load the embedded catalogs.
    pub fn load() -> AppResult<Self> {
        let catalogs = EMBEDDED
            .iter()
            .map(|(lang, raw)| {
                serde_json::from_str::<HashMap<String, String>>(raw)
                    .map(|entries| (*lang, entries))
                    .map_err(|e| AppError::Config(format!("Invalid {lang} catalog: {e}")))
            })
            .collect::<AppResult<_>>()?;
        Ok(Self { catalogs })
    }

    /// Build a translator from explicit catalogs.
    #[must_use]
    pub const fn from_catalogs(catalogs: HashMap<Language, HashMap<String, String>>) -> Self {
        Self { catalogs }
    }

    /// Translate `key` into `lang`.
    #[must_use]
    pub fn t<'a>(&'a self, lang: Language, key: &'a str) -> &'a str {
        self.lookup(lang, key)
            .or_else(|| self.lookup(Language::En, key))
            .unwrap_or(key)
    }

    /// Every known key with its translation for `lang`, fallbacks applied.
    #[must_use]
    pub fn catalog(&self, lang: Language) -> BTreeMap<&str, &str> {
        self.keys().into_iter().map(|key| (key, self.t(lang, key))).collect()
    }

    /// Number of keys translated natively (without fallback) for `lang`.
    #[must_use]
    pub fn coverage(&self, lang: Language) -> usize {
        self.catalogs.get(&lang).map_or(0, HashMap::len)
    }

    fn keys(&self) -> BTreeSet<&str> {
        self.catalogs
            .values()
            .flat_map(|entries| entries.keys().map(String::as_str))
            .collect()
    }

    fn lookup(&self, lang: Language, key: &str) -> Option<&str> {
        self.catalogs
            .get(&lang)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_region_and_case() {
        assert_eq!(Language::parse("en-US"), Some(Language::En));
        assert_eq!(Language::parse("ZH_cn"), Some(Language::Zh));
        assert_eq!(Language::parse(" pt "), Some(Language::Pt));
        assert_eq!(Language::parse("es"), None);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_negotiate_uses_quality() {
        assert_eq!(
            Language::negotiate("es;q=1.0, ja;q=0.8, en;q=0.9"),
            Some(Language::En)
        );
        assert_eq!(Language::negotiate("ko, fr"), Some(Language::Ko));
        assert_eq!(Language::negotiate("de;q=0"), None);
        assert_eq!(Language::negotiate(""), None);
    }

    #[test]
    fn test_native_names() {
        let names: Vec<&str> = Language::ALL.iter().map(|l| l.native_name()).collect();
        assert_eq!(
            names,
            ["中文", "English", "日本語", "한국어", "Français", "Deutsch", "Português"]
        );
    }

    #[test]
    fn test_embedded_catalogs_load() {
        let translator = Translator::load().unwrap();
        assert_eq!(translator.t(Language::Zh, "nav.home"), "首页");
        assert_eq!(translator.t(Language::En, "nav.home"), "Home");
        for lang in Language::ALL {
            assert!(translator.coverage(lang) > 0, "{lang} catalog is empty");
        }
    }

    #[test]
    fn test_fallback_to_english_then_key() {
        let translator = Translator::load().unwrap();
        // Only the zh and en catalogs carry the home section titles
        assert_eq!(
            translator.t(Language::Fr, "home.news.title"),
            translator.t(Language::En, "home.news.title")
        );
        assert_eq!(translator.t(Language::Ja, "no.such.key"), "no.such.key");
    }

    #[test]
    fn test_explicit_catalogs_fall_back_per_key() {
        let catalog = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>()
        };
        let translator = Translator::from_catalogs(HashMap::from([
            (Language::En, catalog(&[("nav.home", "Home"), ("nav.news", "News")])),
            (Language::Ja, catalog(&[("nav.home", "ホーム"), ("nav.news", "")])),
        ]));

        assert_eq!(translator.t(Language::Ja, "nav.home"), "ホーム");
        // Empty entries count as missing.
        assert_eq!(translator.t(Language::Ja, "nav.news"), "News");
        assert_eq!(translator.t(Language::Ko, "nav.home"), "Home");
        assert_eq!(translator.t(Language::Ja, "nav.contact"), "nav.contact");
        assert_eq!(translator.coverage(Language::Ko), 0);
        assert_eq!(translator.catalog(Language::Ja).len(), 2);
    }

    #[test]
    fn test_catalog_is_complete_for_every_language() {
        let translator = Translator::load().unwrap();
        let zh = translator.catalog(Language::Zh);
        let de = translator.catalog(Language::De);
        assert_eq!(zh.len(), de.len());
        assert_ne!(zh.get("nav.about"), de.get("nav.about"));
    }
}
