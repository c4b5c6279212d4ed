//! Language resolution for the lexical ranker

use crate::error::HybridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages with a lexical index variant in the corpus store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    /// Every supported variant, in resolution order
    pub const ALL: [Language; 2] = [Language::English, Language::Spanish];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }

    pub(crate) fn analyzer_language(&self) -> tantivy::tokenizer::Language {
        match self {
            Language::English => tantivy::tokenizer::Language::English,
            Language::Spanish => tantivy::tokenizer::Language::Spanish,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = HybridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "es" | "spanish" | "español" => Ok(Language::Spanish),
            _ => Err(HybridError::InvalidLanguage {
                lang: s.to_string(),
            }),
        }
    }
}

/// Outcome of resolving the `lang` request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageChoice {
    /// Caller named a supported language
    Explicit(Language),
    /// Caller left `lang` empty; pick among variants by match count
    Infer { default: Language },
}

/// Resolve the requested language.
///
/// Blank input counts as absent. Anything else must name a supported
/// language or the query fails with `InvalidLanguage`.
pub fn resolve_language(
    requested: Option<&str>,
    default: Language,
) -> Result<LanguageChoice, HybridError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(tag) => Ok(LanguageChoice::Explicit(tag.parse()?)),
        None => Ok(LanguageChoice::Infer { default }),
    }
}

/// Choose among per-language match counts.
///
/// The variant with the most matches wins; ties (including no matches at
/// all) go to `default`.
pub fn pick_by_matches(counts: &[(Language, usize)], default: Language) -> Language {
    let best = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let default_count = counts
        .iter()
        .find(|(lang, _)| *lang == default)
        .map(|(_, n)| *n);

    if default_count == Some(best) {
        return default;
    }

    counts
        .iter()
        .find(|(_, n)| *n == best)
        .map(|(lang, _)| *lang)
        .unwrap_or(default)
}
