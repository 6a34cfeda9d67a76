use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod detector;

pub use detector::{LanguageDetector, ScriptDetector};

/// Bilingual collection a request is scoped to, named by its source and
/// target language codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguagePair {
    /// English-Russian.
    Enru,
    /// German-Russian.
    Deru,
}

struct PairCodes {
    abbreviation: &'static str,
    source: &'static str,
    target: &'static str,
}

const ENRU: PairCodes = PairCodes {
    abbreviation: "enru",
    source: "en",
    target: "ru",
};

const DERU: PairCodes = PairCodes {
    abbreviation: "deru",
    source: "de",
    target: "ru",
};

impl LanguagePair {
    pub const ALL: [LanguagePair; 2] = [LanguagePair::Enru, LanguagePair::Deru];

    fn codes(&self) -> &'static PairCodes {
        match self {
            LanguagePair::Enru => &ENRU,
            LanguagePair::Deru => &DERU,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        self.codes().abbreviation
    }

    pub fn source_language(&self) -> &'static str {
        self.codes().source
    }

    pub fn target_language(&self) -> &'static str {
        self.codes().target
    }

    /// Concatenation in target-then-source order, e.g. `ruen` for `enru`.
    pub fn reversed_abbreviation(&self) -> String {
        format!("{}{}", self.target_language(), self.source_language())
    }

    /// True when `name` is this pair's abbreviation in either order.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = normalize_code(name);
        name == self.abbreviation() || name == self.reversed_abbreviation()
    }

    /// Resolves a stored collection name in either order back to its pair.
    pub fn from_collection_name(name: &str) -> Option<LanguagePair> {
        LanguagePair::ALL
            .into_iter()
            .find(|pair| pair.matches_name(name))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for LanguagePair {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let code = normalize_code(value);
        LanguagePair::ALL
            .into_iter()
            .find(|pair| pair.abbreviation() == code)
            .ok_or_else(|| anyhow!("unsupported language pair '{}'", value.trim()))
    }
}

impl Serialize for LanguagePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.abbreviation())
    }
}

impl<'de> Deserialize<'de> for LanguagePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Closed part-of-speech vocabulary an entry is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartOfSpeech {
    Noun,
    Adjective,
    Verb,
    AdverbParticiple,
    Participle,
    Numeral,
    Pronoun,
    Adverb,
    Preposition,
    Conjunctive,
    Interjection,
    Particle,
    Parenthesis,
    Conjunction,
    Phrase,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 15] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Adjective,
        PartOfSpeech::Verb,
        PartOfSpeech::AdverbParticiple,
        PartOfSpeech::Participle,
        PartOfSpeech::Numeral,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Adverb,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunctive,
        PartOfSpeech::Interjection,
        PartOfSpeech::Particle,
        PartOfSpeech::Parenthesis,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Phrase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::AdverbParticiple => "adverb-participle",
            PartOfSpeech::Participle => "participle",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunctive => "conjunctive",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Parenthesis => "parenthesis",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Phrase => "phrase",
        }
    }

    pub fn from_name(name: &str) -> Option<PartOfSpeech> {
        let name = normalize_code(name);
        PartOfSpeech::ALL
            .into_iter()
            .find(|part| part.as_str() == name)
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locale tag the morphology service expects, e.g. `en` -> `en_EN`.
pub fn morphology_locale(code: &str) -> String {
    let code = normalize_code(code);
    format!("{}_{}", code, code.to_uppercase())
}

pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
