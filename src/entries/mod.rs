use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{DictionaryError, DictionaryResult};
use crate::index::Page;
use crate::languages::PartOfSpeech;

mod image;
mod service;

pub use image::{ImageUpload, save_entry_image};
pub use service::EntryService;

pub const MAX_FIELD_LENGTH: usize = 256;

/// A dictionary record. The id is assigned by the index when the entry is
/// saved and changes on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub source_phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<PartOfSpeech>,
    #[serde(default)]
    pub target_phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub commentary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
}

impl Entry {
    pub fn swap_phrases(&mut self) {
        std::mem::swap(&mut self.source_phrase, &mut self.target_phrase);
    }

    pub fn trim_phrases(&mut self) {
        self.source_phrase = self.source_phrase.trim().to_string();
        self.target_phrase = self.target_phrase.trim().to_string();
    }

    /// Required fields present and every free-text field within bounds.
    pub fn validate(&self) -> DictionaryResult<()> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("sourcePhrase", &self.source_phrase),
            ("targetPhrase", &self.target_phrase),
            ("commentary", &self.commentary),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{}: must not be empty", name));
            }
        }
        for (name, value) in [
            ("id", self.id.as_deref()),
            ("sourcePhrase", Some(self.source_phrase.as_str())),
            ("targetPhrase", Some(self.target_phrase.as_str())),
            ("dictionary", self.dictionary.as_deref()),
            ("author", self.author.as_deref()),
            ("commentary", Some(self.commentary.as_str())),
            ("imageName", self.image_name.as_deref()),
            ("pronunciation", self.pronunciation.as_deref()),
        ] {
            if let Some(value) = value {
                if value.chars().count() > MAX_FIELD_LENGTH {
                    errors.push(format!(
                        "{}: size must be between 0 and {}",
                        name, MAX_FIELD_LENGTH
                    ));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DictionaryError::Validation(errors.join(", ")))
        }
    }
}

/// Fuzzy search response: one page of entries plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageableResult {
    pub entries: Vec<Entry>,
    pub total_pages: usize,
    pub total_entries: u64,
    pub entries_on_page: usize,
    #[serde(rename = "first")]
    pub is_first: bool,
    #[serde(rename = "last")]
    pub is_last: bool,
    pub has_next: bool,
    pub has_previous: bool,
    pub has_content: bool,
}

impl PageableResult {
    pub fn from_page(page: &Page<Entry>, entries: Vec<Entry>) -> Self {
        Self {
            entries,
            total_pages: page.total_pages(),
            total_entries: page.total_elements,
            entries_on_page: page.number_of_elements(),
            is_first: page.is_first(),
            is_last: page.is_last(),
            has_next: page.has_next(),
            has_previous: page.has_previous(),
            has_content: page.has_content(),
        }
    }
}
