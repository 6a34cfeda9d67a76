use std::sync::Arc;
use tracing::debug;

use crate::entries::Entry;
use crate::error::{Collaborator, CollaboratorContext, DictionaryResult};
use crate::languages::{LanguageDetector, LanguagePair};

/// Aligns phrase order with the language pair using the detector.
#[derive(Clone)]
pub struct DirectionResolver {
    detector: Arc<dyn LanguageDetector>,
}

impl DirectionResolver {
    pub fn new(detector: Arc<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    fn is_written_in(&self, text: &str, language: &str) -> DictionaryResult<bool> {
        let detected = self
            .detector
            .detect(text)
            .via(Collaborator::Detector)?;
        Ok(detected.as_deref() == Some(language))
    }

    /// Swaps every result when the searched phrase is not written in the
    /// pair's source language. The detector runs once per call.
    pub fn normalize_results(
        &self,
        phrase: &str,
        pair: LanguagePair,
        mut entries: Vec<Entry>,
    ) -> DictionaryResult<Vec<Entry>> {
        if entries.is_empty() || self.is_written_in(phrase, pair.source_language())? {
            return Ok(entries);
        }
        debug!(
            "'{}' is not {}, swapping {} results",
            phrase,
            pair.source_language(),
            entries.len()
        );
        entries.iter_mut().for_each(Entry::swap_phrases);
        Ok(entries)
    }

    /// Swaps the entry's phrases only when neither phrase is written in the
    /// language its field expects.
    pub fn normalize_entry(&self, entry: &mut Entry, pair: LanguagePair) -> DictionaryResult<()> {
        let source_matches = self.is_written_in(&entry.source_phrase, pair.source_language())?;
        let target_matches = self.is_written_in(&entry.target_phrase, pair.target_language())?;
        if !source_matches && !target_matches {
            debug!(
                "entry '{}'/'{}' is stored reversed for {}, swapping",
                entry.source_phrase, entry.target_phrase, pair
            );
            entry.swap_phrases();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DictionaryError;
    use crate::test_util::{detector, entry};
    use anyhow::{Result, anyhow};

    struct Silent;

    impl LanguageDetector for Silent {
        fn detect(&self, _text: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct Broken;

    impl LanguageDetector for Broken {
        fn detect(&self, _text: &str) -> Result<Option<String>> {
            Err(anyhow!("model not loaded"))
        }
    }

    fn results() -> Vec<Entry> {
        vec![
            entry("собака", "dog", "alice"),
            entry("большая собака", "big dog", "alice"),
        ]
    }

    #[test]
    fn results_are_swapped_when_phrase_is_not_source_language() {
        let resolver = DirectionResolver::new(detector());
        let normalized = resolver
            .normalize_results("собака", LanguagePair::Enru, results())
            .unwrap();
        assert_eq!(normalized[0].source_phrase, "dog");
        assert_eq!(normalized[1].source_phrase, "big dog");
        assert_eq!(normalized[1].target_phrase, "большая собака");
    }

    #[test]
    fn results_pass_through_for_source_language_phrase() {
        let resolver = DirectionResolver::new(detector());
        let normalized = resolver
            .normalize_results("dog", LanguagePair::Enru, results())
            .unwrap();
        assert_eq!(normalized, results());
    }

    #[test]
    fn absent_detection_counts_as_mismatch() {
        let resolver = DirectionResolver::new(Arc::new(Silent));
        let normalized = resolver
            .normalize_results("dog", LanguagePair::Enru, results())
            .unwrap();
        assert_eq!(normalized[0].source_phrase, "dog");

        let mut dog = entry("dog", "собака", "alice");
        resolver.normalize_entry(&mut dog, LanguagePair::Enru).unwrap();
        assert_eq!(dog.source_phrase, "собака");
    }

    #[test]
    fn reversed_entry_is_swapped() {
        let resolver = DirectionResolver::new(detector());
        let mut dog = entry("собака", "dog", "alice");
        resolver.normalize_entry(&mut dog, LanguagePair::Enru).unwrap();
        assert_eq!(dog.source_phrase, "dog");
        assert_eq!(dog.target_phrase, "собака");
    }

    #[test]
    fn one_matching_field_keeps_entry_order() {
        let resolver = DirectionResolver::new(detector());
        let mut mixed = entry("dog", "dog", "alice");
        resolver.normalize_entry(&mut mixed, LanguagePair::Enru).unwrap();
        assert_eq!(mixed.source_phrase, "dog");

        let mut hund = entry("Hund", "собака", "alice");
        resolver.normalize_entry(&mut hund, LanguagePair::Deru).unwrap();
        assert_eq!(hund.source_phrase, "Hund");
    }

    #[test]
    fn detector_failure_is_a_collaborator_error() {
        let resolver = DirectionResolver::new(Arc::new(Broken));
        let err = resolver
            .normalize_results("dog", LanguagePair::Enru, results())
            .unwrap_err();
        assert!(matches!(
            err,
            DictionaryError::Collaborator {
                collaborator: Collaborator::Detector,
                ..
            }
        ));
    }
}
