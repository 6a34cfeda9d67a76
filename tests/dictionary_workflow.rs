use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use dictionary_search_rust::languages::LanguageDetector;
use dictionary_search_rust::morphology::{LookupFuture, MorphologyLookup};
use dictionary_search_rust::{
    DictionaryError, Entry, EntryRepository, EntryService, IndexSelector, LanguagePair,
    MatchLimits, MemoryIndex, PartOfSpeech, SearchIndex,
};

struct ScriptedDetector(HashMap<&'static str, &'static str>);

impl LanguageDetector for ScriptedDetector {
    fn detect(&self, text: &str) -> Result<Option<String>> {
        Ok(self.0.get(text.trim()).map(|code| code.to_string()))
    }
}

struct ScriptedMorphology(Vec<(&'static str, &'static str, Vec<&'static str>)>);

impl MorphologyLookup for ScriptedMorphology {
    fn find_parts_of_speech<'a>(
        &'a self,
        phrase: &'a str,
        language: &'a str,
    ) -> LookupFuture<'a, Vec<String>> {
        let tags: Vec<String> = self
            .0
            .iter()
            .find(|(known, code, _)| *known == phrase.trim() && *code == language)
            .map(|(_, _, tags)| tags.iter().map(|tag| tag.to_string()).collect())
            .unwrap_or_default();
        Box::pin(async move { Ok(tags) })
    }
}

fn workflow(index_names: &[&str]) -> (EntryService, Vec<Arc<MemoryIndex>>) {
    let indexes = index_names
        .iter()
        .map(|name| Arc::new(MemoryIndex::new(*name)))
        .collect::<Vec<_>>();
    let selector = IndexSelector::new(
        indexes
            .iter()
            .map(|index| index.clone() as Arc<dyn SearchIndex>)
            .collect(),
    );
    let limits = MatchLimits {
        partial_max_distance: 3,
        partial_max_results_per_page: 20,
        exact_max_results: 100,
    };
    let detector = ScriptedDetector(HashMap::from([
        ("dog", "en"),
        ("big dog", "en"),
        ("Hund", "de"),
        ("собака", "ru"),
        ("большая собака", "ru"),
    ]));
    let morphology = ScriptedMorphology(vec![
        ("dog", "en", vec!["noun", "verb"]),
        ("собака", "ru", vec!["noun"]),
        ("Hund", "de", vec!["noun"]),
    ]);
    let images = std::env::temp_dir().join("dictionary-search-rust-tests");
    let service = EntryService::new(
        EntryRepository::new(selector, limits),
        Arc::new(detector),
        Arc::new(morphology),
        images,
    );
    (service, indexes)
}

fn entry(source: &str, target: &str, author: &str) -> Entry {
    Entry {
        source_phrase: source.to_string(),
        target_phrase: target.to_string(),
        author: Some(author.to_string()),
        commentary: "animal".to_string(),
        ..Entry::default()
    }
}

#[tokio::test]
async fn created_entry_round_trips_through_search() {
    let (service, _) = workflow(&["enru", "deru"]);
    let created = service
        .create(entry("dog", "собака", "alice"), LanguagePair::Enru)
        .await
        .unwrap();
    assert_eq!(created.part_of_speech, Some(PartOfSpeech::Noun));

    let id = created.id.clone().unwrap();
    let stored = service.get(&id, LanguagePair::Enru).await.unwrap().unwrap();
    assert_eq!(stored.part_of_speech, Some(PartOfSpeech::Noun));

    let exact = service.get_all_exact("dog", LanguagePair::Enru).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].source_phrase, "dog");

    let by_phrases = service
        .get_by_phrases("dog", "собака", PartOfSpeech::Noun, LanguagePair::Enru)
        .await
        .unwrap();
    assert_eq!(by_phrases.and_then(|entry| entry.id), Some(id));
}

#[tokio::test]
async fn reverse_named_index_serves_its_pair() {
    let (service, indexes) = workflow(&["ruen", "rude"]);
    service
        .create(entry("собака", "Hund", "alice"), LanguagePair::Deru)
        .await
        .unwrap();
    let stored = indexes[1].entries().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source_phrase, "Hund");
    assert!(indexes[0].entries().unwrap().is_empty());

    let swapped = service
        .get_all_exact("собака", LanguagePair::Deru)
        .await
        .unwrap();
    assert_eq!(swapped[0].source_phrase, "собака");
    assert_eq!(swapped[0].target_phrase, "Hund");
}

#[tokio::test]
async fn fuzzy_search_wraps_page_metadata() {
    let (service, _) = workflow(&["enru"]);
    for (source, target) in [("dog", "собака"), ("big dog", "большая собака")] {
        service
            .create(entry(source, target, "alice"), LanguagePair::Enru)
            .await
            .unwrap();
    }
    let result = service
        .get_all_partial("dog", LanguagePair::Enru, 0)
        .await
        .unwrap();
    let mut value = serde_json::to_value(&result).unwrap();
    let entries = value.as_object_mut().unwrap().remove("entries").unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 2);
    insta::assert_json_snapshot!(value, @r#"
    {
      "entriesOnPage": 2,
      "first": true,
      "hasContent": true,
      "hasNext": false,
      "hasPrevious": false,
      "last": true,
      "totalEntries": 2,
      "totalPages": 1
    }
    "#);
}

#[tokio::test]
async fn other_author_cannot_update() {
    let (service, indexes) = workflow(&["enru"]);
    let created = service
        .create(entry("dog", "собака", "alice"), LanguagePair::Enru)
        .await
        .unwrap();
    let mut forged = created.clone();
    forged.author = Some("bob".to_string());
    let err = service.update(forged, LanguagePair::Enru).await.unwrap_err();
    assert!(matches!(err, DictionaryError::Authorization(_)));
    assert_eq!(indexes[0].entries().unwrap(), vec![created]);
}

#[tokio::test]
async fn pair_without_index_is_reported() {
    let (service, _) = workflow(&["enru"]);
    let err = service
        .get_all_exact("Hund", LanguagePair::Deru)
        .await
        .unwrap_err();
    assert!(matches!(err, DictionaryError::IndexNotFound(pair) if pair == "deru"));
}
