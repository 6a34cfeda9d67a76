use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::entries::{Entry, EntryService};
use crate::index::{IndexSelector, MemoryIndex, SearchIndex};
use crate::languages::ScriptDetector;
use crate::matcher::{EntryRepository, MatchLimits};
use crate::morphology::{LookupFuture, MorphologyLookup};

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: Mutex<()> = Mutex::new(());
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    let old_base = std::env::var("DICTIONARY_SEARCH_DIR").ok();
    // Env mutation is serialized by HOME_MUTEX.
    unsafe {
        std::env::set_var("HOME", dir.path());
        std::env::remove_var("DICTIONARY_SEARCH_DIR");
    }
    let result = func(dir.path());
    unsafe {
        match old_home {
            Some(old) => std::env::set_var("HOME", old),
            None => std::env::remove_var("HOME"),
        }
        if let Some(old) = old_base {
            std::env::set_var("DICTIONARY_SEARCH_DIR", old);
        }
    }
    result
}

/// Morphology double answering from a fixed table, recording every call.
#[derive(Default)]
pub(crate) struct StaticMorphology {
    tags: HashMap<(String, String), Vec<String>>,
    calls: Mutex<Vec<(String, String)>>,
    failing: Mutex<Vec<String>>,
}

impl StaticMorphology {
    pub(crate) fn with(mut self, phrase: &str, language: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            (phrase.to_string(), language.to_string()),
            tags.iter().map(|tag| tag.to_string()).collect(),
        );
        self
    }

    /// Later lookups of `phrase` fail as an unreachable service would.
    pub(crate) fn fail_on(&self, phrase: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .push(phrase.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl MorphologyLookup for StaticMorphology {
    fn find_parts_of_speech<'a>(
        &'a self,
        phrase: &'a str,
        language: &'a str,
    ) -> LookupFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.calls
                .lock()
                .expect("calls lock")
                .push((phrase.to_string(), language.to_string()));
            if self
                .failing
                .lock()
                .expect("failing lock")
                .iter()
                .any(|failing| failing == phrase)
            {
                return Err(anyhow::anyhow!("morphology down"));
            }
            Ok(self
                .tags
                .get(&(phrase.to_string(), language.to_string()))
                .cloned()
                .unwrap_or_default())
        })
    }
}

pub(crate) fn limits() -> MatchLimits {
    MatchLimits {
        partial_max_distance: 3,
        partial_max_results_per_page: 2,
        exact_max_results: 100,
    }
}

pub(crate) fn detector() -> Arc<ScriptDetector> {
    Arc::new(ScriptDetector::new(&[
        "en".to_string(),
        "ru".to_string(),
        "de".to_string(),
    ]))
}

pub(crate) fn memory_selector(names: &[&str]) -> (IndexSelector, Vec<Arc<MemoryIndex>>) {
    let indexes = names
        .iter()
        .map(|name| Arc::new(MemoryIndex::new(*name)))
        .collect::<Vec<_>>();
    let selector = IndexSelector::new(
        indexes
            .iter()
            .map(|index| index.clone() as Arc<dyn SearchIndex>)
            .collect(),
    );
    (selector, indexes)
}

pub(crate) fn service(
    morphology: Arc<StaticMorphology>,
    image_dir: &std::path::Path,
) -> (EntryService, Arc<MemoryIndex>) {
    let (selector, mut indexes) = memory_selector(&["enru", "deru"]);
    let repository = EntryRepository::new(selector, limits());
    let service = EntryService::new(repository, detector(), morphology, image_dir.to_path_buf());
    (service, indexes.remove(0))
}

pub(crate) fn entry(source: &str, target: &str, author: &str) -> Entry {
    Entry {
        source_phrase: source.to_string(),
        target_phrase: target.to_string(),
        author: Some(author.to_string()),
        commentary: "animal".to_string(),
        ..Entry::default()
    }
}
