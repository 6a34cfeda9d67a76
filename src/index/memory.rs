use anyhow::{Result, anyhow};
use std::sync::{Mutex, MutexGuard};

use super::query::{Condition, Criteria, Page, SearchQuery};
use super::{fields, IndexFuture, SearchIndex};
use crate::entries::Entry;

/// In-process index with the same field semantics as the Solr schema:
/// exact fields compare whole values ignoring case, phrase fields match
/// tokens in order within the allowed distance. Writes are staged until
/// `commit`.
pub struct MemoryIndex {
    name: String,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    committed: Vec<Entry>,
    staged: Vec<Entry>,
    next_id: u64,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory index '{}' lock poisoned", self.name))
    }

    /// Committed entries, in insertion order.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.lock()?.committed.clone())
    }

    fn run_query(&self, query: &SearchQuery) -> Result<Page<Entry>> {
        let state = self.lock()?;
        let matches = state
            .committed
            .iter()
            .filter(|entry| query.criteria.iter().all(|criteria| matches(entry, criteria)))
            .collect::<Vec<_>>();
        let total = matches.len() as u64;
        let content = matches
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.size)
            .cloned()
            .collect();
        Ok(Page::new(content, query.page, total))
    }

    fn stage_save(&self, entry: &Entry) -> Result<()> {
        let mut state = self.lock()?;
        let mut entry = entry.clone();
        let id = match entry.id.clone() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                format!("{}-{}", self.name, state.next_id)
            }
        };
        entry.id = Some(id.clone());
        state.staged.retain(|stored| stored.id.as_deref() != Some(id.as_str()));
        state.staged.push(entry);
        Ok(())
    }

    fn stage_delete(&self, id: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.staged.retain(|stored| stored.id.as_deref() != Some(id));
        Ok(())
    }

    fn apply_commit(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.committed = state.staged.clone();
        Ok(())
    }
}

impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn query<'a>(&'a self, query: &'a SearchQuery) -> IndexFuture<'a, Page<Entry>> {
        Box::pin(async move { self.run_query(query) })
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, Option<Entry>> {
        Box::pin(async move {
            let state = self.lock()?;
            Ok(state
                .committed
                .iter()
                .find(|entry| entry.id.as_deref() == Some(id))
                .cloned())
        })
    }

    fn save<'a>(&'a self, entry: &'a Entry) -> IndexFuture<'a, ()> {
        Box::pin(async move { self.stage_save(entry) })
    }

    fn delete_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, ()> {
        Box::pin(async move { self.stage_delete(id) })
    }

    fn commit(&self) -> IndexFuture<'_, ()> {
        Box::pin(async move { self.apply_commit() })
    }
}

fn field_value<'a>(entry: &'a Entry, field: &str) -> Option<&'a str> {
    match field {
        fields::ID => entry.id.as_deref(),
        fields::SOURCE_PHRASE | fields::SOURCE_PHRASE_EXACT => Some(&entry.source_phrase),
        fields::TARGET_PHRASE | fields::TARGET_PHRASE_EXACT => Some(&entry.target_phrase),
        fields::PART_OF_SPEECH => entry.part_of_speech.as_ref().map(|part| part.as_str()),
        fields::DICTIONARY => entry.dictionary.as_deref(),
        fields::AUTHOR => entry.author.as_deref(),
        fields::COMMENTARY => Some(&entry.commentary),
        fields::IMAGE => entry.image_name.as_deref(),
        fields::PRONUNCIATION => entry.pronunciation.as_deref(),
        _ => None,
    }
}

fn matches(entry: &Entry, criteria: &Criteria) -> bool {
    let Some(value) = field_value(entry, criteria.field) else {
        return false;
    };
    match &criteria.condition {
        Condition::ExactPhrase(phrase) | Condition::Equals(phrase) => {
            value.trim().to_lowercase() == phrase.trim().to_lowercase()
        }
        Condition::Proximity { phrase, distance } => {
            within_distance(&tokenize(value), &tokenize(phrase), *distance as usize)
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Phrase tokens appear in order with at most `distance` extra words in total.
/// Stricter than Solr slop, which also accepts reordered tokens within the
/// distance; tests relying on the double must keep phrase order.
fn within_distance(value: &[String], phrase: &[String], distance: usize) -> bool {
    let Some(first) = phrase.first() else {
        return false;
    };
    value
        .iter()
        .enumerate()
        .filter(|(_, token)| *token == first)
        .any(|(start, _)| {
            let mut position = start;
            let mut gaps = 0usize;
            for token in &phrase[1..] {
                let Some(offset) = value[position + 1..].iter().position(|item| item == token)
                else {
                    return false;
                };
                gaps += offset;
                position += offset + 1;
            }
            gaps <= distance
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PageRequest;
    use crate::test_util::entry;

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let index = MemoryIndex::new("enru");
        index.save(&entry("dog", "собака", "alice")).await.unwrap();
        assert!(index.entries().unwrap().is_empty());
        index.commit().await.unwrap();
        let stored = index.entries().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id.as_deref(), Some("enru-1"));
    }

    #[tokio::test]
    async fn save_with_existing_id_replaces_entry() {
        let index = MemoryIndex::new("enru");
        let mut dog = entry("dog", "собака", "alice");
        dog.id = Some("7".to_string());
        index.save(&dog).await.unwrap();
        dog.commentary = "pet".to_string();
        index.save(&dog).await.unwrap();
        index.commit().await.unwrap();
        let stored = index.entries().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].commentary, "pet");
    }

    #[tokio::test]
    async fn proximity_counts_intervening_words() {
        let index = MemoryIndex::new("enru");
        index
            .save(&entry("the big brown dog", "собака", "alice"))
            .await
            .unwrap();
        index.commit().await.unwrap();
        let near = SearchQuery::new(
            Criteria::proximity(fields::SOURCE_PHRASE, "big dog", 1),
            PageRequest::new(0, 10),
        );
        assert_eq!(index.query(&near).await.unwrap().total_elements, 1);
        let too_near = SearchQuery::new(
            Criteria::proximity(fields::SOURCE_PHRASE, "big dog", 0),
            PageRequest::new(0, 10),
        );
        assert_eq!(index.query(&too_near).await.unwrap().total_elements, 0);
    }

    #[test]
    fn tokens_must_keep_order() {
        let value = tokenize("dog big");
        assert!(!within_distance(&value, &tokenize("big dog"), 5));
        assert!(within_distance(&value, &tokenize("DOG"), 0));
        assert!(!within_distance(&value, &[], 0));
    }
}
