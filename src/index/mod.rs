use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::entries::Entry;
use crate::error::{DictionaryError, DictionaryResult};
use crate::languages::LanguagePair;

pub mod escape;
pub mod memory;
mod query;
pub mod solr;

pub use escape::escape_phrase;
pub use memory::MemoryIndex;
pub use query::{
    exact_expression, proximity_expression, Condition, Criteria, Page, PageRequest, SearchQuery,
};
pub use solr::SolrIndex;

/// Stored field names of an entry document.
pub mod fields {
    pub const ID: &str = "id";
    /// Tokenized source phrase, used for proximity search.
    pub const SOURCE_PHRASE: &str = "sourcePhrase";
    /// Untokenized source phrase, used for exact search.
    pub const SOURCE_PHRASE_EXACT: &str = "sourcePhraseExact";
    pub const TARGET_PHRASE: &str = "targetPhrase";
    pub const TARGET_PHRASE_EXACT: &str = "targetPhraseExact";
    pub const DICTIONARY: &str = "dictionary";
    pub const AUTHOR: &str = "author";
    pub const PART_OF_SPEECH: &str = "partOfSpeech";
    pub const COMMENTARY: &str = "commentary";
    pub const IMAGE: &str = "image";
    pub const DATE: &str = "date";
    pub const PRONUNCIATION: &str = "pronunciation";
}

pub type IndexFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A named collection of entries. Writes become visible after `commit`.
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;
    fn query<'a>(&'a self, query: &'a SearchQuery) -> IndexFuture<'a, Page<Entry>>;
    fn get_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, Option<Entry>>;
    /// Stores the entry; the index assigns an id when the entry has none.
    fn save<'a>(&'a self, entry: &'a Entry) -> IndexFuture<'a, ()>;
    fn delete_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, ()>;
    fn commit(&self) -> IndexFuture<'_, ()>;
}

/// Configured indexes, looked up by language pair in either stored order.
#[derive(Clone, Default)]
pub struct IndexSelector {
    indexes: Vec<Arc<dyn SearchIndex>>,
}

impl IndexSelector {
    pub fn new(indexes: Vec<Arc<dyn SearchIndex>>) -> Self {
        Self { indexes }
    }

    pub fn select(&self, pair: LanguagePair) -> DictionaryResult<&dyn SearchIndex> {
        self.indexes
            .iter()
            .find(|index| pair.matches_name(index.name()))
            .map(|index| &**index)
            .ok_or_else(|| DictionaryError::IndexNotFound(pair.abbreviation().to_string()))
    }

    /// Pairs that have no index among the configured ones.
    pub fn missing_pairs(&self) -> Vec<LanguagePair> {
        LanguagePair::ALL
            .into_iter()
            .filter(|pair| self.select(*pair).is_err())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| index.name().to_string())
            .collect()
    }
}
