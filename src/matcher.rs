use tracing::debug;

use crate::entries::Entry;
use crate::error::{Collaborator, CollaboratorContext, DictionaryResult};
use crate::index::{fields, Criteria, IndexSelector, Page, PageRequest, SearchIndex, SearchQuery};
use crate::languages::{LanguagePair, PartOfSpeech};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    /// Words allowed between phrase tokens in a partial match.
    pub partial_max_distance: u32,
    /// Page size of every partial match, whatever the caller asked for.
    pub partial_max_results_per_page: usize,
    pub exact_max_results: usize,
}

impl MatchLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            partial_max_distance: settings.partial_max_distance,
            partial_max_results_per_page: settings.partial_max_results_per_page,
            exact_max_results: settings.exact_max_results,
        }
    }
}

/// Reads and writes entries of the index selected for a language pair.
#[derive(Clone)]
pub struct EntryRepository {
    selector: IndexSelector,
    limits: MatchLimits,
}

impl EntryRepository {
    pub fn new(selector: IndexSelector, limits: MatchLimits) -> Self {
        Self { selector, limits }
    }

    pub fn limits(&self) -> MatchLimits {
        self.limits
    }

    /// Entries whose whole source phrase equals `phrase`; the target phrase is
    /// tried only when the source yields nothing.
    pub async fn find_exactly_matched(
        &self,
        phrase: &str,
        pair: LanguagePair,
    ) -> DictionaryResult<Page<Entry>> {
        let page = PageRequest::new(0, self.limits.exact_max_results);
        self.find_with_fallback(
            Criteria::exact(fields::SOURCE_PHRASE_EXACT, phrase),
            Criteria::exact(fields::TARGET_PHRASE_EXACT, phrase),
            pair,
            page,
        )
        .await
    }

    /// Proximity match on the source phrase, then on the target phrase. Keeps
    /// the caller's page number; the page size is always the configured one.
    pub async fn find_partially_matched(
        &self,
        phrase: &str,
        pair: LanguagePair,
        page_number: usize,
    ) -> DictionaryResult<Page<Entry>> {
        let distance = self.limits.partial_max_distance;
        let page = PageRequest::new(page_number, self.limits.partial_max_results_per_page);
        self.find_with_fallback(
            Criteria::proximity(fields::SOURCE_PHRASE, phrase, distance),
            Criteria::proximity(fields::TARGET_PHRASE, phrase, distance),
            pair,
            page,
        )
        .await
    }

    async fn find_with_fallback(
        &self,
        primary: Criteria,
        fallback: Criteria,
        pair: LanguagePair,
        page: PageRequest,
    ) -> DictionaryResult<Page<Entry>> {
        let index = self.selector.select(pair)?;
        let results = run_query(index, SearchQuery::new(primary, page)).await?;
        if results.total_elements > 0 {
            return Ok(results);
        }
        debug!(
            "no match on {}, retrying on {}",
            index.name(),
            fallback.field
        );
        run_query(index, SearchQuery::new(fallback, page)).await
    }

    pub async fn get(&self, entry_id: &str, pair: LanguagePair) -> DictionaryResult<Option<Entry>> {
        let index = self.selector.select(pair)?;
        index.get_by_id(entry_id).await.via(Collaborator::Index)
    }

    /// Entry whose trimmed phrases both equal the given ones. The exact
    /// fields ignore case, so hits are filtered for the stored spelling.
    pub async fn get_by_phrases(
        &self,
        source_phrase: &str,
        target_phrase: &str,
        part_of_speech: PartOfSpeech,
        pair: LanguagePair,
    ) -> DictionaryResult<Option<Entry>> {
        let index = self.selector.select(pair)?;
        let (source_phrase, target_phrase) = (source_phrase.trim(), target_phrase.trim());
        let query = phrases_query(
            source_phrase,
            target_phrase,
            part_of_speech,
            self.limits.exact_max_results,
        );
        let page = run_query(index, query).await?;
        Ok(page.content.into_iter().find(|entry| {
            entry.source_phrase.trim() == source_phrase
                && entry.target_phrase.trim() == target_phrase
        }))
    }

    pub async fn save_entry(&self, entry: &Entry, pair: LanguagePair) -> DictionaryResult<()> {
        let index = self.selector.select(pair)?;
        index.save(entry).await.via(Collaborator::Index)?;
        index.commit().await.via(Collaborator::Index)?;
        debug!("saved entry '{}' into {}", entry.source_phrase, index.name());
        Ok(())
    }

    pub async fn delete_entry(&self, entry_id: &str, pair: LanguagePair) -> DictionaryResult<()> {
        let index = self.selector.select(pair)?;
        index.delete_by_id(entry_id).await.via(Collaborator::Index)?;
        index.commit().await.via(Collaborator::Index)?;
        debug!("deleted entry {} from {}", entry_id, index.name());
        Ok(())
    }
}

fn phrases_query(
    source_phrase: &str,
    target_phrase: &str,
    part_of_speech: PartOfSpeech,
    size: usize,
) -> SearchQuery {
    SearchQuery::new(
        Criteria::exact(fields::SOURCE_PHRASE_EXACT, source_phrase),
        PageRequest::new(0, size),
    )
    .and(Criteria::exact(fields::TARGET_PHRASE_EXACT, target_phrase))
    .and(Criteria::equals(fields::PART_OF_SPEECH, part_of_speech.as_str()))
}

async fn run_query(index: &dyn SearchIndex, query: SearchQuery) -> DictionaryResult<Page<Entry>> {
    debug!(
        "querying {} with {} (page {}, size {})",
        index.name(),
        query.to_query_string(),
        query.page.page,
        query.page.size
    );
    index.query(&query).await.via(Collaborator::Index)
}
