use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::image::{ImageUpload, save_entry_image};
use super::{Entry, PageableResult};
use crate::direction::DirectionResolver;
use crate::error::{Collaborator, CollaboratorContext, DictionaryError, DictionaryResult};
use crate::languages::{LanguageDetector, LanguagePair, PartOfSpeech};
use crate::matcher::EntryRepository;
use crate::morphology::{MorphologyLookup, PartOfSpeechResolver};

/// Search and write workflow over the configured indexes.
#[derive(Clone)]
pub struct EntryService {
    repository: EntryRepository,
    direction: DirectionResolver,
    parts_of_speech: PartOfSpeechResolver,
    image_dir: PathBuf,
}

impl EntryService {
    pub fn new(
        repository: EntryRepository,
        detector: Arc<dyn LanguageDetector>,
        morphology: Arc<dyn MorphologyLookup>,
        image_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            direction: DirectionResolver::new(detector),
            parts_of_speech: PartOfSpeechResolver::new(morphology),
            image_dir,
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Fuzzy search. `page` is zero-based; the page size comes from settings.
    pub async fn get_all_partial(
        &self,
        phrase: &str,
        pair: LanguagePair,
        page: usize,
    ) -> DictionaryResult<PageableResult> {
        let found = self
            .repository
            .find_partially_matched(phrase, pair, page)
            .await?;
        let entries = self
            .direction
            .normalize_results(phrase, pair, found.content.clone())?;
        Ok(PageableResult::from_page(&found, entries))
    }

    pub async fn get_all_exact(
        &self,
        phrase: &str,
        pair: LanguagePair,
    ) -> DictionaryResult<Vec<Entry>> {
        let found = self.repository.find_exactly_matched(phrase, pair).await?;
        self.direction.normalize_results(phrase, pair, found.content)
    }

    pub async fn get(&self, entry_id: &str, pair: LanguagePair) -> DictionaryResult<Option<Entry>> {
        self.repository.get(entry_id, pair).await
    }

    pub async fn get_by_phrases(
        &self,
        source_phrase: &str,
        target_phrase: &str,
        part_of_speech: PartOfSpeech,
        pair: LanguagePair,
    ) -> DictionaryResult<Option<Entry>> {
        self.repository
            .get_by_phrases(source_phrase, target_phrase, part_of_speech, pair)
            .await
    }

    /// Normalizes, classifies and stores a new entry, returning it with the
    /// id the index assigned.
    pub async fn create(&self, mut entry: Entry, pair: LanguagePair) -> DictionaryResult<Entry> {
        entry.validate()?;
        self.prepare(&mut entry, pair).await?;
        self.repository.save_entry(&entry, pair).await?;
        let stored = self.refetch(&entry, pair).await?;
        info!(
            "created entry {} in {}",
            stored.id.as_deref().unwrap_or_default(),
            pair
        );
        Ok(stored)
    }

    /// Replaces a stored entry owned by the same author. The replacement is
    /// stored under a new id; the old document is removed only once the
    /// replacement is committed.
    pub async fn update(&self, mut entry: Entry, pair: LanguagePair) -> DictionaryResult<Entry> {
        entry.validate()?;
        let entry_id = entry
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DictionaryError::Validation("id: must not be empty".to_string()))?;
        let existing = self.fetch_existing(&entry_id, pair).await?;
        if existing.author != entry.author {
            return Err(DictionaryError::Authorization(format!(
                "entry {} belongs to {}",
                entry_id,
                existing.author.as_deref().unwrap_or("nobody")
            )));
        }
        self.prepare(&mut entry, pair).await?;
        self.repository.save_entry(&entry, pair).await?;
        self.repository.delete_entry(&entry_id, pair).await?;
        debug!("replaced entry {} in {}", entry_id, pair);
        self.refetch(&entry, pair).await
    }

    /// Stores the uploaded image, records its name on the stored entry and
    /// runs `update` with it. An empty upload clears the image name.
    pub async fn update_with_image(
        &self,
        entry_id: &str,
        pair: LanguagePair,
        upload: &ImageUpload,
    ) -> DictionaryResult<Entry> {
        let mut existing = self.fetch_existing(entry_id, pair).await?;
        let image_name = save_entry_image(upload, &self.image_dir).via(Collaborator::ImageStorage)?;
        if let Some(name) = &image_name {
            info!("stored image {} for entry {}", name, entry_id);
        }
        existing.image_name = image_name.clone();
        let result = self.update(existing, pair).await;
        if let (Err(_), Some(name)) = (&result, &image_name) {
            let path = self.image_dir.join(name);
            if let Err(err) = std::fs::remove_file(&path) {
                warn!("failed to remove image {}: {}", path.display(), err);
            }
        }
        result
    }

    /// Deleting an id the index does not hold succeeds.
    pub async fn delete(&self, entry_id: &str, pair: LanguagePair) -> DictionaryResult<()> {
        self.repository.delete_entry(entry_id, pair).await
    }

    /// Clears the id, fixes the direction, classifies and stamps the entry.
    async fn prepare(&self, entry: &mut Entry, pair: LanguagePair) -> DictionaryResult<()> {
        entry.id = None;
        self.direction.normalize_entry(entry, pair)?;
        let part_of_speech = self.parts_of_speech.resolve(entry, pair).await?;
        entry.part_of_speech = Some(part_of_speech);
        entry.trim_phrases();
        entry.date = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    /// Reads back a saved entry to learn the id the index assigned.
    async fn refetch(&self, entry: &Entry, pair: LanguagePair) -> DictionaryResult<Entry> {
        let part_of_speech = entry.part_of_speech.unwrap_or(PartOfSpeech::Phrase);
        self.repository
            .get_by_phrases(
                &entry.source_phrase,
                &entry.target_phrase,
                part_of_speech,
                pair,
            )
            .await?
            .ok_or_else(|| {
                DictionaryError::EntryNotFound(format!(
                    "{} / {} after save",
                    entry.source_phrase, entry.target_phrase
                ))
            })
    }

    async fn fetch_existing(&self, entry_id: &str, pair: LanguagePair) -> DictionaryResult<Entry> {
        self.repository
            .get(entry_id, pair)
            .await?
            .ok_or_else(|| DictionaryError::EntryNotFound(entry_id.to_string()))
    }
}
