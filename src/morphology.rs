use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::entries::Entry;
use crate::error::{Collaborator, CollaboratorContext, DictionaryResult};
use crate::languages::{morphology_locale, LanguagePair, PartOfSpeech};

pub type LookupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Part-of-speech lookup for a phrase written in `language` (two-letter code).
pub trait MorphologyLookup: Send + Sync {
    fn find_parts_of_speech<'a>(
        &'a self,
        phrase: &'a str,
        language: &'a str,
    ) -> LookupFuture<'a, Vec<String>>;
}

/// Client of the remote morphology service.
#[derive(Debug, Clone)]
pub struct RestMorphology {
    client: reqwest::Client,
    url: String,
}

impl RestMorphology {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch(&self, phrase: &str, language: &str) -> Result<Vec<String>> {
        let locale = morphology_locale(language);
        let response = self
            .client
            .get(&self.url)
            .query(&[("phrase", phrase), ("language", locale.as_str())])
            .send()
            .await
            .with_context(|| format!("failed to call morphology service at {}", self.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| "failed to read morphology response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "morphology service error ({}): {}",
                status.as_u16(),
                body
            ));
        }
        parse_tags(&body)
    }
}

impl MorphologyLookup for RestMorphology {
    fn find_parts_of_speech<'a>(
        &'a self,
        phrase: &'a str,
        language: &'a str,
    ) -> LookupFuture<'a, Vec<String>> {
        Box::pin(self.fetch(phrase, language))
    }
}

fn parse_tags(body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).with_context(|| "morphology response is not a JSON array of strings")
}

/// Merges the source-language and target-language classifications of an
/// entry into one tag.
#[derive(Clone)]
pub struct PartOfSpeechResolver {
    lookup: Arc<dyn MorphologyLookup>,
}

impl PartOfSpeechResolver {
    pub fn new(lookup: Arc<dyn MorphologyLookup>) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, entry: &Entry, pair: LanguagePair) -> DictionaryResult<PartOfSpeech> {
        let source = self
            .lookup
            .find_parts_of_speech(&entry.source_phrase, pair.source_language())
            .await
            .via(Collaborator::Morphology)?;
        let target = self
            .lookup
            .find_parts_of_speech(&entry.target_phrase, pair.target_language())
            .await
            .via(Collaborator::Morphology)?;
        let part = resolve_tags(&source, &target);
        debug!(
            "part of speech for '{}'/'{}': {} (source {:?}, target {:?})",
            entry.source_phrase, entry.target_phrase, part, source, target
        );
        Ok(part)
    }
}

/// Source tags agreeing with the target analysis win, in source order.
/// Without agreement the first source tag is used; without any source tag
/// the first target tag; without either, `Phrase`.
pub fn resolve_tags(source: &[String], target: &[String]) -> PartOfSpeech {
    let source = known_tags(source);
    let target = known_tags(target);
    let Some(first_source) = source.first() else {
        return target.first().copied().unwrap_or(PartOfSpeech::Phrase);
    };
    source
        .iter()
        .find(|tag| target.contains(tag))
        .copied()
        .unwrap_or(*first_source)
}

fn known_tags(tags: &[String]) -> Vec<PartOfSpeech> {
    let mut known = Vec::new();
    for part in tags.iter().filter_map(|tag| PartOfSpeech::from_name(tag)) {
        if !known.contains(&part) {
            known.push(part);
        }
    }
    known
}
