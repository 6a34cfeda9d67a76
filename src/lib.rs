use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod direction;
pub mod entries;
pub mod error;
pub mod index;
pub mod languages;
pub mod logging;
pub mod matcher;
pub mod morphology;
mod paths;
pub mod server;
pub mod settings;

#[cfg(test)]
mod test_util;

pub use entries::{Entry, EntryService, ImageUpload, PageableResult};
pub use error::{DictionaryError, DictionaryResult};
pub use index::{IndexSelector, MemoryIndex, SearchIndex, SolrIndex};
pub use languages::{LanguagePair, PartOfSpeech};
pub use matcher::{EntryRepository, MatchLimits};

/// Where entries are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Solr,
    /// Empty in-process indexes, lost on exit.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub lang: String,
    pub fuzzy: bool,
    pub page: usize,
    pub settings_path: Option<String>,
    pub backend: Backend,
}

/// Runs one lookup and renders the result as pretty JSON.
pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let input = input.unwrap_or_default();
    let phrase = input.trim();
    if phrase.is_empty() {
        return Err(anyhow!("phrase is empty"));
    }
    let pair: LanguagePair = config.lang.parse()?;
    let service = build_service(&settings, config.backend)?;

    let rendered = if config.fuzzy {
        let result = service.get_all_partial(phrase, pair, config.page).await?;
        serde_json::to_string_pretty(&result)?
    } else {
        let entries = service.get_all_exact(phrase, pair).await?;
        serde_json::to_string_pretty(&entries)?
    };
    Ok(rendered)
}

/// One index per configured direction. A direction that names no known
/// language pair is a configuration error.
pub fn build_indexes(settings: &settings::Settings, backend: Backend) -> Result<IndexSelector> {
    for name in &settings.directions {
        if LanguagePair::from_collection_name(name).is_none() {
            return Err(DictionaryError::IndexNotFound(name.clone()))
                .with_context(|| "settings [search] directions names an unknown language pair");
        }
    }
    let indexes = match backend {
        Backend::Solr => index::SolrIndex::for_directions(&settings.solr_url, &settings.directions),
        Backend::Memory => settings
            .directions
            .iter()
            .map(|name| Arc::new(MemoryIndex::new(name.clone())) as Arc<dyn SearchIndex>)
            .collect(),
    };
    let selector = IndexSelector::new(indexes);
    for pair in selector.missing_pairs() {
        warn!("no index configured for {}; requests for it will fail", pair);
    }
    debug!("indexes: {}", selector.names().join(", "));
    Ok(selector)
}

pub fn build_service(settings: &settings::Settings, backend: Backend) -> Result<EntryService> {
    let selector = build_indexes(settings, backend)?;
    let repository = EntryRepository::new(selector, MatchLimits::from_settings(settings));
    let detector = Arc::new(languages::ScriptDetector::new(&settings.detector_languages));
    let morphology = Arc::new(morphology::RestMorphology::new(
        reqwest::Client::new(),
        settings.morphology_url.clone(),
    ));
    Ok(EntryService::new(
        repository,
        detector,
        morphology,
        settings.image_upload_dir.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_direction_is_fatal() {
        let settings = settings::Settings {
            directions: vec!["enru".to_string(), "frru".to_string()],
            ..settings::Settings::default()
        };
        let err = build_indexes(&settings, Backend::Memory)
            .err()
            .expect("unknown direction rejected");
        assert!(matches!(
            err.downcast_ref::<DictionaryError>(),
            Some(DictionaryError::IndexNotFound(name)) if name == "frru"
        ));
    }

    #[test]
    fn directions_in_either_order_are_accepted() {
        let settings = settings::Settings {
            directions: vec!["ruen".to_string()],
            ..settings::Settings::default()
        };
        let selector = build_indexes(&settings, Backend::Memory).unwrap();
        assert_eq!(selector.names(), vec!["ruen".to_string()]);
        assert_eq!(selector.missing_pairs(), vec![LanguagePair::Deru]);
    }

    #[test]
    fn empty_memory_lookup_renders_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("local.toml");
        std::fs::write(&settings_path, "[search]\ndirections = [\"enru\"]\n").unwrap();
        let output = test_util::with_temp_home(|_| {
            let config = Config {
                lang: "enru".to_string(),
                fuzzy: false,
                page: 0,
                settings_path: Some(settings_path.display().to_string()),
                backend: Backend::Memory,
            };
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(run(config, Some("dog".to_string())))
        });
        assert_eq!(output.unwrap(), "[]");
    }
}
