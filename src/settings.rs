use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    /// Solr base URL; each direction is a core below it.
    pub solr_url: String,
    /// Index (core) names, one per language pair in either order.
    pub directions: Vec<String>,
    pub partial_max_distance: u32,
    pub partial_max_results_per_page: usize,
    pub exact_max_results: usize,
    pub morphology_url: String,
    pub detector_languages: Vec<String>,
    pub server_addr: String,
    pub image_upload_dir: PathBuf,
    pub image_upload_context: String,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solr_url: "http://localhost:8983/solr".to_string(),
            directions: vec!["enru".to_string(), "deru".to_string()],
            partial_max_distance: 3,
            partial_max_results_per_page: 20,
            exact_max_results: 100,
            morphology_url: "http://localhost:8081/part-of-speech".to_string(),
            detector_languages: vec!["en".to_string(), "ru".to_string(), "de".to_string()],
            server_addr: "127.0.0.1:8080".to_string(),
            image_upload_dir: paths::default_image_dir(),
            image_upload_context: "/images".to_string(),
            verbose: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    search: Option<SearchSettings>,
    morphology: Option<MorphologySettings>,
    detector: Option<DetectorSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchSettings {
    solr_url: Option<String>,
    directions: Option<Vec<String>>,
    partial_max_distance: Option<u32>,
    partial_max_results_per_page: Option<usize>,
    exact_max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct MorphologySettings {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectorSettings {
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    image_upload_dir: Option<String>,
    image_upload_context: Option<String>,
    verbose: Option<bool>,
}

/// Loads defaults, then overlays every settings file found, later files
/// winning: `./settings.toml`, `./settings.local.toml`, the same two under the
/// settings directory, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(dir) = paths::settings_dir() {
        ordered_paths.push(dir.join("settings.toml"));
        ordered_paths.push(dir.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(search) = incoming.search {
            if let Some(url) = non_blank(search.solr_url) {
                self.solr_url = url.trim_end_matches('/').to_string();
            }
            if let Some(directions) = search.directions {
                let directions = directions
                    .into_iter()
                    .map(|name| name.trim().to_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>();
                if !directions.is_empty() {
                    self.directions = directions;
                }
            }
            if let Some(distance) = search.partial_max_distance {
                if distance > 0 {
                    self.partial_max_distance = distance;
                }
            }
            if let Some(limit) = search.partial_max_results_per_page {
                if limit > 0 {
                    self.partial_max_results_per_page = limit;
                }
            }
            if let Some(limit) = search.exact_max_results {
                if limit > 0 {
                    self.exact_max_results = limit;
                }
            }
        }
        if let Some(morphology) = incoming.morphology {
            if let Some(url) = non_blank(morphology.url) {
                self.morphology_url = url;
            }
        }
        if let Some(detector) = incoming.detector {
            if let Some(languages) = detector.languages {
                if !languages.is_empty() {
                    self.detector_languages = languages;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = non_blank(server.addr) {
                self.server_addr = addr;
            }
            if let Some(dir) = server
                .image_upload_dir
                .as_deref()
                .and_then(paths::normalize_dir)
            {
                self.image_upload_dir = dir;
            }
            if let Some(context) = non_blank(server.image_upload_context) {
                self.image_upload_context = normalize_context(&context);
            }
            if let Some(verbose) = server.verbose {
                self.verbose = verbose;
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_context(context: &str) -> String {
    let trimmed = context.trim().trim_matches('/');
    format!("/{}", trimmed)
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(dir) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create settings directory: {}", dir.display()))?;
    let path = dir.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
