use std::fmt;

/// External system a failed call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Index,
    Morphology,
    Detector,
    ImageStorage,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collaborator::Index => "search index",
            Collaborator::Morphology => "morphology service",
            Collaborator::Detector => "language detector",
            Collaborator::ImageStorage => "image storage",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("wrong author: {0}")]
    Authorization(String),

    #[error("no index configured for language pair {0}")]
    IndexNotFound(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("{collaborator} unavailable: {source:#}")]
    Collaborator {
        collaborator: Collaborator,
        #[source]
        source: anyhow::Error,
    },
}

impl DictionaryError {
    pub fn collaborator(collaborator: Collaborator, source: anyhow::Error) -> Self {
        DictionaryError::Collaborator {
            collaborator,
            source,
        }
    }
}

pub type DictionaryResult<T> = std::result::Result<T, DictionaryError>;

/// Tags an `anyhow` failure with the collaborator it came from.
pub(crate) trait CollaboratorContext<T> {
    fn via(self, collaborator: Collaborator) -> DictionaryResult<T>;
}

impl<T> CollaboratorContext<T> for anyhow::Result<T> {
    fn via(self, collaborator: Collaborator) -> DictionaryResult<T> {
        self.map_err(|err| DictionaryError::collaborator(collaborator, err))
    }
}
