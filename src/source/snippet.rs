//! Snippet persistence
//!
//! Snippets are the saved form of a [`SourceBundle`], keyed by an opaque
//! identifier. The preview engine never talks to a store directly; callers
//! load a snippet, turn it into a bundle, and hand that over.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::bundle::{ExternalResource, SourceBundle};

#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("Snippet not found: {0}")]
    NotFound(String),
    #[error("Invalid snippet id: {0}")]
    InvalidId(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snippet: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_title() -> String {
    "Untitled Project".to_string()
}

/// A saved snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    #[serde(default)]
    pub html_code: String,
    #[serde(default)]
    pub css_code: String,
    #[serde(default)]
    pub js_code: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub libraries: Vec<ExternalResource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Create a snippet from a bundle with a freshly generated id
    pub fn from_bundle(bundle: &SourceBundle) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            html_code: bundle.markup.clone(),
            css_code: bundle.style.clone(),
            js_code: bundle.script.clone(),
            title: default_title(),
            description: String::new(),
            libraries: bundle.external_resources.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn to_bundle(&self) -> SourceBundle {
        SourceBundle::new(&self.html_code, &self.css_code, &self.js_code)
            .with_resources(self.libraries.clone())
    }
}

/// Save/load service keyed by snippet id
pub trait SnippetStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Snippet, SnippetError>;

    /// Persist the snippet, bumping `updated_at`. Returns the stored id.
    fn save(&self, snippet: &mut Snippet) -> Result<String, SnippetError>;
}

/// One JSON file per snippet under a directory
#[derive(Debug, Clone)]
pub struct FileSnippetStore {
    dir: PathBuf,
}

impl FileSnippetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, SnippetError> {
        // Ids become file names; reject anything that could escape the directory.
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SnippetError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl SnippetStore for FileSnippetStore {
    fn load(&self, id: &str) -> Result<Snippet, SnippetError> {
        let path = self.path_for(id)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnippetError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, snippet: &mut Snippet) -> Result<String, SnippetError> {
        let path = self.path_for(&snippet.id)?;
        fs::create_dir_all(&self.dir)?;
        snippet.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(snippet)?;
        fs::write(&path, json)?;
        tracing::debug!(id = %snippet.id, path = %path.display(), "Snippet saved");
        Ok(snippet.id.clone())
    }
}
