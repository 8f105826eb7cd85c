//! Pipeline and server configuration
//!
//! The matcher reads an optional JSON file; anything missing falls back to the
//! `data/` layout the catalog has always used. The server reads environment
//! variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::ImageAsset;
use crate::error::{CatalogError, Result};
use crate::matching::SourcePriority;
use crate::report::ArtifactPaths;
use crate::sources::{load_image_list, scan_image_dir, JsonFileSource, RecordSource};

const DEFAULT_SOURCES: &[&str] = &[
    "data/examples_v2.json",
    "data/exercises_v2_with_images.json",
    "data/exercises.json",
    "data/exercises_complete.json",
    "data/exercises_complete_from_images.json",
];

const DEFAULT_PRIORITY: &[&str] = &[
    "data/exercises_v2_with_images.json",
    "data/exercises_complete_from_images.json",
    "data/exercises_complete.json",
    "data/exercises.json",
];

/// One exercise source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Identifier written into the artifact; defaults to the path
    #[serde(default)]
    pub id: Option<String>,
    pub path: PathBuf,
}

impl SourceConfig {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            id: None,
            path: path.into(),
        }
    }

    pub fn to_source(&self) -> JsonFileSource {
        match &self.id {
            Some(id) => JsonFileSource::with_id(id.as_str(), &self.path),
            None => JsonFileSource::new(&self.path),
        }
    }
}

/// Where image paths come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageInput {
    /// JSON array of paths
    List(PathBuf),
    /// Walk a directory, exposing files under a URL prefix
    Directory { root: PathBuf, url_prefix: String },
}

impl ImageInput {
    pub fn load(&self) -> Vec<ImageAsset> {
        match self {
            ImageInput::List(path) => load_image_list(path),
            ImageInput::Directory { root, url_prefix } => scan_image_dir(root, url_prefix),
        }
    }
}

/// Image-to-exercise matcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub sources: Vec<SourceConfig>,
    pub images: ImageInput,
    pub source_priority: Vec<String>,
    pub output_json: PathBuf,
    pub output_csv: PathBuf,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|p| SourceConfig::from_path(*p)).collect(),
            images: ImageInput::List(PathBuf::from("data/images_list.json")),
            source_priority: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
            output_json: PathBuf::from("data/images_best_match_clean.json"),
            output_csv: PathBuf::from("data/images_best_match_clean.csv"),
        }
    }
}

impl MatcherConfig {
    /// Load from a JSON file; omitted keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_json == self.output_csv {
            return Err(CatalogError::InvalidInput(
                "output_json and output_csv must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn priority(&self) -> SourcePriority {
        SourcePriority::new(self.source_priority.iter().map(String::as_str))
    }

    pub fn record_sources(&self) -> Vec<Box<dyn RecordSource>> {
        self.sources
            .iter()
            .map(|s| Box::new(s.to_source()) as Box<dyn RecordSource>)
            .collect()
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.output_json, &self.output_csv)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// SQLite path, `sqlite://` URL or `.json` catalog file
    pub database_url: String,
    /// Flat v1 file used by the migrate endpoint
    pub v1_data_file: PathBuf,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "data/exercises.db".to_string(),
            v1_data_file: PathBuf::from("data/exercises.json"),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `DATABASE_URL`, `V1_DATA_FILE`, `PORT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_url),
            v1_data_file: lookup("V1_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.v1_data_file),
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        }
    }
}
