//! Reading item lists and configuration files
//!
//! Both are accepted as JSON or YAML, picked by file extension. This is the
//! only fallible surface of the library; the scene itself never fails.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::GalaxyConfig;
use crate::model::Item;

/// Errors that can occur while reading inputs
#[derive(Error, Debug)]
pub enum GalaxyError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for input operations
pub type GalaxyResult<T> = Result<T, GalaxyError>;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_extension(ext: &str) -> GalaxyResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(GalaxyError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> GalaxyResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| GalaxyError::UnknownExtension(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> GalaxyResult<T> {
        match self {
            Format::Json => {
                serde_json::from_str(content).map_err(|e| GalaxyError::Parse(e.to_string()))
            }
            Format::Yaml => {
                serde_yaml::from_str(content).map_err(|e| GalaxyError::Parse(e.to_string()))
            }
        }
    }
}

/// An item list is either a bare array or wrapped as `{"items": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemList {
    Bare(Vec<Item>),
    Wrapped { items: Vec<Item> },
}

impl From<ItemList> for Vec<Item> {
    fn from(list: ItemList) -> Self {
        match list {
            ItemList::Bare(items) | ItemList::Wrapped { items } => items,
        }
    }
}

/// Parse an item list from a string
pub fn parse_items(content: &str, format: Format) -> GalaxyResult<Vec<Item>> {
    let list: ItemList = format.parse(content)?;
    Ok(list.into())
}

/// Read an item list from a `.json` / `.yaml` file
pub fn read_items(path: &Path) -> GalaxyResult<Vec<Item>> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    let items = parse_items(&content, format)?;
    tracing::debug!(path = %path.display(), count = items.len(), "read items");
    Ok(items)
}

/// Read configuration from a `.json` / `.yaml` file
pub fn read_config(path: &Path) -> GalaxyResult<GalaxyConfig> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    format.parse(&content)
}

/// Read configuration if a path was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> GalaxyResult<GalaxyConfig> {
    match path {
        Some(p) => read_config(p),
        None => Ok(GalaxyConfig::default()),
    }
}
