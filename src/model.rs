//! Media item types consumed by the galaxy
//!
//! These mirror the records returned by the memory backend's search and
//! discovery endpoints. Only the fields the galaxy reads are modelled; unknown
//! fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Kind of media an item points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Image, MediaKind::Audio, MediaKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media item as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable unique identifier (absolute path on the backend)
    pub path: String,

    /// Media kind
    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Path relative to the media root, used to build raw-media URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_path: Option<String>,

    /// Thumbnail reference relative to the API base (e.g. "/thumbs/ab12.jpg")
    #[serde(default, rename = "thumb", skip_serializing_if = "Option::is_none")]
    pub thumbnail_ref: Option<String>,

    /// Layout coordinates from the backend's projection, each nullable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,

    /// Identity / label tags, in display order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    /// Relevance score from a search, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Free-form metadata (audio title, EXIF, ...)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Item {
    /// Create a bare item with no hint, tags or metadata
    pub fn new(path: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
            display_path: None,
            thumbnail_ref: None,
            x: None,
            y: None,
            z: None,
            tags: Vec::new(),
            score: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Builder-style setter for the layout hint
    pub fn with_hint(mut self, x: f32, y: f32, z: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self.z = Some(z);
        self
    }

    /// Builder-style setter for tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The item's identifier
    pub fn id(&self) -> &str {
        &self.path
    }

    /// Layout hint, present only when all three components are present and finite
    pub fn position_hint(&self) -> Option<[f32; 3]> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) if x.is_finite() && y.is_finite() && z.is_finite() => {
                Some([x, y, z])
            }
            _ => None,
        }
    }

    /// Audio title from `metadata.title`, if non-empty
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get("title")
            .and_then(|t| t.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// First tag, shown as a billboard label
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
