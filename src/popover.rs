//! Detail popovers and tag labels
//!
//! A shown node (hovered or dreaming) gets a floating popover: a thumbnail for
//! images and video, the track title for audio. Anything that cannot be
//! resolved degrades to a typed placeholder instead of an error.

use serde::Serialize;
use url::Url;

use crate::math::add;
use crate::model::{Item, MediaKind};
use crate::node_state::{NodeState, colors};

/// Popover anchor offset above the node, in world units
pub const POPOVER_OFFSET: [f32; 3] = [0.0, 1.2, 0.0];

/// Tag label offset above the node, in world units
pub const TAG_LABEL_OFFSET: [f32; 3] = [0.0, 0.3, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Audio,
    Generic,
}

impl PlaceholderKind {
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => PlaceholderKind::Audio,
            MediaKind::Image | MediaKind::Video => PlaceholderKind::Generic,
        }
    }
}

/// What a popover displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PopoverContent {
    Thumbnail { url: String },
    AudioTitle { title: String },
    Placeholder { kind: PlaceholderKind },
}

/// A popover anchored to a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popover {
    pub id: String,
    pub anchor: [f32; 3],
    pub content: PopoverContent,
}

/// Small text label floating above an idle node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLabel {
    pub text: String,
    pub anchor: [f32; 3],
    pub color: String,
}

impl TagLabel {
    pub fn new(text: &str, coordinate: [f32; 3]) -> Self {
        Self {
            text: text.to_string(),
            anchor: add(coordinate, TAG_LABEL_OFFSET),
            color: colors::to_hex(colors::TAG_LABEL),
        }
    }
}

/// Label visibility options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelOptions {
    /// Show popovers for shown nodes
    pub popovers: bool,
    /// Show the first tag on nodes that are not shown
    pub tag_labels: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            popovers: true,
            tag_labels: true,
        }
    }
}

impl LabelOptions {
    pub fn toggle_popovers(&mut self) {
        self.popovers = !self.popovers;
    }

    pub fn toggle_tag_labels(&mut self) {
        self.tag_labels = !self.tag_labels;
    }

    /// Tag label for a node in its current state, if any
    pub fn tag_label<'a>(&self, item: &'a Item, state: &NodeState) -> Option<&'a str> {
        if self.tag_labels && !state.shown() {
            item.primary_tag()
        } else {
            None
        }
    }
}

/// URL of the item's thumbnail, falling back to its raw media path
pub fn thumbnail_url(item: &Item, api_base: &str) -> Option<String> {
    if let Some(thumb) = item.thumbnail_ref.as_deref().filter(|t| !t.is_empty()) {
        return join_reference(api_base, thumb);
    }
    let display = item.display_path.as_deref().filter(|p| !p.is_empty())?;
    join_segments(
        api_base,
        std::iter::once("raw").chain(display.split('/').filter(|s| !s.is_empty())),
    )
}

/// Popover content for an item; `thumbnail_failed` marks a reported load failure
pub fn resolve_content(item: &Item, api_base: &str, thumbnail_failed: bool) -> PopoverContent {
    let placeholder = PopoverContent::Placeholder {
        kind: PlaceholderKind::for_kind(item.kind),
    };
    match item.kind {
        MediaKind::Audio => match item.title() {
            Some(title) => PopoverContent::AudioTitle {
                title: title.to_string(),
            },
            None => placeholder,
        },
        MediaKind::Image | MediaKind::Video if thumbnail_failed => placeholder,
        MediaKind::Image | MediaKind::Video => match thumbnail_url(item, api_base) {
            Some(url) => PopoverContent::Thumbnail { url },
            None => placeholder,
        },
    }
}

/// Append an opaque, already encoded reference to the base as is
fn join_reference(api_base: &str, reference: &str) -> Option<String> {
    let base = Url::parse(api_base).ok()?;
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        reference.trim_start_matches('/')
    );
    Url::parse(&joined).ok().map(String::from)
}

fn join_segments<'a>(api_base: &str, segments: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut url = Url::parse(api_base).ok()?;
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const BASE: &str = "http://localhost:8000";

    fn image() -> Item {
        let mut item = Item::new("/box/trips/summer 2019/a b.jpg", MediaKind::Image);
        item.display_path = Some("trips/summer 2019/a b.jpg".to_string());
        item
    }

    #[test]
    fn thumbnail_reference_wins() {
        let mut item = image();
        item.thumbnail_ref = Some("/thumbs/ab12.jpg".to_string());
        insta::assert_snapshot!(thumbnail_url(&item, BASE).unwrap(), @"http://localhost:8000/thumbs/ab12.jpg");
    }

    #[test]
    fn thumbnail_reference_is_not_reencoded() {
        let mut item = image();
        item.thumbnail_ref = Some("/thumbs/a%20b.jpg?v=2".to_string());
        insta::assert_snapshot!(thumbnail_url(&item, BASE).unwrap(), @"http://localhost:8000/thumbs/a%20b.jpg?v=2");
    }

    #[test]
    fn raw_path_is_percent_encoded() {
        insta::assert_snapshot!(
            thumbnail_url(&image(), BASE).unwrap(),
            @"http://localhost:8000/raw/trips/summer%202019/a%20b.jpg"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let mut item = image();
        item.thumbnail_ref = Some("/thumbs/x.jpg".to_string());
        assert_eq!(
            thumbnail_url(&item, "http://host/api/").as_deref(),
            Some("http://host/api/thumbs/x.jpg")
        );
    }

    #[test]
    fn unresolvable_image_gets_generic_placeholder() {
        let item = Item::new("/box/x.jpg", MediaKind::Image);
        assert_eq!(
            resolve_content(&item, BASE, false),
            PopoverContent::Placeholder {
                kind: PlaceholderKind::Generic
            }
        );
        assert_eq!(
            resolve_content(&image(), "not a url", false),
            PopoverContent::Placeholder {
                kind: PlaceholderKind::Generic
            }
        );
    }

    #[test]
    fn reported_failure_switches_to_placeholder() {
        assert!(matches!(
            resolve_content(&image(), BASE, false),
            PopoverContent::Thumbnail { .. }
        ));
        assert_eq!(
            resolve_content(&image(), BASE, true),
            PopoverContent::Placeholder {
                kind: PlaceholderKind::Generic
            }
        );
    }

    #[test]
    fn audio_uses_title_or_audio_placeholder() {
        let mut item = Item::new("/box/song.mp3", MediaKind::Audio);
        assert_eq!(
            resolve_content(&item, BASE, false),
            PopoverContent::Placeholder {
                kind: PlaceholderKind::Audio
            }
        );
        item.metadata = serde_json::json!({"title": "Heroes"});
        assert_eq!(
            resolve_content(&item, BASE, false),
            PopoverContent::AudioTitle {
                title: "Heroes".to_string()
            }
        );
    }

    #[test]
    fn tag_label_hidden_while_shown() {
        let item = Item::new("a", MediaKind::Image).with_tags(["Grandma", "Beach"]);
        let opts = LabelOptions::default();
        let idle = NodeState::default();
        let dreaming = NodeState {
            hovered: false,
            attention_until: Some(Duration::from_secs(1)),
        };
        assert_eq!(opts.tag_label(&item, &idle), Some("Grandma"));
        assert_eq!(opts.tag_label(&item, &dreaming), None);
    }

    #[test]
    fn tag_label_floats_above_node() {
        let label = TagLabel::new("Grandma", [1.0, 2.0, 3.0]);
        assert_eq!(label.anchor, [1.0, 2.3, 3.0]);
        insta::assert_snapshot!(label.color, @"#93c5fd");
    }

    #[test]
    fn popovers_can_be_toggled() {
        let mut opts = LabelOptions::default();
        opts.toggle_popovers();
        assert!(!opts.popovers);
    }

    #[test]
    fn tag_labels_can_be_toggled_off() {
        let item = Item::new("a", MediaKind::Image).with_tags(["Grandma"]);
        let mut opts = LabelOptions::default();
        opts.toggle_tag_labels();
        assert_eq!(opts.tag_label(&item, &NodeState::default()), None);
        opts.toggle_tag_labels();
        assert!(opts.tag_labels);
    }

    #[test]
    fn content_serializes_with_type_tag() {
        let json = serde_json::to_string(&PopoverContent::AudioTitle {
            title: "Heroes".to_string(),
        })
        .unwrap();
        insta::assert_snapshot!(json, @r#"{"type":"audio_title","title":"Heroes"}"#);
    }
}
