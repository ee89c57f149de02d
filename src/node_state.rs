//! Per-node interaction state
//!
//! Hover and attention are two independent flags. A node is *shown* while
//! either is set; hover wins when picking the accent color.

use std::time::Duration;

use serde::Serialize;

use crate::model::MediaKind;

/// Color constants for node kinds (RGBA, normalized 0.0-1.0)
pub mod colors {
    /// Image at rest: pale blue (#BFDBFE)
    pub const IMAGE_BASE: [f32; 4] = [0.749, 0.859, 0.996, 0.8];
    /// Image hovered: electric blue (#0A84FF)
    pub const IMAGE_HOVER: [f32; 4] = [0.039, 0.518, 1.0, 0.8];
    /// Image dreaming: amber (#FBBF24)
    pub const IMAGE_ATTENTION: [f32; 4] = [0.984, 0.749, 0.141, 0.8];

    /// Audio at rest: violet (#A855F7)
    pub const AUDIO_BASE: [f32; 4] = [0.659, 0.333, 0.969, 0.6];
    /// Audio hovered: hot pink (#FF0055)
    pub const AUDIO_HOVER: [f32; 4] = [1.0, 0.0, 0.333, 0.6];
    /// Audio dreaming: rose (#F472B6)
    pub const AUDIO_ATTENTION: [f32; 4] = [0.957, 0.447, 0.714, 0.6];

    /// Video at rest: pale teal (#99F6E4)
    pub const VIDEO_BASE: [f32; 4] = [0.6, 0.965, 0.894, 0.8];
    /// Video hovered: teal (#14B8A6)
    pub const VIDEO_HOVER: [f32; 4] = [0.078, 0.722, 0.651, 0.8];
    /// Video dreaming: orange (#FB923C)
    pub const VIDEO_ATTENTION: [f32; 4] = [0.984, 0.573, 0.235, 0.8];

    /// Tag label text (#93C5FD)
    pub const TAG_LABEL: [f32; 4] = [0.576, 0.773, 0.992, 1.0];

    /// Glow ring alpha
    pub const GLOW_ALPHA: f32 = 0.5;

    /// Format an RGBA color as `#rrggbb`, dropping alpha
    pub fn to_hex(color: [f32; 4]) -> String {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(color[0]),
            channel(color[1]),
            channel(color[2])
        )
    }
}

/// Which visual emphasis a node currently has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    None,
    Attention,
    Hover,
}

/// Ephemeral interaction state of one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    pub hovered: bool,
    /// Scene time at which the current dreaming pulse ends
    pub attention_until: Option<Duration>,
}

impl NodeState {
    pub fn attention(&self) -> bool {
        self.attention_until.is_some()
    }

    /// Hovered or dreaming
    pub fn shown(&self) -> bool {
        self.hovered || self.attention()
    }

    pub fn emphasis(&self) -> Emphasis {
        if self.hovered {
            Emphasis::Hover
        } else if self.attention() {
            Emphasis::Attention
        } else {
            Emphasis::None
        }
    }

    /// Accent color for the node's sphere and glow ring
    pub fn accent(&self, kind: MediaKind) -> [f32; 4] {
        accent_color(kind, self.emphasis())
    }

    /// Clear attention if its pulse has ended by `now`; returns true if cleared
    pub fn expire_attention(&mut self, now: Duration) -> bool {
        match self.attention_until {
            Some(until) if until <= now => {
                self.attention_until = None;
                true
            }
            _ => false,
        }
    }
}

/// Accent color for a kind under a given emphasis
pub fn accent_color(kind: MediaKind, emphasis: Emphasis) -> [f32; 4] {
    use colors::*;
    match (kind, emphasis) {
        (MediaKind::Image, Emphasis::None) => IMAGE_BASE,
        (MediaKind::Image, Emphasis::Hover) => IMAGE_HOVER,
        (MediaKind::Image, Emphasis::Attention) => IMAGE_ATTENTION,
        (MediaKind::Audio, Emphasis::None) => AUDIO_BASE,
        (MediaKind::Audio, Emphasis::Hover) => AUDIO_HOVER,
        (MediaKind::Audio, Emphasis::Attention) => AUDIO_ATTENTION,
        (MediaKind::Video, Emphasis::None) => VIDEO_BASE,
        (MediaKind::Video, Emphasis::Hover) => VIDEO_HOVER,
        (MediaKind::Video, Emphasis::Attention) => VIDEO_ATTENTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_node_is_not_shown() {
        let state = NodeState::default();
        assert!(!state.shown());
        assert_eq!(state.emphasis(), Emphasis::None);
        assert_eq!(state.accent(MediaKind::Image), colors::IMAGE_BASE);
    }

    #[test]
    fn attention_alone_uses_attention_accent() {
        let state = NodeState {
            hovered: false,
            attention_until: Some(Duration::from_secs(4)),
        };
        assert!(state.shown());
        assert_eq!(state.accent(MediaKind::Audio), colors::AUDIO_ATTENTION);
    }

    #[test]
    fn hover_takes_precedence_over_attention() {
        let state = NodeState {
            hovered: true,
            attention_until: Some(Duration::from_secs(4)),
        };
        assert_eq!(state.emphasis(), Emphasis::Hover);
        for kind in MediaKind::ALL {
            assert_eq!(state.accent(kind), accent_color(kind, Emphasis::Hover));
            assert_ne!(state.accent(kind), accent_color(kind, Emphasis::Attention));
        }
    }

    #[test]
    fn attention_expires_at_deadline() {
        let mut state = NodeState {
            hovered: false,
            attention_until: Some(Duration::from_secs(4)),
        };
        assert!(!state.expire_attention(Duration::from_millis(3999)));
        assert!(state.attention());
        assert!(state.expire_attention(Duration::from_secs(4)));
        assert!(!state.attention());
        assert!(!state.expire_attention(Duration::from_secs(5)));
    }

    #[test]
    fn hex_formatting() {
        insta::assert_snapshot!(colors::to_hex(colors::IMAGE_HOVER), @"#0a84ff");
        insta::assert_snapshot!(colors::to_hex(colors::AUDIO_HOVER), @"#ff0055");
        insta::assert_snapshot!(colors::to_hex(colors::IMAGE_BASE), @"#bfdbfe");
    }
}
