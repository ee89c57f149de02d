//! The galaxy scene
//!
//! [`GalaxyScene`] is the lifecycle object a host mounts once per view. It
//! owns everything with state: the fallback memo, the camera and its
//! autoframing guard, per-node interaction state, the dreaming scheduler and
//! the backdrop. The host feeds it dataset loads, pointer events and clock
//! ticks, and reads back visuals, popovers and events.
//!
//! Time is always scene time: a `Duration` since mount supplied by the host.
//! Nothing here reads a wall clock, so tests drive it deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::attention::{AttentionChange, AttentionScheduler};
use crate::backdrop::Backdrop;
use crate::camera::{Autoframer, CameraPose, OrbitCamera, Ray};
use crate::config::GalaxyConfig;
use crate::layout::{Placement, PositionResolver, PositionedNode};
use crate::model::{Item, MediaKind};
use crate::node_state::{Emphasis, NodeState, colors};
use crate::popover::{LabelOptions, POPOVER_OFFSET, Popover, TagLabel, resolve_content};
use crate::random::RandomSource;
use crate::transform::{Transform, billboard, ease_scale, node_transform};

/// Selection callback, invoked once per click with the clicked item
pub type SelectCallback = Box<dyn FnMut(&Item) + Send>;

/// Something the host may want to react to (animate a popover in, log, ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SceneEvent {
    CameraFramed { pose: CameraPose },
    AttentionStarted { id: String, until_ms: u64 },
    AttentionEnded { id: String },
    PopoverOpened { popover: Popover },
    PopoverClosed { id: String },
}

/// What the renderer draws for one node this frame
#[derive(Debug, Clone, Serialize)]
pub struct NodeVisual {
    pub transform: Transform,
    pub radius: f32,
    pub accent: [f32; 4],
    pub emphasis: Emphasis,
    /// Ring around shown nodes
    pub glow_ring: bool,
    /// Accent color at glow alpha
    pub glow_color: [f32; 4],
}

/// Serializable view of one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub kind: MediaKind,
    pub coordinate: [f32; 3],
    pub placement: Placement,
    pub hovered: bool,
    pub attention: bool,
    pub accent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_label: Option<TagLabel>,
    pub visual: NodeVisual,
}

/// Serializable view of the whole scene
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub elapsed_ms: u64,
    pub loads: u64,
    pub camera: CameraPose,
    pub star_count: usize,
    pub nodes: Vec<NodeSnapshot>,
    pub popovers: Vec<Popover>,
}

pub struct GalaxyScene {
    config: GalaxyConfig,
    rng: Box<dyn RandomSource + Send>,
    on_select: Option<SelectCallback>,

    resolver: PositionResolver,
    autoframer: Autoframer,
    camera: OrbitCamera,
    scheduler: AttentionScheduler,
    backdrop: Backdrop,
    labels: LabelOptions,

    nodes: Vec<PositionedNode>,
    states: Vec<NodeState>,
    visuals: Vec<NodeVisual>,
    index: HashMap<String, usize>,
    failed_thumbnails: HashSet<String>,
    pointer_hover: Option<usize>,

    events: Vec<SceneEvent>,
    now: Duration,
    last_frame: Option<Duration>,
    loads: u64,
    mounted: bool,
}

impl std::fmt::Debug for GalaxyScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalaxyScene")
            .field("nodes", &self.nodes.len())
            .field("loads", &self.loads)
            .field("now", &self.now)
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl GalaxyScene {
    /// Mount a fresh scene
    pub fn mount<R, F>(config: GalaxyConfig, rng: R, on_select: F) -> Self
    where
        R: RandomSource + Send + 'static,
        F: FnMut(&Item) + Send + 'static,
    {
        let mut rng: Box<dyn RandomSource + Send> = Box::new(rng);
        let backdrop = Backdrop::generate(&config.backdrop, rng.as_mut());
        let labels = LabelOptions {
            popovers: true,
            tag_labels: config.popover.tag_labels,
        };

        tracing::info!(stars = backdrop.stars.len(), "galaxy scene mounted");

        Self {
            resolver: PositionResolver::new(config.layout.clone()),
            autoframer: Autoframer::new(&config.camera),
            camera: OrbitCamera::new(&config.camera, &config.orbit, 16.0 / 9.0),
            scheduler: AttentionScheduler::new(&config.attention, Duration::ZERO),
            backdrop,
            labels,
            rng,
            on_select: Some(Box::new(on_select)),
            config,
            nodes: Vec::new(),
            states: Vec::new(),
            visuals: Vec::new(),
            index: HashMap::new(),
            failed_thumbnails: HashSet::new(),
            pointer_hover: None,
            events: Vec::new(),
            now: Duration::ZERO,
            last_frame: None,
            loads: 0,
            mounted: true,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &GalaxyConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    pub fn visuals(&self) -> &[NodeVisual] {
        &self.visuals
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Orbit controls; once the dataset is framed the user is the only writer
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn labels_mut(&mut self) -> &mut LabelOptions {
        &mut self.labels
    }

    /// Number of dataset loads since mount
    pub fn loads(&self) -> u64 {
        self.loads
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn state(&self, id: &str) -> Option<&NodeState> {
        self.index_of(id).map(|i| &self.states[i])
    }

    /// Replace the dataset
    pub fn load(&mut self, items: Vec<Item>) {
        self.load_shared(items.into_iter().map(Arc::new).collect());
    }

    /// Replace the dataset with already shared items
    pub fn load_shared(&mut self, items: Vec<Arc<Item>>) {
        if !self.mounted {
            return;
        }

        for i in 0..self.states.len() {
            if self.states[i].shown() {
                let id = self.nodes[i].id().to_string();
                self.events.push(SceneEvent::PopoverClosed { id });
            }
        }

        let nodes = self.resolver.resolve(&items, self.rng.as_mut());
        let camera_pos = self.camera.position;
        self.visuals = nodes
            .iter()
            .map(|n| NodeVisual {
                transform: Transform {
                    position: n.coordinate,
                    scale: 1.0,
                    basis: billboard(n.coordinate, camera_pos),
                },
                radius: self.config.node.radius(n.item.kind),
                accent: NodeState::default().accent(n.item.kind),
                emphasis: Emphasis::None,
                glow_ring: false,
                glow_color: glow(NodeState::default().accent(n.item.kind)),
            })
            .collect();
        self.states = vec![NodeState::default(); nodes.len()];
        self.index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id().to_string(), i))
            .collect();
        self.failed_thumbnails
            .retain(|id| self.index.contains_key(id.as_str()));
        self.pointer_hover = None;
        self.nodes = nodes;
        self.loads += 1;

        tracing::info!(
            items = items.len(),
            nodes = self.nodes.len(),
            load = self.loads,
            "dataset loaded"
        );

        if let Some(pose) = self.autoframer.on_load(&self.nodes, &mut self.camera) {
            self.events.push(SceneEvent::CameraFramed { pose });
        }
    }

    /// Run any due dreaming polls
    pub fn attention_tick(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }
        self.now = self.now.max(now);
        let changes = self
            .scheduler
            .poll(self.now, &mut self.states, self.rng.as_mut());
        self.apply_attention(changes);
    }

    /// Evaluate one display frame and return the visuals to draw
    pub fn frame(&mut self, now: Duration) -> &[NodeVisual] {
        if !self.mounted {
            return &[];
        }
        self.now = self.now.max(now);
        let dt = self
            .last_frame
            .map(|last| self.now.saturating_sub(last))
            .unwrap_or_default();
        self.last_frame = Some(self.now);

        let expired = self.scheduler.expire(self.now, &mut self.states);
        self.apply_attention(expired);

        if self.config.orbit.auto_rotate && !dt.is_zero() {
            self.camera
                .auto_rotate(dt.as_secs_f32(), self.config.orbit.auto_rotate_speed);
        }
        self.camera.update_animation();

        let phase = self.now.as_secs_f32();
        let camera_pos = self.camera.position;
        let breathing = &self.config.breathing;
        for ((node, state), visual) in self
            .nodes
            .iter()
            .zip(&self.states)
            .zip(self.visuals.iter_mut())
        {
            let target = node_transform(phase, state.hovered, node.coordinate, camera_pos, breathing);
            let scale = ease_scale(visual.transform.scale, target.scale, breathing.smoothing);
            visual.transform = Transform { scale, ..target };
            visual.emphasis = state.emphasis();
            visual.accent = state.accent(node.item.kind);
            visual.glow_ring = state.shown();
            visual.glow_color = glow(visual.accent);
        }

        &self.visuals
    }

    /// Convenience for hosts with a single clock: poll dreaming, then draw
    pub fn advance(&mut self, now: Duration) -> &[NodeVisual] {
        self.attention_tick(now);
        self.frame(now)
    }

    /// Pointer entered a node's hit region
    pub fn pointer_enter(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(i) if self.mounted => {
                self.set_hover(i, true);
                true
            }
            _ => false,
        }
    }

    /// Pointer left a node's hit region
    pub fn pointer_leave(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(i) if self.mounted => {
                self.set_hover(i, false);
                true
            }
            _ => false,
        }
    }

    /// Select a node; invokes the selection callback once
    pub fn click(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(i) if self.mounted => {
                self.select(i);
                true
            }
            _ => false,
        }
    }

    /// Nearest node whose hit sphere the ray passes through
    pub fn pick(&self, ray: &Ray) -> Option<usize> {
        let radius = self.config.node.hit_radius;
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| ray.intersect_sphere(n.coordinate, radius).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Pointer moved to normalized device coordinates; returns the hovered id
    pub fn pointer_move(&mut self, ndc_x: f32, ndc_y: f32) -> Option<&str> {
        if !self.mounted {
            return None;
        }
        let hit = self.pick(&self.camera.ray(ndc_x, ndc_y));
        if hit != self.pointer_hover {
            if let Some(prev) = self.pointer_hover {
                self.set_hover(prev, false);
            }
            if let Some(next) = hit {
                self.set_hover(next, true);
            }
            self.pointer_hover = hit;
        }
        hit.map(|i| self.nodes[i].id())
    }

    /// Click at normalized device coordinates
    pub fn click_at(&mut self, ndc_x: f32, ndc_y: f32) -> bool {
        if !self.mounted {
            return false;
        }
        match self.pick(&self.camera.ray(ndc_x, ndc_y)) {
            Some(i) => {
                self.select(i);
                true
            }
            None => false,
        }
    }

    /// The host failed to load a node's thumbnail; show a placeholder instead
    pub fn report_thumbnail_failure(&mut self, id: &str) {
        if self.mounted && self.index.contains_key(id) {
            self.failed_thumbnails.insert(id.to_string());
        }
    }

    /// Popover for a node, present only while the node is shown
    pub fn popover(&self, index: usize) -> Option<Popover> {
        let state = self.states.get(index)?;
        if !self.labels.popovers || !state.shown() {
            return None;
        }
        Some(self.build_popover(index))
    }

    /// Popovers of every shown node
    pub fn popovers(&self) -> Vec<Popover> {
        (0..self.nodes.len())
            .filter_map(|i| self.popover(i))
            .collect()
    }

    /// Tag label for a node that is not shown
    pub fn tag_label(&self, index: usize) -> Option<&str> {
        let node = self.nodes.get(index)?;
        self.labels.tag_label(&node.item, &self.states[index])
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let nodes = self
            .nodes
            .iter()
            .zip(&self.states)
            .zip(&self.visuals)
            .enumerate()
            .map(|(i, ((node, state), visual))| NodeSnapshot {
                id: node.id().to_string(),
                kind: node.item.kind,
                coordinate: node.coordinate,
                placement: node.placement,
                hovered: state.hovered,
                attention: state.attention(),
                accent: colors::to_hex(visual.accent),
                tag_label: self
                    .tag_label(i)
                    .map(|text| TagLabel::new(text, node.coordinate)),
                visual: visual.clone(),
            })
            .collect();

        SceneSnapshot {
            elapsed_ms: self.now.as_millis() as u64,
            loads: self.loads,
            camera: self.camera.pose(),
            star_count: self.backdrop.stars.len(),
            nodes,
            popovers: self.popovers(),
        }
    }

    /// Dispose of the scene; every later call is a no-op
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.scheduler.cancel();
        self.on_select = None;
        self.nodes.clear();
        self.states.clear();
        self.visuals.clear();
        self.index.clear();
        self.failed_thumbnails.clear();
        self.events.clear();
        self.pointer_hover = None;
        tracing::info!(loads = self.loads, "galaxy scene torn down");
    }

    fn select(&mut self, index: usize) {
        let item = Arc::clone(&self.nodes[index].item);
        tracing::debug!(id = item.id(), "node selected");
        if let Some(callback) = self.on_select.as_mut() {
            callback(&item);
        }
    }

    fn set_hover(&mut self, index: usize, hovered: bool) {
        let was_shown = self.states[index].shown();
        self.states[index].hovered = hovered;
        self.emit_visibility(index, was_shown);
    }

    fn apply_attention(&mut self, changes: Vec<AttentionChange>) {
        for change in changes {
            match change {
                AttentionChange::Started { index, until } => {
                    let id = self.nodes[index].id().to_string();
                    tracing::debug!(%id, "node started dreaming");
                    self.events.push(SceneEvent::AttentionStarted {
                        id,
                        until_ms: until.as_millis() as u64,
                    });
                    if !self.states[index].hovered {
                        self.open_popover(index);
                    }
                }
                AttentionChange::Ended { index } => {
                    let id = self.nodes[index].id().to_string();
                    tracing::debug!(%id, "node stopped dreaming");
                    self.events.push(SceneEvent::AttentionEnded { id });
                    // Judged per change: a replayed poll may already have
                    // restarted attention in the final state
                    if !self.states[index].hovered {
                        self.close_popover(index);
                    }
                }
            }
        }
    }

    fn emit_visibility(&mut self, index: usize, was_shown: bool) {
        match (was_shown, self.states[index].shown()) {
            (false, true) => self.open_popover(index),
            (true, false) => self.close_popover(index),
            _ => {}
        }
    }

    fn open_popover(&mut self, index: usize) {
        let popover = self.build_popover(index);
        tracing::debug!(id = %popover.id, "popover opened");
        self.events.push(SceneEvent::PopoverOpened { popover });
    }

    fn close_popover(&mut self, index: usize) {
        let id = self.nodes[index].id().to_string();
        tracing::debug!(%id, "popover closed");
        self.events.push(SceneEvent::PopoverClosed { id });
    }

    fn build_popover(&self, index: usize) -> Popover {
        let node = &self.nodes[index];
        let failed = self.failed_thumbnails.contains(node.id());
        Popover {
            id: node.id().to_string(),
            anchor: crate::math::add(node.coordinate, POPOVER_OFFSET),
            content: resolve_content(&node.item, &self.config.popover.api_base, failed),
        }
    }
}

fn glow(accent: [f32; 4]) -> [f32; 4] {
    [accent[0], accent[1], accent[2], colors::GLOW_ALPHA]
}
