//! Node placement
//!
//! Turns an item list into positioned nodes. Items carrying a complete layout
//! hint from the backend keep it (scaled by the configured spread); the rest
//! are dropped at a random point inside the fallback volume. Fallback samples
//! are memoized per item id so a node never jumps between frames.

use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{CapPolicy, FallbackVolume, LayoutConfig};
use crate::model::{Item, MediaKind};
use crate::random::RandomSource;

/// Where a node's coordinate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Hinted,
    Fallback,
}

/// An item with its resolved position for the current dataset load
#[derive(Debug, Clone, Serialize)]
pub struct PositionedNode {
    pub item: Arc<Item>,
    pub coordinate: [f32; 3],
    pub placement: Placement,
}

impl PositionedNode {
    pub fn id(&self) -> &str {
        self.item.id()
    }
}

/// Resolves coordinates and owns the fallback memo
#[derive(Debug, Clone)]
pub struct PositionResolver {
    config: LayoutConfig,
    fallbacks: HashMap<String, [f32; 3]>,
}

impl PositionResolver {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            fallbacks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Number of memoized fallback coordinates
    pub fn memo_len(&self) -> usize {
        self.fallbacks.len()
    }

    /// Resolve one dataset load
    ///
    /// Applies the caps, then places every admitted item in input order.
    pub fn resolve(
        &mut self,
        items: &[Arc<Item>],
        rng: &mut dyn RandomSource,
    ) -> Vec<PositionedNode> {
        self.begin_load(items);

        self.admit(items)
            .into_iter()
            .map(|i| {
                let item = Arc::clone(&items[i]);
                let (coordinate, placement) = self.coordinate_for(&item, rng);
                PositionedNode {
                    item,
                    coordinate,
                    placement,
                }
            })
            .collect()
    }

    /// Coordinate for a single item, sampling a fallback at most once per id
    pub fn coordinate_for(
        &mut self,
        item: &Item,
        rng: &mut dyn RandomSource,
    ) -> ([f32; 3], Placement) {
        if let Some([x, y, z]) = item.position_hint() {
            let s = self.config.spread;
            return ([x * s, y * s, z * s], Placement::Hinted);
        }

        if let Some(coord) = self.fallbacks.get(item.id()) {
            return (*coord, Placement::Fallback);
        }

        let coord = self.sample_fallback(rng);
        tracing::trace!(id = item.id(), ?coord, "fallback placement");
        self.fallbacks.insert(item.id().to_string(), coord);
        (coord, Placement::Fallback)
    }

    /// Indices of the items that receive nodes, ascending
    ///
    /// Only the first admitted occurrence of an id gets a node.
    pub fn admit(&self, items: &[Arc<Item>]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        if self.config.cap_policy == CapPolicy::Relevance {
            // Stable sort keeps input order among equal or missing scores
            order.sort_by(|&a, &b| {
                let sa = items[a].score.unwrap_or(f32::NEG_INFINITY);
                let sb = items[b].score.unwrap_or(f32::NEG_INFINITY);
                sb.total_cmp(&sa)
            });
        }

        let mut per_kind: HashMap<MediaKind, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut admitted = Vec::new();
        for i in order {
            if admitted.len() >= self.config.max_nodes {
                break;
            }
            // Ids address nodes; a repeated id is dropped without using a cap slot
            if seen.contains(items[i].id()) {
                continue;
            }
            let kind = items[i].kind;
            let count = per_kind.entry(kind).or_insert(0);
            if *count >= self.config.caps.for_kind(kind) {
                continue;
            }
            *count += 1;
            seen.insert(items[i].id());
            admitted.push(i);
        }

        admitted.sort_unstable();
        admitted
    }

    fn begin_load(&mut self, items: &[Arc<Item>]) {
        if self.config.retain_fallbacks {
            let live: HashSet<&str> = items.iter().map(|i| i.id()).collect();
            self.fallbacks.retain(|id, _| live.contains(id.as_str()));
        } else {
            self.fallbacks.clear();
        }
    }

    fn sample_fallback(&self, rng: &mut dyn RandomSource) -> [f32; 3] {
        let r = self.config.fallback.radius;
        match self.config.fallback.volume {
            FallbackVolume::Cube => [
                rng.next_range(-r, r),
                rng.next_range(-r, r),
                rng.next_range(-r, r),
            ],
            FallbackVolume::Sphere => {
                // Uniform in the ball: uniform direction, radius ~ cbrt(u)
                let cos_theta = rng.next_range(-1.0, 1.0);
                let phi = rng.next_range(0.0, 2.0 * PI);
                let rho = r * (rng.next_unit() as f32).cbrt();
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                [
                    rho * sin_theta * phi.cos(),
                    rho * sin_theta * phi.sin(),
                    rho * cos_theta,
                ]
            }
        }
    }
}

/// Arithmetic mean of the node coordinates, `None` when there are no nodes
pub fn centroid(nodes: &[PositionedNode]) -> Option<[f32; 3]> {
    if nodes.is_empty() {
        return None;
    }
    let mut sum = [0.0f64; 3];
    for node in nodes {
        for (acc, c) in sum.iter_mut().zip(node.coordinate) {
            *acc += f64::from(c);
        }
    }
    let n = nodes.len() as f64;
    Some([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ])
}
