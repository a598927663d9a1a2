use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::graph::SceneGraph;

// Nodes per ring before the next ring starts further out
pub const NODES_PER_TIER: usize = 6;
pub const TIER_SPREAD: f32 = 0.5;
// Vertical jitter amplitude relative to the base radius
pub const JITTER_FACTOR: f32 = 0.2;

// AR places the graph on a table top (metres); desktop uses scene units
pub const AR_BASE_RADIUS: f32 = 0.3;
pub const DESKTOP_BASE_RADIUS: f32 = 30.0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Desktop,
    Ar,
}

impl ViewMode {
    pub fn base_radius(self) -> f32 {
        match self {
            ViewMode::Desktop => DESKTOP_BASE_RADIUS,
            ViewMode::Ar => AR_BASE_RADIUS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Desktop => "3D",
            ViewMode::Ar => "AR",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Tiered,
    Force,
}

/// Tiered circular position of entity `i` out of `n`.
/// `jitter` is in [-0.5, 0.5] and scales the vertical offset.
pub fn tiered_position(i: usize, n: usize, base_radius: f32, jitter: f32) -> Vec3 {
    let n = n.max(1) as f32;
    let angle = TAU * (i as f32) / n;
    let tier = (i / NODES_PER_TIER) as f32;
    let r = base_radius * (1.0 + tier * TIER_SPREAD);
    Vec3::new(r * angle.cos(), jitter * base_radius * JITTER_FACTOR, r * angle.sin())
}

/// Deterministic fallback layout. The same seed always yields the same positions.
pub fn apply_tiered_layout(graph: &mut SceneGraph, mode: ViewMode, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = graph.nodes.len();
    let base = mode.base_radius();
    for (i, node) in graph.nodes.iter_mut().enumerate() {
        let jitter: f32 = rng.gen_range(-0.5..=0.5);
        node.position = tiered_position(i, n, base, jitter);
    }
}

/// Small 3D force simulation: many-body charge, link springs and centering,
/// cooled by alpha decay. Distances scale with the mode's base radius.
#[derive(Clone, Debug)]
pub struct ForceLayout {
    pub charge: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center_strength: f32,
    pub velocity_decay: f32,
    pub alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    velocities: Vec<Vec3>,
}

impl ForceLayout {
    pub fn new(base_radius: f32) -> Self {
        let alpha_min = 0.001_f32;
        Self {
            charge: -30.0 * (base_radius / DESKTOP_BASE_RADIUS).powi(2),
            link_distance: base_radius * 0.5,
            link_strength: 0.5,
            center_strength: 1.0,
            velocity_decay: 0.6,
            alpha: 1.0,
            alpha_min,
            // same cooling curve as d3-force: reach alpha_min in ~300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocities: Vec::new(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.alpha_min
    }

    pub fn tick(&mut self, graph: &mut SceneGraph) {
        let n = graph.nodes.len();
        if n == 0 {
            return;
        }
        if self.velocities.len() != n {
            self.velocities = vec![Vec3::ZERO; n];
        }
        let alpha = self.alpha;

        // Many-body repulsion (O(n^2); graphs here are small)
        for i in 0..n {
            for j in (i + 1)..n {
                let mut d = graph.nodes[j].position - graph.nodes[i].position;
                let mut l2 = d.length_squared();
                if l2 < 1e-6 {
                    // coincident: deterministic nudge
                    d = Vec3::new(1e-3 * (i as f32 + 1.0), 1e-3, -1e-3 * (j as f32 + 1.0));
                    l2 = d.length_squared();
                }
                let w = self.charge * alpha / l2;
                self.velocities[i] += d * w;
                self.velocities[j] -= d * w;
            }
        }

        // Link springs
        for link in &graph.links {
            let (s, t) = (link.source, link.target);
            if s == t {
                continue;
            }
            let d = (graph.nodes[t].position + self.velocities[t]) - (graph.nodes[s].position + self.velocities[s]);
            let l = d.length().max(1e-6);
            let k = (l - self.link_distance) / l * alpha * self.link_strength;
            let delta = d * k * 0.5;
            self.velocities[t] -= delta;
            self.velocities[s] += delta;
        }

        // Integrate
        for (node, v) in graph.nodes.iter_mut().zip(self.velocities.iter_mut()) {
            *v *= self.velocity_decay;
            node.position += *v;
        }

        // Centering pulls the centroid back to the origin
        let centroid = graph.nodes.iter().map(|n| n.position).sum::<Vec3>() / n as f32;
        for node in &mut graph.nodes {
            node.position -= centroid * self.center_strength.clamp(0.0, 1.0);
        }

        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
    }

    /// Run a fixed number of ticks before first paint.
    pub fn warmup(&mut self, graph: &mut SceneGraph, ticks: usize) {
        for _ in 0..ticks {
            if self.is_settled() {
                break;
            }
            self.tick(graph);
        }
    }
}

/// Assign positions for a freshly built graph.
pub fn apply_layout(graph: &mut SceneGraph, mode: ViewMode, kind: LayoutKind, seed: u64, warmup_ticks: usize) {
    apply_tiered_layout(graph, mode, seed);
    if kind == LayoutKind::Force {
        let mut sim = ForceLayout::new(mode.base_radius());
        sim.warmup(graph, warmup_ticks);
    }
}
