use glam::Vec3;

use super::SceneTransform;
use crate::graph_utils::graph::SceneGraph;
use crate::graph_utils::layout::ViewMode;

// Node sphere radius relative to the mode's layout radius
pub const NODE_RADIUS_FACTOR: f32 = 0.05;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Distance along the ray to the first intersection with a sphere, if any.
/// A ray starting inside the sphere hits at t = 0.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 || b > 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

/// World-space sphere radius of a node, including its highlight scale.
pub fn node_radius(graph: &SceneGraph, idx: usize, mode: ViewMode, transform: &SceneTransform) -> f32 {
    graph
        .node(idx)
        .map(|n| mode.base_radius() * NODE_RADIUS_FACTOR * n.size * n.visual.scale * transform.scale)
        .unwrap_or(0.0)
}

/// Nearest node whose sphere the ray intersects.
pub fn pick_node(graph: &SceneGraph, ray: &Ray, mode: ViewMode, transform: &SceneTransform) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, node) in graph.nodes.iter().enumerate() {
        let center = transform.apply(node.position);
        let r = node_radius(graph, idx, mode, transform);
        if let Some(t) = ray_sphere(ray, center, r)
            && best.is_none_or(|(_, bt)| t < bt)
        {
            best = Some((idx, t));
        }
    }
    best.map(|(idx, _)| idx)
}
