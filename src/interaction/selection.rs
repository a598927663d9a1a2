use crate::graph_utils::graph::{NodeVisual, SceneGraph};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    Selected(usize),
}

/// Single owner of node highlight visuals. Every input path (pointer, touch,
/// controller, keyboard reset) goes through these transitions, so at most one
/// node is ever highlighted.
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Selection,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.current
    }

    pub fn selected(&self) -> Option<usize> {
        match self.current {
            Selection::Idle => None,
            Selection::Selected(idx) => Some(idx),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current == Selection::Idle
    }

    /// Highlight `idx`, reverting any previous selection first.
    /// Returns false (and changes nothing) if `idx` is not a node.
    pub fn select(&mut self, graph: &mut SceneGraph, idx: usize) -> bool {
        if idx >= graph.nodes.len() {
            return false;
        }
        if self.current == Selection::Selected(idx) {
            return true;
        }
        self.revert(graph);
        graph.nodes[idx].visual = NodeVisual::HIGHLIGHT;
        self.current = Selection::Selected(idx);
        log::debug!("selected node {:?}", graph.nodes[idx].id());
        true
    }

    /// Back to Idle with every node at baseline.
    pub fn reset(&mut self, graph: &mut SceneGraph) {
        self.revert(graph);
        self.current = Selection::Idle;
    }

    fn revert(&mut self, graph: &mut SceneGraph) {
        if let Selection::Selected(prev) = self.current
            && let Some(node) = graph.nodes.get_mut(prev)
        {
            node.visual = NodeVisual::BASELINE;
        }
    }
}
