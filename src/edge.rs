use std::fmt::{Debug, Display};

use crate::{adjacency::Adjacency, node::NodeIndex};

/// Stable handle of an [`Edge`] inside an [`crate::Automaton`]. Handles are never reused,
/// once an edge is discarded its handle stays dangling forever.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct EdgeIndex(pub(crate) usize);

impl EdgeIndex {
    /// Returns the raw position of the edge in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Debug for EdgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl Display for EdgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A directed edge between two nodes, labelled with a token. The label of an edge never changes,
/// its endpoints are rewritten in place whenever one of them is merged away.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Edge {
    source: NodeIndex,
    target: NodeIndex,
    label: String,
}

impl Edge {
    /// Creates a new edge from `source` to `target` labelled with `label`.
    pub fn new<L: Into<String>>(source: NodeIndex, label: L, target: NodeIndex) -> Self {
        Self {
            source,
            target,
            label: label.into(),
        }
    }

    /// Returns the node this edge leaves.
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// Returns the node this edge reaches.
    pub fn target(&self) -> NodeIndex {
        self.target
    }

    /// Gives the token labelling this edge.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true if the edge leaves and reaches the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Returns true if `node` is one of the endpoints.
    pub fn incident_to(&self, node: NodeIndex) -> bool {
        self.source == node || self.target == node
    }

    /// The [`Adjacency`] of this edge, i.e. where its label leads.
    pub fn adjacency(&self) -> Adjacency {
        Adjacency::new(self.label.clone(), self.target)
    }

    pub(crate) fn set_source(&mut self, source: NodeIndex) {
        self.source = source;
    }

    pub(crate) fn set_target(&mut self, target: NodeIndex) {
        self.target = target;
    }

    /// Splits the edge into `(source, label, target)`.
    pub fn into_tuple(self) -> (NodeIndex, String, NodeIndex) {
        (self.source, self.label, self.target)
    }
}

/// Owns all edges of an automaton. Discarded edges leave a `None` slot behind so that
/// the handles of the remaining edges stay valid.
#[derive(Clone, Debug, Default)]
pub(crate) struct EdgeArena {
    edges: Vec<Option<Edge>>,
}

impl EdgeArena {
    pub(crate) fn add(&mut self, edge: Edge) -> EdgeIndex {
        let idx = EdgeIndex(self.edges.len());
        self.edges.push(Some(edge));
        idx
    }

    pub(crate) fn get(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.edges.get(idx.0)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, idx: EdgeIndex) -> Option<&mut Edge> {
        self.edges.get_mut(idx.0)?.as_mut()
    }

    pub(crate) fn remove(&mut self, idx: EdgeIndex) -> Option<Edge> {
        self.edges.get_mut(idx.0)?.take()
    }

    /// Iterates over all live edges in ascending handle order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeIndex(i), e)))
    }

    pub(crate) fn live(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }
}
