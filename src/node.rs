use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Debug, Display},
};

use crate::{
    adjacency::Adjacency,
    edge::{Edge, EdgeArena, EdgeIndex},
    math::Set,
};

/// Stable handle of a [`Node`] inside an [`crate::Automaton`]. Handles are handed out in
/// increasing order and never reused, so comparing handles compares creation order.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Returns the raw position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Debug for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// A state of the automaton. Besides its id and acceptance it stores three views on the
/// edges touching it: all incident edges, the ones leaving it and the ones reaching it.
/// A self-loop shows up in both directed views but only once among the incident edges.
///
/// The views only hold [`EdgeIndex`] handles, the edges themselves live in the arena of
/// the owning automaton.
#[derive(Clone, Debug)]
pub struct Node {
    index: NodeIndex,
    id: String,
    accepting: bool,
    edges: Vec<EdgeIndex>,
    outgoing: Vec<EdgeIndex>,
    incoming: Vec<EdgeIndex>,
}

impl Node {
    pub(crate) fn new<S: Into<String>>(index: NodeIndex, id: S, accepting: bool) -> Self {
        Self {
            index,
            id: id.into(),
            accepting,
            edges: vec![],
            outgoing: vec![],
            incoming: vec![],
        }
    }

    /// The handle under which this node is stored.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// The id of the node. Fresh nodes carry a number, merged nodes the comma separated
    /// ids of the nodes they replaced.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if some ingested sentence ends in this node.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub(crate) fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    /// All edges touching this node.
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// Edges whose source is this node.
    pub fn outgoing(&self) -> &[EdgeIndex] {
        &self.outgoing
    }

    /// Edges whose target is this node.
    pub fn incoming(&self) -> &[EdgeIndex] {
        &self.incoming
    }

    /// Files the edge `idx` into the views it belongs to. Does nothing if the edge does not
    /// touch this node.
    pub(crate) fn attach(&mut self, idx: EdgeIndex, edge: &Edge) {
        if !edge.incident_to(self.index) {
            return;
        }
        if edge.source() == self.index {
            self.outgoing.push(idx);
        }
        if edge.target() == self.index {
            self.incoming.push(idx);
        }
        self.edges.push(idx);
    }

    /// Removes the edge `idx` from all views.
    pub(crate) fn detach(&mut self, idx: EdgeIndex) {
        self.edges.retain(|&e| e != idx);
        self.outgoing.retain(|&e| e != idx);
        self.incoming.retain(|&e| e != idx);
    }

    pub(crate) fn outgoing_edges<'a>(
        &'a self,
        edges: &'a EdgeArena,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing.iter().filter_map(|&idx| edges.get(idx))
    }

    pub(crate) fn incoming_edges<'a>(
        &'a self,
        edges: &'a EdgeArena,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.incoming.iter().filter_map(|&idx| edges.get(idx))
    }

    /// Follows the first outgoing edge labelled `label`.
    pub(crate) fn successor(&self, label: &str, edges: &EdgeArena) -> Option<NodeIndex> {
        self.outgoing_edges(edges)
            .find(|e| e.label() == label)
            .map(Edge::target)
    }

    /// Groups the targets of all outgoing edges by their label.
    pub(crate) fn label_to_targets<'a>(
        &'a self,
        edges: &'a EdgeArena,
    ) -> BTreeMap<&'a str, BTreeSet<NodeIndex>> {
        let mut map: BTreeMap<&str, BTreeSet<NodeIndex>> = BTreeMap::new();
        for edge in self.outgoing_edges(edges) {
            map.entry(edge.label()).or_default().insert(edge.target());
        }
        map
    }

    /// Returns true if two outgoing edges share a label, i.e. the node is nondeterministic.
    pub(crate) fn needs_to_merge_outgoing_edges(&self, edges: &EdgeArena) -> bool {
        let mut seen = Set::default();
        self.outgoing_edges(edges).any(|e| !seen.insert(e.label()))
    }

    /// The sources of all incoming edges, without the node itself.
    pub(crate) fn predecessors(&self, edges: &EdgeArena) -> BTreeSet<NodeIndex> {
        self.incoming_edges(edges)
            .map(Edge::source)
            .filter(|&q| q != self.index)
            .collect()
    }

    pub(crate) fn adjacencies(&self, edges: &EdgeArena) -> Vec<Adjacency> {
        self.outgoing_edges(edges).map(Edge::adjacency).collect()
    }
}
