use std::collections::BTreeSet;

use tracing::trace;

use crate::{
    edge::{Edge, EdgeArena, EdgeIndex},
    node::{Node, NodeIndex},
};

mod generalize;
mod invariants;
mod merge;

pub use invariants::InvariantViolation;

/// The id given to the start node of every automaton.
pub const START_ID: &str = "0";

/// Tracks which kind of merging the next call to [`Automaton::step_merge`] performs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum MergePhase {
    /// No merge step has run yet, the next step unifies all final nodes.
    #[default]
    NotStarted,
    /// The final nodes have been unified, every further step merges intermediate nodes.
    FinalsUnified,
}

/// Summary of a single call to [`Automaton::step_merge`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StepReport {
    /// The phase the automaton is in after the step.
    pub phase: MergePhase,
    /// How many groups of at least two nodes were merged.
    pub merges: usize,
    /// Whether the step repaired a nondeterministic node instead of merging equivalent ones.
    pub determinized: bool,
}

impl StepReport {
    /// Returns true if the step changed the structure of the automaton.
    pub fn changed(&self) -> bool {
        self.merges > 0
    }
}

/// A deterministic automaton over whitespace separated tokens. It starts out as a prefix tree
/// of the ingested sentences and is generalized by repeatedly calling [`Automaton::step_merge`].
///
/// The automaton owns all of its nodes and edges, they are referred to by [`NodeIndex`] and
/// [`EdgeIndex`] handles. A handle stays valid until the node or edge it refers to is merged
/// away, after that the slot is empty and lookups return `None`.
///
/// # Example
/// ```
/// use fsa_induction::prelude::*;
///
/// let mut fsa = Automaton::new();
/// fsa.ingest("Mary eats pies");
/// fsa.ingest("John bakes cakes");
/// fsa.ingest("Mary bakes cakes");
/// assert_eq!(fsa.finals().count(), 3);
///
/// fsa.step_merge().unwrap();
/// assert_eq!(fsa.finals().count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Automaton {
    nodes: Vec<Option<Node>>,
    edges: EdgeArena,
    start: NodeIndex,
    finals: BTreeSet<NodeIndex>,
    next_id: usize,
    phase: MergePhase,
    frontier: BTreeSet<NodeIndex>,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Creates an automaton consisting only of a non-accepting start node.
    pub fn new() -> Self {
        let start = NodeIndex(0);
        Self {
            nodes: vec![Some(Node::new(start, START_ID, false))],
            edges: EdgeArena::default(),
            start,
            finals: BTreeSet::new(),
            next_id: 1,
            phase: MergePhase::NotStarted,
            frontier: BTreeSet::new(),
        }
    }

    /// Extends the automaton by the given sentence. Starting in the start node, tokens are
    /// consumed along existing edges for as long as possible, the remaining tokens each get
    /// a fresh node. The node reached after the last token becomes accepting, for the empty
    /// sentence this is the start node itself.
    pub fn ingest(&mut self, sentence: &str) {
        let mut current = self.start;
        for token in sentence.split_whitespace() {
            current = match self.successor(current, token) {
                Some(next) => next,
                None => {
                    let next = self.add_fresh_node();
                    self.add_edge(current, token, next);
                    next
                }
            };
        }
        trace!("sentence \"{sentence}\" ends in {current}");
        self.mark_final(current);
    }

    /// Returns the designated start node.
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    /// Gives a reference to the node with handle `q` if it is still live.
    pub fn node(&self, q: NodeIndex) -> Option<&Node> {
        self.nodes.get(q.0)?.as_ref()
    }

    /// Gives a reference to the edge with handle `idx` if it is still live.
    pub fn edge(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.edges.get(idx)
    }

    /// Returns true if `q` refers to a node that has not been merged away.
    pub fn is_live(&self, q: NodeIndex) -> bool {
        self.node(q).is_some()
    }

    /// Iterates over all live nodes in ascending handle order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten()
    }

    /// Iterates over all live edges in ascending handle order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> + '_ {
        self.edges.iter()
    }

    /// Iterates over the accepting nodes.
    pub fn finals(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.finals.iter().copied()
    }

    /// The nodes that the next intermediate merge step inspects.
    pub fn frontier(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.frontier.iter().copied()
    }

    /// Returns the current [`MergePhase`].
    pub fn phase(&self) -> MergePhase {
        self.phase
    }

    /// Returns true once the first merge step has unified the final nodes.
    pub fn finals_merged(&self) -> bool {
        self.phase == MergePhase::FinalsUnified
    }

    /// The number of live nodes.
    pub fn size(&self) -> usize {
        self.nodes().count()
    }

    /// The number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.live()
    }

    /// Follows the first edge labelled `label` that leaves `q`.
    pub fn successor(&self, q: NodeIndex, label: &str) -> Option<NodeIndex> {
        self.node(q)?.successor(label, &self.edges)
    }

    /// Iterates over the edges leaving `q`. Returns `None` if `q` is not live.
    pub fn edges_from(&self, q: NodeIndex) -> Option<impl Iterator<Item = &Edge> + '_> {
        Some(self.node(q)?.outgoing_edges(&self.edges))
    }

    /// Iterates over the edges reaching `q`. Returns `None` if `q` is not live.
    pub fn edges_to(&self, q: NodeIndex) -> Option<impl Iterator<Item = &Edge> + '_> {
        Some(self.node(q)?.incoming_edges(&self.edges))
    }

    /// Returns true if no node has two outgoing edges with the same label.
    pub fn is_deterministic(&self) -> bool {
        self.nodes()
            .all(|node| !node.needs_to_merge_outgoing_edges(&self.edges))
    }

    pub(crate) fn node_mut(&mut self, q: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(q.0)?.as_mut()
    }

    pub(crate) fn needs_determinization(&self, q: NodeIndex) -> bool {
        self.node(q)
            .is_some_and(|node| node.needs_to_merge_outgoing_edges(&self.edges))
    }

    fn push_node(&mut self, id: String, accepting: bool) -> NodeIndex {
        let q = NodeIndex(self.nodes.len());
        self.nodes.push(Some(Node::new(q, id, accepting)));
        q
    }

    fn add_fresh_node(&mut self) -> NodeIndex {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.push_node(id, false)
    }

    fn add_edge(&mut self, source: NodeIndex, label: &str, target: NodeIndex) -> EdgeIndex {
        let edge = Edge::new(source, label, target);
        let idx = self.edges.add(edge.clone());
        for q in [source, target] {
            if let Some(node) = self.node_mut(q) {
                node.attach(idx, &edge);
            }
            if source == target {
                break;
            }
        }
        trace!("added edge {idx} {source} -{label}-> {target}");
        idx
    }

    fn mark_final(&mut self, q: NodeIndex) {
        if let Some(node) = self.node_mut(q) {
            node.set_accepting(true);
            self.finals.insert(q);
        }
    }

    /// Takes the node out of the live set, its slot stays empty from now on.
    fn remove_node(&mut self, q: NodeIndex) -> Option<Node> {
        self.finals.remove(&q);
        self.nodes.get_mut(q.0)?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{Automaton, MergePhase, START_ID};
    use crate::tests::{reached, sample};

    #[test]
    fn fresh_automaton_has_only_start() {
        let fsa = Automaton::default();
        assert_eq!(fsa.size(), 1);
        assert_eq!(fsa.edge_count(), 0);
        assert_eq!(fsa.node(fsa.start()).map(|n| n.id()), Some(START_ID));
        assert_eq!(fsa.phase(), MergePhase::NotStarted);
        assert!(!fsa.finals_merged());
        assert!(fsa.check_invariants().is_ok());
    }

    #[test]
    fn ingest_builds_prefix_tree() {
        let fsa = sample();
        // shared "Mary" prefix, everything else fresh
        assert_eq!(fsa.size(), 9);
        assert_eq!(fsa.edge_count(), 8);
        assert_eq!(fsa.finals().count(), 3);
        assert_eq!(
            fsa.nodes().map(|n| n.id().to_string()).collect::<Vec<_>>(),
            (0..9).map(|i| i.to_string()).collect::<Vec<_>>()
        );
        assert!(fsa.is_deterministic());
        fsa.check_invariants().unwrap();
    }

    #[test]
    fn ingested_sentences_are_accepted() {
        let mut fsa = Automaton::new();
        let sentences = ["a b c", "a  b", "a\tc\nd", "b"];
        for s in sentences {
            fsa.ingest(s);
            fsa.check_invariants().unwrap();
        }
        for s in sentences {
            let q = reached(&fsa, s).expect("path must exist");
            assert!(fsa.node(q).unwrap().is_accepting(), "{s:?} is not accepted");
        }
        // "a b" is a prefix of "a b c" and was marked explicitly
        assert_eq!(fsa.finals().count(), 4);
        assert!(!fsa.node(reached(&fsa, "a").unwrap()).unwrap().is_accepting());
    }

    #[test]
    fn repeated_sentence_changes_nothing() {
        let mut fsa = Automaton::new();
        fsa.ingest("x y");
        fsa.ingest("x y");
        assert_eq!(fsa.size(), 3);
        assert_eq!(fsa.edge_count(), 2);
        assert_eq!(fsa.finals().count(), 1);
    }

    #[test]
    fn empty_sentence_accepts_start() {
        let mut fsa = Automaton::new();
        fsa.ingest("");
        fsa.ingest("   ");
        assert_eq!(fsa.size(), 1);
        assert!(fsa.node(fsa.start()).unwrap().is_accepting());
        assert_eq!(fsa.finals().collect::<Vec<_>>(), vec![fsa.start()]);
        fsa.check_invariants().unwrap();
    }

    #[test]
    fn edge_views_of_trie() {
        let fsa = sample();
        let mary = fsa.successor(fsa.start(), "Mary").unwrap();
        let labels = fsa
            .edges_from(mary)
            .unwrap()
            .map(|e| e.label().to_string())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["eats", "bakes"]);
        assert_eq!(fsa.edges_to(mary).unwrap().count(), 1);
        let node = fsa.node(mary).unwrap();
        assert_eq!(node.edges().len(), 3);
    }
}
