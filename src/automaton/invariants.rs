use thiserror::Error;

use super::Automaton;
use crate::{edge::EdgeIndex, math::Set, node::Node, node::NodeIndex};

/// Violations of the structural contract of an [`Automaton`]. Each of them points at a defect
/// in the merging machinery rather than at bad input, there is no way to recover from them.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[allow(missing_docs)]
pub enum InvariantViolation {
    #[error("start node {0} has been merged away")]
    RetiredStart(NodeIndex),
    #[error("final node {0} has been merged away")]
    RetiredFinal(NodeIndex),
    #[error("cannot merge {0}, it has already been merged away")]
    RetiredMergeInput(NodeIndex),
    #[error("frontier refers to {0}, which has been merged away")]
    RetiredFrontierNode(NodeIndex),
    #[error("edge {edge} refers to {node}, which has been merged away")]
    DanglingEdge { edge: EdgeIndex, node: NodeIndex },
    #[error("{node} refers to edge {edge}, which has been discarded")]
    MissingEdge { node: NodeIndex, edge: EdgeIndex },
    #[error("edge {edge} is filed incorrectly in the views of {node}")]
    MisfiledEdge { node: NodeIndex, edge: EdgeIndex },
    #[error("edge {edge} duplicates {from} -{label}-> {target}")]
    DuplicateEdge {
        edge: EdgeIndex,
        from: NodeIndex,
        label: String,
        target: NodeIndex,
    },
    #[error("{0} is accepting but not final")]
    AcceptingNotFinal(NodeIndex),
    #[error("{0} is final but not accepting")]
    FinalNotAccepting(NodeIndex),
}

impl Automaton {
    /// Checks the full structural contract:
    /// - the start node, all final nodes and all frontier nodes are live,
    /// - a node is final if and only if it is accepting,
    /// - each view of a node refers to live edges filed in the correct direction and each
    ///   incident edge appears exactly once,
    /// - every live edge is known to both of its endpoints,
    /// - no two live edges share source, target and label.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if !self.is_live(self.start) {
            return Err(InvariantViolation::RetiredStart(self.start));
        }
        for q in self.finals() {
            let node = self.node(q).ok_or(InvariantViolation::RetiredFinal(q))?;
            if !node.is_accepting() {
                return Err(InvariantViolation::FinalNotAccepting(q));
            }
        }
        if let Some(q) = self.frontier().find(|&q| !self.is_live(q)) {
            return Err(InvariantViolation::RetiredFrontierNode(q));
        }

        for node in self.nodes() {
            if node.is_accepting() && !self.finals.contains(&node.index()) {
                return Err(InvariantViolation::AcceptingNotFinal(node.index()));
            }
            self.check_views(node)?;
        }

        let mut seen = Set::default();
        for (idx, edge) in self.edges() {
            for q in [edge.source(), edge.target()] {
                let node = self
                    .node(q)
                    .ok_or(InvariantViolation::DanglingEdge { edge: idx, node: q })?;
                if !node.edges().contains(&idx) {
                    return Err(InvariantViolation::MisfiledEdge { node: q, edge: idx });
                }
            }
            if !seen.insert((edge.source(), edge.target(), edge.label())) {
                return Err(InvariantViolation::DuplicateEdge {
                    edge: idx,
                    from: edge.source(),
                    label: edge.label().to_string(),
                    target: edge.target(),
                });
            }
        }
        Ok(())
    }

    fn check_views(&self, node: &Node) -> Result<(), InvariantViolation> {
        let q = node.index();
        let misfiled = |edge| InvariantViolation::MisfiledEdge { node: q, edge };

        let mut incident = Set::default();
        for &idx in node.edges() {
            let edge = self
                .edge(idx)
                .ok_or(InvariantViolation::MissingEdge { node: q, edge: idx })?;
            if !incident.insert(idx) || !edge.incident_to(q) {
                return Err(misfiled(idx));
            }
        }

        let mut outgoing = Set::default();
        for &idx in node.outgoing() {
            let edge = self
                .edge(idx)
                .ok_or(InvariantViolation::MissingEdge { node: q, edge: idx })?;
            if edge.source() != q || !incident.contains(&idx) || !outgoing.insert(idx) {
                return Err(misfiled(idx));
            }
        }
        let mut incoming = Set::default();
        for &idx in node.incoming() {
            let edge = self
                .edge(idx)
                .ok_or(InvariantViolation::MissingEdge { node: q, edge: idx })?;
            if edge.target() != q || !incident.contains(&idx) || !incoming.insert(idx) {
                return Err(misfiled(idx));
            }
        }

        // every incident edge is in the view matching each of its roles
        for &idx in node.edges() {
            let Some(edge) = self.edge(idx) else { continue };
            if (edge.source() == q) != outgoing.contains(&idx)
                || (edge.target() == q) != incoming.contains(&idx)
            {
                return Err(misfiled(idx));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InvariantViolation;
    use crate::{automaton::Automaton, edge::EdgeIndex, node::NodeIndex};

    #[test]
    fn detects_view_corruption() {
        let mut fsa = Automaton::new();
        fsa.ingest("a b");
        fsa.check_invariants().unwrap();

        fsa.node_mut(NodeIndex(1)).unwrap().detach(EdgeIndex(1));
        assert_eq!(
            fsa.check_invariants(),
            Err(InvariantViolation::MisfiledEdge {
                node: NodeIndex(1),
                edge: EdgeIndex(1)
            })
        );
    }

    #[test]
    fn detects_dangling_edges() {
        let mut fsa = Automaton::new();
        fsa.ingest("a b");
        fsa.ingest("c");
        fsa.nodes[1] = None;
        assert_eq!(
            fsa.check_invariants(),
            Err(InvariantViolation::DanglingEdge {
                edge: EdgeIndex(0),
                node: NodeIndex(1)
            })
        );
    }

    #[test]
    fn detects_out_of_sync_finals() {
        let mut fsa = Automaton::new();
        fsa.ingest("a");
        fsa.node_mut(NodeIndex(1)).unwrap().set_accepting(false);
        assert_eq!(
            fsa.check_invariants(),
            Err(InvariantViolation::FinalNotAccepting(NodeIndex(1)))
        );

        let mut fsa = Automaton::new();
        fsa.ingest("a");
        fsa.finals.clear();
        assert_eq!(
            fsa.check_invariants(),
            Err(InvariantViolation::AcceptingNotFinal(NodeIndex(1)))
        );
    }

    #[test]
    fn detects_duplicate_edges() {
        let mut fsa = Automaton::new();
        fsa.ingest("a");
        fsa.add_edge(NodeIndex(0), "a", NodeIndex(1));
        let err = fsa.check_invariants().unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::DuplicateEdge {
                edge: EdgeIndex(1),
                from: NodeIndex(0),
                label: "a".to_string(),
                target: NodeIndex(1)
            }
        );
        assert_eq!(err.to_string(), "edge e1 duplicates q0 -a-> q1");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn detects_retired_frontier_nodes() {
        let mut fsa = Automaton::new();
        fsa.frontier.insert(NodeIndex(42));
        assert_eq!(
            fsa.check_invariants(),
            Err(InvariantViolation::RetiredFrontierNode(NodeIndex(42)))
        );
    }
}
