use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::{debug, trace};

use super::{Automaton, InvariantViolation};
use crate::{
    edge::EdgeIndex,
    math::Set,
    node::{Node, NodeIndex},
};

impl Automaton {
    /// Replaces all nodes of `group` by a single fresh node and returns it. The new node is
    /// accepting if any member was, it becomes the start node if the start node is among the
    /// members and its id joins the ids of the members in ascending handle order.
    ///
    /// Every edge touching a member is kept and rewired in place: an endpoint inside the group
    /// is redirected to the new node, so edges between members turn into self-loops. If rewiring
    /// produces an edge that the new node already has, i.e. one with the same source, target and
    /// label, the later edge is discarded.
    ///
    /// An empty group yields `None`, a singleton group is returned unchanged. Merging a node
    /// that is no longer live is an error.
    pub(crate) fn merge_nodes(
        &mut self,
        group: &BTreeSet<NodeIndex>,
    ) -> Result<Option<NodeIndex>, InvariantViolation> {
        if let Some(&retired) = group.iter().find(|&&q| !self.is_live(q)) {
            return Err(InvariantViolation::RetiredMergeInput(retired));
        }
        match group.len() {
            0 => return Ok(None),
            1 => return Ok(group.first().copied()),
            _ => {}
        }

        let members = group.iter().filter_map(|&q| self.node(q)).collect_vec();
        let id = members.iter().map(|node| node.id()).join(",");
        let accepting = members.iter().any(|node| node.is_accepting());
        let replaced_final = members.iter().any(|node| self.finals.contains(&node.index()));
        let affected: BTreeSet<EdgeIndex> = members
            .iter()
            .flat_map(|node| node.edges().iter().copied())
            .collect();
        let replaced_start = group.contains(&self.start);

        let merged = self.push_node(id, accepting);
        debug!(
            "merging {{{}}} into {merged}",
            group.iter().map(|q| q.to_string()).join(", ")
        );

        let mut attached = Set::default();
        for idx in affected {
            let Some(edge) = self.edges.get_mut(idx) else {
                let node = group
                    .iter()
                    .copied()
                    .find(|&q| self.node(q).is_some_and(|n| n.edges().contains(&idx)))
                    .unwrap_or(merged);
                return Err(InvariantViolation::MissingEdge { node, edge: idx });
            };
            let outside: Vec<NodeIndex> = [edge.source(), edge.target()]
                .into_iter()
                .filter(|q| !group.contains(q))
                .dedup()
                .collect();
            if group.contains(&edge.source()) {
                edge.set_source(merged);
            }
            if group.contains(&edge.target()) {
                edge.set_target(merged);
            }

            let key = (edge.source(), edge.target(), edge.label().to_string());
            if !attached.insert(key) {
                trace!(
                    "discarding duplicate edge {idx} {} -{}-> {}",
                    edge.source(),
                    edge.label(),
                    edge.target()
                );
                for q in outside {
                    if let Some(node) = self.node_mut(q) {
                        node.detach(idx);
                    }
                }
                self.edges.remove(idx);
                continue;
            }

            let edge = edge.clone();
            if let Some(node) = self.node_mut(merged) {
                node.attach(idx, &edge);
            }
        }

        for &q in group {
            self.remove_node(q);
        }
        if replaced_start {
            self.start = merged;
        }
        if replaced_final {
            self.finals.insert(merged);
        }

        self.check_merge(merged, group)?;
        Ok(Some(merged))
    }

    /// Verifies that no live edge still refers to a member of `group` and that `merged`
    /// carries no duplicate adjacency.
    fn check_merge(
        &self,
        merged: NodeIndex,
        group: &BTreeSet<NodeIndex>,
    ) -> Result<(), InvariantViolation> {
        if let Some((edge, e)) = self
            .edges
            .iter()
            .find(|(_, e)| group.contains(&e.source()) || group.contains(&e.target()))
        {
            let node = if group.contains(&e.source()) {
                e.source()
            } else {
                e.target()
            };
            return Err(InvariantViolation::DanglingEdge { edge, node });
        }

        let node = self
            .node(merged)
            .ok_or(InvariantViolation::RetiredMergeInput(merged))?;
        check_no_duplicates(node, self)
    }
}

fn check_no_duplicates(node: &Node, fsa: &Automaton) -> Result<(), InvariantViolation> {
    let mut seen = Set::default();
    for (&idx, edge) in node
        .edges()
        .iter()
        .filter_map(|idx| fsa.edge(*idx).map(|e| (idx, e)))
    {
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
