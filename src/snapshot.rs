use std::collections::BTreeSet;

use itertools::Itertools;

use crate::{edge::EdgeIndex, node::NodeIndex, Automaton, Show};

/// A node as seen in a [`Snapshot`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeEntry {
    /// Handle of the node at the time the snapshot was taken.
    pub index: NodeIndex,
    /// The id of the node.
    pub id: String,
    /// Whether the node is accepting.
    pub accepting: bool,
}

/// An edge as seen in a [`Snapshot`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EdgeEntry {
    /// Handle of the edge at the time the snapshot was taken.
    pub index: EdgeIndex,
    /// Node the edge leaves.
    pub source: NodeIndex,
    /// Token the edge is labelled with.
    pub label: String,
    /// Node the edge reaches.
    pub target: NodeIndex,
}

/// All edges between one ordered pair of nodes, combined for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CombinedEdge {
    source: NodeIndex,
    target: NodeIndex,
    labels: Vec<String>,
}

impl CombinedEdge {
    /// The node all combined edges leave.
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// The node all combined edges reach.
    pub fn target(&self) -> NodeIndex {
        self.target
    }

    /// The labels of the combined edges, in the order of their handles.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The labels joined into a single presentation label, e.g. `"a, b"`.
    pub fn label(&self) -> String {
        self.labels.join(", ")
    }
}

/// A read-only copy of the structure of an [`Automaton`] at one point in time. The handles it
/// contains may refer to retired nodes and edges as soon as the automaton is mutated again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    nodes: Vec<NodeEntry>,
    edges: Vec<EdgeEntry>,
    start: NodeIndex,
    accepting: BTreeSet<NodeIndex>,
}

impl Automaton {
    /// Copies the current nodes, edges, start node and accepting nodes into a [`Snapshot`].
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self
                .nodes()
                .map(|node| NodeEntry {
                    index: node.index(),
                    id: node.id().to_string(),
                    accepting: node.is_accepting(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|(index, edge)| EdgeEntry {
                    index,
                    source: edge.source(),
                    label: edge.label().to_string(),
                    target: edge.target(),
                })
                .collect(),
            start: self.start(),
            accepting: self.finals().collect(),
        }
    }
}

impl Snapshot {
    /// The nodes in ascending handle order.
    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    /// The edges in ascending handle order.
    pub fn edges(&self) -> &[EdgeEntry] {
        &self.edges
    }

    /// The start node.
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    /// The accepting nodes.
    pub fn accepting(&self) -> &BTreeSet<NodeIndex> {
        &self.accepting
    }

    /// Looks up the entry of the node with handle `q`.
    pub fn node(&self, q: NodeIndex) -> Option<&NodeEntry> {
        self.nodes
            .binary_search_by_key(&q, |entry| entry.index)
            .ok()
            .map(|pos| &self.nodes[pos])
    }

    /// Looks up the id of the node with handle `q`.
    pub fn id(&self, q: NodeIndex) -> Option<&str> {
        self.node(q).map(|entry| entry.id.as_str())
    }

    /// Combines all edges between the same ordered pair of nodes into one entry. Pairs appear
    /// in the order of their first edge. This only affects presentation, the snapshot itself
    /// keeps every edge.
    pub fn combined_edges(&self) -> Vec<CombinedEdge> {
        self.edges
            .iter()
            .into_group_map_by(|edge| (edge.source, edge.target))
            .into_iter()
            .map(|((source, target), edges)| {
                let first = edges.iter().map(|e| e.index).min();
                (
                    first,
                    CombinedEdge {
                        source,
                        target,
                        labels: edges.into_iter().map(|e| e.label.clone()).collect(),
                    },
                )
            })
            .sorted_by_key(|(first, _)| *first)
            .map(|(_, combined)| combined)
            .collect()
    }

    fn show_node(&self, q: NodeIndex) -> String {
        use owo_colors::OwoColorize;
        let id = self.id(q).unwrap_or("?");
        match (q == self.start, self.accepting.contains(&q)) {
            (true, true) => id.green().bold().to_string(),
            (true, false) => id.bold().to_string(),
            (false, true) => id.green().to_string(),
            (false, false) => id.to_string(),
        }
    }
}

impl Show for Snapshot {
    fn show(&self) -> String {
        let mut b = tabled::builder::Builder::default();
        b.push_record(vec![
            "source".to_string(),
            "labels".to_string(),
            "target".to_string(),
        ]);
        for edge in self.combined_edges() {
            b.push_record(vec![
                self.show_node(edge.source()),
                edge.label(),
                self.show_node(edge.target()),
            ]);
        }

        format!(
            "{}\n{} nodes, {} edges, start {}, accepting {{{}}}",
            b.build().with(tabled::settings::Style::ascii()),
            self.nodes.len(),
            self.edges.len(),
            self.show_node(self.start),
            self.accepting.iter().map(|&q| self.show_node(q)).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{tests::sample, Show};

    #[test]
    fn snapshot_reflects_automaton() {
        let fsa = sample();
        let snapshot = fsa.export_snapshot();
        assert_eq!(snapshot.nodes().len(), fsa.size());
        assert_eq!(snapshot.edges().len(), fsa.edge_count());
        assert_eq!(snapshot.start(), fsa.start());
        assert_eq!(snapshot.id(fsa.start()), Some("0"));
        assert_eq!(
            snapshot.accepting().iter().copied().collect::<Vec<_>>(),
            fsa.finals().collect::<Vec<_>>()
        );
        assert!(snapshot
            .nodes()
            .iter()
            .all(|entry| entry.accepting == snapshot.accepting().contains(&entry.index)));
    }

    #[test]
    fn parallel_edges_are_combined_for_display_only() {
        let mut fsa = sample();
        fsa.merge_to_fixpoint(10).unwrap();
        let snapshot = fsa.export_snapshot();
        assert_eq!(snapshot.edges().len(), 6);

        let combined = snapshot.combined_edges();
        assert_eq!(combined.len(), 5);
        let from_start = combined
            .iter()
            .find(|edge| edge.source() == snapshot.start())
            .unwrap();
        assert_eq!(from_start.label(), "Mary, John");
        assert_eq!(from_start.labels().len(), 2);
        assert_eq!(snapshot.id(from_start.target()), Some("1,4"));

        // combining left the automaton alone
        assert_eq!(fsa.edge_count(), 6);
        assert_eq!(fsa.export_snapshot(), snapshot);
    }

    #[test]
    fn show_renders_edge_table() {
        let mut fsa = sample();
        fsa.merge_to_fixpoint(10).unwrap();
        let shown = fsa.export_snapshot().show();
        assert!(shown.contains("Mary, John"));
        assert!(shown.contains("cakes"));
        assert!(shown.contains("5 nodes, 6 edges"));
    }
}
