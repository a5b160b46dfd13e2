use crate::node::NodeIndex;

/// Describes where an edge leads: the label it carries together with its target. Two edges
/// leaving the same node with equal adjacencies are duplicates, two edges leaving different
/// nodes with equal adjacencies make their sources candidates for a merge.
///
/// Adjacencies are ordered first by label and then by target, this order decides which
/// candidates are merged first.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug)]
pub struct Adjacency {
    label: String,
    target: NodeIndex,
}

impl Adjacency {
    /// Creates the adjacency of an edge labelled with `label` that leads to `target`.
    pub fn new<L: Into<String>>(label: L, target: NodeIndex) -> Self {
        Self {
            label: label.into(),
            target,
        }
    }

    /// The label of the edge.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node that is reached.
    pub fn target(&self) -> NodeIndex {
        self.target
    }
}

impl std::fmt::Display for Adjacency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-{}-> {}", self.label, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::Adjacency;
    use crate::{math::Set, node::NodeIndex};

    #[test]
    fn adjacencies_order_by_label_then_target() {
        let mut adjacencies = vec![
            Adjacency::new("b", NodeIndex(1)),
            Adjacency::new("a", NodeIndex(7)),
            Adjacency::new("a", NodeIndex(2)),
        ];
        adjacencies.sort();
        assert_eq!(
            adjacencies,
            vec![
                Adjacency::new("a", NodeIndex(2)),
                Adjacency::new("a", NodeIndex(7)),
                Adjacency::new("b", NodeIndex(1)),
            ]
        );
    }

    #[test]
    fn equal_adjacencies_collapse_in_sets() {
        let set: Set<_> = [
            Adjacency::new("cakes", NodeIndex(3)),
            Adjacency::new("cakes", NodeIndex(3)),
            Adjacency::new("cakes", NodeIndex(4)),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(Adjacency::new("a", NodeIndex(3)).to_string(), "-a-> q3");
    }
}
