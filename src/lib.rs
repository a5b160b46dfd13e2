//! Library for inducing finite automata from example sentences.
//!
//! Sentences are split at whitespace and fed into an [`Automaton`] by [`Automaton::ingest`]. Initially the automaton is a prefix tree: every path from the start node spells a prefix of some ingested sentence, and the nodes reached by complete sentences are accepting. Calling [`Automaton::step_merge`] generalizes the automaton step by step. The first step collapses all accepting nodes into one, each further step looks at the current frontier, i.e. the nodes adjacent to the previous merges, and merges those nodes that cannot be told apart by one of their outgoing edges. Whenever a merge leaves a node with two outgoing edges carrying the same label, the targets of these edges are merged as well, so the automaton stays deterministic.
//!
//! Nodes and edges are owned by the automaton and referred to through [`node::NodeIndex`] and [`edge::EdgeIndex`] handles, a merge rewires the endpoints of the existing edges in place. For display purposes, [`Automaton::export_snapshot`] produces a [`snapshot::Snapshot`] which is detached from the automaton and can be rendered with [`Show`].
//!
//! The structural contract of the automaton (no duplicate edges, no edges touching merged away nodes, consistent edge views) is checked after every merge, violations are reported as [`InvariantViolation`]s.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use fsa_induction::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        adjacency::Adjacency,
        automaton::{Automaton, InvariantViolation, MergePhase, StepReport},
        edge::{Edge, EdgeIndex},
        node::{Node, NodeIndex},
        snapshot::{CombinedEdge, EdgeEntry, NodeEntry, Snapshot},
        Show,
    };
}

/// Contains type aliases for the collections used throughout the crate and the [`math::Redirections`]
/// which keep track of chains of replaced nodes.
pub mod math;

/// Defines the labelled edges of an automaton.
pub mod edge;

/// Defines the [`adjacency::Adjacency`] key, which describes where an edge leads.
pub mod adjacency;

/// Defines the nodes of an automaton and their views on incident edges.
pub mod node;

/// Defines the automaton itself together with ingestion and merging.
pub mod automaton;
pub use automaton::{Automaton, InvariantViolation};

/// Read-only copies of an automaton, used for display.
pub mod snapshot;

/// Helper trait which can be used to display snapshots, reports and such.
pub trait Show {
    /// Returns a human readable representation of `self`. This is mainly used for
    /// displaying the progress of the generalization in a terminal.
    fn show(&self) -> String;
}

impl Show for automaton::StepReport {
    fn show(&self) -> String {
        let kind = if self.determinized {
            "determinization"
        } else {
            "merge"
        };
        match self.merges {
            0 => format!("{kind} step, nothing merged"),
            1 => format!("{kind} step, merged 1 group"),
            n => format!("{kind} step, merged {n} groups"),
        }
    }
}
