use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, trace};

use super::{Automaton, InvariantViolation, MergePhase, StepReport};
use crate::{
    adjacency::Adjacency,
    math::{Redirections, Set},
    node::NodeIndex,
};

impl Automaton {
    /// Performs one step of generalization. The very first step unifies all final nodes into
    /// a single accepting node. Every later step merges intermediate nodes of the current
    /// frontier and moves the frontier one level towards the start node.
    ///
    /// Calling this when there is nothing left to merge is not an error, the step simply
    /// leaves the automaton unchanged.
    pub fn step_merge(&mut self) -> Result<StepReport, InvariantViolation> {
        let report = match self.phase {
            MergePhase::NotStarted => {
                let merges = self.merge_final_states()?;
                self.phase = MergePhase::FinalsUnified;
                StepReport {
                    phase: self.phase,
                    merges,
                    determinized: false,
                }
            }
            MergePhase::FinalsUnified => self.merge_intermediate_states()?,
        };
        debug!(
            "merge step performed {} merges, frontier is now {{{}}}",
            report.merges,
            self.frontier.iter().join(", ")
        );

        if cfg!(debug_assertions) {
            self.check_invariants()?;
        }
        Ok(report)
    }

    /// Repeatedly calls [`Automaton::step_merge`] until no further step can change the
    /// automaton, but at most `max_steps` times. Returns the number of steps taken.
    ///
    /// Once a step merges nothing, the structure can only change again if some later frontier
    /// allows a merge. Frontiers are determined by the structure alone, so generalization has
    /// finished as soon as the frontier is empty or repeats one seen since the last merge.
    pub fn merge_to_fixpoint(&mut self, max_steps: usize) -> Result<usize, InvariantViolation> {
        let mut seen: Set<BTreeSet<NodeIndex>> = Set::default();
        for step in 1..=max_steps {
            let report = self.step_merge()?;
            if report.changed() {
                seen.clear();
                continue;
            }
            if self.frontier.is_empty() || !seen.insert(self.frontier.clone()) {
                debug!("reached fixpoint after {step} steps");
                return Ok(step);
            }
        }
        Ok(max_steps)
    }

    /// Merges all final nodes into one, the frontier becomes the set of its predecessors. If
    /// the merged node is nondeterministic, it joins the frontier as well.
    fn merge_final_states(&mut self) -> Result<usize, InvariantViolation> {
        let finals = self.finals.clone();
        let Some(merged) = self.merge_nodes(&finals)? else {
            trace!("there are no final states to merge");
            self.frontier.clear();
            return Ok(0);
        };
        let mut next = self
            .node(merged)
            .map(|node| node.predecessors(&self.edges))
            .unwrap_or_default();
        if self.needs_determinization(merged) {
            next.insert(merged);
        }
        self.frontier = next;
        Ok(usize::from(finals.len() > 1))
    }

    /// Merges intermediate nodes of the current frontier.
    ///
    /// Frontier nodes are inspected in ascending handle order. If one of them has a label leading
    /// to several targets, these targets are merged and nothing else happens in this step.
    /// Otherwise frontier nodes that share an [`Adjacency`] are merged, adjacencies are processed
    /// in ascending order. Nodes that were replaced earlier in the same step are resolved to
    /// their replacement first.
    ///
    /// The next frontier consists of the predecessors of the old frontier together with every
    /// merged or old frontier node that is still nondeterministic, so each nondeterministic node
    /// stays on the frontier until it is repaired.
    fn merge_intermediate_states(&mut self) -> Result<StepReport, InvariantViolation> {
        if let Some(q) = self.frontier.iter().copied().find(|&q| !self.is_live(q)) {
            return Err(InvariantViolation::RetiredFrontierNode(q));
        }

        let frontier = std::mem::take(&mut self.frontier);
        let mut redirections = Redirections::default();
        let mut next = BTreeSet::new();
        let mut adjacency_to_nodes: BTreeMap<Adjacency, BTreeSet<NodeIndex>> = BTreeMap::new();
        let mut merges = 0;
        let mut determinized = false;

        for &q in &frontier {
            let q = redirections.resolve(q);
            let Some(node) = self.node(q) else {
                continue;
            };
            let collisions = node
                .label_to_targets(&self.edges)
                .into_iter()
                .filter(|(_, targets)| targets.len() > 1)
                .map(|(label, targets)| (label.to_string(), targets))
                .collect_vec();
            let adjacencies = node.adjacencies(&self.edges);

            if !collisions.is_empty() {
                for (label, targets) in collisions {
                    let targets = redirections.resolve_all(targets);
                    if targets.len() < 2 {
                        continue;
                    }
                    trace!("{q} reaches {} nodes on {label}", targets.len());
                    if let Some(merged) = self.merge_nodes(&targets)? {
                        redirections.redirect_all(&targets, merged);
                        merges += 1;
                        if self.needs_determinization(merged) {
                            next.insert(merged);
                        }
                    }
                }
                determinized = true;
                break;
            }

            for adjacency in adjacencies {
                adjacency_to_nodes.entry(adjacency).or_default().insert(q);
            }
        }

        if !determinized {
            for (adjacency, sources) in adjacency_to_nodes {
                let sources = redirections.resolve_all(sources);
                if sources.len() < 2 {
                    continue;
                }
                trace!("{} nodes share {adjacency}", sources.len());
                if let Some(merged) = self.merge_nodes(&sources)? {
                    redirections.redirect_all(&sources, merged);
                    merges += 1;
                    if self.needs_determinization(merged) {
                        next.insert(merged);
                    }
                }
            }
        }

        for q in frontier {
            let q = redirections.resolve(q);
            if let Some(node) = self.node(q) {
                next.extend(node.predecessors(&self.edges));
            }
            if self.needs_determinization(q) {
                next.insert(q);
            }
        }
        let next: BTreeSet<NodeIndex> = next
            .into_iter()
            .map(|q| redirections.resolve(q))
            .filter(|&q| self.is_live(q))
            .collect();
        self.frontier = next;

        Ok(StepReport {
            phase: self.phase,
            merges,
            determinized,
        })
    }
}
