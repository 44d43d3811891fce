use crate::{
    analysis::{
        cfg::{reverse_postorder, StmtGraph},
        def_use::DefUseSets,
    },
    stmt::StmtId,
};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

/// Definitions that may still be current on entry to and exit from each statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachingDefinitions {
    reaching_in: Vec<BTreeSet<StmtId>>,
    reaching_out: Vec<BTreeSet<StmtId>>,
    iterations: usize,
    converged: bool,
}

impl ReachingDefinitions {
    #[tracing::instrument(skip_all, fields(stmts = graph.len()))]
    pub fn compute<G: StmtGraph + ?Sized>(
        graph: &G,
        def_use: &DefUseSets,
        max_iterations: usize,
    ) -> Self {
        let len = graph.len();
        Self::solve(
            graph,
            def_use,
            vec![BTreeSet::new(); len],
            vec![BTreeSet::new(); len],
            max_iterations,
        )
    }

    /// Runs the fixpoint again, seeded with this result. A converged result comes back unchanged.
    pub fn recompute_from_current<G: StmtGraph + ?Sized>(
        &self,
        graph: &G,
        def_use: &DefUseSets,
        max_iterations: usize,
    ) -> Self {
        Self::solve(
            graph,
            def_use,
            self.reaching_in.clone(),
            self.reaching_out.clone(),
            max_iterations,
        )
    }

    fn solve<G: StmtGraph + ?Sized>(
        graph: &G,
        def_use: &DefUseSets,
        mut reaching_in: Vec<BTreeSet<StmtId>>,
        mut reaching_out: Vec<BTreeSet<StmtId>>,
        max_iterations: usize,
    ) -> Self {
        let len = graph.len();

        // Reachable statements first in reverse postorder, then anything the entry cannot reach.
        let mut order = graph
            .entry()
            .map(|entry| reverse_postorder(graph, entry))
            .unwrap_or_default();
        let mut queued = vec![false; len];
        for &s in &order {
            queued[s.index()] = true;
        }
        order.extend(graph.stmt_ids().filter(|s| !queued[s.index()]));
        queued.iter_mut().for_each(|q| *q = true);

        let mut worklist: VecDeque<StmtId> = order.into_iter().collect();
        let mut iterations = 0;

        while !worklist.is_empty() && iterations < max_iterations {
            iterations += 1;

            for _ in 0..worklist.len() {
                let Some(stmt) = worklist.pop_front() else {
                    break;
                };
                queued[stmt.index()] = false;

                let mut new_in = BTreeSet::new();
                for pred in graph.predecessors(stmt) {
                    new_in.extend(reaching_out[pred.index()].iter().copied());
                }

                let defs = def_use.defs(stmt);
                let new_out: BTreeSet<StmtId> = if defs.is_empty() {
                    new_in.clone()
                } else {
                    new_in
                        .iter()
                        .copied()
                        .filter(|&d| d != stmt && defs.is_disjoint(def_use.defs(d)))
                        .chain(std::iter::once(stmt))
                        .collect()
                };

                reaching_in[stmt.index()] = new_in;
                if new_out != reaching_out[stmt.index()] {
                    reaching_out[stmt.index()] = new_out;
                    for &succ in graph.successors(stmt) {
                        if !queued[succ.index()] {
                            queued[succ.index()] = true;
                            worklist.push_back(succ);
                        }
                    }
                }
            }
        }

        let converged = worklist.is_empty();
        if !converged {
            warn!(
                iterations,
                pending = worklist.len(),
                "reaching definitions hit the iteration cap; results are approximate"
            );
        }
        debug!(iterations, converged, "reaching definitions computed");

        Self {
            reaching_in,
            reaching_out,
            iterations,
            converged,
        }
    }

    /// Definitions that may reach the point just before `stmt` executes.
    pub fn reaching_in(&self, stmt: StmtId) -> &BTreeSet<StmtId> {
        &self.reaching_in[stmt.index()]
    }

    pub fn reaching_out(&self, stmt: StmtId) -> &BTreeSet<StmtId> {
        &self.reaching_out[stmt.index()]
    }

    /// True when the definition at `def` may reach the entry of `at`.
    pub fn reaches(&self, def: StmtId, at: StmtId) -> bool {
        self.reaching_in
            .get(at.index())
            .map_or(false, |set| set.contains(&def))
    }

    /// Reaching definitions of `var` on entry to `stmt`.
    pub fn definitions_of(&self, stmt: StmtId, var: &str, def_use: &DefUseSets) -> Vec<StmtId> {
        self.reaching_in(stmt)
            .iter()
            .copied()
            .filter(|&d| def_use.defines(d, var))
            .collect()
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}
