use crate::{
    analysis::{
        cfg::{find_exits, StmtGraph},
        dominator::{solve_dominance, to_indices, DominatorTree},
    },
    stmt::StmtId,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Post-dominance computed as dominance on the reversed graph, rooted at a synthetic exit.
///
/// The synthetic exit takes index `len()` and joins every statement without successors. It never
/// appears in any reported set: a statement whose closest post-dominator is the synthetic exit has
/// no immediate post-dominator.
#[derive(Debug, Clone, Serialize)]
pub struct PostDominatorTree {
    tree: DominatorTree,
    exits: Vec<StmtId>,
}

impl PostDominatorTree {
    #[tracing::instrument(skip_all, fields(stmts = graph.len()))]
    pub fn compute<G: StmtGraph + ?Sized>(graph: &G, max_iterations: usize) -> Self {
        let len = graph.len();
        if len == 0 {
            return Self {
                tree: DominatorTree::from_solution(
                    None,
                    solve_dominance(1, 0, |_| Vec::new(), |_| Vec::new(), max_iterations),
                    0,
                ),
                exits: Vec::new(),
            };
        }

        let mut exits = find_exits(graph);
        if exits.is_empty() {
            let fallback = StmtId::from_index(len - 1);
            warn!(%fallback, "no statement without successors; using the last statement as exit");
            exits.push(fallback);
        }

        let exit_node = len;
        let exit_set: BTreeSet<usize> = exits.iter().map(|e| e.index()).collect();

        // Reversed edges: the synthetic exit flows into each real exit, and every statement flows
        // into its original predecessors.
        let reversed_successors = |n: usize| {
            if n == exit_node {
                exit_set.iter().copied().collect::<Vec<_>>()
            } else {
                to_indices(graph.predecessors(StmtId::from_index(n)))
            }
        };
        let reversed_predecessors = |n: usize| {
            if n == exit_node {
                return Vec::new();
            }
            let mut preds = to_indices(graph.successors(StmtId::from_index(n)));
            if exit_set.contains(&n) {
                preds.push(exit_node);
            }
            preds
        };

        let solution = solve_dominance(
            len + 1,
            exit_node,
            reversed_successors,
            reversed_predecessors,
            max_iterations,
        );

        if !solution.converged {
            warn!(
                iterations = solution.iterations,
                "post-dominator fixpoint hit the iteration cap; results are approximate"
            );
        }

        let stuck = solution.reachable[..len].iter().filter(|r| !**r).count();
        if stuck > 0 {
            warn!(stuck, "statements cannot reach any exit");
        }

        debug!(
            exits = exits.len(),
            iterations = solution.iterations,
            converged = solution.converged,
            "post-dominators computed"
        );

        Self {
            tree: DominatorTree::from_solution(None, solution, len),
            exits,
        }
    }

    /// True iff every path from `post_dominated` to an exit passes through `post_dominator`.
    pub fn post_dominates(&self, post_dominator: StmtId, post_dominated: StmtId) -> bool {
        self.tree.dominates(post_dominator, post_dominated)
    }

    pub fn strictly_post_dominates(&self, post_dominator: StmtId, post_dominated: StmtId) -> bool {
        self.tree.strictly_dominates(post_dominator, post_dominated)
    }

    pub fn post_dominators(&self, stmt: StmtId) -> Option<&BTreeSet<StmtId>> {
        self.tree.dominators(stmt)
    }

    pub fn ipdom(&self, stmt: StmtId) -> Option<StmtId> {
        self.tree.idom(stmt)
    }

    pub fn children(&self, stmt: StmtId) -> &[StmtId] {
        self.tree.children(stmt)
    }

    /// Statements joined by the synthetic exit.
    pub fn exits(&self) -> &[StmtId] {
        &self.exits
    }

    pub fn reaches_exit(&self, stmt: StmtId) -> bool {
        self.tree.is_reachable(stmt)
    }

    pub fn converged(&self) -> bool {
        self.tree.converged()
    }

    pub fn iterations(&self) -> usize {
        self.tree.iterations()
    }
}
