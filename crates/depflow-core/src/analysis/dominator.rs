use crate::{
    analysis::cfg::{reverse_postorder_by, StmtGraph},
    stmt::StmtId,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Dominator sets over dense node indices.
pub(crate) struct DominanceSolution {
    pub sets: Vec<BTreeSet<usize>>,
    pub idom: Vec<Option<usize>>,
    pub reachable: Vec<bool>,
    pub iterations: usize,
    pub converged: bool,
}

/// Iterative dominator fixpoint rooted at `root`.
///
/// Nodes not reachable from `root` keep the singleton set `{n}` and have no immediate dominator.
/// The same routine serves post-dominance when called with reversed edges.
pub(crate) fn solve_dominance(
    node_count: usize,
    root: usize,
    successors: impl Fn(usize) -> Vec<usize>,
    predecessors: impl Fn(usize) -> Vec<usize>,
    max_iterations: usize,
) -> DominanceSolution {
    let order = reverse_postorder_by(node_count, root, successors);

    let mut reachable = vec![false; node_count];
    for &n in &order {
        reachable[n] = true;
    }
    let all: BTreeSet<usize> = order.iter().copied().collect();

    let mut sets: Vec<BTreeSet<usize>> = (0..node_count)
        .map(|n| {
            if n == root || !reachable[n] {
                BTreeSet::from([n])
            } else {
                all.clone()
            }
        })
        .collect();

    let mut iterations = 0;
    let mut changed = true;
    while changed && iterations < max_iterations {
        changed = false;
        iterations += 1;

        for &node in order.iter().skip(1) {
            let mut new_set: Option<BTreeSet<usize>> = None;
            for pred in predecessors(node) {
                if !reachable[pred] {
                    continue;
                }
                new_set = Some(match new_set {
                    Some(acc) => acc.intersection(&sets[pred]).copied().collect(),
                    None => sets[pred].clone(),
                });
            }

            let mut new_set = new_set.unwrap_or_default();
            new_set.insert(node);

            if new_set != sets[node] {
                sets[node] = new_set;
                changed = true;
            }
        }
    }

    let idom = (0..node_count)
        .map(|n| immediate_of(n, &sets))
        .collect();

    DominanceSolution {
        sets,
        idom,
        reachable,
        iterations,
        converged: !changed,
    }
}

/// The strict dominator of `node` that every other strict dominator dominates.
fn immediate_of(node: usize, sets: &[BTreeSet<usize>]) -> Option<usize> {
    let candidates: Vec<usize> = sets[node].iter().copied().filter(|&d| d != node).collect();

    candidates
        .iter()
        .copied()
        .find(|&c| candidates.iter().all(|o| sets[c].contains(o)))
        // An unconverged run can leave no candidate satisfying the pairwise test.
        .or_else(|| candidates.iter().copied().max_by_key(|&c| sets[c].len()))
}

#[derive(Debug, Clone, Serialize)]
pub struct DominatorTree {
    entry: Option<StmtId>,
    dominators: Vec<BTreeSet<StmtId>>,
    idom: Vec<Option<StmtId>>,
    children: Vec<Vec<StmtId>>,
    reachable: Vec<bool>,
    iterations: usize,
    converged: bool,
}

impl DominatorTree {
    #[tracing::instrument(skip_all, fields(stmts = graph.len()))]
    pub fn compute<G: StmtGraph + ?Sized>(graph: &G, max_iterations: usize) -> Self {
        let Some(entry) = graph.entry() else {
            return Self::empty();
        };

        let solution = solve_dominance(
            graph.len(),
            entry.index(),
            |n| to_indices(graph.successors(StmtId::from_index(n))),
            |n| to_indices(graph.predecessors(StmtId::from_index(n))),
            max_iterations,
        );

        if !solution.converged {
            warn!(
                iterations = solution.iterations,
                "dominator fixpoint hit the iteration cap; results are approximate"
            );
        }

        let unreachable = solution.reachable.iter().filter(|r| !**r).count();
        if unreachable > 0 {
            warn!(unreachable, %entry, "statements unreachable from entry");
        }

        debug!(
            %entry,
            iterations = solution.iterations,
            converged = solution.converged,
            "dominators computed"
        );

        Self::from_solution(Some(entry), solution, graph.len())
    }

    pub(crate) fn from_solution(
        entry: Option<StmtId>,
        solution: DominanceSolution,
        len: usize,
    ) -> Self {
        let dominators = solution
            .sets
            .iter()
            .take(len)
            .map(|set| {
                set.iter()
                    .filter(|&&n| n < len)
                    .map(|&n| StmtId::from_index(n))
                    .collect()
            })
            .collect();

        let idom: Vec<Option<StmtId>> = solution
            .idom
            .iter()
            .take(len)
            .map(|d| d.filter(|&n| n < len).map(StmtId::from_index))
            .collect();

        let mut children = vec![Vec::new(); len];
        for (node, parent) in idom.iter().enumerate() {
            if let Some(parent) = parent {
                children[parent.index()].push(StmtId::from_index(node));
            }
        }

        Self {
            entry,
            dominators,
            idom,
            children,
            reachable: solution.reachable.into_iter().take(len).collect(),
            iterations: solution.iterations,
            converged: solution.converged,
        }
    }

    fn empty() -> Self {
        Self {
            entry: None,
            dominators: Vec::new(),
            idom: Vec::new(),
            children: Vec::new(),
            reachable: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }

    pub fn entry(&self) -> Option<StmtId> {
        self.entry
    }

    /// True iff every path from the entry to `dominated` passes through `dominator`.
    pub fn dominates(&self, dominator: StmtId, dominated: StmtId) -> bool {
        self.dominators
            .get(dominated.index())
            .map_or(false, |doms| doms.contains(&dominator))
    }

    pub fn strictly_dominates(&self, dominator: StmtId, dominated: StmtId) -> bool {
        dominator != dominated && self.dominates(dominator, dominated)
    }

    pub fn dominators(&self, stmt: StmtId) -> Option<&BTreeSet<StmtId>> {
        self.dominators.get(stmt.index())
    }

    pub fn idom(&self, stmt: StmtId) -> Option<StmtId> {
        self.idom.get(stmt.index()).copied().flatten()
    }

    pub fn children(&self, stmt: StmtId) -> &[StmtId] {
        self.children
            .get(stmt.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_reachable(&self, stmt: StmtId) -> bool {
        self.reachable.get(stmt.index()).copied().unwrap_or(false)
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Tree pre-order from the entry, with each node's depth.
    pub fn preorder(&self) -> Vec<(StmtId, usize)> {
        let mut order = Vec::new();
        let Some(entry) = self.entry else {
            return order;
        };

        let mut stack = vec![(entry, 0)];
        while let Some((node, depth)) = stack.pop() {
            order.push((node, depth));
            for &child in self.children(node).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        order
    }
}

pub(crate) fn to_indices(ids: &[StmtId]) -> Vec<usize> {
    ids.iter().map(|id| id.index()).collect()
}
