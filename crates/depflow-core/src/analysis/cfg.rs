use crate::stmt::{Stmt, StmtId};
use crate::{AnalysisError, Result};
use std::collections::VecDeque;

/// Every statement id of a graph, in index order.
pub type StmtIds = std::iter::Map<std::ops::Range<usize>, fn(usize) -> StmtId>;

/// Read-only view of a method's statement graph.
///
/// Statement ids must be dense: every id in `0..len()` names a statement, and every id returned
/// by `successors`/`predecessors` is in that range. [`validate`] checks this before a run.
pub trait StmtGraph {
    fn len(&self) -> usize;

    fn stmt(&self, id: StmtId) -> &Stmt;

    fn successors(&self, id: StmtId) -> &[StmtId];

    fn predecessors(&self, id: StmtId) -> &[StmtId];

    fn entry(&self) -> Option<StmtId> {
        find_entry(self)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stmt_ids(&self) -> StmtIds {
        (0..self.len()).map(StmtId::from_index as fn(usize) -> StmtId)
    }
}

/// First statement without predecessors, or the first statement when every statement has one.
pub fn find_entry<G: StmtGraph + ?Sized>(graph: &G) -> Option<StmtId> {
    graph
        .stmt_ids()
        .find(|&id| graph.predecessors(id).is_empty())
        .or_else(|| graph.stmt_ids().next())
}

/// Statements without successors.
pub fn find_exits<G: StmtGraph + ?Sized>(graph: &G) -> Vec<StmtId> {
    graph
        .stmt_ids()
        .filter(|&id| graph.successors(id).is_empty())
        .collect()
}

/// Rejects graphs whose ids, edges or entry fall outside `0..len()`, and graphs whose successor
/// and predecessor lists disagree.
pub fn validate<G: StmtGraph + ?Sized>(graph: &G) -> Result<()> {
    let len = graph.len();
    for id in graph.stmt_ids() {
        if graph.stmt(id).id != id {
            return Err(AnalysisError::InvalidStatement(id));
        }
        for &other in graph.successors(id).iter().chain(graph.predecessors(id)) {
            if other.index() >= len {
                return Err(AnalysisError::InvalidStatement(other));
            }
        }
    }

    if let Some(entry) = graph.entry() {
        if entry.index() >= len {
            return Err(AnalysisError::InvalidStatement(entry));
        }
    }

    for id in graph.stmt_ids() {
        for &succ in graph.successors(id) {
            if !graph.predecessors(succ).contains(&id) {
                return Err(AnalysisError::UnmirroredEdge(id, succ));
            }
        }
        for &pred in graph.predecessors(id) {
            if !graph.successors(pred).contains(&id) {
                return Err(AnalysisError::UnmirroredEdge(pred, id));
            }
        }
    }
    Ok(())
}

/// Reverse postorder of the statements reachable from `entry`.
pub fn reverse_postorder<G: StmtGraph + ?Sized>(graph: &G, entry: StmtId) -> Vec<StmtId> {
    reverse_postorder_by(graph.len(), entry.index(), |n| {
        graph
            .successors(StmtId::from_index(n))
            .iter()
            .map(|s| s.index())
            .collect()
    })
    .into_iter()
    .map(StmtId::from_index)
    .collect()
}

/// Reverse postorder over dense node indices, for graphs that only exist as a successor function.
pub(crate) fn reverse_postorder_by(
    node_count: usize,
    root: usize,
    successors: impl Fn(usize) -> Vec<usize>,
) -> Vec<usize> {
    let mut visited = vec![false; node_count];
    let mut postorder = Vec::with_capacity(node_count);
    let mut stack = vec![(root, successors(root), 0usize)];
    visited[root] = true;

    while let Some((node, succs, next_child)) = stack.pop() {
        if let Some(&succ) = succs.get(next_child) {
            stack.push((node, succs, next_child + 1));
            if !visited[succ] {
                visited[succ] = true;
                stack.push((succ, successors(succ), 0));
            }
        } else {
            postorder.push(node);
        }
    }

    postorder.reverse();
    postorder
}

pub fn reachable_from<G: StmtGraph + ?Sized>(graph: &G, start: StmtId) -> Vec<bool> {
    let mut visited = vec![false; graph.len()];
    let mut queue = VecDeque::from([start]);
    visited[start.index()] = true;

    while let Some(current) = queue.pop_front() {
        for &succ in graph.successors(current) {
            if !visited[succ.index()] {
                visited[succ.index()] = true;
                queue.push_back(succ);
            }
        }
    }

    visited
}

/// Path queries between statements, precomputed once per run.
#[derive(Debug, Clone)]
pub struct Reachability {
    len: usize,
    /// Row `a` holds the statements reachable from `a` through at least one edge.
    matrix: Vec<bool>,
}

impl Reachability {
    pub fn compute<G: StmtGraph + ?Sized>(graph: &G) -> Self {
        let len = graph.len();
        let mut matrix = vec![false; len * len];

        for start in graph.stmt_ids() {
            let row = &mut matrix[start.index() * len..(start.index() + 1) * len];
            let mut queue: VecDeque<StmtId> = graph.successors(start).iter().copied().collect();

            while let Some(current) = queue.pop_front() {
                if row[current.index()] {
                    continue;
                }
                row[current.index()] = true;
                queue.extend(graph.successors(current).iter().copied());
            }
        }

        Self { len, matrix }
    }

    /// True when `to` can execute after `from` along some path of one or more edges.
    pub fn has_path(&self, from: StmtId, to: StmtId) -> bool {
        from.index() < self.len
            && to.index() < self.len
            && self.matrix[from.index() * self.len + to.index()]
    }

    pub fn on_cycle(&self, stmt: StmtId) -> bool {
        self.has_path(stmt, stmt)
    }
}
