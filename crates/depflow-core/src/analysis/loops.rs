use crate::{
    analysis::{
        cfg::StmtGraph, def_use::DefUseSets, dominator::DominatorTree,
        reaching::ReachingDefinitions,
    },
    stmt::{Stmt, StmtId, StmtKind},
    values::{BinOp, Expr},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A natural loop: every statement that can reach a back-edge tail without passing the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loop {
    pub header: StmtId,
    pub stmts: BTreeSet<StmtId>,
    /// `(tail, header)` edges closing the loop.
    pub back_edges: Vec<(StmtId, StmtId)>,
    pub latches: Vec<StmtId>,
    /// Loop statements with at least one successor outside the loop.
    pub exits: Vec<StmtId>,
    /// Header of the tightest enclosing loop.
    pub parent: Option<StmtId>,
    pub children: Vec<StmtId>,
    /// Number of enclosing loops.
    pub depth: usize,
}

impl Loop {
    pub fn contains(&self, stmt: StmtId) -> bool {
        self.stmts.contains(&stmt)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn is_outermost(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopForest {
    /// Sorted by header.
    loops: Vec<Loop>,
}

impl LoopForest {
    #[tracing::instrument(skip_all, fields(stmts = graph.len()))]
    pub fn compute<G: StmtGraph + ?Sized>(graph: &G, dominators: &DominatorTree) -> Self {
        let mut by_header: BTreeMap<StmtId, Vec<StmtId>> = BTreeMap::new();

        for tail in graph.stmt_ids() {
            if !dominators.is_reachable(tail) {
                continue;
            }
            for &head in graph.successors(tail) {
                if dominators.dominates(head, tail) {
                    by_header.entry(head).or_default().push(tail);
                }
            }
        }

        let mut loops: Vec<Loop> = by_header
            .into_iter()
            .map(|(header, latches)| {
                let mut stmts = BTreeSet::from([header]);
                for &tail in &latches {
                    collect_body(graph, dominators, header, tail, &mut stmts);
                }
                let exits = stmts
                    .iter()
                    .copied()
                    .filter(|&s| graph.successors(s).iter().any(|t| !stmts.contains(t)))
                    .collect();

                Loop {
                    header,
                    back_edges: latches.iter().map(|&tail| (tail, header)).collect(),
                    latches,
                    stmts,
                    exits,
                    parent: None,
                    children: Vec::new(),
                    depth: 0,
                }
            })
            .collect();

        link_nesting(&mut loops);

        debug!(loops = loops.len(), "natural loops detected");
        Self { loops }
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn get(&self, header: StmtId) -> Option<&Loop> {
        self.loops
            .binary_search_by_key(&header, |l| l.header)
            .ok()
            .map(|i| &self.loops[i])
    }

    pub fn is_header(&self, stmt: StmtId) -> bool {
        self.get(stmt).is_some()
    }

    /// Innermost loop containing `stmt`.
    pub fn loop_of(&self, stmt: StmtId) -> Option<&Loop> {
        self.loops_containing(stmt)
            .into_iter()
            .min_by_key(|l| (l.len(), l.header))
    }

    pub fn is_in_loop(&self, stmt: StmtId) -> bool {
        self.loops.iter().any(|l| l.contains(stmt))
    }

    pub fn loops_containing(&self, stmt: StmtId) -> Vec<&Loop> {
        self.loops.iter().filter(|l| l.contains(stmt)).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Loop> {
        self.loops.iter().filter(|l| l.is_outermost())
    }

    pub fn is_back_edge(&self, from: StmtId, to: StmtId) -> bool {
        self.get(to)
            .map_or(false, |l| l.back_edges.contains(&(from, to)))
    }
}

/// Walks predecessors backwards from `tail` until the header, adding every statement seen.
fn collect_body<G: StmtGraph + ?Sized>(
    graph: &G,
    dominators: &DominatorTree,
    header: StmtId,
    tail: StmtId,
    stmts: &mut BTreeSet<StmtId>,
) {
    if !stmts.insert(tail) {
        return;
    }

    let mut worklist = vec![tail];
    while let Some(stmt) = worklist.pop() {
        if stmt == header {
            continue;
        }
        for &pred in graph.predecessors(stmt) {
            if dominators.is_reachable(pred) && stmts.insert(pred) {
                worklist.push(pred);
            }
        }
    }
}

fn link_nesting(loops: &mut [Loop]) {
    let count = loops.len();

    for i in 0..count {
        let mut parent: Option<usize> = None;
        let mut depth = 0;

        for j in 0..count {
            if i == j || !is_strict_subset(&loops[i].stmts, &loops[j].stmts) {
                continue;
            }
            depth += 1;
            let tighter = parent.map_or(true, |p| {
                (loops[j].len(), loops[j].header) < (loops[p].len(), loops[p].header)
            });
            if tighter {
                parent = Some(j);
            }
        }

        loops[i].depth = depth;
        loops[i].parent = parent.map(|p| loops[p].header);
    }

    for i in 0..count {
        if let Some(parent) = loops[i].parent {
            let child = loops[i].header;
            if let Ok(p) = loops.binary_search_by_key(&parent, |l| l.header) {
                loops[p].children.push(child);
            }
        }
    }
}

fn is_strict_subset(inner: &BTreeSet<StmtId>, outer: &BTreeSet<StmtId>) -> bool {
    inner.len() < outer.len() && inner.is_subset(outer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LoopDependencyKind {
    /// The value flows from one iteration into a later one.
    Carried,
    /// Definition and use meet within the same iteration.
    Independent,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LoopDependency {
    pub loop_header: StmtId,
    pub source: StmtId,
    pub target: StmtId,
    pub variable: String,
    pub kind: LoopDependencyKind,
    /// Iterations between definition and use; 0 for independent pairs.
    pub distance: u64,
}

impl LoopDependency {
    pub fn is_carried(&self) -> bool {
        self.kind == LoopDependencyKind::Carried
    }
}

/// `var = var + c` or `var = var - c` as `(var, signed step)`.
pub fn induction_step(stmt: &Stmt) -> Option<(&str, i64)> {
    let StmtKind::Assign {
        lhs: Expr::Local(var),
        rhs: Expr::BinOp { op, left, right },
    } = &stmt.kind
    else {
        return None;
    };

    match (op, left.as_ref(), right.as_ref()) {
        (BinOp::Add, Expr::Local(v), c) | (BinOp::Add, c, Expr::Local(v)) if v == var => {
            c.as_int().map(|step| (var.as_str(), step))
        }
        (BinOp::Sub, Expr::Local(v), c) if v == var => {
            c.as_int().map(|step| (var.as_str(), step.wrapping_neg()))
        }
        _ => None,
    }
}

/// Constant `k` such that `shifted` is `base + k`, when the two indices differ only by a literal.
pub fn index_shift(base: &Expr, shifted: &Expr) -> Option<i64> {
    if base == shifted {
        return Some(0);
    }
    offset_from(base, shifted).or_else(|| offset_from(shifted, base).map(i64::wrapping_neg))
}

fn offset_from(base: &Expr, shifted: &Expr) -> Option<i64> {
    let Expr::BinOp { op, left, right } = shifted else {
        return None;
    };
    match op {
        BinOp::Add if left.as_ref() == base => right.as_int(),
        BinOp::Add if right.as_ref() == base => left.as_int(),
        BinOp::Sub if left.as_ref() == base => right.as_int().map(i64::wrapping_neg),
        _ => None,
    }
}

/// Classifies every definition/use pair inside each loop as carried or independent.
pub struct LoopDependencyClassifier<'a, G: StmtGraph + ?Sized> {
    graph: &'a G,
    def_use: &'a DefUseSets,
    reaching: &'a ReachingDefinitions,
    dominators: &'a DominatorTree,
}

impl<'a, G: StmtGraph + ?Sized> LoopDependencyClassifier<'a, G> {
    pub fn new(
        graph: &'a G,
        def_use: &'a DefUseSets,
        reaching: &'a ReachingDefinitions,
        dominators: &'a DominatorTree,
    ) -> Self {
        Self {
            graph,
            def_use,
            reaching,
            dominators,
        }
    }

    #[tracing::instrument(skip_all, fields(loops = forest.len()))]
    pub fn classify(&self, forest: &LoopForest) -> Vec<LoopDependency> {
        let mut deps = Vec::new();

        for lp in forest.loops() {
            for &user in &lp.stmts {
                for var in self.def_use.uses(user) {
                    let mut sources: BTreeSet<StmtId> = self
                        .reaching
                        .reaching_in(user)
                        .iter()
                        .copied()
                        .filter(|&d| lp.contains(d) && self.def_use.defines(d, var))
                        .collect();
                    if self.def_use.defines(user, var) {
                        sources.insert(user);
                    }

                    for def in sources {
                        deps.push(self.classify_pair(lp, def, user, var));
                    }
                }
            }
        }

        let carried = deps.iter().filter(|d| d.is_carried()).count();
        debug!(
            pairs = deps.len(),
            carried,
            "loop dependencies classified"
        );
        deps
    }

    pub fn classify_pair(&self, lp: &Loop, def: StmtId, user: StmtId, var: &str) -> LoopDependency {
        let (kind, distance) = self.carry(lp, def, user, var);
        LoopDependency {
            loop_header: lp.header,
            source: def,
            target: user,
            variable: var.to_string(),
            kind,
            distance,
        }
    }

    /// Rules are tried in order; the first that applies decides.
    fn carry(&self, lp: &Loop, def: StmtId, user: StmtId, var: &str) -> (LoopDependencyKind, u64) {
        use LoopDependencyKind::{Carried, Independent};

        let reaches_header = self.reaching.reaches(def, lp.header);
        let carried = (Carried, self.carried_distance(def));

        if def == user {
            return if reaches_header {
                carried
            } else {
                (Independent, 0)
            };
        }

        if reaches_header {
            return carried;
        }

        if !self.dominators.dominates(def, user) {
            return carried;
        }

        if let Some(carry) = self.subscript_carry(def, user, var) {
            return carry;
        }

        if induction_step(self.graph.stmt(def)).is_some() {
            return (Independent, 0);
        }

        if lp.contains(def) && lp.contains(user) {
            (Independent, 0)
        } else {
            (Carried, 1)
        }
    }

    /// Compares every element of `var` touched by `def` with every element touched by `user`.
    /// Independent only when all pairs name the same element; any shifted or unrelated pair
    /// carries, at the largest shift seen.
    fn subscript_carry(
        &self,
        def: StmtId,
        user: StmtId,
        var: &str,
    ) -> Option<(LoopDependencyKind, u64)> {
        let du = self.def_use;
        let mut written: Vec<&Expr> = du.array_write_indices(def, var).collect();
        if written.is_empty() {
            written = du.array_read_indices(def, var).collect();
        }
        let mut read: Vec<&Expr> = du.array_read_indices(user, var).collect();
        if read.is_empty() {
            read = du.array_write_indices(user, var).collect();
        }
        if written.is_empty() || read.is_empty() {
            return None;
        }

        let mut distance = 0u64;
        for w in &written {
            for r in &read {
                let pair = match index_shift(w, r) {
                    Some(shift) => shift.unsigned_abs(),
                    None => 1,
                };
                distance = distance.max(pair);
            }
        }

        Some(if distance == 0 {
            (LoopDependencyKind::Independent, 0)
        } else {
            (LoopDependencyKind::Carried, distance)
        })
    }

    fn carried_distance(&self, def: StmtId) -> u64 {
        induction_step(self.graph.stmt(def))
            .map(|(_, step)| step.unsigned_abs().max(1))
            .unwrap_or(1)
    }
}
