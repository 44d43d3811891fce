use crate::{
    analysis::{
        cfg::{Reachability, StmtGraph},
        def_use::DefUseSets,
        dominator::DominatorTree,
        loops::LoopDependency,
        post_dominator::PostDominatorTree,
        reaching::ReachingDefinitions,
    },
    stmt::StmtId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DependencyKind {
    /// Read after write: the target reads a value the source may have written.
    Raw,
    /// Write after read: the source reads a variable the target may later overwrite.
    War,
    /// Write after write.
    Waw,
    /// Write after write where the source strictly dominates the target.
    DefOrder,
    Control,
}

impl DependencyKind {
    pub fn is_data(self) -> bool {
        !matches!(self, DependencyKind::Control)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyKind::Raw => "RAW",
            DependencyKind::War => "WAR",
            DependencyKind::Waw => "WAW",
            DependencyKind::DefOrder => "DEF_ORDER",
            DependencyKind::Control => "CONTROL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    pub source: StmtId,
    pub target: StmtId,
    pub kind: DependencyKind,
    /// `None` for control dependencies.
    pub variable: Option<String>,
}

impl Dependency {
    pub fn data(source: StmtId, target: StmtId, kind: DependencyKind, variable: &str) -> Self {
        Self {
            source,
            target,
            kind,
            variable: Some(variable.to_string()),
        }
    }

    pub fn control(branch: StmtId, target: StmtId) -> Self {
        Self {
            source: branch,
            target,
            kind: DependencyKind::Control,
            variable: None,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} [{}", self.source, self.target, self.kind)?;
        if let Some(var) = &self.variable {
            write!(f, " {}", var)?;
        }
        write!(f, "]")
    }
}

/// Every dependency of one run, keyed by target statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyResult {
    data: BTreeMap<StmtId, BTreeSet<Dependency>>,
    control: BTreeMap<StmtId, BTreeSet<Dependency>>,
    /// Keyed by the statement that uses the variable.
    loop_dependencies: BTreeMap<StmtId, BTreeSet<LoopDependency>>,
}

impl DependencyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dep: Dependency) -> bool {
        trace!(%dep, "dependency");
        let map = if dep.kind.is_data() {
            &mut self.data
        } else {
            &mut self.control
        };
        map.entry(dep.target).or_default().insert(dep)
    }

    pub fn insert_loop_dependency(&mut self, dep: LoopDependency) -> bool {
        trace!(
            source = %dep.source,
            target = %dep.target,
            kind = ?dep.kind,
            variable = %dep.variable,
            "loop dependency"
        );
        self.loop_dependencies
            .entry(dep.target)
            .or_default()
            .insert(dep)
    }

    /// Data and control dependencies whose target is `stmt`.
    pub fn dependencies_for(&self, stmt: StmtId) -> Vec<&Dependency> {
        self.data
            .get(&stmt)
            .into_iter()
            .chain(self.control.get(&stmt))
            .flatten()
            .collect()
    }

    pub fn data_dependencies_for(&self, stmt: StmtId) -> Option<&BTreeSet<Dependency>> {
        self.data.get(&stmt)
    }

    pub fn control_dependencies_for(&self, stmt: StmtId) -> Option<&BTreeSet<Dependency>> {
        self.control.get(&stmt)
    }

    pub fn loop_dependencies_for(&self, stmt: StmtId) -> Option<&BTreeSet<LoopDependency>> {
        self.loop_dependencies.get(&stmt)
    }

    pub fn data_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.data.values().flatten()
    }

    pub fn control_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.control.values().flatten()
    }

    pub fn loop_dependencies(&self) -> impl Iterator<Item = &LoopDependency> {
        self.loop_dependencies.values().flatten()
    }

    pub fn of_kind(&self, kind: DependencyKind) -> Vec<&Dependency> {
        self.data_dependencies()
            .chain(self.control_dependencies())
            .filter(|d| d.kind == kind)
            .collect()
    }

    pub fn contains(&self, source: StmtId, target: StmtId, kind: DependencyKind) -> bool {
        self.dependencies_for(target)
            .iter()
            .any(|d| d.source == source && d.kind == kind)
    }

    pub fn counts(&self) -> BTreeMap<DependencyKind, usize> {
        let mut counts = BTreeMap::new();
        for dep in self.data_dependencies().chain(self.control_dependencies()) {
            *counts.entry(dep.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.data.values().map(BTreeSet::len).sum::<usize>()
            + self.control.values().map(BTreeSet::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAW, WAR, WAW and DEF_ORDER edges.
#[tracing::instrument(skip_all, fields(stmts = graph.len()))]
pub fn classify_data<G: StmtGraph + ?Sized>(
    graph: &G,
    def_use: &DefUseSets,
    reaching: &ReachingDefinitions,
    dominators: &DominatorTree,
    reachability: &Reachability,
    result: &mut DependencyResult,
) {
    let before = result.len();

    for user in graph.stmt_ids() {
        let uses = def_use.uses(user);
        if uses.is_empty() {
            continue;
        }
        for &def in reaching.reaching_in(user) {
            for var in def_use.defs(def).intersection(uses) {
                result.insert(Dependency::data(def, user, DependencyKind::Raw, var));
            }
        }
    }

    for reader in graph.stmt_ids() {
        let uses = def_use.uses(reader);
        for writer in graph.stmt_ids() {
            if writer == reader || !reachability.has_path(reader, writer) {
                continue;
            }
            for var in def_use.defs(writer).intersection(uses) {
                result.insert(Dependency::data(reader, writer, DependencyKind::War, var));
            }
        }
    }

    let writers: Vec<StmtId> = graph.stmt_ids().filter(|&s| def_use.has_defs(s)).collect();
    for (i, &a) in writers.iter().enumerate() {
        for &b in &writers[i + 1..] {
            let shared: Vec<&String> = def_use.defs(a).intersection(def_use.defs(b)).collect();
            if shared.is_empty() {
                continue;
            }

            let (first, second) = output_order(a, b, dominators, reachability);
            for var in shared {
                result.insert(Dependency::data(first, second, DependencyKind::Waw, var));
                if dominators.strictly_dominates(first, second) {
                    result.insert(Dependency::data(first, second, DependencyKind::DefOrder, var));
                }
            }
        }
    }

    debug!(edges = result.len() - before, "data dependencies classified");
}

/// Orientation of a write/write pair with `a < b`.
fn output_order(
    a: StmtId,
    b: StmtId,
    dominators: &DominatorTree,
    reachability: &Reachability,
) -> (StmtId, StmtId) {
    if dominators.strictly_dominates(a, b) {
        (a, b)
    } else if dominators.strictly_dominates(b, a) {
        (b, a)
    } else if reachability.has_path(a, b) || !reachability.has_path(b, a) {
        (a, b)
    } else {
        (b, a)
    }
}

/// CONTROL edges from each branch to the successors it decides on.
#[tracing::instrument(skip_all, fields(stmts = graph.len()))]
pub fn classify_control<G: StmtGraph + ?Sized>(
    graph: &G,
    post_dominators: &PostDominatorTree,
    result: &mut DependencyResult,
) {
    let before = result.len();

    for branch in graph.stmt_ids() {
        let succs = graph.successors(branch);
        if succs.len() <= 1 && !graph.stmt(branch).is_jump() {
            continue;
        }
        for &succ in succs {
            if !post_dominators.post_dominates(succ, branch) {
                result.insert(Dependency::control(branch, succ));
            }
        }
    }

    debug!(edges = result.len() - before, "control dependencies classified");
}
