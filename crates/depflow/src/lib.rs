/*! Unified interface for intraprocedural dependency analysis.
 *
 * Single import for building method bodies, running the analysis pipeline and reading its results:
 * dominators, reaching definitions, data and control dependencies, and loop-carried classification.
 */

pub use depflow_core as core;

pub use depflow_core::{
    analysis::{cfg::Reachability, StmtDefUse},
    AnalysisConfig, AnalysisError, BinOp, Constant, DataFlowAnalysis, DefUseSets, Dependency,
    DependencyKind, DependencyResult, DominatorTree, Expr, IdentitySource, Loop, LoopDependency,
    LoopDependencyKind, LoopForest, MethodBody, MethodBuilder, PostDominatorTree,
    ReachingDefinitions, Result, Stmt, StmtGraph, StmtId, StmtKind,
};

pub use depflow_core::format::format_body;

/// Runs every stage with the default configuration.
pub fn analyze<G: StmtGraph + ?Sized>(graph: &G) -> Result<DataFlowAnalysis> {
    DataFlowAnalysis::analyze(graph, &AnalysisConfig::default())
}
