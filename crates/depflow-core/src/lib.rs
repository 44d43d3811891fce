/*! Statement IR and intraprocedural dependency analysis.
 *
 * Reordering, parallelizing or slicing a method needs to know which statements depend on which.
 * This crate models a method as an arena of statements with explicit control-flow edges and derives
 * def/use sets, dominators, post-dominators, reaching definitions, data and control dependencies,
 * and natural loops with a loop-carried dependency classification.
 */

pub mod analysis;
pub mod body;
pub mod builder;
pub mod config;
pub mod format;
pub mod stmt;
pub mod values;

pub use analysis::{
    DataFlowAnalysis, DefUseSets, Dependency, DependencyKind, DependencyResult, DominatorTree,
    Loop, LoopDependency, LoopDependencyKind, LoopForest, PostDominatorTree, ReachingDefinitions,
    StmtGraph,
};
pub use body::MethodBody;
pub use builder::MethodBuilder;
pub use config::AnalysisConfig;
pub use stmt::{IdentitySource, Stmt, StmtId, StmtKind};
pub use values::{BinOp, Constant, Expr};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Statement {0} is not part of the method body")]
    InvalidStatement(StmtId),
    #[error("Unknown label: {0}")]
    UnknownLabel(String),
    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),
    #[error("Label {0} is not attached to any statement")]
    DanglingLabel(String),
    #[error("No statement to redirect for label {0}")]
    NothingToRedirect(String),
    #[error("Edge {0} -> {1} is missing from one side of the successor/predecessor lists")]
    UnmirroredEdge(StmtId, StmtId),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests;
