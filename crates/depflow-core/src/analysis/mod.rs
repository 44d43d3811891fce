/*! Derive dependency facts from a method's statement graph.
 *
 * Each stage reads the graph through [`StmtGraph`] and the results of earlier stages. Def/use sets
 * feed reaching definitions; dominators, post-dominators and reaching definitions feed the
 * dependency classifier; dominators also delimit natural loops. [`DataFlowAnalysis`] runs them all.
 */

pub mod cfg;
pub mod dataflow;
pub mod def_use;
pub mod dependency;
pub mod dominator;
pub mod loops;
pub mod post_dominator;
pub mod reaching;

pub use cfg::{Reachability, StmtGraph, StmtIds};
pub use dataflow::DataFlowAnalysis;
pub use def_use::{DefUseSets, StmtDefUse};
pub use dependency::{Dependency, DependencyKind, DependencyResult};
pub use dominator::DominatorTree;
pub use loops::{Loop, LoopDependency, LoopDependencyClassifier, LoopDependencyKind, LoopForest};
pub use post_dominator::PostDominatorTree;
pub use reaching::ReachingDefinitions;
