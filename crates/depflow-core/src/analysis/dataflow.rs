use crate::{
    analysis::{
        cfg::{self, Reachability, StmtGraph},
        def_use::DefUseSets,
        dependency::{classify_control, classify_data, DependencyResult},
        dominator::DominatorTree,
        loops::{LoopDependencyClassifier, LoopForest},
        post_dominator::PostDominatorTree,
        reaching::ReachingDefinitions,
    },
    config::AnalysisConfig,
    Result,
};
use tracing::{info, warn};

/// Every derived structure of one analysis run over one method body.
#[derive(Debug, Clone)]
pub struct DataFlowAnalysis {
    pub def_use: DefUseSets,
    pub dominators: DominatorTree,
    pub post_dominators: PostDominatorTree,
    pub reaching_defs: ReachingDefinitions,
    pub reachability: Reachability,
    pub loops: LoopForest,
    pub dependencies: DependencyResult,
}

impl DataFlowAnalysis {
    #[tracing::instrument(skip_all, fields(stmts = graph.len()))]
    pub fn analyze<G: StmtGraph + ?Sized>(graph: &G, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        cfg::validate(graph)?;

        let max_iterations = config.max_iterations;

        let def_use = DefUseSets::compute(graph);
        let dominators = DominatorTree::compute(graph, max_iterations);
        let post_dominators = PostDominatorTree::compute(graph, max_iterations);
        let reaching_defs = ReachingDefinitions::compute(graph, &def_use, max_iterations);
        let reachability = Reachability::compute(graph);

        let mut dependencies = DependencyResult::new();
        classify_data(
            graph,
            &def_use,
            &reaching_defs,
            &dominators,
            &reachability,
            &mut dependencies,
        );
        if config.control_dependencies {
            classify_control(graph, &post_dominators, &mut dependencies);
        }

        let loops = LoopForest::compute(graph, &dominators);
        if config.loop_dependencies {
            let classifier =
                LoopDependencyClassifier::new(graph, &def_use, &reaching_defs, &dominators);
            for dep in classifier.classify(&loops) {
                dependencies.insert_loop_dependency(dep);
            }
        }

        let analysis = Self {
            def_use,
            dominators,
            post_dominators,
            reaching_defs,
            reachability,
            loops,
            dependencies,
        };

        if !analysis.converged() {
            warn!("analysis finished with unconverged fixpoints");
        }
        info!(
            dependencies = analysis.dependencies.len(),
            loops = analysis.loops.len(),
            "analysis complete"
        );

        Ok(analysis)
    }

    /// False when any fixpoint stopped at the iteration cap.
    pub fn converged(&self) -> bool {
        self.dominators.converged()
            && self.post_dominators.converged()
            && self.reaching_defs.converged()
    }
}
