// This module is the entry point of copy coalescing for one register class of one
// procedure. It selects the strategy named in the configuration, records the copy costs
// before and after, and reports what the pass did. The heuristic strategy runs size
// reduction, the heuristic adapter with the in-tree recoloring engine and reinsertion.
// The ILP strategy hands a fresh size reducer to the ILP driver with the
// color-assignment formulation, which carries the caller's solve service if any. Both strategies allocate the coloring suffix in the
// session arena and add their counters to the session statistics. A pass never leaves
// nodes removed from the working graph on success; errors are propagated unchanged.

//! Copy coalescing pass.

use log::info;

use crate::core::config::{CoalesceAlgorithm, CoalesceConfig};
use crate::core::error::CoalesceResult;
use crate::core::graph::{copy_costs, CoalesceGraph};
use crate::core::session::CoalesceSession;
use crate::heur::{HeuristicAdapter, RecolorEngine};
use crate::ilp::{ColorAssignmentIlp, IlpDriver, SolutionState, SolveService};
use crate::size_red::SizeReducer;

/// What one coalescing pass achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalesceOutcome {
    pub algorithm: CoalesceAlgorithm,
    /// Copy costs of the coloring handed in.
    pub costs_before: u64,
    /// Copy costs of the coloring handed back.
    pub costs_after: u64,
    /// Nodes taken out by size reduction (and reinserted).
    pub nodes_removed: usize,
    /// Terminal solver state; `None` for the heuristic.
    pub solution: Option<SolutionState>,
}

impl CoalesceOutcome {
    /// Copy costs saved by the pass.
    pub fn saved(&self) -> u64 {
        self.costs_before.saturating_sub(self.costs_after)
    }
}

/// Coalesce copies of `graph` with the strategy selected in `config`.
///
/// `graph` must hold a valid coloring on entry and holds one on success.
/// No solve service is attached; use [`co_solve_with_service`] for remote
/// ILP solving.
pub fn co_solve<G>(
    session: &CoalesceSession<'_>,
    graph: &mut G,
    config: &CoalesceConfig,
) -> CoalesceResult<CoalesceOutcome>
where
    G: CoalesceGraph + ?Sized,
{
    co_solve_with_service(session, graph, config, None)
}

/// [`co_solve`] with the service the ILP strategy solves through when
/// `config.ilp.solve_over_network` is set.
pub fn co_solve_with_service<G>(
    session: &CoalesceSession<'_>,
    graph: &mut G,
    config: &CoalesceConfig,
    service: Option<Box<dyn SolveService>>,
) -> CoalesceResult<CoalesceOutcome>
where
    G: CoalesceGraph + ?Sized,
{
    let costs_before = copy_costs(graph);
    session.record_pass_started(costs_before);

    let (nodes_removed, solution) = match config.algorithm {
        CoalesceAlgorithm::Heuristic => (solve_heuristic(session, graph, config)?, None),
        CoalesceAlgorithm::Ilp => {
            let (removed, state) = solve_ilp(session, graph, config, service)?;
            (removed, Some(state))
        }
    };

    let costs_after = copy_costs(graph);
    session.record_pass_finished(costs_after);

    info!(
        "{}/{}: {} coalescing, copy costs {} -> {}",
        graph.procedure_name(),
        graph.register_class().name(),
        config.algorithm,
        costs_before,
        costs_after
    );

    Ok(CoalesceOutcome {
        algorithm: config.algorithm,
        costs_before,
        costs_after,
        nodes_removed,
        solution,
    })
}

fn solve_heuristic<G>(session: &CoalesceSession<'_>, graph: &mut G, config: &CoalesceConfig) -> CoalesceResult<usize>
where
    G: CoalesceGraph + ?Sized,
{
    let mut sr = SizeReducer::new(session.arena());
    let removed = sr.remove(graph);
    session.record_nodes_removed(removed);

    let adapter = HeuristicAdapter::new(&config.heur, &config.dump_dir);
    if adapter.run::<RecolorEngine, G>(graph, Some(&sr))? {
        session.record_engine_run();
    }

    let reinserted = sr.reinsert(graph)?;
    session.record_nodes_reinserted(reinserted);
    Ok(removed)
}

fn solve_ilp<G>(
    session: &CoalesceSession<'_>,
    graph: &mut G,
    config: &CoalesceConfig,
    service: Option<Box<dyn SolveService>>,
) -> CoalesceResult<(usize, SolutionState)>
where
    G: CoalesceGraph + ?Sized,
{
    let formulation = match service {
        Some(service) => ColorAssignmentIlp::with_service(service),
        None => ColorAssignmentIlp::new(),
    };
    let mut driver = IlpDriver::new(
        graph,
        formulation,
        SizeReducer::new(session.arena()),
        &config.ilp,
        &config.backend,
        &config.dump_dir,
    );
    let state = driver.run()?;
    session.record_ilp_solved();

    let removed = driver.removed_nodes();
    session.record_nodes_removed(removed);
    session.record_nodes_reinserted(removed);
    Ok((removed, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::verify_coloring;
    use crate::test_graph::TestGraph;
    use bumpalo::Bump;

    const CHAIN: &str = "
proc chain
class gp r0 r1 r2
node a = r0
node b = r1
node c = r2
node t = r1
edge a t
aff a b 2
aff b c 5
";

    #[test]
    fn test_heuristic_pass() {
        let arena = Bump::new();
        let session = CoalesceSession::new(&arena);
        let mut g = TestGraph::parse(CHAIN).unwrap();

        let outcome = co_solve(&session, &mut g, &CoalesceConfig::default()).unwrap();
        assert_eq!(outcome.costs_before, 7);
        assert_eq!(outcome.costs_after, 0);
        assert_eq!(outcome.saved(), 7);
        assert_eq!(outcome.nodes_removed, 1);
        assert_eq!(outcome.solution, None);
        assert!(verify_coloring(&g).is_empty());

        let stats = session.stats();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.engine_runs, 1);
        assert_eq!(stats.nodes_removed, 1);
        assert_eq!(stats.nodes_reinserted, 1);
    }

    #[cfg(feature = "local-solver")]
    #[test]
    fn test_ilp_pass() {
        let arena = Bump::new();
        let session = CoalesceSession::new(&arena);
        let mut g = TestGraph::parse(CHAIN).unwrap();
        let mut config = CoalesceConfig {
            algorithm: CoalesceAlgorithm::Ilp,
            ..CoalesceConfig::default()
        };
        config.ilp.solve_over_network = false;

        let outcome = co_solve(&session, &mut g, &config).unwrap();
        assert_eq!(outcome.solution, Some(SolutionState::Optimal));
        assert_eq!(outcome.costs_after, 0);
        assert!(verify_coloring(&g).is_empty());
        assert_eq!(session.stats().ilp_solves, 1);
    }
}
