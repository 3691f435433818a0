// This module implements the ILP driver, the generic orchestration shared by all ILP
// formulations of coalescing. A driver owns one size reducer and, once built, the
// linear-program handle; both are released when the driver is dropped. The concrete
// formulation plugs in through the IlpFormulation capability: build populates a model
// from the reduced graph and apply commits the solved colors back to the nodes. run
// performs reduce, build, configure (time limit), solve (remote service or in process),
// optional model and solution dumps, apply and reinsert, each exactly once and in that
// order, and returns the solver's terminal solution state without interpreting it.
// Requesting local solving where none is available is a configuration error. Solution
// quality policy (accepting a feasible but unproven solution) belongs to the caller.

//! ILP based coalescing.
//!
//! - [`IlpDriver`] - generic reduce/build/solve/apply/reinsert sequence
//! - [`IlpFormulation`] - model construction and solution application
//! - [`lpp`] - linear-program handle contract and the [`Lpp`] model
//! - [`formulation`] - the color-assignment formulation

pub mod formulation;
pub mod lpp;
#[cfg(feature = "local-solver")]
mod solver;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::core::config::{dump_path, BackendOptions, IlpConfig};
use crate::core::error::CoalesceResult;
use crate::core::graph::CoalesceGraph;
use crate::size_red::SizeReducer;

pub use formulation::ColorAssignmentIlp;
pub use lpp::{CstKind, Direction, LinearProgram, Lpp, LppSolution, SolutionState, SolveService};

/// Model construction and solution application of one ILP formulation.
pub trait IlpFormulation<G: CoalesceGraph + ?Sized> {
    type Program: LinearProgram;

    /// Build the model for the nodes still present after size reduction.
    fn build(&mut self, graph: &G, reducer: &SizeReducer<'_>) -> CoalesceResult<Self::Program>;

    /// Read the solved model and commit colors to the present nodes.
    fn apply(&mut self, graph: &mut G, reducer: &SizeReducer<'_>, lp: &Self::Program) -> CoalesceResult<()>;
}

/// Drives one ILP coalescing pass over one register class.
pub struct IlpDriver<'a, 'arena, G: CoalesceGraph + ?Sized, F: IlpFormulation<G>> {
    graph: &'a mut G,
    formulation: F,
    sr: SizeReducer<'arena>,
    lp: Option<F::Program>,
    removed: usize,
    config: &'a IlpConfig,
    backend: &'a BackendOptions,
    dump_dir: &'a Path,
}

impl<'a, 'arena, G, F> IlpDriver<'a, 'arena, G, F>
where
    G: CoalesceGraph + ?Sized,
    F: IlpFormulation<G>,
{
    pub fn new(
        graph: &'a mut G,
        formulation: F,
        sr: SizeReducer<'arena>,
        config: &'a IlpConfig,
        backend: &'a BackendOptions,
        dump_dir: &'a Path,
    ) -> Self {
        Self {
            graph,
            formulation,
            sr,
            lp: None,
            removed: 0,
            config,
            backend,
            dump_dir,
        }
    }

    /// The size reducer owned by this driver.
    pub fn reducer(&self) -> &SizeReducer<'arena> {
        &self.sr
    }

    /// The model, once [`Self::run`] has built it.
    pub fn lp(&self) -> Option<&F::Program> {
        self.lp.as_ref()
    }

    /// Nodes size reduction removed during the last run.
    pub fn removed_nodes(&self) -> usize {
        self.removed
    }

    /// Reduce, build, solve, apply and reinsert.
    ///
    /// Returns the terminal state reported by the solver.
    pub fn run(&mut self) -> CoalesceResult<SolutionState> {
        self.removed = self.sr.remove(&*self.graph);

        let mut lp = self.formulation.build(&*self.graph, &self.sr)?;
        lp.set_time_limit(self.config.time_limit);

        if self.config.solve_over_network {
            debug!(
                "solving over the net with {}@{}",
                self.backend.ilp_solver, self.backend.ilp_server
            );
            lp.solve_remote(&self.backend.ilp_server, &self.backend.ilp_solver)?;
        } else {
            lp.solve_local().inspect_err(|e| error!("{}", e))?;
        }

        if self.config.dump.ilp {
            let mut f = BufWriter::new(File::create(self.dump_file("-co.ilp"))?);
            lp.dump_plain(&mut f)?;
        }
        if self.config.dump.sol {
            let mut f = BufWriter::new(File::create(self.dump_file("-co.sol"))?);
            lp.dump_solution(&mut f)?;
        }

        self.formulation.apply(&mut *self.graph, &self.sr, &lp)?;
        let reinserted = self.sr.reinsert(&mut *self.graph)?;

        let state = lp.solution_state();
        match state {
            SolutionState::Optimal => info!("{}: ILP solved optimally", self.graph.procedure_name()),
            other => warn!("{}: ILP solution state is {}", self.graph.procedure_name(), other),
        }
        debug!("ILP pass removed {} and reinserted {} nodes", self.removed, reinserted);

        self.lp = Some(lp);
        Ok(state)
    }

    fn dump_file(&self, suffix: &str) -> PathBuf {
        dump_path(
            self.dump_dir,
            self.graph.procedure_name(),
            self.graph.register_class().name(),
            suffix,
        )
    }
}
