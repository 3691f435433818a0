// This module provides arena-based session management for coalescing passes using the
// bumpalo crate. CoalesceSession owns nothing but a borrowed arena and the statistics
// of all passes run through it. A size reducer allocates its coloring suffix in the
// session arena, so the suffix shares the session lifetime and needs no manual
// freeing; dropping the arena after the pass releases it in one step. CoalesceStats
// counts passes, size-reduced and reinserted nodes, engine runs, ILP solves and the
// copy costs observed before and after coalescing, and prints a summary via Display.
// Passes over distinct register classes may use distinct sessions and run
// independently of each other.

//! Arena-based coalescing session management.
//!
//! All per-pass scratch data that is append-only (the coloring suffix of
//! the size reducer) lives in the session arena.

use bumpalo::Bump;
use std::cell::RefCell;
use std::fmt;

/// Arena-based coalescing session.
pub struct CoalesceSession<'arena> {
    /// Arena allocator for pass scratch data.
    arena: &'arena Bump,

    /// Session statistics for debugging and tuning.
    stats: RefCell<CoalesceStats>,
}

impl<'arena> CoalesceSession<'arena> {
    /// Create a new session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(CoalesceStats::default()),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Record the start of a pass and the copy costs before it.
    pub fn record_pass_started(&self, costs_before: u64) {
        let mut stats = self.stats.borrow_mut();
        stats.passes += 1;
        stats.costs_before += costs_before;
    }

    /// Record the copy costs remaining after a pass.
    pub fn record_pass_finished(&self, costs_after: u64) {
        self.stats.borrow_mut().costs_after += costs_after;
    }

    pub fn record_nodes_removed(&self, count: usize) {
        self.stats.borrow_mut().nodes_removed += count;
    }

    pub fn record_nodes_reinserted(&self, count: usize) {
        self.stats.borrow_mut().nodes_reinserted += count;
    }

    pub fn record_engine_run(&self) {
        self.stats.borrow_mut().engine_runs += 1;
    }

    pub fn record_ilp_solved(&self) {
        self.stats.borrow_mut().ilp_solves += 1;
    }

    /// Get session statistics.
    pub fn stats(&self) -> CoalesceStats {
        self.stats.borrow().clone()
    }
}

/// Coalescing session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoalesceStats {
    /// Number of passes started.
    pub passes: usize,

    /// Nodes removed by size reduction.
    pub nodes_removed: usize,

    /// Nodes recolored by reinsertion.
    pub nodes_reinserted: usize,

    /// Runs of the heuristic coalescing engine.
    pub engine_runs: usize,

    /// ILP models solved.
    pub ilp_solves: usize,

    /// Copy costs before coalescing, summed over passes.
    pub costs_before: u64,

    /// Copy costs after coalescing, summed over passes.
    pub costs_after: u64,
}

impl fmt::Display for CoalesceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coalescing Session Statistics:")?;
        writeln!(f, "  Passes: {}", self.passes)?;
        writeln!(f, "  Nodes size-reduced: {}", self.nodes_removed)?;
        writeln!(f, "  Nodes reinserted: {}", self.nodes_reinserted)?;
        writeln!(f, "  Engine runs: {}", self.engine_runs)?;
        writeln!(f, "  ILP solves: {}", self.ilp_solves)?;
        writeln!(f, "  Copy costs: {} -> {}", self.costs_before, self.costs_after)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let arena = Bump::new();
        let session = CoalesceSession::new(&arena);

        assert_eq!(session.stats(), CoalesceStats::default());
    }

    #[test]
    fn test_session_statistics() {
        let arena = Bump::new();
        let session = CoalesceSession::new(&arena);

        session.record_pass_started(30);
        session.record_nodes_removed(4);
        session.record_nodes_reinserted(4);
        session.record_engine_run();
        session.record_pass_finished(10);

        let stats = session.stats();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.nodes_removed, 4);
        assert_eq!(stats.nodes_reinserted, 4);
        assert_eq!(stats.engine_runs, 1);
        assert_eq!(stats.ilp_solves, 0);
        assert_eq!(stats.costs_before, 30);
        assert_eq!(stats.costs_after, 10);
    }

    #[test]
    fn test_statistics_display() {
        let arena = Bump::new();
        let session = CoalesceSession::new(&arena);

        session.record_pass_started(12);
        session.record_ilp_solved();
        session.record_pass_finished(2);

        let output = format!("{}", session.stats());
        assert!(output.contains("Passes: 1"));
        assert!(output.contains("ILP solves: 1"));
        assert!(output.contains("Copy costs: 12 -> 2"));
    }
}
