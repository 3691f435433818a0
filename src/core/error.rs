// This module defines error types for regcoal using the thiserror crate for idiomatic
// Rust error handling. CoalesceError is the single error enum of a coalescing pass:
// invariant violations found while reinserting size-reduced nodes, configuration
// errors (local ILP solving requested without local solver support), remote solve
// failures, contract breaches by the graph (active nodes without an initial color or
// holding a register that is not assignable), test-graph syntax errors and dump I/O.
// Each variant carries the context needed to report it. CoalesceResult<T> is the
// convenience alias used throughout the crate. None of these are recovered inside
// the pass: they surface synchronously to the direct caller, which aborts the pass.

//! Error types for coalescing passes.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

use super::graph::NodeIdx;

/// Main error type for a coalescing pass.
#[derive(Error, Debug)]
pub enum CoalesceError {
    /// Reinsertion of a size-reduced node found every register taken.
    #[error("No free color for node {node} in register class {class}")]
    NoFreeColor {
        node: NodeIdx,
        class: String,
    },

    #[error("Local ILP solving requested but this build has no local solver")]
    LocalSolverUnavailable,

    #[error("Remote solve with {solver}@{server} failed: {reason}")]
    RemoteSolve {
        server: String,
        solver: String,
        reason: String,
    },

    #[error("Node {node} has no register assigned")]
    UncoloredNode {
        node: NodeIdx,
    },

    #[error("Node {node} holds register {reg} which is not assignable")]
    InvalidRegister {
        node: NodeIdx,
        reg: usize,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse {
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for coalescing operations.
pub type CoalesceResult<T> = Result<T, CoalesceError>;
