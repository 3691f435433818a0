// This module serves as the central hub for regcoal's core infrastructure, the building
// blocks shared by size reduction, the heuristic adapter and the ILP driver. It exports
// session management (arena-based scratch memory and coalescing statistics), register
// classes and register sets (bitset tracking of admissible and used registers), the
// graph contracts a caller implements to expose its interference graph, register
// constraints and affinities, dense bidirectional index maps between native and
// solver-local numbering, pass configuration, and the crate wide error type.

//! Core regcoal infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena-based allocation of per-pass scratch data using `bumpalo`
//! - Coalescing statistics
//!
//! ## Registers (`register_class`, `reg_set`)
//! - Register classes with ignore (reserved) registers
//! - Fixed-capacity register bitsets
//!
//! ## Graph Contracts (`graph`)
//! - Interference, register constraint and affinity queries
//! - Copy cost and coloring validity checks
//!
//! ## Index Maps (`index_map`)
//! - O(1) native to local and local to native lookups

pub mod config;
pub mod error;
pub mod graph;
pub mod index_map;
pub mod reg_set;
pub mod register_class;
pub mod session;

// Re-export core components
pub use config::{
    BackendOptions,
    CoalesceAlgorithm,
    CoalesceConfig,
    DumpFlags,
    HeurConfig,
    IlpConfig,
    IlpDumpFlags,
};

pub use error::{CoalesceError, CoalesceResult};

pub use graph::{
    copy_costs,
    verify_coloring,
    AffinityGraph,
    CoalesceGraph,
    ColoringViolation,
    InterferenceGraph,
    NodeIdx,
    RegisterConstraints,
};

pub use index_map::BiMap;
pub use reg_set::RegSet;
pub use register_class::{RegIdx, Register, RegisterClass};
pub use session::{CoalesceSession, CoalesceStats};
