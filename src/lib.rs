//! regcoal - copy coalescing for register allocation.
//!
//! After an initial valid coloring, regcoal re-colors copy-related values
//! so that as many of them as possible share a register, which lets the
//! copies between them disappear. The coloring stays valid throughout.
//!
//! # Primary Usage
//!
//! ```
//! use bumpalo::Bump;
//! use regcoal::test_graph::TestGraph;
//! use regcoal::{co_solve, CoalesceConfig, CoalesceSession};
//!
//! let arena = Bump::new();
//! let session = CoalesceSession::new(&arena);
//!
//! // Any `CoalesceGraph` works; `TestGraph` reads a small text format.
//! let mut graph = TestGraph::parse(
//!     "class gp r0 r1\nnode a = r0\nnode b = r1\naff a b 4",
//! )?;
//! let outcome = co_solve(&session, &mut graph, &CoalesceConfig::default())?;
//! assert_eq!(outcome.saved(), 4);
//! # Ok::<(), regcoal::CoalesceError>(())
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Shared infrastructure (session, registers, graph contracts, config)
//! - [`size_red`] - Simplicial size reduction and reinsertion
//! - [`heur`] - Heuristic adapter and coalescing engines
//! - [`ilp`] - ILP driver, linear programs and formulations
//! - [`copy_opt`] - Pass entry point
//! - [`test_graph`] - In-memory graph with a textual format

pub mod core;
pub mod copy_opt;
pub mod heur;
pub mod ilp;
pub mod size_red;
pub mod test_graph;

pub use copy_opt::{co_solve, co_solve_with_service, CoalesceOutcome};
pub use crate::core::{CoalesceConfig, CoalesceError, CoalesceResult, CoalesceSession};
