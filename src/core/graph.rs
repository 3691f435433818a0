// This module defines the graph contract every coalescing strategy consumes. The
// interference graph itself, the register constraint model and the affinity graph
// are owned by the surrounding register allocator; regcoal only queries them through
// the traits here. InterferenceGraph exposes node iteration, neighbour iteration,
// adjacency tests and degrees. RegisterConstraints exposes the register class, the
// current assignment of each node, admissible-register subsets for limited nodes and
// whether a node is ignored. AffinityGraph exposes weighted copy relations and the
// "optimizable" flag that protects a node from size reduction. CoalesceGraph bundles
// the three together with the name of the owning procedure, used for dump files.
// Capability queries are resolved against these traits per node, never by inspecting
// concrete IR node kinds.

//! Graph contract consumed by the coalescing strategies.
//!
//! Implementations must keep interference and affinity relations symmetric
//! and free of self loops. Node indices are stable for the duration of one
//! pass and are expected to be small, dense-ish integers since index maps
//! are vector backed.

use super::reg_set::RegSet;
use super::register_class::{RegIdx, RegisterClass};

/// Native index of a value node.
pub type NodeIdx = usize;

/// Read-only view of the interference graph of one register class.
pub trait InterferenceGraph {
    /// Iterator over all nodes of the graph.
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeIdx> + '_>;

    /// Iterator over the interference neighbours of `node`.
    fn neighbours(&self, node: NodeIdx) -> Box<dyn Iterator<Item = NodeIdx> + '_>;

    /// Whether `a` and `b` interfere.
    fn connected(&self, a: NodeIdx, b: NodeIdx) -> bool;

    /// Number of interference neighbours of `node`.
    fn degree(&self, node: NodeIdx) -> usize {
        self.neighbours(node).count()
    }
}

/// Register assignment and constraint model.
pub trait RegisterConstraints {
    /// Register class all nodes of the graph belong to.
    fn register_class(&self) -> &RegisterClass;

    /// Register currently assigned to `node`, if any.
    fn register(&self, node: NodeIdx) -> Option<RegIdx>;

    /// Commit a register to `node`.
    fn set_register(&mut self, node: NodeIdx, reg: RegIdx);

    /// Admissible registers of `node`, or `None` if every register of the
    /// class is allowed.
    fn limited(&self, node: NodeIdx) -> Option<&RegSet>;

    /// Whether `node` is excluded from allocation (it lives in an ignore
    /// register that must not change).
    fn is_ignored(&self, node: NodeIdx) -> bool;
}

/// Weighted copy relations layered on the interference graph nodes.
pub trait AffinityGraph {
    /// Affinity neighbours of `node` with the cost of the copy between them.
    fn affinities(&self, node: NodeIdx) -> Box<dyn Iterator<Item = (NodeIdx, u32)> + '_>;

    /// Whether the node takes part in coalescing and must be kept out of
    /// size reduction.
    fn is_optimizable(&self, node: NodeIdx) -> bool {
        self.affinities(node).next().is_some()
    }
}

/// Everything a coalescing pass needs from its caller.
pub trait CoalesceGraph: InterferenceGraph + RegisterConstraints + AffinityGraph {
    /// Name of the procedure the graph belongs to.
    fn procedure_name(&self) -> &str;
}

/// Sum of the costs of all affinity edges whose endpoints hold different
/// registers. Each undirected edge is counted once.
pub fn copy_costs<G: CoalesceGraph + ?Sized>(graph: &G) -> u64 {
    let mut costs = 0u64;
    for node in graph.nodes() {
        for (other, cost) in graph.affinities(node) {
            if node < other && graph.register(node) != graph.register(other) {
                costs += u64::from(cost);
            }
        }
    }
    costs
}

/// A broken invariant of a finished coloring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColoringViolation {
    /// Node has no register.
    Uncolored(NodeIdx),
    /// Two interfering nodes share a register.
    Conflict(NodeIdx, NodeIdx),
    /// Node holds a register outside its admissible set.
    Inadmissible(NodeIdx, RegIdx),
}

/// Check soundness and admissibility of the current coloring.
pub fn verify_coloring<G: CoalesceGraph + ?Sized>(graph: &G) -> Vec<ColoringViolation> {
    let mut violations = Vec::new();
    for node in graph.nodes() {
        let Some(reg) = graph.register(node) else {
            violations.push(ColoringViolation::Uncolored(node));
            continue;
        };

        if let Some(adm) = graph.limited(node) {
            if !adm.contains(reg) {
                violations.push(ColoringViolation::Inadmissible(node, reg));
            }
        }

        for other in graph.neighbours(node) {
            if node < other && graph.register(other) == Some(reg) {
                violations.push(ColoringViolation::Conflict(node, other));
            }
        }
    }
    violations
}
