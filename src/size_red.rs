// This module implements size reduction, the preprocessing step shared by every
// coalescing strategy. Before an expensive solve it repeatedly removes simplicial nodes
// (nodes whose still-present neighbours form a clique) from the working graph. Nodes
// with limited admissible registers, ignored nodes and nodes the affinity graph marks
// as optimizable are never removed. Each removed node is appended to the coloring
// suffix, an arena allocated sequence owned by the reducer, and entered into the
// removed set for O(1) membership tests. After solving, reinsert pops the suffix in
// reverse removal order and gives each node the lowest register not held by a present
// neighbour, which is always possible for a simplicial elimination order when the
// class has more assignable registers than the node had present neighbours. Running
// out of registers is an invariant violation reported as CoalesceError::NoFreeColor.

//! Size reduction of the interference graph.
//!
//! One [`SizeReducer`] serves one pass over one register class: create it,
//! call [`SizeReducer::remove`] before solving and [`SizeReducer::reinsert`]
//! afterwards.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use hashbrown::HashSet;
use log::{debug, trace};

use crate::core::error::{CoalesceError, CoalesceResult};
use crate::core::graph::{CoalesceGraph, NodeIdx};
use crate::core::reg_set::RegSet;

/// Simplicial elimination of the working graph.
pub struct SizeReducer<'arena> {
    /// Removed nodes in removal order; the last entry is recolored first.
    col_suff: BumpVec<'arena, NodeIdx>,
    /// Nodes currently out of the working graph.
    all_removed: HashSet<NodeIdx>,
}

impl<'arena> SizeReducer<'arena> {
    /// Create a reducer whose coloring suffix lives in `arena`.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            col_suff: BumpVec::new_in(arena),
            all_removed: HashSet::new(),
        }
    }

    /// Whether `node` is currently removed from the working graph.
    pub fn is_removed(&self, node: NodeIdx) -> bool {
        self.all_removed.contains(&node)
    }

    /// Number of nodes currently removed.
    pub fn removed_count(&self) -> usize {
        self.all_removed.len()
    }

    /// Removed nodes in the order they were removed.
    pub fn removal_order(&self) -> &[NodeIdx] {
        &self.col_suff
    }

    /// Checks if a node is simplicial in the graph heeding the already
    /// removed nodes.
    fn is_simplicial<G: CoalesceGraph + ?Sized>(&self, graph: &G, node: NodeIdx) -> bool {
        let mut present = Vec::with_capacity(graph.degree(node));
        present.extend(graph.neighbours(node).filter(|n| !self.is_removed(*n)));

        present.iter().enumerate().all(|(i, &a)| {
            present[i + 1..].iter().all(|&b| graph.connected(a, b))
        })
    }

    fn is_candidate<G: CoalesceGraph + ?Sized>(&self, graph: &G, node: NodeIdx) -> bool {
        graph.limited(node).is_none()
            && !graph.is_ignored(node)
            && !self.is_removed(node)
            && !graph.is_optimizable(node)
    }

    /// Remove simplicial nodes until a fixed point is reached.
    ///
    /// Returns the number of nodes removed by this call.
    pub fn remove<G: CoalesceGraph + ?Sized>(&mut self, graph: &G) -> usize {
        let before = self.col_suff.len();
        let mut redo = true;
        let mut rounds = 0usize;

        while redo {
            redo = false;
            rounds += 1;
            for node in graph.nodes() {
                if self.is_candidate(graph, node) && self.is_simplicial(graph, node) {
                    trace!("size reduction removes node {}", node);
                    self.col_suff.push(node);
                    self.all_removed.insert(node);
                    redo = true;
                }
            }
        }

        let removed = self.col_suff.len() - before;
        debug!(
            "size reduction of {}/{} removed {} nodes in {} rounds",
            graph.procedure_name(),
            graph.register_class().name(),
            removed,
            rounds
        );
        removed
    }

    /// Color the removed nodes in reverse removal order and put them back
    /// into the working graph.
    ///
    /// Returns the number of nodes reinserted.
    pub fn reinsert<G: CoalesceGraph + ?Sized>(&mut self, graph: &mut G) -> CoalesceResult<usize> {
        let cls = graph.register_class();
        let n_regs = cls.n_regs();

        // Ignore registers are never handed out.
        let mut reserved = RegSet::new(n_regs);
        for reg in cls.regs().iter().filter(|r| r.ignore) {
            reserved.set(reg.index);
        }

        let mut used_cols = RegSet::new(n_regs);
        let mut count = 0usize;

        while let Some(node) = self.col_suff.pop() {
            used_cols.clone_from(&reserved);

            // Only inspect nodes which are in the graph right now.
            for other in graph.neighbours(node) {
                if self.is_removed(other) {
                    continue;
                }
                if let Some(reg) = graph.register(other) {
                    used_cols.set(reg);
                }
            }

            let Some(free_col) = used_cols.next_clear(0) else {
                return Err(CoalesceError::NoFreeColor {
                    node,
                    class: graph.register_class().name().to_string(),
                });
            };

            trace!("reinserting node {} with register {}", node, free_col);
            graph.set_register(node, free_col);
            self.all_removed.remove(&node);
            count += 1;
        }

        debug!("reinserted {} nodes", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{verify_coloring, InterferenceGraph, RegisterConstraints};
    use crate::test_graph::TestGraph;

    /// A path a - b - c - d, colored badly but validly.
    const PATH: &str = "
proc path
class gp r0 r1 r2
node a = r0
node b = r1
node c = r0
node d = r1
edge a b
edge b c
edge c d
";

    #[test]
    fn test_path_reduces_completely() {
        let arena = Bump::new();
        let mut g = TestGraph::parse(PATH).unwrap();
        let mut sr = SizeReducer::new(&arena);

        assert_eq!(sr.remove(&g), 4);
        assert_eq!(sr.removed_count(), 4);
        for n in g.nodes() {
            assert!(sr.is_removed(n));
        }

        assert_eq!(sr.reinsert(&mut g).unwrap(), 4);
        assert_eq!(sr.removed_count(), 0);
        assert!(verify_coloring(&g).is_empty());
    }

    #[test]
    fn test_cycle_is_not_simplicial() {
        let text = "
class gp r0 r1 r2
node a = r0
node b = r1
node c = r0
node d = r1
edge a b
edge b c
edge c d
edge d a
";
        let arena = Bump::new();
        let g = TestGraph::parse(text).unwrap();
        let mut sr = SizeReducer::new(&arena);

        assert_eq!(sr.remove(&g), 0);
        assert!(sr.removal_order().is_empty());
    }

    #[test]
    fn test_protected_nodes_stay() {
        let text = "
class gp r0 r1 r2
node a = r0 limit r0
node b = r1
node c = r2
node s = r2 ignore
edge a b
aff b c 4
";
        let arena = Bump::new();
        let g = TestGraph::parse(text).unwrap();
        let mut sr = SizeReducer::new(&arena);

        sr.remove(&g);
        assert!(!sr.is_removed(g.node_by_name("a").unwrap()));
        assert!(!sr.is_removed(g.node_by_name("b").unwrap()));
        assert!(!sr.is_removed(g.node_by_name("c").unwrap()));
        assert!(!sr.is_removed(g.node_by_name("s").unwrap()));
    }

    #[test]
    fn test_reinsert_skips_ignore_registers() {
        let text = "
class gp !sp r0 r1
node a = r0
node b = r1
node f = sp ignore
edge a b
edge a f
edge b f
";
        let arena = Bump::new();
        let mut g = TestGraph::parse(text).unwrap();
        let mut sr = SizeReducer::new(&arena);

        // a and b are simplicial (their neighbours form cliques).
        sr.remove(&g);
        sr.reinsert(&mut g).unwrap();

        let a = g.node_by_name("a").unwrap();
        let b = g.node_by_name("b").unwrap();
        assert_ne!(g.register(a), Some(0));
        assert_ne!(g.register(b), Some(0));
        assert!(verify_coloring(&g).is_empty());
    }

    #[test]
    fn test_no_free_color() {
        // A triangle over a two register class cannot be colored.
        let text = "
class gp r0 r1
node a = r0
node b = r1
node c = r0
edge a b
edge b c
edge a c
";
        let arena = Bump::new();
        let mut g = TestGraph::parse(text).unwrap();
        let mut sr = SizeReducer::new(&arena);

        assert_eq!(sr.remove(&g), 3);
        let err = sr.reinsert(&mut g).unwrap_err();
        assert!(matches!(err, CoalesceError::NoFreeColor { .. }));
    }
}
