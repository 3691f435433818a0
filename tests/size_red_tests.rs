//! Size reduction and reinsertion over generated and hand-written graphs.

mod common;

use bumpalo::Bump;
use common::random_graph;
use regcoal::core::graph::{
    verify_coloring, AffinityGraph, CoalesceGraph, InterferenceGraph, NodeIdx, RegisterConstraints,
};
use regcoal::core::reg_set::RegSet;
use regcoal::core::register_class::{RegIdx, RegisterClass};
use regcoal::size_red::SizeReducer;
use regcoal::test_graph::TestGraph;

#[test]
fn test_reduce_then_reinsert_keeps_coloring_valid() {
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 1..=40 {
        let arena = Bump::new();
        let mut g = random_graph(seed, 12, 30);
        let mut sr = SizeReducer::new(&arena);

        let removed = sr.remove(&g);
        assert_eq!(sr.reinsert(&mut g).unwrap(), removed);
        assert_eq!(sr.removed_count(), 0);
        assert!(verify_coloring(&g).is_empty(), "seed {}: {:?}", seed, verify_coloring(&g));
    }
}

#[test]
fn test_removed_nodes_were_simplicial() {
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 100..=130 {
        let arena = Bump::new();
        let g = random_graph(seed, 14, 25);
        let mut sr = SizeReducer::new(&arena);
        sr.remove(&g);

        let order = sr.removal_order();
        for (i, &node) in order.iter().enumerate() {
            assert!(!g.is_optimizable(node));
            assert!(g.limited(node).is_none());

            // Neighbours still present when `node` was taken out.
            let removed_before = &order[..i];
            let present: Vec<NodeIdx> = g
                .neighbours(node)
                .filter(|m| !removed_before.contains(m))
                .collect();
            for (j, &a) in present.iter().enumerate() {
                for &b in &present[j + 1..] {
                    assert!(g.connected(a, b), "seed {}: {} not simplicial", seed, node);
                }
            }
        }
    }
}

/// Forwards to a [`TestGraph`] and records every register assignment.
struct Recording {
    inner: TestGraph,
    assigned: Vec<NodeIdx>,
}

impl InterferenceGraph for Recording {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeIdx> + '_> {
        self.inner.nodes()
    }

    fn neighbours(&self, node: NodeIdx) -> Box<dyn Iterator<Item = NodeIdx> + '_> {
        self.inner.neighbours(node)
    }

    fn connected(&self, a: NodeIdx, b: NodeIdx) -> bool {
        self.inner.connected(a, b)
    }
}

impl RegisterConstraints for Recording {
    fn register_class(&self) -> &RegisterClass {
        self.inner.register_class()
    }

    fn register(&self, node: NodeIdx) -> Option<RegIdx> {
        self.inner.register(node)
    }

    fn set_register(&mut self, node: NodeIdx, reg: RegIdx) {
        self.assigned.push(node);
        self.inner.set_register(node, reg);
    }

    fn limited(&self, node: NodeIdx) -> Option<&RegSet> {
        self.inner.limited(node)
    }

    fn is_ignored(&self, node: NodeIdx) -> bool {
        self.inner.is_ignored(node)
    }
}

impl AffinityGraph for Recording {
    fn affinities(&self, node: NodeIdx) -> Box<dyn Iterator<Item = (NodeIdx, u32)> + '_> {
        self.inner.affinities(node)
    }
}

impl CoalesceGraph for Recording {
    fn procedure_name(&self) -> &str {
        self.inner.procedure_name()
    }
}

#[test]
fn test_reinsertion_is_reverse_removal_order() {
    let _ = env_logger::builder().is_test(true).try_init();

    // a and c only become simplicial once b and d are gone.
    let text = "
proc order
class gp r0 r1 r2
node a = r0
node b = r1
node c = r1
node d = r0
edge a b
edge a c
edge c d
";
    let arena = Bump::new();
    let mut g = Recording {
        inner: TestGraph::parse(text).unwrap(),
        assigned: Vec::new(),
    };
    let mut sr = SizeReducer::new(&arena);

    assert_eq!(sr.remove(&g), 4);
    assert_eq!(sr.removal_order(), &[1, 3, 0, 2]);

    sr.reinsert(&mut g).unwrap();
    assert_eq!(g.assigned, vec![2, 0, 3, 1]);
    assert!(verify_coloring(&g).is_empty());
}

#[test]
fn test_reinsertion_order_on_random_graphs() {
    for seed in 200..=220 {
        let arena = Bump::new();
        let mut g = Recording {
            inner: random_graph(seed, 16, 20),
            assigned: Vec::new(),
        };
        let mut sr = SizeReducer::new(&arena);

        sr.remove(&g);
        let mut expected = sr.removal_order().to_vec();
        expected.reverse();

        sr.reinsert(&mut g).unwrap();
        assert_eq!(g.assigned, expected, "seed {}", seed);
    }
}

#[test]
fn test_reinsertion_ignores_still_removed_neighbours() {
    let _ = env_logger::builder().is_test(true).try_init();

    // The stale registers are all r0; only present neighbours may count.
    let text = "
proc stale
class gp r0 r1 r2
node a = r0
node b = r0
node c = r0
edge a b
edge b c
";
    let arena = Bump::new();
    let mut g = TestGraph::parse(text).unwrap();
    let mut sr = SizeReducer::new(&arena);

    assert_eq!(sr.remove(&g), 3);
    assert_eq!(sr.removal_order(), &[0, 1, 2]);
    sr.reinsert(&mut g).unwrap();

    assert_eq!(g.register_name(2), Some("r0"));
    assert_eq!(g.register_name(1), Some("r1"));
    assert_eq!(g.register_name(0), Some("r0"));
}

#[test]
fn test_limited_and_ignored_nodes_are_kept() {
    let text = "
proc keep
class gp r0 r1 r2 !sp
node a = r0 limit r0 r1
node b = r1
node s = sp ignore
edge a b
edge b s
edge a s
";
    let arena = Bump::new();
    let mut g = TestGraph::parse(text).unwrap();
    let mut sr = SizeReducer::new(&arena);

    // Only b qualifies: a is limited and s is ignored.
    assert_eq!(sr.remove(&g), 1);
    assert_eq!(sr.removal_order(), &[1]);

    sr.reinsert(&mut g).unwrap();
    assert_eq!(g.register_name(0), Some("r0"));
    assert_eq!(g.register_name(1), Some("r1"));
    assert_eq!(g.register_name(2), Some("sp"));
    assert!(verify_coloring(&g).is_empty());
}
