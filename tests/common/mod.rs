//! Graph generators shared by the integration tests.

#![allow(dead_code)]

use regcoal::core::graph::{verify_coloring, InterferenceGraph, RegisterConstraints};
use regcoal::core::reg_set::RegSet;
use regcoal::core::register_class::RegisterClass;
use regcoal::test_graph::TestGraph;

/// Small deterministic generator so failures reproduce.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Random graph with a greedy initial coloring and enough registers for it.
pub fn random_graph(seed: u64, n_nodes: usize, edge_pct: u64) -> TestGraph {
    let mut rng = Lcg(seed);
    let mut edges = Vec::new();
    let mut degree = vec![0usize; n_nodes];
    for a in 0..n_nodes {
        for b in a + 1..n_nodes {
            if rng.below(100) < edge_pct {
                edges.push((a, b));
                degree[a] += 1;
                degree[b] += 1;
            }
        }
    }

    let n_regs = degree.iter().copied().max().unwrap_or(0) + 1;
    let class = RegisterClass::new("gp", (0..n_regs).map(|i| (format!("r{}", i), false)));
    let mut g = TestGraph::new(format!("rand{}", seed), class);
    for i in 0..n_nodes {
        g.add_node(format!("v{}", i), None);
    }
    for &(a, b) in &edges {
        g.add_edge(a, b);
    }
    for i in 0..n_nodes {
        if rng.below(4) == 0 {
            let j = rng.below(n_nodes as u64) as usize;
            g.add_affinity(i, j, 1 + rng.below(9) as u32);
        }
    }

    for n in 0..n_nodes {
        let mut used = RegSet::new(n_regs);
        for m in g.neighbours(n).collect::<Vec<_>>() {
            if let Some(r) = g.register(m) {
                used.set(r);
            }
        }
        let free = used.next_clear(0).unwrap();
        g.set_register(n, free);
    }
    assert!(verify_coloring(&g).is_empty());
    g
}

/// [`random_graph`] with extra affinities and some nodes limited to a
/// random register subset that contains their current register.
pub fn random_limited_graph(seed: u64, n_nodes: usize, edge_pct: u64) -> TestGraph {
    let mut g = random_graph(seed, n_nodes, edge_pct);
    let mut rng = Lcg(seed ^ 0x5eed);
    let n_regs = g.register_class().n_regs();

    for n in 0..n_nodes {
        if rng.below(3) == 0 {
            let m = rng.below(n_nodes as u64) as usize;
            g.add_affinity(n, m, 1 + rng.below(20) as u32);
        }
        if rng.below(4) == 0 {
            let mut adm = RegSet::new(n_regs);
            adm.set(g.register(n).unwrap());
            for r in 0..n_regs {
                if rng.below(2) == 0 {
                    adm.set(r);
                }
            }
            g.set_limited(n, adm);
        }
    }
    g
}
