//! Test graph (TG) format and data structures for exercising coalescing passes.
//!
//! This module provides a small textual description of an interference graph
//! plus affinities and an initial coloring, so strategies can be tested
//! without a register allocator around them. [`TestGraph`] implements the
//! full [`CoalesceGraph`] contract.
//!
//! # TG Format
//!
//! ```text
//! ; Comments start with semicolon
//! proc diamond
//! class gp r0 r1 r2 !sp       ; '!' marks an ignore register
//! node a = r0
//! node b = r1 limit r1 r2     ; admissible registers
//! node s = sp ignore
//! edge a b
//! aff a b 10
//! ```

use std::fmt;

use hashbrown::HashSet;

use crate::core::graph::{AffinityGraph, CoalesceGraph, InterferenceGraph, NodeIdx, RegisterConstraints};
use crate::core::reg_set::RegSet;
use crate::core::register_class::{RegIdx, RegisterClass};
use crate::core::error::CoalesceResult;

pub mod parser;

#[derive(Debug, Clone, PartialEq)]
pub struct TestNode {
    pub name: String,
    pub reg: Option<RegIdx>,
    pub limited: Option<RegSet>,
    pub ignore: bool,
}

/// Adjacency-list interference graph with affinities and a coloring.
#[derive(Debug, Clone)]
pub struct TestGraph {
    procedure: String,
    class: RegisterClass,
    nodes: Vec<TestNode>,
    neighbours: Vec<Vec<NodeIdx>>,
    edges: HashSet<(NodeIdx, NodeIdx)>,
    affinities: Vec<Vec<(NodeIdx, u32)>>,
}

impl TestGraph {
    pub fn new<S: Into<String>>(procedure: S, class: RegisterClass) -> Self {
        Self {
            procedure: procedure.into(),
            class,
            nodes: Vec::new(),
            neighbours: Vec::new(),
            edges: HashSet::new(),
            affinities: Vec::new(),
        }
    }

    /// Parse a graph from TG text.
    pub fn parse(text: &str) -> CoalesceResult<Self> {
        parser::parse_graph(text)
    }

    pub fn add_node<S: Into<String>>(&mut self, name: S, reg: Option<RegIdx>) -> NodeIdx {
        self.nodes.push(TestNode {
            name: name.into(),
            reg,
            limited: None,
            ignore: false,
        });
        self.neighbours.push(Vec::new());
        self.affinities.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn set_limited(&mut self, node: NodeIdx, adm: RegSet) {
        self.nodes[node].limited = Some(adm);
    }

    pub fn set_ignored(&mut self, node: NodeIdx, ignore: bool) {
        self.nodes[node].ignore = ignore;
    }

    /// Add an interference edge. Self loops and duplicates are dropped.
    pub fn add_edge(&mut self, a: NodeIdx, b: NodeIdx) {
        if a == b || !self.edges.insert((a.min(b), a.max(b))) {
            return;
        }
        self.neighbours[a].push(b);
        self.neighbours[b].push(a);
    }

    /// Add an affinity edge. Repeated edges accumulate their costs.
    pub fn add_affinity(&mut self, a: NodeIdx, b: NodeIdx, cost: u32) {
        if a == b {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            match self.affinities[from].iter_mut().find(|(n, _)| *n == to) {
                Some((_, c)) => *c += cost,
                None => self.affinities[from].push((to, cost)),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node: NodeIdx) -> &TestNode {
        &self.nodes[node]
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Register name held by `node`, for assertions and printing.
    pub fn register_name(&self, node: NodeIdx) -> Option<&str> {
        let reg = self.nodes[node].reg?;
        self.class.reg(reg).map(|r| r.name.as_str())
    }
}

impl InterferenceGraph for TestGraph {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeIdx> + '_> {
        Box::new(0..self.nodes.len())
    }

    fn neighbours(&self, node: NodeIdx) -> Box<dyn Iterator<Item = NodeIdx> + '_> {
        Box::new(self.neighbours[node].iter().copied())
    }

    fn connected(&self, a: NodeIdx, b: NodeIdx) -> bool {
        self.edges.contains(&(a.min(b), a.max(b)))
    }

    fn degree(&self, node: NodeIdx) -> usize {
        self.neighbours[node].len()
    }
}

impl RegisterConstraints for TestGraph {
    fn register_class(&self) -> &RegisterClass {
        &self.class
    }

    fn register(&self, node: NodeIdx) -> Option<RegIdx> {
        self.nodes[node].reg
    }

    fn set_register(&mut self, node: NodeIdx, reg: RegIdx) {
        self.nodes[node].reg = Some(reg);
    }

    fn limited(&self, node: NodeIdx) -> Option<&RegSet> {
        self.nodes[node].limited.as_ref()
    }

    fn is_ignored(&self, node: NodeIdx) -> bool {
        self.nodes[node].ignore
    }
}

impl AffinityGraph for TestGraph {
    fn affinities(&self, node: NodeIdx) -> Box<dyn Iterator<Item = (NodeIdx, u32)> + '_> {
        Box::new(self.affinities[node].iter().copied())
    }
}

impl CoalesceGraph for TestGraph {
    fn procedure_name(&self) -> &str {
        &self.procedure
    }
}

impl fmt::Display for TestGraph {
    /// Prints the graph back in TG format with the current coloring.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "proc {}", self.procedure)?;
        write!(f, "class {}", self.class.name())?;
        for reg in self.class.regs() {
            write!(f, " {}{}", if reg.ignore { "!" } else { "" }, reg.name)?;
        }
        writeln!(f)?;

        for (idx, node) in self.nodes.iter().enumerate() {
            write!(f, "node {}", node.name)?;
            if let Some(reg) = self.register_name(idx) {
                write!(f, " = {}", reg)?;
            }
            if let Some(adm) = &node.limited {
                write!(f, " limit")?;
                for reg in adm.iter() {
                    if let Some(r) = self.class.reg(reg) {
                        write!(f, " {}", r.name)?;
                    }
                }
            }
            if node.ignore {
                write!(f, " ignore")?;
            }
            writeln!(f)?;
        }

        let mut edges: Vec<_> = self.edges.iter().copied().collect();
        edges.sort_unstable();
        for (a, b) in edges {
            writeln!(f, "edge {} {}", self.nodes[a].name, self.nodes[b].name)?;
        }

        for (a, affs) in self.affinities.iter().enumerate() {
            for &(b, cost) in affs {
                if a < b {
                    writeln!(f, "aff {} {} {}", self.nodes[a].name, self.nodes[b].name, cost)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class3() -> RegisterClass {
        RegisterClass::new("gp", ["r0", "r1", "r2"].iter().map(|n| (n.to_string(), false)))
    }

    #[test]
    fn test_edges_are_symmetric() {
        let mut g = TestGraph::new("f", class3());
        let a = g.add_node("a", Some(0));
        let b = g.add_node("b", Some(1));

        g.add_edge(a, b);
        g.add_edge(b, a);
        g.add_edge(a, a);

        assert!(g.connected(a, b));
        assert!(g.connected(b, a));
        assert!(!g.connected(a, a));
        assert_eq!(g.degree(a), 1);
        assert_eq!(g.degree(b), 1);
    }

    #[test]
    fn test_affinity_accumulates() {
        let mut g = TestGraph::new("f", class3());
        let a = g.add_node("a", Some(0));
        let b = g.add_node("b", Some(1));
        let c = g.add_node("c", Some(2));

        g.add_affinity(a, b, 3);
        g.add_affinity(b, a, 4);

        assert_eq!(g.affinities(a).collect::<Vec<_>>(), vec![(b, 7)]);
        assert_eq!(g.affinities(b).collect::<Vec<_>>(), vec![(a, 7)]);
        assert!(g.is_optimizable(a));
        assert!(!g.is_optimizable(c));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let mut g = TestGraph::new("f", class3());
        let a = g.add_node("a", Some(0));
        let b = g.add_node("b", Some(2));
        g.set_limited(b, RegSet::from_regs(3, [1, 2]));
        g.add_edge(a, b);
        g.add_affinity(a, b, 5);

        let text = g.to_string();
        let parsed = TestGraph::parse(&text).unwrap();
        assert_eq!(parsed.to_string(), text);
    }
}
