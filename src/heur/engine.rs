//! Coalescing engine contract and the in-tree recoloring engine.
//!
//! The heuristic adapter talks to its engine only through
//! [`CoalescingEngine`]. Nodes and colors are compacted solver-local indices;
//! the engine never sees native node or register numbers. Dropping the engine
//! releases it.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, trace};

use crate::core::reg_set::RegSet;

/// External coalescing engine operating on a compacted graph.
pub trait CoalescingEngine {
    /// Create an engine for `n_nodes` nodes and `n_colors` colors.
    fn init(name: &str, n_nodes: usize, n_colors: usize, debug_level: u32) -> Self
    where
        Self: Sized;

    /// Set the initial color of `node`.
    fn set_color(&mut self, node: usize, color: usize);

    /// Forbid `color` for `node`.
    fn forbid_color(&mut self, node: usize, color: usize);

    fn add_int_edge(&mut self, a: usize, b: usize);

    fn add_aff_edge(&mut self, a: usize, b: usize, cost: u32);

    /// Improve the coloring in place.
    fn coalesce(&mut self);

    /// Color of `node` after coalescing.
    fn color(&self, node: usize) -> usize;

    /// Write the graph in dot format.
    fn dump(&self, path: &Path) -> io::Result<()>;
}

/// Greedy affinity-driven recoloring.
///
/// Visits affinity edges by descending cost and moves one endpoint to the
/// color of the other whenever that strictly lowers the copy costs around
/// the moved node and the color is neither forbidden nor held by an
/// interference neighbour. Repeats until no move applies.
pub struct RecolorEngine {
    name: String,
    n_colors: usize,
    debug_level: u32,
    colors: Vec<usize>,
    forbidden: Vec<RegSet>,
    int_adj: Vec<Vec<usize>>,
    aff_adj: Vec<Vec<(usize, u32)>>,
    aff_edges: Vec<(usize, usize, u32)>,
}

impl RecolorEngine {
    fn is_admissible(&self, node: usize, color: usize) -> bool {
        color < self.n_colors
            && !self.forbidden[node].contains(color)
            && self.int_adj[node].iter().all(|&n| self.colors[n] != color)
    }

    /// Affinity cost saved around `node` if it had `color`.
    fn gain(&self, node: usize, color: usize) -> u64 {
        self.aff_adj[node]
            .iter()
            .filter(|&&(other, _)| self.colors[other] == color)
            .map(|&(_, cost)| u64::from(cost))
            .sum()
    }

    /// Move `node` to `color` if legal and profitable.
    fn try_move(&mut self, node: usize, color: usize) -> bool {
        if self.colors[node] == color || !self.is_admissible(node, color) {
            return false;
        }
        if self.gain(node, color) <= self.gain(node, self.colors[node]) {
            return false;
        }
        if self.debug_level > 0 {
            debug!("{}: node {} {} -> {}", self.name, node, self.colors[node], color);
        }
        self.colors[node] = color;
        true
    }
}

impl CoalescingEngine for RecolorEngine {
    fn init(name: &str, n_nodes: usize, n_colors: usize, debug_level: u32) -> Self {
        Self {
            name: name.to_string(),
            n_colors,
            debug_level,
            colors: vec![0; n_nodes],
            forbidden: vec![RegSet::new(n_colors); n_nodes],
            int_adj: vec![Vec::new(); n_nodes],
            aff_adj: vec![Vec::new(); n_nodes],
            aff_edges: Vec::new(),
        }
    }

    fn set_color(&mut self, node: usize, color: usize) {
        self.colors[node] = color;
    }

    fn forbid_color(&mut self, node: usize, color: usize) {
        self.forbidden[node].set(color);
    }

    fn add_int_edge(&mut self, a: usize, b: usize) {
        self.int_adj[a].push(b);
        self.int_adj[b].push(a);
    }

    fn add_aff_edge(&mut self, a: usize, b: usize, cost: u32) {
        self.aff_adj[a].push((b, cost));
        self.aff_adj[b].push((a, cost));
        self.aff_edges.push((a, b, cost));
    }

    fn coalesce(&mut self) {
        let mut edges = std::mem::take(&mut self.aff_edges);
        edges.sort_by(|x, y| y.2.cmp(&x.2));

        // Every move strictly lowers the total copy costs, so this ends.
        let mut rounds = 0usize;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for &(a, b, _) in &edges {
                if self.colors[a] == self.colors[b] {
                    continue;
                }
                let (ca, cb) = (self.colors[a], self.colors[b]);
                changed |= self.try_move(b, ca) || self.try_move(a, cb);
            }
        }

        trace!("{}: recoloring finished after {} rounds", self.name, rounds);
        self.aff_edges = edges;
    }

    fn color(&self, node: usize) -> usize {
        self.colors[node]
    }

    fn dump(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "graph \"{}\" {{", self.name)?;
        for (node, color) in self.colors.iter().enumerate() {
            writeln!(out, "  n{} [label=\"{}:{}\"];", node, node, color)?;
        }
        for (a, adj) in self.int_adj.iter().enumerate() {
            for &b in adj.iter().filter(|&&b| a < b) {
                writeln!(out, "  n{} -- n{};", a, b)?;
            }
        }
        for &(a, b, cost) in &self.aff_edges {
            writeln!(out, "  n{} -- n{} [style=dashed, label=\"{}\"];", a, b, cost)?;
        }
        writeln!(out, "}}")?;
        out.flush()
    }
}
