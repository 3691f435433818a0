// This module implements the heuristic solver adapter. It translates the working graph
// of one register class into the compacted problem a CoalescingEngine understands,
// runs the engine and commits the engine's coloring back to the nodes. Two index maps
// are built per run: assignable registers to dense colors and present, non-ignored
// nodes to dense solver-local indices. Each node contributes its current color,
// forbidden-color directives for the complement of its admissible set and for the
// registers held by ignored interference neighbours, and its interference and
// affinity edges to nodes with a greater native index so every undirected edge is
// submitted once. Nodes removed by size reduction are left out and
// are not touched; the caller reinserts them afterwards. An empty working graph is a
// successful no-op that never creates an engine. Optional dot dumps of the engine's
// graph are written before and after coalescing.

//! Heuristic coalescing through an external engine.

pub mod engine;

use std::path::{Path, PathBuf};

use log::debug;

use crate::core::config::{dump_path, HeurConfig};
use crate::core::error::{CoalesceError, CoalesceResult};
use crate::core::graph::{CoalesceGraph, NodeIdx};
use crate::core::index_map::BiMap;
use crate::size_red::SizeReducer;

pub use engine::{CoalescingEngine, RecolorEngine};

/// Translates a working graph to and from a [`CoalescingEngine`].
pub struct HeuristicAdapter<'c> {
    config: &'c HeurConfig,
    dump_dir: &'c Path,
}

impl<'c> HeuristicAdapter<'c> {
    pub fn new(config: &'c HeurConfig, dump_dir: &'c Path) -> Self {
        Self { config, dump_dir }
    }

    /// Run engine `E` over the nodes of `graph` that are neither ignored nor
    /// removed by `reducer`.
    ///
    /// Returns `false` without creating an engine if there is nothing to
    /// coalesce.
    pub fn run<E, G>(&self, graph: &mut G, reducer: Option<&SizeReducer<'_>>) -> CoalesceResult<bool>
    where
        E: CoalescingEngine,
        G: CoalesceGraph + ?Sized,
    {
        let cls = graph.register_class();
        let n_regs = cls.n_regs();
        let col_map = BiMap::from_natives(cls.regs().iter().filter(|r| !r.ignore).map(|r| r.index));

        let is_removed = |n: NodeIdx| reducer.is_some_and(|sr| sr.is_removed(n));
        let node_map = BiMap::from_natives(
            graph
                .nodes()
                .filter(|&n| !graph.is_ignored(n) && !is_removed(n)),
        );

        if node_map.is_empty() {
            debug!("no nodes to coalesce in {}", graph.procedure_name());
            return Ok(false);
        }

        let name = format!("{}-{}", graph.procedure_name(), graph.register_class().name());
        let mut coal = E::init(&name, node_map.len(), col_map.len(), self.config.debug_level);
        let mut n_int = 0usize;
        let mut n_aff = 0usize;

        for (t_idx, &n_idx) in node_map.natives().iter().enumerate() {
            let reg = graph
                .register(n_idx)
                .ok_or(CoalesceError::UncoloredNode { node: n_idx })?;
            let col = col_map
                .local(reg)
                .ok_or(CoalesceError::InvalidRegister { node: n_idx, reg })?;
            coal.set_color(t_idx, col);

            // Forbidding is the complement of the admissible set.
            if let Some(adm) = graph.limited(n_idx) {
                for reg in (0..n_regs).filter(|&r| !adm.contains(r)) {
                    if let Some(c) = col_map.local(reg) {
                        coal.forbid_color(t_idx, c);
                    }
                }
            }

            for m_idx in graph.neighbours(n_idx) {
                // Ignored neighbours stay put, so their register is taken.
                if graph.is_ignored(m_idx) {
                    if let Some(c) = graph.register(m_idx).and_then(|r| col_map.local(r)) {
                        coal.forbid_color(t_idx, c);
                    }
                    continue;
                }
                if let Some(s_idx) = node_map.local(m_idx).filter(|_| n_idx < m_idx) {
                    coal.add_int_edge(s_idx, t_idx);
                    n_int += 1;
                }
            }

            for (m_idx, cost) in graph.affinities(n_idx) {
                if let Some(s_idx) = node_map.local(m_idx).filter(|_| n_idx < m_idx) {
                    coal.add_aff_edge(s_idx, t_idx, cost);
                    n_aff += 1;
                }
            }
        }

        debug!(
            "{}: engine gets {} nodes, {} colors, {} interferences, {} affinities",
            name,
            node_map.len(),
            col_map.len(),
            n_int,
            n_aff
        );

        if self.config.dump.before {
            coal.dump(&self.dump_file(graph, "-before.dot"))?;
        }

        coal.coalesce();

        for (t_idx, &n_idx) in node_map.natives().iter().enumerate() {
            let col = coal.color(t_idx);
            let reg = col_map
                .native(col)
                .ok_or(CoalesceError::InvalidRegister { node: n_idx, reg: col })?;
            graph.set_register(n_idx, reg);
        }

        if self.config.dump.after {
            coal.dump(&self.dump_file(graph, "-after.dot"))?;
        }

        Ok(true)
    }

    fn dump_file<G: CoalesceGraph + ?Sized>(&self, graph: &G, suffix: &str) -> PathBuf {
        dump_path(
            self.dump_dir,
            graph.procedure_name(),
            graph.register_class().name(),
            suffix,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::RegisterConstraints;
    use crate::test_graph::TestGraph;
    use bumpalo::Bump;

    #[test]
    fn test_ignored_nodes_untouched() {
        let text = "
class gp r0 r1 !sp
node a = r0
node b = r1
node s = sp ignore
aff a b 3
aff a s 7
";
        let mut g = TestGraph::parse(text).unwrap();
        let cfg = HeurConfig::default();
        let adapter = HeuristicAdapter::new(&cfg, Path::new("."));

        assert!(adapter.run::<RecolorEngine, _>(&mut g, None).unwrap());
        assert_eq!(g.register_name(g.node_by_name("s").unwrap()), Some("sp"));
        assert_eq!(
            g.register(g.node_by_name("a").unwrap()),
            g.register(g.node_by_name("b").unwrap())
        );
    }

    #[test]
    fn test_removed_nodes_untouched() {
        let text = "
class gp r0 r1 r2
node a = r0
node b = r1
node c = r2
edge a c
aff a b 3
";
        let arena = Bump::new();
        let mut g = TestGraph::parse(text).unwrap();
        let mut sr = SizeReducer::new(&arena);
        let c = g.node_by_name("c").unwrap();

        sr.remove(&g);
        assert!(sr.is_removed(c));

        let cfg = HeurConfig::default();
        let adapter = HeuristicAdapter::new(&cfg, Path::new("."));
        adapter.run::<RecolorEngine, _>(&mut g, Some(&sr)).unwrap();
        assert_eq!(g.register_name(c), Some("r2"));
    }

    #[test]
    fn test_ignore_register_on_active_node() {
        let text = "
class gp r0 !sp
node a = sp
";
        let mut g = TestGraph::parse(text).unwrap();
        let cfg = HeurConfig::default();
        let adapter = HeuristicAdapter::new(&cfg, Path::new("."));

        let err = adapter.run::<RecolorEngine, _>(&mut g, None).unwrap_err();
        assert!(matches!(err, CoalesceError::InvalidRegister { node: 0, reg: 1 }));
    }
}
