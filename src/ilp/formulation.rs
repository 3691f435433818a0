// This module implements ColorAssignmentIlp, the concrete ILP formulation of
// coalescing shipped with regcoal. Every present node n gets one binary variable
// x_n_c per color c it may take: assignable, admissible for n and not already held by
// an ignored (precolored) interference neighbour. Equality constraints give each node
// exactly one color, interference constraints forbid two neighbours from sharing one,
// and every affinity edge between present nodes gets a penalty variable y_a_b that is
// forced to 1 whenever the endpoints differ; the objective sums cost * y. Affinities to
// ignored nodes reward taking the ignored node's register directly. The current
// coloring is passed as start values. Applying a solution commits the color whose x
// variable is set; without a solution the initial coloring is kept.

//! Color-assignment ILP formulation.

use hashbrown::HashMap;
use log::{debug, warn};

use super::lpp::{CstKind, Direction, LinearProgram, Lpp, SolveService, VarIdx};
use super::IlpFormulation;
use crate::core::error::{CoalesceError, CoalesceResult};
use crate::core::graph::{CoalesceGraph, NodeIdx};
use crate::core::register_class::RegIdx;
use crate::size_red::SizeReducer;

/// Assignment formulation with one binary variable per node and color.
#[derive(Default)]
pub struct ColorAssignmentIlp {
    /// Per present node, the `x` variable of each register, if any.
    node_vars: HashMap<NodeIdx, Vec<Option<VarIdx>>>,
    /// Nodes in the order their variables were created.
    order: Vec<NodeIdx>,
    /// Handed to the next model built.
    service: Option<Box<dyn SolveService>>,
}

impl ColorAssignmentIlp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formulation whose model is solved remotely through `service`.
    pub fn with_service(service: Box<dyn SolveService>) -> Self {
        Self {
            service: Some(service),
            ..Self::default()
        }
    }

    fn var(&self, node: NodeIdx, reg: RegIdx) -> Option<VarIdx> {
        self.node_vars.get(&node).and_then(|vars| vars.get(reg).copied().flatten())
    }
}

impl<G: CoalesceGraph + ?Sized> IlpFormulation<G> for ColorAssignmentIlp {
    type Program = Lpp;

    fn build(&mut self, graph: &G, reducer: &SizeReducer<'_>) -> CoalesceResult<Lpp> {
        let cls = graph.register_class();
        let n_regs = cls.n_regs();
        let name = format!("{}-{}", graph.procedure_name(), cls.name());
        let mut lp = Lpp::new(name, Direction::Minimize);
        if let Some(service) = self.service.take() {
            lp.set_service(service);
        }

        self.node_vars.clear();
        self.order.clear();

        let is_present = |n: NodeIdx| !graph.is_ignored(n) && !reducer.is_removed(n);

        for node in graph.nodes().filter(|&n| is_present(n)) {
            let current = graph
                .register(node)
                .ok_or(CoalesceError::UncoloredNode { node })?;

            let mut allowed: Vec<bool> = (0..n_regs)
                .map(|r| !cls.is_ignore(r) && graph.limited(node).map_or(true, |adm| adm.contains(r)))
                .collect();
            for other in graph.neighbours(node).filter(|&m| graph.is_ignored(m)) {
                if let Some(slot) = graph.register(other).and_then(|r| allowed.get_mut(r)) {
                    *slot = false;
                }
            }

            let one = lp.add_cst(format!("one_{}", node), CstKind::Equal, 1.0);
            let mut vars = vec![None; n_regs];
            for reg in (0..n_regs).filter(|&r| allowed[r]) {
                let x = lp.add_var(format!("x_{}_{}", node, reg), 0.0);
                lp.set_start(x, if reg == current { 1.0 } else { 0.0 });
                lp.set_factor(one, x, 1.0);
                vars[reg] = Some(x);
            }
            self.node_vars.insert(node, vars);
            self.order.push(node);
        }

        for &a in &self.order {
            for b in graph.neighbours(a).filter(|&b| a < b && is_present(b)) {
                for reg in 0..n_regs {
                    if let (Some(xa), Some(xb)) = (self.var(a, reg), self.var(b, reg)) {
                        let c = lp.add_cst(format!("int_{}_{}_{}", a, b, reg), CstKind::Less, 1.0);
                        lp.set_factor(c, xa, 1.0);
                        lp.set_factor(c, xb, 1.0);
                    }
                }
            }

            for (b, cost) in graph.affinities(a) {
                if cost == 0 {
                    continue;
                }

                if graph.is_ignored(b) {
                    // Constant cost unless `a` takes the ignored node's register.
                    if let Some(x) = graph.register(b).and_then(|r| self.var(a, r)) {
                        let obj = lp.vars()[x].obj;
                        lp.set_obj(x, obj - f64::from(cost));
                    }
                    continue;
                }
                if !(a < b && is_present(b)) {
                    continue;
                }

                let y = lp.add_var(format!("y_{}_{}", a, b), f64::from(cost));
                let differ = graph.register(a) != graph.register(b);
                lp.set_start(y, if differ { 1.0 } else { 0.0 });

                for reg in 0..n_regs {
                    let (xa, xb) = (self.var(a, reg), self.var(b, reg));
                    if xa.is_none() && xb.is_none() {
                        continue;
                    }
                    for (suffix, pos, neg) in [("a", xa, xb), ("b", xb, xa)] {
                        let Some(pos) = pos else { continue };
                        let c = lp.add_cst(format!("aff_{}_{}_{}{}", a, b, reg, suffix), CstKind::Less, 0.0);
                        lp.set_factor(c, pos, 1.0);
                        if let Some(neg) = neg {
                            lp.set_factor(c, neg, -1.0);
                        }
                        lp.set_factor(c, y, -1.0);
                    }
                }
            }
        }

        debug!(
            "{}: {} nodes, {} variables, {} constraints",
            lp.name(),
            self.order.len(),
            lp.vars().len(),
            lp.csts().len()
        );
        Ok(lp)
    }

    fn apply(&mut self, graph: &mut G, _reducer: &SizeReducer<'_>, lp: &Lpp) -> CoalesceResult<()> {
        let state = lp.solution_state();
        if !state.has_solution() {
            warn!("{}: no solution ({}), keeping initial coloring", lp.name(), state);
            return Ok(());
        }

        for &node in &self.order {
            let chosen = self.node_vars[&node].iter().enumerate().find_map(|(reg, &x)| {
                let value = lp.var_value(x?)?;
                (value > 0.5).then_some(reg)
            });
            if let Some(reg) = chosen {
                graph.set_register(node, reg);
            }
        }
        Ok(())
    }
}
