//! In-process branch-and-bound over binary variables.
//!
//! Depth-first search fixing variables in index order. Each constraint keeps
//! the sum of its fixed terms and the least and greatest value its free terms
//! can still add, so fixing a variable only re-checks the constraints it
//! occurs in. Subtrees whose objective bound cannot beat the incumbent are
//! cut. Feasible start values seed the incumbent and decide which branch is
//! tried first.

use std::time::{Duration, Instant};

use log::debug;

use super::lpp::{CstKind, Direction, Lpp, LppSolution, SolutionState};

const EPS: f64 = 1e-9;

/// Iterations between deadline checks.
const CLOCK_INTERVAL: u32 = 1024;

struct SearchState<'a> {
    csts: &'a [(CstKind, f64)],
    occurs: Vec<Vec<(usize, f64)>>,
    obj: Vec<f64>,
    assign: Vec<u8>,
    fixed_sum: Vec<f64>,
    free_min: Vec<f64>,
    free_max: Vec<f64>,
    obj_fixed: f64,
    obj_free_min: f64,
}

impl SearchState<'_> {
    fn cst_feasible(&self, c: usize) -> bool {
        let (kind, rhs) = self.csts[c];
        let lo = self.fixed_sum[c] + self.free_min[c];
        let hi = self.fixed_sum[c] + self.free_max[c];
        match kind {
            CstKind::Less => lo <= rhs + EPS,
            CstKind::Greater => hi >= rhs - EPS,
            CstKind::Equal => lo <= rhs + EPS && hi >= rhs - EPS,
        }
    }

    /// Fix `var` to `val`; returns whether every touched constraint can
    /// still be satisfied.
    fn fix(&mut self, var: usize, val: u8) -> bool {
        let x = f64::from(val);
        self.assign[var] = val;
        self.obj_fixed += self.obj[var] * x;
        self.obj_free_min -= self.obj[var].min(0.0);

        let mut ok = true;
        for i in 0..self.occurs[var].len() {
            let (c, coef) = self.occurs[var][i];
            self.fixed_sum[c] += coef * x;
            self.free_min[c] -= coef.min(0.0);
            self.free_max[c] -= coef.max(0.0);
            ok &= self.cst_feasible(c);
        }
        ok
    }

    fn unfix(&mut self, var: usize) {
        let x = f64::from(self.assign[var]);
        self.obj_fixed -= self.obj[var] * x;
        self.obj_free_min += self.obj[var].min(0.0);

        for &(c, coef) in &self.occurs[var] {
            self.fixed_sum[c] -= coef * x;
            self.free_min[c] += coef.min(0.0);
            self.free_max[c] += coef.max(0.0);
        }
    }

    fn bound(&self) -> f64 {
        self.obj_fixed + self.obj_free_min
    }
}

/// Evaluate a complete assignment; `None` if it violates a constraint.
fn evaluate(lp: &Lpp, obj: &[f64], assign: &[u8]) -> Option<f64> {
    let feasible = lp.csts().iter().all(|cst| {
        let lhs: f64 = cst.terms.iter().map(|&(v, c)| c * f64::from(assign[v])).sum();
        cst.kind.holds(lhs, cst.rhs, EPS)
    });
    feasible.then(|| obj.iter().zip(assign).map(|(c, &x)| c * f64::from(x)).sum())
}

/// Solve `lp` exactly, or as well as its time limit allows.
pub(crate) fn branch_and_bound(lp: &Lpp) -> LppSolution {
    let n = lp.vars().len();
    let sign = match lp.direction() {
        Direction::Minimize => 1.0,
        Direction::Maximize => -1.0,
    };
    let obj: Vec<f64> = lp.vars().iter().map(|v| sign * v.obj).collect();
    let csts: Vec<(CstKind, f64)> = lp.csts().iter().map(|c| (c.kind, c.rhs)).collect();

    let mut occurs = vec![Vec::new(); n];
    let mut free_min = vec![0.0; csts.len()];
    let mut free_max = vec![0.0; csts.len()];
    for (c, cst) in lp.csts().iter().enumerate() {
        for &(var, coef) in &cst.terms {
            occurs[var].push((c, coef));
            free_min[c] += coef.min(0.0);
            free_max[c] += coef.max(0.0);
        }
    }

    let mut st = SearchState {
        csts: &csts,
        occurs,
        obj_free_min: obj.iter().map(|c| c.min(0.0)).sum(),
        obj,
        assign: vec![0; n],
        fixed_sum: vec![0.0; csts.len()],
        free_min,
        free_max,
        obj_fixed: 0.0,
    };

    let preferred: Vec<u8> = lp
        .vars()
        .iter()
        .map(|v| u8::from(v.start.is_some_and(|s| s > 0.5)))
        .collect();

    let mut incumbent: Option<(f64, Vec<u8>)> =
        evaluate(lp, &st.obj, &preferred).map(|value| (value, preferred.clone()));

    let deadline = match lp.time_limit() {
        0 => None,
        secs => Some(Instant::now() + Duration::from_secs(u64::from(secs))),
    };

    let root_feasible = (0..csts.len()).all(|c| st.cst_feasible(c));
    let mut exhausted = !root_feasible;
    let mut stage = vec![0u8; n];
    let mut depth = 0usize;
    let mut ticks = 0u32;

    while root_feasible {
        if depth == n {
            let value = st.obj_fixed;
            if incumbent.as_ref().map_or(true, |(best, _)| value < best - EPS) {
                incumbent = Some((value, st.assign.clone()));
            }
            if depth == 0 {
                exhausted = true;
                break;
            }
            depth -= 1;
            st.unfix(depth);
            continue;
        }

        if stage[depth] == 2 {
            stage[depth] = 0;
            if depth == 0 {
                exhausted = true;
                break;
            }
            depth -= 1;
            st.unfix(depth);
            continue;
        }

        ticks += 1;
        if ticks == CLOCK_INTERVAL {
            ticks = 0;
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
        }

        let val = if stage[depth] == 0 { preferred[depth] } else { 1 - preferred[depth] };
        stage[depth] += 1;

        let feasible = st.fix(depth, val);
        let bound = st.bound();
        if feasible && incumbent.as_ref().map_or(true, |(best, _)| bound < best - EPS) {
            depth += 1;
        } else {
            st.unfix(depth);
        }
    }

    let state = match (exhausted, incumbent.is_some()) {
        (true, true) => SolutionState::Optimal,
        (true, false) => SolutionState::Infeasible,
        (false, true) => SolutionState::Feasible,
        (false, false) => SolutionState::TimeLimitExceeded,
    };
    debug!(
        "{}: {} variables, {} constraints, {}",
        lp.name(),
        n,
        csts.len(),
        state
    );

    LppSolution {
        state,
        values: incumbent
            .map(|(_, assign)| assign.into_iter().map(f64::from).collect())
            .unwrap_or_default(),
    }
}
