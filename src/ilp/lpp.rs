// This module defines the linear-program handle the ILP driver works with. The
// LinearProgram trait is the contract: set a time limit, solve through a remote
// service named by a server/solver pair or in process, dump the model in plain text,
// dump the solution and report the terminal solution state. Lpp is the in-tree model
// implementing it: named binary variables with objective coefficients and optional
// start values, named equality and inequality constraints, and an optimization
// direction. Remote solving hands the model to an attached SolveService; local solving
// runs the branch-and-bound solver when the crate is built with the local-solver
// feature and is a configuration error otherwise. Solution states are passed through
// to the caller untouched.

//! Linear-program handles.

use std::fmt;
use std::io::{self, Write};

use crate::core::error::{CoalesceError, CoalesceResult};

/// Index of a variable in an [`Lpp`].
pub type VarIdx = usize;

/// Index of a constraint in an [`Lpp`].
pub type CstIdx = usize;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionState {
    /// Not solved yet, or the solver gave no verdict.
    Unknown,
    /// Proven to have no solution.
    Infeasible,
    /// Time ran out before any solution was found.
    TimeLimitExceeded,
    /// A solution exists but was not proven optimal.
    Feasible,
    Optimal,
}

impl SolutionState {
    /// Whether variable values are available.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Feasible | Self::Optimal)
    }
}

impl fmt::Display for SolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Infeasible => "infeasible",
            Self::TimeLimitExceeded => "time limit exceeded",
            Self::Feasible => "feasible",
            Self::Optimal => "optimal",
        };
        f.write_str(s)
    }
}

/// Abstract linear-program handle driven by [`super::IlpDriver`].
pub trait LinearProgram {
    /// Limit solving to `seconds`, 0 meaning unlimited.
    fn set_time_limit(&mut self, seconds: u32);

    /// Solve on the remote service `solver` at `server`.
    fn solve_remote(&mut self, server: &str, solver: &str) -> CoalesceResult<()>;

    /// Solve in process.
    fn solve_local(&mut self) -> CoalesceResult<()> {
        Err(CoalesceError::LocalSolverUnavailable)
    }

    /// Write the model in plain text.
    fn dump_plain(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Write the variable values of the solution.
    fn dump_solution(&self, out: &mut dyn Write) -> io::Result<()>;

    fn solution_state(&self) -> SolutionState;
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// Constraint relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CstKind {
    Equal,
    Less,
    Greater,
}

impl CstKind {
    fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Less => "<=",
            Self::Greater => ">=",
        }
    }

    /// Whether `lhs` relates to `rhs` as required, within `eps`.
    pub fn holds(self, lhs: f64, rhs: f64, eps: f64) -> bool {
        match self {
            Self::Equal => (lhs - rhs).abs() <= eps,
            Self::Less => lhs <= rhs + eps,
            Self::Greater => lhs >= rhs - eps,
        }
    }
}

/// A binary variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LppVar {
    pub name: String,
    /// Objective coefficient.
    pub obj: f64,
    /// Start value handed to the solver.
    pub start: Option<f64>,
    /// Value in the current solution.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LppCst {
    pub name: String,
    pub kind: CstKind,
    pub rhs: f64,
    pub terms: Vec<(VarIdx, f64)>,
}

/// Variable values and state returned by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct LppSolution {
    pub state: SolutionState,
    /// One value per variable; empty if there is no solution.
    pub values: Vec<f64>,
}

/// Service solving models away from this process, usually over the network.
pub trait SolveService {
    fn solve(&mut self, server: &str, solver: &str, lp: &Lpp) -> Result<LppSolution, String>;
}

/// A 0/1 linear program.
pub struct Lpp {
    name: String,
    direction: Direction,
    vars: Vec<LppVar>,
    csts: Vec<LppCst>,
    time_limit: u32,
    state: SolutionState,
    service: Option<Box<dyn SolveService>>,
}

impl Lpp {
    pub fn new<S: Into<String>>(name: S, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            vars: Vec::new(),
            csts: Vec::new(),
            time_limit: 0,
            state: SolutionState::Unknown,
            service: None,
        }
    }

    /// Attach the service used by [`LinearProgram::solve_remote`].
    pub fn set_service(&mut self, service: Box<dyn SolveService>) {
        self.service = Some(service);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn add_var<S: Into<String>>(&mut self, name: S, obj: f64) -> VarIdx {
        self.vars.push(LppVar {
            name: name.into(),
            obj,
            start: None,
            value: None,
        });
        self.vars.len() - 1
    }

    pub fn set_start(&mut self, var: VarIdx, value: f64) {
        self.vars[var].start = Some(value);
    }

    pub fn set_obj(&mut self, var: VarIdx, obj: f64) {
        self.vars[var].obj = obj;
    }

    pub fn add_cst<S: Into<String>>(&mut self, name: S, kind: CstKind, rhs: f64) -> CstIdx {
        self.csts.push(LppCst {
            name: name.into(),
            kind,
            rhs,
            terms: Vec::new(),
        });
        self.csts.len() - 1
    }

    /// Set the coefficient of `var` in `cst`.
    pub fn set_factor(&mut self, cst: CstIdx, var: VarIdx, coef: f64) {
        let terms = &mut self.csts[cst].terms;
        match terms.iter_mut().find(|(v, _)| *v == var) {
            Some((_, c)) => *c = coef,
            None => terms.push((var, coef)),
        }
    }

    pub fn vars(&self) -> &[LppVar] {
        &self.vars
    }

    pub fn csts(&self) -> &[LppCst] {
        &self.csts
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    /// Value of `var` in the current solution.
    pub fn var_value(&self, var: VarIdx) -> Option<f64> {
        self.vars.get(var).and_then(|v| v.value)
    }

    /// Objective value of the current solution.
    pub fn objective_value(&self) -> Option<f64> {
        if !self.state.has_solution() {
            return None;
        }
        self.vars
            .iter()
            .map(|v| v.value.map(|x| x * v.obj))
            .sum()
    }

    /// Store a solver result.
    pub fn set_solution(&mut self, sol: LppSolution) {
        self.state = sol.state;
        let has_values = sol.state.has_solution() && sol.values.len() == self.vars.len();
        for (i, var) in self.vars.iter_mut().enumerate() {
            var.value = if has_values { Some(sol.values[i]) } else { None };
        }
    }
}

impl LinearProgram for Lpp {
    fn set_time_limit(&mut self, seconds: u32) {
        self.time_limit = seconds;
    }

    fn solve_remote(&mut self, server: &str, solver: &str) -> CoalesceResult<()> {
        let remote_err = |reason: String| CoalesceError::RemoteSolve {
            server: server.to_string(),
            solver: solver.to_string(),
            reason,
        };

        let mut service = self
            .service
            .take()
            .ok_or_else(|| remote_err("no solve service attached".to_string()))?;
        let result = service.solve(server, solver, self);
        self.service = Some(service);

        self.set_solution(result.map_err(remote_err)?);
        Ok(())
    }

    #[cfg(feature = "local-solver")]
    fn solve_local(&mut self) -> CoalesceResult<()> {
        let sol = super::solver::branch_and_bound(self);
        self.set_solution(sol);
        Ok(())
    }

    fn dump_plain(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Name: {}", self.name)?;
        match self.direction {
            Direction::Minimize => writeln!(out, "Minimize")?,
            Direction::Maximize => writeln!(out, "Maximize")?,
        }

        write!(out, "  obj:")?;
        for var in self.vars.iter().filter(|v| v.obj != 0.0) {
            write!(out, " {:+} {}", var.obj, var.name)?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for cst in &self.csts {
            write!(out, "  {}:", cst.name)?;
            for &(var, coef) in &cst.terms {
                write!(out, " {:+} {}", coef, self.vars[var].name)?;
            }
            writeln!(out, " {} {}", cst.kind.symbol(), cst.rhs)?;
        }

        writeln!(out, "Binary")?;
        for var in &self.vars {
            writeln!(out, "  {}", var.name)?;
        }
        writeln!(out, "End")
    }

    fn dump_solution(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "State: {}", self.state)?;
        if let Some(obj) = self.objective_value() {
            writeln!(out, "Objective: {}", obj)?;
        }
        for var in &self.vars {
            if let Some(value) = var.value {
                writeln!(out, "{} = {}", var.name, value)?;
            }
        }
        Ok(())
    }

    fn solution_state(&self) -> SolutionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl SolveService for Echo {
        fn solve(&mut self, server: &str, solver: &str, lp: &Lpp) -> Result<LppSolution, String> {
            if server != "ilp.example" || solver != "cbc" {
                return Err(format!("unknown {}@{}", solver, server));
            }
            Ok(LppSolution {
                state: SolutionState::Feasible,
                values: lp.vars().iter().map(|v| v.start.unwrap_or(0.0)).collect(),
            })
        }
    }

    fn tiny() -> Lpp {
        let mut lp = Lpp::new("tiny", Direction::Minimize);
        let x = lp.add_var("x", 2.0);
        let y = lp.add_var("y", 3.0);
        let c = lp.add_cst("cover", CstKind::Greater, 1.0);
        lp.set_factor(c, x, 1.0);
        lp.set_factor(c, y, 1.0);
        lp.set_start(y, 1.0);
        lp
    }

    #[test]
    fn test_dump_plain() {
        let lp = tiny();
        let mut out = Vec::new();
        lp.dump_plain(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Name: tiny\nMinimize\n"));
        assert!(text.contains("obj: +2 x +3 y"));
        assert!(text.contains("cover: +1 x +1 y >= 1"));
        assert!(text.ends_with("End\n"));
    }

    #[test]
    fn test_remote_without_service() {
        let mut lp = tiny();
        let err = lp.solve_remote("ilp.example", "cbc").unwrap_err();
        assert!(matches!(err, CoalesceError::RemoteSolve { .. }));
        assert_eq!(lp.solution_state(), SolutionState::Unknown);
    }

    #[test]
    fn test_remote_with_service() {
        let mut lp = tiny();
        lp.set_service(Box::new(Echo));
        lp.solve_remote("ilp.example", "cbc").unwrap();

        assert_eq!(lp.solution_state(), SolutionState::Feasible);
        assert_eq!(lp.var_value(0), Some(0.0));
        assert_eq!(lp.var_value(1), Some(1.0));
        assert_eq!(lp.objective_value(), Some(3.0));

        assert!(lp.solve_remote("elsewhere", "cbc").is_err());
    }

    #[test]
    fn test_cst_kind_holds() {
        assert!(CstKind::Equal.holds(1.0, 1.0, 1e-9));
        assert!(!CstKind::Equal.holds(0.0, 1.0, 1e-9));
        assert!(CstKind::Less.holds(0.0, 1.0, 1e-9));
        assert!(CstKind::Greater.holds(2.0, 1.0, 1e-9));
        assert!(!CstKind::Greater.holds(0.0, 1.0, 1e-9));
    }
}
