// This module holds the configuration of a coalescing pass as plain values. Options
// are read once before a pass and never mutated while it runs: the pass receives a
// CoalesceConfig by reference and hands the relevant parts to the size reducer, the
// heuristic adapter and the ILP driver. HeurConfig carries the dump mask (before,
// after, all) and the verbosity forwarded to the external coalescing engine. IlpConfig
// carries the ILP dump mask (ilp, sol), the solve time limit in seconds (0 means
// unlimited, default 60) and whether to solve over the network. BackendOptions names
// the server/solver pair of the remote solve service. Dump masks and the algorithm
// selector parse from the same option strings the command line accepts.

//! Pass configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default ILP time limit in seconds.
pub const DEFAULT_TIME_LIMIT: u32 = 60;

/// Which graphs the heuristic path writes as dot files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpFlags {
    /// Dump the graph handed to the engine before coalescing.
    pub before: bool,
    /// Dump the graph after the engine ran.
    pub after: bool,
}

impl DumpFlags {
    pub const NONE: Self = Self { before: false, after: false };
    pub const ALL: Self = Self { before: true, after: true };
}

impl FromStr for DumpFlags {
    type Err = String;

    /// Parse a comma separated mask of `before`, `after`, `all` and `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::NONE;
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item {
                "before" => flags.before = true,
                "after" => flags.after = true,
                "all" => flags = Self::ALL,
                "none" => flags = Self::NONE,
                other => return Err(format!("unknown dump item '{}'", other)),
            }
        }
        Ok(flags)
    }
}

/// What the ILP path writes to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IlpDumpFlags {
    /// Dump the model in plain text.
    pub ilp: bool,
    /// Dump the solution values.
    pub sol: bool,
}

impl FromStr for IlpDumpFlags {
    type Err = String;

    /// Parse a comma separated mask of `ilp`, `sol` and `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::default();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item {
                "ilp" => flags.ilp = true,
                "sol" => flags.sol = true,
                "none" => flags = Self::default(),
                other => return Err(format!("unknown ilp dump item '{}'", other)),
            }
        }
        Ok(flags)
    }
}

/// Settings of the heuristic path.
#[derive(Debug, Clone, Default)]
pub struct HeurConfig {
    pub dump: DumpFlags,
    /// Verbosity forwarded to the coalescing engine.
    pub debug_level: u32,
}

/// Settings of the ILP path.
#[derive(Debug, Clone)]
pub struct IlpConfig {
    pub dump: IlpDumpFlags,
    /// Solve time limit in seconds, 0 for unlimited.
    pub time_limit: u32,
    /// Route solving to the remote service named in [`BackendOptions`].
    pub solve_over_network: bool,
}

impl Default for IlpConfig {
    fn default() -> Self {
        Self {
            dump: IlpDumpFlags::default(),
            time_limit: DEFAULT_TIME_LIMIT,
            solve_over_network: true,
        }
    }
}

/// Backend wide options shared with the rest of the allocator.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub ilp_server: String,
    pub ilp_solver: String,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            ilp_server: "localhost".to_string(),
            ilp_solver: "cplex".to_string(),
        }
    }
}

/// Coalescing strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoalesceAlgorithm {
    /// Size reduction around the external coalescing engine.
    #[default]
    Heuristic,
    /// Size reduction around an exact ILP formulation.
    Ilp,
}

impl FromStr for CoalesceAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heur" | "heuristic" => Ok(Self::Heuristic),
            "ilp" => Ok(Self::Ilp),
            other => Err(format!("unknown coalescing algorithm '{}'", other)),
        }
    }
}

impl fmt::Display for CoalesceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => write!(f, "heur"),
            Self::Ilp => write!(f, "ilp"),
        }
    }
}

/// Complete configuration of one coalescing pass.
#[derive(Debug, Clone)]
pub struct CoalesceConfig {
    pub algorithm: CoalesceAlgorithm,
    pub heur: HeurConfig,
    pub ilp: IlpConfig,
    pub backend: BackendOptions,
    /// Directory dump files are written to.
    pub dump_dir: PathBuf,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            algorithm: CoalesceAlgorithm::default(),
            heur: HeurConfig::default(),
            ilp: IlpConfig::default(),
            backend: BackendOptions::default(),
            dump_dir: PathBuf::from("."),
        }
    }
}

/// Dump file path `{dir}/{procedure}-{class}{suffix}`.
pub fn dump_path(dir: &Path, procedure: &str, class: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}-{}{}", procedure, class, suffix))
}
