//! Copy coalescing driver binary.
//!
//! Reads a colored graph in the textual test-graph format, coalesces it and
//! prints the resulting graph followed by the session statistics. ILP
//! models are solved in process.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use bumpalo::Bump;
use clap::Parser;
use log::error;

use regcoal::core::config::{CoalesceAlgorithm, CoalesceConfig, DumpFlags, IlpDumpFlags};
use regcoal::core::graph::verify_coloring;
use regcoal::core::session::CoalesceSession;
use regcoal::copy_opt::co_solve;
use regcoal::test_graph::TestGraph;

#[derive(Parser)]
#[command(name = "regcoal")]
#[command(about = "Copy coalescing of a colored interference graph", long_about = None)]
struct Cli {
    /// Graph file, stdin if omitted
    input: Option<PathBuf>,

    /// Coalescing algorithm (heur, ilp)
    #[arg(short, long, default_value = "heur")]
    algorithm: CoalesceAlgorithm,

    /// Heuristic dot dumps (comma-separated: before,after,all,none)
    #[arg(long, default_value = "none")]
    dump: DumpFlags,

    /// ILP dumps (comma-separated: ilp,sol,none)
    #[arg(long, default_value = "none")]
    ilp_dump: IlpDumpFlags,

    /// Verbosity of the coalescing engine
    #[arg(long, default_value_t = 0)]
    debug_level: u32,

    /// ILP time limit in seconds, 0 for unlimited
    #[arg(long, default_value_t = regcoal::core::config::DEFAULT_TIME_LIMIT)]
    time_limit: u32,

    /// Directory dump files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    dump_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let text = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut config = CoalesceConfig {
        algorithm: cli.algorithm,
        dump_dir: cli.dump_dir,
        ..CoalesceConfig::default()
    };
    config.heur.dump = cli.dump;
    config.heur.debug_level = cli.debug_level;
    config.ilp.dump = cli.ilp_dump;
    config.ilp.time_limit = cli.time_limit;
    // No solve service is linked into this tool.
    config.ilp.solve_over_network = false;

    let mut graph = TestGraph::parse(&text)?;
    let arena = Bump::new();
    let session = CoalesceSession::new(&arena);

    let outcome = co_solve(&session, &mut graph, &config)?;

    let violations = verify_coloring(&graph);
    for v in &violations {
        error!("invalid coloring: {:?}", v);
    }

    print!("{}", graph);
    println!();
    print!("{}", session.stats());
    if let Some(state) = outcome.solution {
        println!("ILP solution: {}", state);
    }

    if !violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
