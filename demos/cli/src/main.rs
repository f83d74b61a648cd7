use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use formgraph::{state::GraphState, tessellate::Topology};

/// Classifies and tessellates formulas, optionally saving the result
///
/// Commands (formulas, `var`, `param`, `range`, `step`, `help`) are read one
/// per line from the input script, or from stdin if neither a script nor a
/// formula is given.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Script of commands to run
    input: Option<PathBuf>,

    /// Formula to plot, after running the script
    #[clap(short, long)]
    formula: Option<String>,

    /// Domain bounds
    #[clap(
        short,
        long,
        num_args = 2,
        value_names = ["MIN", "MAX"],
        allow_negative_numbers = true
    )]
    range: Option<Vec<f64>>,

    /// Grid step
    #[clap(short, long)]
    step: Option<f64>,

    /// Name of a `.ply` file to write
    #[clap(short, long)]
    out: Option<PathBuf>,
}

/// Runs a single line, printing its result to stdout
fn run(state: &mut GraphState, line: &str) {
    match state.run_line(line) {
        Ok(Some(msg)) => println!("{msg}"),
        Ok(None) => (),
        Err(e) => println!("Error: {e}"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    let mut state = GraphState::new();

    if let Some(r) = &args.range {
        if let [min, max] = r.as_slice() {
            state.set_range(*min, *max)?;
        }
    }
    if let Some(s) = args.step {
        state.set_step(s)?;
    }

    let now = Instant::now();
    if let Some(path) = &args.input {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        for line in file.lines() {
            run(&mut state, &line?);
        }
        info!("Ran script in {:?}", now.elapsed());
    } else if args.formula.is_none() {
        for line in std::io::stdin().lock().lines() {
            run(&mut state, &line?);
        }
    }
    if let Some(f) = &args.formula {
        run(&mut state, f);
    }

    let start = Instant::now();
    if state.geometry().is_empty() {
        warn!("nothing to draw for '{}'", state.source());
    }
    let geometry = state.geometry();
    for t in [Topology::TriangleStrip, Topology::LineStrip, Topology::Points] {
        let runs = geometry.runs().iter().filter(|r| r.topology == t);
        let (n, v) =
            runs.fold((0, 0), |(n, v), r| (n + 1, v + r.vertices.len()));
        if n > 0 {
            info!("{t}: {n} runs, {v} vertices");
        }
    }
    info!("Built geometry in {:?}", start.elapsed());

    if let Some(out) = &args.out {
        let mut file = std::fs::File::create(out)?;
        geometry.write_ply(&mut file)?;
        info!("Wrote {out:?}");
    }
    Ok(())
}
