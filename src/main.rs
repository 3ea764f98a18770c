use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tree_duo_matching::parse::load_tree;
use tree_duo_matching::report::{write_outputs, RunReport};
use tree_duo_matching::{
    compute_matrix, Algorithm, MatrixOptions, ScoreNorm, SymmetryPolicy,
};

/// Computes the pairwise duo-preservation similarity of a tree collection and
/// writes the similarity, duration and timeout matrices as CSV.
#[derive(Parser)]
#[command(name = "tree-duo-matching", version, about)]
struct Args {
    /// Directory the report and CSV matrices are written to; must not exist
    output_path: PathBuf,

    /// Tree files, or a single text file listing one tree file per line
    #[arg(required = true)]
    graphs: Vec<PathBuf>,

    /// Matcher to run
    #[arg(long, value_enum, default_value_t = AlgorithmArg::Approx)]
    algorithm: AlgorithmArg,

    /// Time limit in seconds for the exact matcher; 0 means unbounded
    #[arg(long, default_value_t = 0)]
    time_limit: u64,

    /// Divide each score by the larger edge count of its tree pair
    #[arg(long)]
    normalize: bool,

    /// Compute both directions of each pair and keep the better score
    /// (only the approximate matcher can differ between directions)
    #[arg(long)]
    both_directions: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    Approx,
    Exact,
}

impl std::fmt::Display for AlgorithmArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Algorithm::from(*self))
    }
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Algorithm {
        match arg {
            AlgorithmArg::Approx => Algorithm::Approx,
            AlgorithmArg::Exact => Algorithm::Exact,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let inputs = resolve_inputs(&args.graphs)?;
    let mut trees = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let tree =
            load_tree(path).with_context(|| format!("reading tree {}", path.display()))?;
        trees.push(tree);
    }
    let names: Vec<String> = inputs.iter().map(|p| display_name(p)).collect();

    let algorithm = Algorithm::from(args.algorithm);
    let budget = (args.time_limit > 0).then(|| Duration::from_secs(args.time_limit));
    let options = MatrixOptions {
        algorithm,
        budget,
        norm: if args.normalize {
            ScoreNorm::MaxEdges
        } else {
            ScoreNorm::Raw
        },
        policy: if args.both_directions {
            SymmetryPolicy::BothDirections
        } else {
            SymmetryPolicy::Mirror
        },
    };

    info!(
        "computing {n}x{n} similarity matrix with the {algorithm} matcher",
        n = trees.len()
    );
    let started = Instant::now();
    let matrix = compute_matrix(&trees, &options);
    let total = started.elapsed();
    info!("matrix done in {:.3}s", total.as_secs_f64());

    let run = RunReport {
        algorithm,
        budget,
        norm: options.norm,
        both_directions: args.both_directions,
        inputs: &inputs,
        total_duration: total,
    };
    write_outputs(&args.output_path, &matrix, &names, &run)
        .with_context(|| format!("writing results to {}", args.output_path.display()))?;
    info!("results saved to {}", args.output_path.display());
    Ok(())
}

/// A single argument names a list file with one tree path per line; several
/// arguments are the tree files themselves.
fn resolve_inputs(graphs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if graphs.len() == 1 {
        let list = std::fs::read_to_string(&graphs[0])
            .with_context(|| format!("reading tree list {}", graphs[0].display()))?;
        let inputs: Vec<PathBuf> = list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        if inputs.is_empty() {
            bail!("tree list {} is empty", graphs[0].display());
        }
        Ok(inputs)
    } else {
        Ok(graphs.to_vec())
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
