//! Thin CLI wiring: load a dataset, fit the metric, solve the MDP,
//! simulate, archive. The core algorithms have no CLI surface of their
//! own; this binary is the thin driver that wraps around them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edge_algo::mdp::mdp;
use edge_algo::metric_fit::fit_metric;
use edge_algo::simulate::{mcsimulate, simulate};
use edge_batch::sweep::load_sweep_config;
use edge_batch::{run_batch, BatchRunnerConfig, ParamJob};
use edge_core::bucket::getqpm;
use edge_core::rng::SeededIndexSource;
use edge_io::artifacts::{read_artifact, write_artifact};
use edge_io::dataset::{build_training_data, CsvDatasetLoader, DatasetLoader};
use edge_io::CostKind;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "edge-cli", about = "Edge offloading policy toolkit driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a metric map for one held-out fold and archive it.
    Fit {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        fold: u32,
        #[arg(long, value_enum)]
        cost: CostArg,
        #[arg(long)]
        out: PathBuf,
    },
    /// Solve the MDP policy for one held-out fold and archive it.
    Solve {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        fold: u32,
        #[arg(long, value_enum)]
        cost: CostArg,
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        depth: f64,
        #[arg(long, default_value_t = 100)]
        maxp: u64,
        #[arg(long, default_value_t = 0.9999)]
        discount: f64,
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,
        #[arg(long, default_value_t = 10_000)]
        maxiter: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Simulate an archived policy against one held-out fold.
    Simulate {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        fold: u32,
        #[arg(long, value_enum)]
        cost: CostArg,
        #[arg(long)]
        policy: PathBuf,
        #[arg(long, default_value_t = 10_000)]
        timesteps: usize,
        #[arg(long, default_value_t = 1)]
        replicas: usize,
        #[arg(long)]
        ncam: Option<usize>,
        /// Shared outer-bucket rate (multi-camera mode only; defaults to the policy's own rate).
        #[arg(long)]
        outer_rate: Option<f64>,
        /// Shared outer-bucket depth (multi-camera mode only; defaults to the policy's own depth).
        #[arg(long)]
        outer_depth: Option<f64>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Archive the simulation stats as a bincode artifact in addition to printing JSON.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a parameter-grid sweep across a rayon thread pool.
    Sweep {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        sweep_config: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CostArg {
    Top1Error,
    Top5Error,
    Rank,
}

impl From<CostArg> for CostKind {
    fn from(arg: CostArg) -> Self {
        match arg {
            CostArg::Top1Error => CostKind::Top1Error,
            CostArg::Top5Error => CostKind::Top5Error,
            CostArg::Rank => CostKind::Rank,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fit { dataset, fold, cost, out } => run_fit(dataset, fold, cost.into(), out),
        Commands::Solve {
            dataset,
            fold,
            cost,
            rate,
            depth,
            maxp,
            discount,
            tol,
            maxiter,
            out,
        } => run_solve(dataset, fold, cost.into(), rate, depth, maxp, discount, tol, maxiter, out),
        Commands::Simulate {
            dataset,
            fold,
            cost,
            policy,
            timesteps,
            replicas,
            ncam,
            outer_rate,
            outer_depth,
            seed,
            out,
        } => run_simulate(
            dataset, fold, cost.into(), policy, timesteps, replicas, ncam, outer_rate, outer_depth, seed, out,
        ),
        Commands::Sweep { dataset, sweep_config, out_dir, threads } => {
            run_sweep(dataset, sweep_config, out_dir, threads)
        }
    }
}

fn run_fit(dataset: PathBuf, fold: u32, cost: CostKind, out: PathBuf) -> Result<()> {
    let raw = CsvDatasetLoader::new(&dataset).load()?;
    let (train, _test) = build_training_data(&raw, fold, cost)?;
    let outcome = fit_metric(&train.metrics, &train.rewards)?;
    if outcome.degenerate {
        tracing::warn!(fold, "metric fit degenerate, archiving constant map");
    }
    write_artifact(&out, &outcome.map)?;
    info!(out = %out.display(), "wrote metric-fit bundle");
    Ok(())
}

fn run_solve(
    dataset: PathBuf,
    fold: u32,
    cost: CostKind,
    rate: f64,
    depth: f64,
    maxp: u64,
    discount: f64,
    tol: f64,
    maxiter: usize,
    out: PathBuf,
) -> Result<()> {
    let raw = CsvDatasetLoader::new(&dataset).load()?;
    let (train, _test) = build_training_data(&raw, fold, cost)?;
    let outcome = mdp(&train.metrics, &train.rewards, rate, depth, maxp, discount, tol, maxiter)
        .context("solving MDP policy")?;
    if let Some(warning) = &outcome.warning {
        tracing::warn!(fold, iterations = outcome.iterations, %warning, "MDP did not converge");
    }
    write_artifact(&out, &outcome.policy)?;
    info!(out = %out.display(), "wrote policy");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    dataset: PathBuf,
    fold: u32,
    cost: CostKind,
    policy_path: PathBuf,
    timesteps: usize,
    replicas: usize,
    ncam: Option<usize>,
    outer_rate: Option<f64>,
    outer_depth: Option<f64>,
    seed: u64,
    out: Option<PathBuf>,
) -> Result<()> {
    let raw = CsvDatasetLoader::new(&dataset).load()?;
    let (_train, test) = build_training_data(&raw, fold, cost)?;
    let policy: edge_algo::mdp::Policy = read_artifact(&policy_path)?;
    let mut rng = SeededIndexSource::new(seed);

    match ncam {
        None | Some(0) | Some(1) => {
            let result = simulate(&policy, &test.metrics, &test.rewards, timesteps, replicas, &mut rng)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(out) = out {
                write_artifact(&out, &result)?;
                info!(out = %out.display(), "wrote simulation stats");
            }
        }
        Some(ncam) => {
            let inner_rate = policy.bucket.q as f64 / policy.bucket.p as f64;
            let inner_depth = policy.bucket.m as f64 / policy.bucket.p as f64;
            let outer = getqpm(
                outer_rate.unwrap_or(inner_rate),
                outer_depth.unwrap_or(inner_depth),
                100,
            )?;
            let result =
                mcsimulate(&policy, outer, ncam, &test.metrics, &test.rewards, timesteps, replicas, &mut rng)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(out) = out {
                write_artifact(&out, &result)?;
                info!(out = %out.display(), "wrote simulation stats");
            }
        }
    }
    Ok(())
}

fn run_sweep(dataset: PathBuf, sweep_config: PathBuf, out_dir: PathBuf, threads: usize) -> Result<()> {
    let raw = CsvDatasetLoader::new(&dataset).load()?;
    let config_text = std::fs::read_to_string(&sweep_config)
        .with_context(|| format!("reading sweep config '{}'", sweep_config.display()))?;
    let sweep = load_sweep_config(&config_text)?;
    let jobs: Vec<ParamJob> = sweep.jobs();

    let runner_config = BatchRunnerConfig {
        jobs,
        output_root: out_dir,
        maxp: 100,
        discount: 0.9999,
        tol: 1e-6,
        maxiter: 10_000,
        timesteps: 10_000,
        replicas: 4,
        threads,
    };

    let summary = run_batch(&runner_config, &raw)?;
    info!(
        success = summary.success,
        failure = summary.failure,
        manifest = %summary.manifest_path.display(),
        "sweep complete"
    );
    Ok(())
}
