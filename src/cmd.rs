//! Command line interface

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use axprune::driver::{Driver, FailurePolicy, LogObserver, Method, PruneConfig, PruneEvent};
use axprune::driver::{PruneObserver, StopReason};
use axprune::io::{read_network_file, write_network_file};
use axprune::netlist::stats::stats;
use axprune::prune::{by_significance, find_cuts, label_circuit, rank_by_activity};
use axprune::sim::{annotate_activity, Dataset, Metric, SimulationEvaluator};
use axprune::{ConfigError, Netlist};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use kdam::{tqdm, Bar, BarExt};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v for decisions, -vv for search details)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a netlist
    ///
    /// Will print statistics on the number of inputs, outputs and cells in the netlist.
    #[clap()]
    Show(ShowArgs),

    /// Rank the nodes of a netlist by expendability
    ///
    /// Nodes are ranked by increasing significance, or by how often they hold the same value.
    #[clap()]
    Rank(RankArgs),

    /// Find closed cuts of low significance
    #[clap()]
    Cuts(CutsArgs),

    /// Prune a netlist within an error bound
    ///
    /// Candidates proposed by the chosen method are removed one at a time, and kept only if the
    /// error measured by simulation stays within the threshold.
    #[clap()]
    Prune(PruneArgs),
}

/// Initialize logging from the verbosity count; RUST_LOG takes precedence
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read(path: &Path) -> anyhow::Result<Netlist> {
    read_network_file(path).with_context(|| format!("Could not read {}", path.display()))
}

/// Make a dataset for simulation
fn make_dataset(
    netlist: &Netlist,
    patterns: usize,
    seed: u64,
    exhaustive: bool,
) -> anyhow::Result<Dataset> {
    if exhaustive {
        match Dataset::exhaustive(netlist.nb_inputs()) {
            Some(d) => return Ok(d),
            None => bail!(
                "Too many inputs ({}) for exhaustive simulation",
                netlist.nb_inputs()
            ),
        }
    }
    if patterns == 0 {
        return Err(ConfigError::ZeroPatterns.into());
    }
    Ok(Dataset::random(netlist.nb_inputs(), patterns, seed))
}

/// Command arguments for netlist informations
#[derive(Args)]
pub struct ShowArgs {
    /// Netlist to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let netlist = read(&self.file)?;
        println!("Netlist stats:\n{}\n\n", stats(&netlist));
        Ok(())
    }
}

/// Criterion for node ranking
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RankBy {
    /// Increasing significance
    Significance,
    /// Decreasing time spent at the majority value
    Activity,
}

/// Command arguments for node ranking
#[derive(Args)]
pub struct RankArgs {
    /// Netlist to analyze
    file: PathBuf,

    /// Ranking criterion
    #[arg(long, value_enum, default_value_t = RankBy::Significance)]
    by: RankBy,

    /// Significance of each primary output; powers of 2 by default
    #[arg(long, value_delimiter = ',')]
    significances: Option<Vec<f64>>,

    /// Number of nodes to show
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Number of random patterns for activity
    #[arg(long, default_value_t = 10000)]
    patterns: usize,

    /// Seed for random patterns
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl RankArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut netlist = read(&self.file)?;
        let count = self.count.unwrap_or(usize::MAX);
        match self.by {
            RankBy::Significance => {
                label_circuit(&mut netlist, self.significances.as_deref(), true)?;
                for (n, s) in by_significance(&netlist)?.iter().take(count) {
                    println!("{}\t{}\t{}", netlist.var(*n), netlist.node(*n).cell(), s);
                }
            }
            RankBy::Activity => {
                let dataset = make_dataset(&netlist, self.patterns, self.seed, false)?;
                annotate_activity(&mut netlist, &dataset)?;
                for c in rank_by_activity(&netlist).iter().take(count) {
                    println!(
                        "{}\t{}\t{}%",
                        netlist.var(c.node),
                        u8::from(c.value),
                        c.percent
                    );
                }
            }
        }
        Ok(())
    }
}

/// Command arguments for cut carving
#[derive(Args)]
pub struct CutsArgs {
    /// Netlist to analyze
    file: PathBuf,

    /// Difference threshold of the cuts
    #[arg(short = 't', long)]
    threshold: f64,

    /// Maximum number of expansion rounds per cut; 0 for unbounded
    #[arg(long, default_value_t = 0)]
    harshness: usize,

    /// Significance of each primary output; powers of 2 by default
    #[arg(long, value_delimiter = ',')]
    significances: Option<Vec<f64>>,
}

impl CutsArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut netlist = read(&self.file)?;
        label_circuit(&mut netlist, self.significances.as_deref(), true)?;
        let cuts = find_cuts(&netlist, self.threshold, self.harshness)?;
        println!("{} cuts found", cuts.len());
        for (i, cut) in cuts.iter().enumerate() {
            let vars: Vec<&str> = cut.nodes().iter().map(|n| netlist.var(*n)).collect();
            println!(
                "Cut {}: {} nodes, difference {}: {}",
                i,
                cut.size(),
                cut.difference(),
                vars.join(" ")
            );
        }
        Ok(())
    }
}

/// Progress bar over the evaluations of a pruning run
struct ProgressObserver {
    progress: Bar,
}

impl ProgressObserver {
    fn new(total: usize) -> ProgressObserver {
        let mut progress = tqdm!(total = total);
        progress.set_description("Candidates evaluated");
        ProgressObserver { progress }
    }

    fn step(&mut self, netlist: &Netlist, error: Option<f64>) {
        if let Some(e) = error {
            self.progress
                .set_postfix(format!("deleted={}, error={}", netlist.nb_deleted(), e));
        }
        self.progress.update(1).ok();
    }
}

impl PruneObserver for ProgressObserver {
    fn on_event(&mut self, netlist: &Netlist, event: &PruneEvent) {
        match event {
            PruneEvent::Committed { error, .. } => self.step(netlist, Some(*error)),
            PruneEvent::RolledBack { .. } | PruneEvent::EvaluationFailed { .. } => {
                self.step(netlist, None)
            }
            PruneEvent::Finished { .. } => {
                self.progress.refresh().ok();
                eprintln!();
            }
            _ => (),
        }
    }
}

/// Command arguments for pruning
#[derive(Args)]
pub struct PruneArgs {
    /// Netlist to prune
    network: PathBuf,

    /// Output file for the pruned netlist (.bench or .v)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Pruning method
    #[arg(short = 'm', long, value_enum, default_value_t = Method::ConstantInputs)]
    method: Method,

    /// Largest acceptable error
    #[arg(short = 'e', long)]
    max_error: f64,

    /// Error metric
    #[arg(long, value_enum, default_value_t = Metric::Med)]
    metric: Metric,

    /// Number of random patterns used to measure the error
    #[arg(long, default_value_t = 10000)]
    patterns: usize,

    /// Simulate every input combination instead of random patterns
    #[arg(long)]
    exhaustive: bool,

    /// Seed for random patterns
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Maximum number of evaluations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Maximum number of bits explored by inconst and outconst
    #[arg(long)]
    max_bits: Option<usize>,

    /// Number of candidates evaluated in parallel
    #[arg(short = 'j', long, default_value_t = 1)]
    jobs: usize,

    /// Maximum number of expansion rounds per cut; 0 for unbounded
    #[arg(long, default_value_t = 0)]
    harshness: usize,

    /// Difference threshold for cut carving; the error threshold by default
    #[arg(long)]
    diff_threshold: Option<f64>,

    /// What to do when a candidate cannot be evaluated
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    on_failure: FailurePolicy,

    /// Significance of each primary output; powers of 2 by default
    #[arg(long, value_delimiter = ',')]
    significances: Option<Vec<f64>>,

    /// Hide the progress bar
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl PruneArgs {
    fn config(&self) -> PruneConfig {
        PruneConfig {
            method: self.method,
            max_error: self.max_error,
            max_iterations: self.max_iterations,
            max_bits: self.max_bits,
            jobs: self.jobs,
            harshness: self.harshness,
            diff_threshold: self.diff_threshold,
            on_failure: self.on_failure,
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let mut netlist = read(&self.network)?;
        let config = self.config();
        config.validate()?;
        let dataset = make_dataset(&netlist, self.patterns, self.seed, self.exhaustive)?;
        if let Some(s) = &self.significances {
            label_circuit(&mut netlist, Some(s.as_slice()), true)?;
        }
        if self.method == Method::Probabilistic {
            annotate_activity(&mut netlist, &dataset)?;
        }
        let evaluator = SimulationEvaluator::new(&netlist, dataset, self.metric)?;

        let mut driver = Driver::new(config, &evaluator);
        driver.add_observer(Box::new(LogObserver));
        if !self.quiet {
            let total = self.max_iterations.unwrap_or(0);
            driver.add_observer(Box::new(ProgressObserver::new(total)));
        }
        let outcome = driver.run(&netlist)?;

        println!("Before:\n{}\n", stats(&netlist));
        println!("After:\n{}\n", stats(&outcome.netlist));
        println!(
            "{} nodes removed with {} {} after {} evaluations: {}",
            outcome.committed.len(),
            self.metric,
            outcome.error,
            outcome.evaluations,
            outcome.stop
        );
        if let Some(output) = &self.output {
            write_network_file(output, &outcome.netlist)
                .with_context(|| format!("Could not write {}", output.display()))?;
        }
        if let StopReason::EvaluationFailed(e) = outcome.stop {
            bail!("Pruning aborted: {}", e);
        }
        Ok(())
    }
}
