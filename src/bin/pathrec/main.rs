//! Binary entry point for the pathrec command-line driver.
#![forbid(unsafe_code)]

mod ui;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pathrec::config::RunConfig;
use pathrec::dataset::{self, RatingsFormat};
use pathrec::eval::{Experiment, ExperimentReport};
use pathrec::graph::{Graph, GraphOptions, NormKind};
use pathrec::neighbours::{detect_neighbours, CandidateWeighting};
use pathrec::scoring::{ScoringStrategy, StrategyKind};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "pathrec",
    version,
    about = "Graph-walk item recommender",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "PATHREC_CONFIG",
        help = "Run configuration (TOML); defaults to <config dir>/pathrec/config.toml"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Theme::Auto,
        help = "Colour theme for text output"
    )]
    theme: Theme,

    #[arg(short, long, global = true, help = "Suppress progress output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct PrepareCmd {
    #[arg(long, value_name = "CSV", help = "Semicolon-separated ratings file")]
    ratings: PathBuf,

    #[arg(long, value_name = "JSON", help = "Where to write the prepared dataset")]
    out: PathBuf,

    #[arg(long, help = "Rename users and items to user_NNNN / item_NNNN")]
    anonymize: bool,

    #[arg(long, help = "Skip rows that cannot be parsed instead of failing")]
    skip_malformed: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, value_name = "JSON", help = "Prepared dataset")]
    dataset: PathBuf,

    #[arg(long, help = "Scoring strategy (baseline, normalized, neighbours)")]
    strategy: Option<StrategyKind>,

    #[arg(long, value_name = "K", help = "Recommendation list length")]
    top_k: Option<usize>,

    #[arg(
        long,
        value_enum,
        default_value_t = WeightMode::Unit,
        help = "Insert every interaction with weight 1.0, or with its rating weight"
    )]
    weight_mode: WeightMode,

    #[arg(long, value_enum, help = "Norm formula")]
    norm: Option<NormArg>,

    #[arg(long, value_enum, help = "Candidate preselection weighting")]
    weighting: Option<WeightingArg>,

    #[arg(long, help = "Maximum candidates scored per user")]
    candidate_limit: Option<usize>,

    #[arg(long, help = "Maximum neighbours kept per user")]
    neighbour_limit: Option<usize>,

    #[arg(long, help = "Detect neighbours on all cores")]
    parallel: bool,
}

#[derive(Args, Debug)]
struct EvaluateCmd {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long, help = "Share of interactions held out for testing")]
    test_fraction: Option<f64>,

    #[arg(long, help = "Shuffle seed for the train/test split")]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RecommendCmd {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long, value_name = "ID", help = "User to recommend for")]
    user: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Convert a ratings CSV into a JSON dataset")]
    Prepare(PrepareCmd),

    #[command(about = "Split a dataset, train, and measure recall")]
    Evaluate(EvaluateCmd),

    #[command(about = "Print recommendations for one user")]
    Recommend(RecommendCmd),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum WeightMode {
    Unit,
    Rating,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum NormArg {
    Euclidean,
    #[value(name = "self-power")]
    SelfPower,
}

impl From<NormArg> for NormKind {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::Euclidean => NormKind::Euclidean,
            NormArg::SelfPower => NormKind::SelfPower,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum WeightingArg {
    #[value(name = "shared-items")]
    SharedItems,
    #[value(name = "inverse-norm")]
    InverseNorm,
}

impl From<WeightingArg> for CandidateWeighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::SharedItems => CandidateWeighting::SharedItems,
            WeightingArg::InverseNorm => CandidateWeighting::InverseNorm,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    install_tracing_subscriber(cli.quiet);
    let ui = Ui::new(cli.theme, cli.quiet || cli.format == OutputFormat::Json);

    match cli.command {
        Command::Prepare(cmd) => run_prepare(&cmd, cli.format, &ui)?,
        Command::Evaluate(cmd) => {
            let mut config = RunConfig::load(cli.config.as_deref())?;
            apply_run_overrides(&mut config, &cmd.run);
            if let Some(fraction) = cmd.test_fraction {
                config.evaluation.test_fraction = fraction;
            }
            if let Some(seed) = cmd.seed {
                config.evaluation.seed = seed;
            }
            config.validate()?;
            run_evaluate(&cmd, config, cli.format, &ui)?;
        }
        Command::Recommend(cmd) => {
            let mut config = RunConfig::load(cli.config.as_deref())?;
            apply_run_overrides(&mut config, &cmd.run);
            config.validate()?;
            run_recommend(&cmd, &config, cli.format, &ui)?;
        }
    }

    Ok(())
}

fn install_tracing_subscriber(quiet: bool) {
    let fallback = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn apply_run_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(strategy) = args.strategy {
        config.scoring.strategy = strategy;
    }
    if let Some(top_k) = args.top_k {
        config.scoring.top_k = top_k;
    }
    if let Some(norm) = args.norm {
        config.graph.norm_kind = norm.into();
    }
    if let Some(weighting) = args.weighting {
        config.neighbours.weighting = weighting.into();
    }
    if let Some(limit) = args.candidate_limit {
        config.neighbours.candidate_limit = limit;
    }
    if let Some(limit) = args.neighbour_limit {
        config.neighbours.neighbour_limit = limit;
    }
    if args.parallel {
        config.neighbours.parallel = true;
    }
}

#[derive(Debug, Serialize)]
struct PrepareReport {
    out: PathBuf,
    rows: u64,
    interactions: usize,
    zero_ratings: u64,
    malformed: u64,
    anonymized: bool,
    duration_ms: u64,
}

fn run_prepare(cmd: &PrepareCmd, format: OutputFormat, ui: &Ui) -> Result<(), Box<dyn Error>> {
    let task = ui.task(format!("Reading {}", cmd.ratings.display()));
    let ratings_format = RatingsFormat {
        skip_malformed: cmd.skip_malformed,
        ..RatingsFormat::default()
    };
    let (mut interactions, stats) = dataset::load_ratings_csv(&cmd.ratings, &ratings_format)?;
    if cmd.anonymize {
        interactions = dataset::anonymize(&interactions);
    }
    dataset::save_json(&cmd.out, &interactions)?;
    let elapsed = task.finish();

    let report = PrepareReport {
        out: cmd.out.clone(),
        rows: stats.rows,
        interactions: interactions.len(),
        zero_ratings: stats.zero_ratings,
        malformed: stats.malformed,
        anonymized: cmd.anonymize,
        duration_ms: elapsed.as_millis() as u64,
    };
    emit(format, &report, || {
        ui.success(&format!(
            "Wrote {} interactions to {} in {}",
            report.interactions,
            report.out.display(),
            format_duration(elapsed)
        ));
        ui.section(
            "Ratings",
            [
                ("rows", report.rows),
                ("kept", report.interactions as u64),
                ("zero ratings", report.zero_ratings),
                ("malformed", report.malformed),
            ],
        );
    })
}

fn run_evaluate(
    cmd: &EvaluateCmd,
    config: RunConfig,
    format: OutputFormat,
    ui: &Ui,
) -> Result<(), Box<dyn Error>> {
    let interactions = dataset::load_json(&cmd.run.dataset)?;
    let experiment = Experiment::new(config);
    let progress = ui.experiment_progress();
    let report = experiment.run(
        &interactions,
        cmd.run.weight_mode == WeightMode::Unit,
        &progress,
    )?;
    progress.finish();

    if report.check.cold_users > 0 {
        ui.warn(&format!(
            "{} of {} test users have no training interactions",
            report.check.cold_users, report.check.test_users
        ));
    }
    emit(format, &report, || print_experiment_text(ui, &report))
}

fn print_experiment_text(ui: &Ui, report: &ExperimentReport) {
    let evaluation = &report.evaluation;
    ui.section(
        "Dataset",
        [
            ("interactions", report.dataset_size.to_string()),
            ("train", report.train_size.to_string()),
            ("test", report.test_size.to_string()),
            ("graph users", report.graph_users.to_string()),
            ("graph items", report.graph_items.to_string()),
        ],
    );
    if let Some(neighbours) = &report.neighbours {
        ui.section(
            "Neighbours",
            [
                ("users", neighbours.users.to_string()),
                ("candidates scored", neighbours.candidates_scored.to_string()),
                ("neighbours stored", neighbours.neighbours_stored.to_string()),
                ("duration", format!("{}ms", neighbours.duration_ms)),
            ],
        );
    }
    ui.section(
        "Evaluation",
        [
            ("strategy", evaluation.strategy.clone()),
            ("users", evaluation.users_evaluated.to_string()),
            ("unknown users", evaluation.unknown_users.to_string()),
            (
                "correct",
                format!(
                    "{} / {}",
                    evaluation.correctly_recommended, evaluation.total_held_out
                ),
            ),
            ("recall", format!("{:.4}", evaluation.recall())),
            ("duration", format!("{}ms", evaluation.duration_ms)),
        ],
    );
}

#[derive(Debug, Serialize)]
struct ScoredItem {
    item_id: String,
    score: f64,
}

#[derive(Debug, Serialize)]
struct RecommendReport {
    user_id: String,
    strategy: &'static str,
    known_user: bool,
    items: Vec<ScoredItem>,
}

fn run_recommend(
    cmd: &RecommendCmd,
    config: &RunConfig,
    format: OutputFormat,
    ui: &Ui,
) -> Result<(), Box<dyn Error>> {
    let interactions = dataset::load_json(&cmd.run.dataset)?;
    let options = GraphOptions::new()
        .norm_kind(config.graph.norm_kind)
        .norm_policy(config.graph.norm_policy);
    let mut graph = Graph::new(options);
    let unit = cmd.run.weight_mode == WeightMode::Unit;
    for interaction in &interactions {
        let weight = if unit { 1.0 } else { interaction.weight };
        graph.put_interaction(&interaction.user_id, &interaction.item_id, weight);
    }

    let strategy = config.scoring.strategy.build(config.scoring.top_k);
    if strategy.requires_neighbours() {
        let task = ui.task("Detecting neighbours");
        detect_neighbours(&mut graph, &config.neighbours);
        task.finish();
    }

    let known_user = graph.user(&cmd.user).is_some();
    if !known_user {
        ui.warn(&format!("user '{}' has no interactions in the dataset", cmd.user));
    }
    let report = RecommendReport {
        user_id: cmd.user.clone(),
        strategy: strategy.name(),
        known_user,
        items: strategy
            .recommend_scored(&graph, &cmd.user)
            .into_iter()
            .map(|(item_id, score)| ScoredItem { item_id, score })
            .collect(),
    };
    emit(format, &report, || {
        ui.ranked(
            &format!("Recommendations for {} ({})", report.user_id, report.strategy),
            report
                .items
                .iter()
                .map(|item| (item.item_id.clone(), item.score)),
        );
    })
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
