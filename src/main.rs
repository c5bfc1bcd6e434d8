use clap::{Parser, Subcommand};
use floweval_rs::flo::read_flow_file;
use floweval_rs::metrics::{render_table, summarize_methods, FrameResult, ResultsFile, TableFormat};
use floweval_rs::visualize::{draw_flow_field, DEFAULT_MAX_MAGNITUDE};
use floweval_rs::{discover_frames, DatasetPaths, EvaluationConfig, Evaluator, FailurePolicy};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "floweval")]
#[command(version, about = "Optical flow evaluation against ground truth", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate estimated flow of one or more methods on a dataset
    Evaluate {
        /// Dataset root (contains image, ground-truth and mask directories)
        #[arg(long, value_name = "DIR")]
        dataset: PathBuf,

        /// Root of the estimates, one sub-directory per method
        #[arg(long, value_name = "DIR")]
        estimates: PathBuf,

        /// Method(s) to evaluate
        #[arg(short, long = "method", value_name = "NAME", required = true)]
        methods: Vec<String>,

        /// Evaluation config (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Where to save per-frame results
        #[arg(long, value_name = "FILE", default_value = "short_term_results.json")]
        results: PathBuf,

        /// Where to write the result table
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,

        /// Table format: "latex" (default) or "text"
        #[arg(long, value_name = "FORMAT", default_value = "latex")]
        format: TableFormat,

        /// Leave frames that fail to load out of the results instead of aborting
        #[arg(long)]
        skip_failures: bool,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        silent: bool,
    },

    /// Render the result table of a saved run
    Table {
        /// Results file written by `evaluate`
        #[arg(value_name = "RESULTS")]
        results: PathBuf,

        /// Evaluation config (JSON), for the sequence markers
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Table format: "latex" (default) or "text"
        #[arg(long, value_name = "FORMAT", default_value = "latex")]
        format: TableFormat,

        /// Write the table to a file instead of stdout only
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render a .flo file as a color image
    Visualize {
        /// Input flow file
        #[arg(value_name = "FLO")]
        input: PathBuf,

        /// Output image (PNG)
        #[arg(value_name = "IMAGE")]
        output: PathBuf,

        /// Magnitude mapped to full saturation (zero or negative: use the field maximum)
        #[arg(long, value_name = "FLOAT", default_value_t = DEFAULT_MAX_MAGNITUDE, allow_negative_numbers = true)]
        max_magnitude: f32,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Evaluate {
            dataset,
            estimates,
            methods,
            config,
            results,
            table,
            format,
            skip_failures,
            threads,
            silent,
        } => cmd_evaluate(
            &dataset,
            &estimates,
            &methods,
            config.as_deref(),
            &results,
            table.as_deref(),
            format,
            skip_failures,
            threads,
            silent,
        ),
        Commands::Table {
            results,
            config,
            format,
            out,
        } => cmd_table(&results, config.as_deref(), format, out.as_deref()),
        Commands::Visualize {
            input,
            output,
            max_magnitude,
        } => cmd_visualize(&input, &output, max_magnitude),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> floweval_rs::Result<EvaluationConfig> {
    match path {
        Some(path) => EvaluationConfig::from_file(path),
        None => Ok(EvaluationConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_evaluate(
    dataset: &Path,
    estimates: &Path,
    methods: &[String],
    config: Option<&Path>,
    results_path: &Path,
    table_path: Option<&Path>,
    format: TableFormat,
    skip_failures: bool,
    threads: Option<usize>,
    silent: bool,
) -> floweval_rs::Result<()> {
    let mut config = load_config(config)?;
    if skip_failures {
        config.failure_policy = FailurePolicy::Skip;
    }
    if threads.is_some() {
        config.threads = threads;
    }

    let mut records = Vec::new();
    for method in methods {
        let paths = DatasetPaths::new(dataset, estimates, method, &config.layout);
        records.extend(discover_frames(&paths)?);
    }

    let progress = if silent {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(records.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let evaluator = Evaluator::new(config.clone())?;
    let run = evaluator.evaluate_with_progress(&records, |_| progress.inc(1))?;
    progress.finish_and_clear();

    if !run.failures.is_empty() {
        log::warn!("{} frame pairs were skipped", run.failures.len());
    }

    let results = ResultsFile::new(run.results);
    results.save(results_path)?;

    print_table(&results.result, &config, format, table_path)
}

fn cmd_table(
    results_path: &Path,
    config: Option<&Path>,
    format: TableFormat,
    out: Option<&Path>,
) -> floweval_rs::Result<()> {
    let config = load_config(config)?;
    let results = ResultsFile::load(results_path)?;
    log::info!("loaded {} frame results from {}", results.len(), results_path.display());

    print_table(&results.result, &config, format, out)
}

fn print_table(
    results: &[FrameResult],
    config: &EvaluationConfig,
    format: TableFormat,
    out: Option<&Path>,
) -> floweval_rs::Result<()> {
    let summaries = summarize_methods(results, &config.classifier());
    let table = render_table(&summaries, format);
    println!("{}", table);

    if let Some(path) = out {
        std::fs::write(path, &table)?;
        log::info!("wrote result table to {}", path.display());
    }
    Ok(())
}

fn cmd_visualize(input: &Path, output: &Path, max_magnitude: f32) -> floweval_rs::Result<()> {
    let flow = read_flow_file(input)?;
    draw_flow_field(output, &flow, Some(max_magnitude))?;
    log::info!("wrote {}", output.display());
    Ok(())
}
