//! @ai:module:intent CLI for the story evaluation system
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use story_bench::{
    config::{BenchmarkConfig, FailurePolicy},
    corpus::{discover_sample_files, JsonSampleLoader, SampleLoader, Variant},
    evaluator::{LlmJudge, StoryJudge, TextEvaluator},
    metrics::{CorpusAggregator, CorpusReport},
    report::{JsonReporter, MarkdownReporter, ReportGenerator},
    runner::{ChatClient, MockChatClient, RetryPolicy},
};

/// Reply served by the mock chat client in dry runs.
const DRY_RUN_REPLY: &str = r#"{"explanation": "dry run", "final_output": [5, 5, 5, 5]}"#;

#[derive(Parser)]
#[command(name = "story-bench")]
#[command(about = "Text-quality metrics and LLM-judge scoring for generated story corpora")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that reads the corpus.
#[derive(Args, Clone)]
struct CorpusArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override categories (comma-separated)
    #[arg(long)]
    categories: Option<String>,

    /// Override the sample directory
    #[arg(long)]
    sample_dir: Option<PathBuf>,

    /// Leave malformed samples out instead of aborting
    #[arg(long)]
    skip_malformed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the text-metric pass over the corpus
    Metrics {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the LLM-judge pass over the corpus
    Judge {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Judge calls per story variant
        #[arg(short, long)]
        repetitions: Option<u32>,

        /// Judge calls in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Run without making API calls
        #[arg(long)]
        dry_run: bool,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the text metrics of a single story
    Evaluate {
        /// Story file to evaluate
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Story text to evaluate
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Generate reports from existing results
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// List the samples the corpus enumerates
    List {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Validate corpus samples
    Validate {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("story_bench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Metrics { corpus, output } => run_metrics(corpus, output),
        Commands::Judge {
            corpus,
            repetitions,
            concurrency,
            dry_run,
            output,
        } => {
            run_judge(JudgeArgs {
                corpus,
                repetitions,
                concurrency,
                dry_run,
                output,
            })
            .await
        }
        Commands::Evaluate { file, text } => evaluate_story(file, text),
        Commands::Report { results, output } => generate_reports(results, output),
        Commands::List { corpus } => list_samples(corpus),
        Commands::Validate { corpus } => validate(corpus),
        Commands::Init { output } => init_config(output),
    }
}

struct JudgeArgs {
    corpus: CorpusArgs,
    repetitions: Option<u32>,
    concurrency: Option<usize>,
    dry_run: bool,
    output: Option<PathBuf>,
}

/// @ai:intent Run the metric pass and write reports
/// @ai:effects fs:read, fs:write
fn run_metrics(args: CorpusArgs, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(&args)?;
    let loader = JsonSampleLoader::new(&config.corpus.sample_dir);
    let aggregator = CorpusAggregator::from_config(&config);

    tracing::info!(
        "Running metric pass over {} samples in {}",
        aggregator.spec().len(),
        loader.dir().display()
    );

    let evaluator = TextEvaluator::new();
    let report = aggregator.run_metric_pass(&loader, |text| evaluator.evaluate(text))?;

    write_reports(&report, output.unwrap_or(config.paths.results_dir))
}

/// @ai:intent Run the judge pass and write reports
/// @ai:effects network, fs:read, fs:write
async fn run_judge(args: JudgeArgs) -> Result<()> {
    let mut config = load_config(&args.corpus)?;

    if let Some(repetitions) = args.repetitions {
        config.run.repetitions = repetitions;
    }
    if let Some(concurrency) = args.concurrency {
        config.run.concurrency = concurrency;
    }
    config.run.dry_run |= args.dry_run;

    let retry = RetryPolicy::from_config(&config.api);

    let report = if config.run.dry_run {
        tracing::info!("Running in dry-run mode");
        let judge = LlmJudge::new(Arc::new(MockChatClient::new(DRY_RUN_REPLY)), retry);
        judge_corpus(&config, &judge, None).await?
    } else {
        tracing::info!("Judging with {} at {}", config.api.model, config.api.base_url);
        let client = ChatClient::new(config.api.clone()).context("Failed to create chat client")?;
        let judge = LlmJudge::new(Arc::new(client), retry);
        judge_corpus(&config, &judge, Some(config.api.model.clone())).await?
    };

    write_reports(&report, args.output.unwrap_or(config.paths.results_dir))
}

/// @ai:effects network, fs:read
async fn judge_corpus<J: StoryJudge>(
    config: &BenchmarkConfig,
    judge: &J,
    model: Option<String>,
) -> Result<CorpusReport> {
    let loader = JsonSampleLoader::new(&config.corpus.sample_dir);
    let aggregator = CorpusAggregator::from_config(config);

    let report = aggregator
        .run_judge_pass(
            &loader,
            judge,
            config.run.repetitions,
            config.run.concurrency,
            model,
        )
        .await?;

    Ok(report)
}

/// @ai:intent Write all reports into a timestamped directory and print the summary
/// @ai:effects fs:write, io
fn write_reports(report: &CorpusReport, output: PathBuf) -> Result<()> {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let output_dir = output.join(format!("{}_{}", report.kind.as_str(), timestamp));

    ReportGenerator::new().generate_all(report, &output_dir)?;
    print_summary(report);
    println!();
    println!("Results written to {}", output_dir.display());

    Ok(())
}

/// @ai:intent Evaluate a single story and print its metric vector as JSON
/// @ai:effects fs:read, io
fn evaluate_story(file: Option<PathBuf>, text: Option<String>) -> Result<()> {
    let story = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read story: {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => anyhow::bail!("Provide a story with --file or --text"),
    };

    let metrics = TextEvaluator::new().evaluate(&story);
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}

/// @ai:intent Generate reports from results file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let report = JsonReporter::load(&results_path)?;

    ReportGenerator::new().generate_all(&report, &output_dir)?;
    print_summary(&report);

    println!();
    println!("Reports generated in {}", output_dir.display());
    Ok(())
}

/// @ai:intent List enumerated samples and whether each file exists
/// @ai:effects fs:read, io
fn list_samples(args: CorpusArgs) -> Result<()> {
    let config = load_config(&args)?;
    let loader = JsonSampleLoader::new(&config.corpus.sample_dir);
    let aggregator = CorpusAggregator::from_config(&config);

    println!("Samples in {}:", loader.dir().display());

    let mut missing = 0;
    for id in aggregator.spec().sample_ids() {
        let exists = loader.path_for(&id).exists();
        if !exists {
            missing += 1;
        }
        println!("  - {} {}", id, if exists { "" } else { "(missing)" });
    }

    println!();
    println!("Total: {} ({} missing)", aggregator.spec().len(), missing);
    Ok(())
}

/// @ai:intent Load every sample, report malformed ones and stray files
/// @ai:post fails when any enumerated sample is malformed
/// @ai:effects fs:read, io
fn validate(args: CorpusArgs) -> Result<()> {
    let config = load_config(&args)?;
    let loader = JsonSampleLoader::new(&config.corpus.sample_dir);
    let aggregator = CorpusAggregator::from_config(&config);

    let ids = aggregator.spec().sample_ids();
    let mut malformed = Vec::new();

    for id in &ids {
        if let Err(e) = loader.load(id) {
            println!("  ✗ {}", e);
            malformed.push(id.to_string());
        }
    }

    let expected: HashSet<PathBuf> = ids.iter().map(|id| loader.path_for(id)).collect();
    let stray: Vec<PathBuf> = discover_sample_files(loader.dir())
        .into_iter()
        .filter(|path| !expected.contains(path))
        .collect();

    if !stray.is_empty() {
        println!("Files not part of the corpus:");
        for path in &stray {
            println!("  - {}", path.display());
        }
    }

    if !malformed.is_empty() {
        anyhow::bail!(
            "{} of {} samples are malformed: {}",
            malformed.len(),
            ids.len(),
            malformed.join(", ")
        );
    }

    println!("Corpus validation passed!");
    println!("Total samples: {}", ids.len());
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration and apply corpus flag overrides
/// @ai:effects fs:read
fn load_config(args: &CorpusArgs) -> Result<BenchmarkConfig> {
    let mut config = load_or_default_config(args.config.clone())?;

    if let Some(categories) = &args.categories {
        config.corpus.categories = parse_list(categories);
    }
    if let Some(dir) = &args.sample_dir {
        config.corpus.sample_dir = dir.clone();
    }
    if args.skip_malformed {
        config.run.failure_policy = FailurePolicy::Skip;
    }

    Ok(config)
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    match path {
        Some(p) => BenchmarkConfig::load(&p),
        None => {
            let default_path = PathBuf::from("benchmark.toml");

            if default_path.exists() {
                BenchmarkConfig::load(&default_path)
            } else {
                Ok(BenchmarkConfig::default())
            }
        }
    }
}

/// @ai:intent Split a comma-separated list
/// @ai:effects pure
fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// @ai:intent Print averages per variant, then deltas
/// @ai:effects io
fn print_summary(report: &CorpusReport) {
    println!();
    println!("Story Evaluation Results ({} pass)", report.kind.as_str());
    println!("==================================");
    println!();

    if !report.is_complete() {
        println!(
            "Partial run: {} of {} samples counted; skipped: {}",
            report.samples_counted,
            report.expected_samples,
            report.skipped.join(", ")
        );
        println!();
    }

    for variant in Variant::ALL {
        let Some(averages) = report.averages_for(variant) else {
            continue;
        };
        for (name, value) in averages.iter() {
            println!(
                "{} {}: {}",
                variant.display_name(),
                name,
                MarkdownReporter::format_value(value)
            );
        }
    }

    println!();
    for (name, value) in report.delta.iter() {
        println!("{:<25} {:>+10.4}", format!("Delta {}:", name), value);
    }
}
