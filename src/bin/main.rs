//! StackSample Command Line Interface
//!
//! Inspect the tag distribution of a Stack Exchange export and train a
//! linear SVM tag classifier on it.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use stacksample::core::{Loss, Result};
use stacksample::data::{
    combine_and_format, label_counts, load_all, CombinedRecord, FormatConfig, LoaderConfig,
    TableSource, DEFAULT_ENCODING,
};
use stacksample::solver::SolverKind;
use stacksample::training::{train_model, TrainConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "stacksample")]
#[command(about = "Tag classification on the StackSample question dataset")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the number of rows per tag
    ViewLabels(ViewLabelsArgs),
    /// Train and evaluate a tag classifier
    Train(TrainArgs),
}

/// Input files and the formatting applied to them
#[derive(Args)]
struct DataArgs {
    #[arg(long, default_value = "data/Answers.csv")]
    answers_file_path: PathBuf,

    #[arg(long, default_value = DEFAULT_ENCODING)]
    answers_file_encoding: String,

    #[arg(long, default_value = "data/Questions.csv")]
    questions_file_path: PathBuf,

    #[arg(long, default_value = DEFAULT_ENCODING)]
    questions_file_encoding: String,

    #[arg(long, default_value = "data/Tags.csv")]
    tags_file_path: PathBuf,

    #[arg(long, default_value = DEFAULT_ENCODING)]
    tags_file_encoding: String,

    /// Strip HTML tags from the text
    #[arg(long)]
    remove_html_tags: bool,

    /// Replace line breaks with spaces
    #[arg(long)]
    remove_line_breaks: bool,

    /// Drop tags with fewer rows than this
    #[arg(long)]
    minimum_labels: Option<usize>,

    /// Randomly keep at most this many rows
    #[arg(long)]
    reduce_number_of_samples: Option<usize>,

    /// Seed for every random step
    #[arg(long)]
    random_state: Option<u64>,

    /// Truncate each text to this many characters
    #[arg(long)]
    crop_sentences: Option<usize>,

    /// Leave question titles out of the text
    #[arg(long)]
    exclude_title: bool,

    /// Leave answers out of the text
    #[arg(long)]
    exclude_answers: bool,
}

impl DataArgs {
    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            answers: TableSource::new(&self.answers_file_path, &self.answers_file_encoding),
            questions: TableSource::new(&self.questions_file_path, &self.questions_file_encoding),
            tags: TableSource::new(&self.tags_file_path, &self.tags_file_encoding),
        }
    }

    fn format_config(&self) -> FormatConfig {
        FormatConfig {
            remove_html_tags: self.remove_html_tags,
            remove_line_breaks: self.remove_line_breaks,
            minimum_labels: self.minimum_labels,
            reduce_number_of_samples: self.reduce_number_of_samples,
            crop_sentences: self.crop_sentences,
            random_state: self.random_state,
            exclude_answers: self.exclude_answers,
            exclude_title: self.exclude_title,
        }
    }

    fn load(&self) -> Result<Vec<CombinedRecord>> {
        let tables = load_all(&self.loader_config())?;
        combine_and_format(&tables, &self.format_config())
    }
}

#[derive(Args)]
struct ViewLabelsArgs {
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args)]
struct TrainArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Oversample minority tags in the train partition
    #[arg(long)]
    balance_train_data: bool,

    /// Regularization parameter C
    #[arg(short, long, default_value = "1.0")]
    c_value: f64,

    /// Split each tag separately
    #[arg(long)]
    stratify: bool,

    /// Binary solver for each tag
    #[arg(long, default_value = "dcd")]
    solver: CliSolver,

    /// Loss function
    #[arg(long, default_value = "squared-hinge")]
    loss: CliLoss,

    /// Maximum solver iterations
    #[arg(long, default_value = "1000")]
    max_iterations: usize,

    /// Convergence tolerance
    #[arg(long, default_value = "0.0001")]
    epsilon: f64,

    /// Ignore terms found in fewer documents
    #[arg(long, default_value = "1")]
    min_df: usize,

    /// Ignore terms found in a larger share of documents
    #[arg(long, default_value = "1.0")]
    max_df: f64,

    /// Keep only the most frequent terms
    #[arg(long)]
    max_features: Option<usize>,
}

#[derive(ValueEnum, Clone, Debug)]
enum CliSolver {
    /// Dual coordinate descent (fast, default)
    #[value(name = "dcd")]
    DualCoordinateDescent,
    /// Sequential minimal optimization with a kernel cache (small data)
    #[value(name = "smo")]
    Smo,
}

#[derive(ValueEnum, Clone, Debug)]
enum CliLoss {
    #[value(name = "hinge")]
    Hinge,
    #[value(name = "squared-hinge")]
    SquaredHinge,
}

impl From<CliSolver> for SolverKind {
    fn from(cli_solver: CliSolver) -> Self {
        match cli_solver {
            CliSolver::DualCoordinateDescent => SolverKind::DualCoordinateDescent,
            CliSolver::Smo => SolverKind::Smo,
        }
    }
}

impl From<CliLoss> for Loss {
    fn from(cli_loss: CliLoss) -> Self {
        match cli_loss {
            CliLoss::Hinge => Loss::Hinge,
            CliLoss::SquaredHinge => Loss::SquaredHinge,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::ViewLabels(args) => view_labels_command(args),
        Commands::Train(args) => train_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn view_labels_command(args: ViewLabelsArgs) -> Result<()> {
    let records = args.data.load()?;
    let counts = label_counts(&records);

    let width = counts.keys().map(|t| t.chars().count()).max().unwrap_or(0).max(3);
    println!("=== Label Counts ===");
    println!("{:<width$}  {:>8}", "tag", "count");
    for (tag, count) in &counts {
        println!("{tag:<width$}  {count:>8}");
    }
    println!("Total: {}", records.len());

    Ok(())
}

fn train_command(args: TrainArgs) -> Result<()> {
    let records = args.data.load()?;
    info!("Training on {} combined rows", records.len());

    let config = TrainConfig {
        test_size: args.test_size,
        random_state: args.data.random_state,
        balance_train_dataset: args.balance_train_data,
        c_value: args.c_value,
        stratify: args.stratify,
        solver: args.solver.into(),
        loss: args.loss.into(),
        max_iterations: args.max_iterations,
        epsilon: args.epsilon,
        min_df: args.min_df,
        max_df: args.max_df,
        max_features: args.max_features,
    };
    info!(
        "Parameters: C={}, epsilon={}, max_iter={}, solver={:?}, loss={:?}",
        config.c_value, config.epsilon, config.max_iterations, config.solver, config.loss
    );

    let result = train_model(&records, &config)?;

    println!("=== Dataset ===");
    println!("Train rows: {}", result.train_size);
    if config.balance_train_dataset {
        println!("Balanced train rows: {}", result.balanced_train_size);
    }
    println!("Test rows: {}", result.test_size);
    println!("Vocabulary size: {}", result.vocabulary_size);
    println!("Classes: {}", result.classes.len());
    println!();
    println!("=== Classification Report ===");
    print!("{}", result.report);

    Ok(())
}
