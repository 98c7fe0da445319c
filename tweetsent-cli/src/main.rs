use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tweetsent::config::{TrainingConfig, WordCloudConfig};
use tweetsent::corpus::{self, Sentiment};
use tweetsent::get_version;
use tweetsent::normalizer::Normalizer;
use tweetsent::trainer::Trainer;
use tweetsent::wordfreq;
use tweetsent::Predictor;

const DEFAULT_MODEL_FILE: &str = "sentiment_model.json";
const DEFAULT_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";

#[derive(Debug, Args)]
#[clap(
    author,
    about = "Train the sentiment model on a labeled tweet corpus",
    version = get_version(),
)]
struct TrainArgs {
    /// Read training parameters from a JSON file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    max_features: Option<usize>,

    #[arg(long)]
    test_size: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short = 'i', long)]
    max_iter: Option<usize>,

    #[arg(short, long, default_value = DEFAULT_MODEL_FILE)]
    model_file: PathBuf,

    #[arg(short = 't', long, default_value = DEFAULT_VECTORIZER_FILE)]
    vectorizer_file: PathBuf,

    dataset_file: PathBuf,
}

#[derive(Debug, Args)]
#[clap(
    author,
    about = "Predict the sentiment of a tweet, or of each line of stdin",
    version = get_version(),
)]
struct PredictArgs {
    #[arg(short, long, default_value = DEFAULT_MODEL_FILE)]
    model_file: PathBuf,

    #[arg(short = 't', long, default_value = DEFAULT_VECTORIZER_FILE)]
    vectorizer_file: PathBuf,

    text: Option<String>,
}

#[derive(Debug, Args)]
#[clap(
    author,
    about = "Show the size and balance of a labeled tweet corpus",
    version = get_version(),
)]
struct SummaryArgs {
    dataset_file: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SentimentArg {
    Positive,
    Negative,
}

impl From<SentimentArg> for Sentiment {
    fn from(arg: SentimentArg) -> Self {
        match arg {
            SentimentArg::Positive => Sentiment::Positive,
            SentimentArg::Negative => Sentiment::Negative,
        }
    }
}

#[derive(Debug, Args)]
#[clap(
    author,
    about = "Print the word frequencies behind the sentiment word clouds",
    version = get_version(),
)]
struct WordCloudArgs {
    #[arg(short = 'n', long, default_value = "8000")]
    sample_size: usize,

    #[arg(long, default_value = "42")]
    seed: u64,

    #[arg(short = 'w', long, default_value = "200")]
    max_words: usize,

    /// Only report this sentiment.
    #[arg(short, long, value_enum)]
    sentiment: Option<SentimentArg>,

    dataset_file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Train(TrainArgs),
    Predict(PredictArgs),
    Summary(SummaryArgs),
    #[clap(name = "wordcloud")]
    WordCloud(WordCloudArgs),
}

#[derive(Debug, Parser)]
#[clap(
    name = "tweetsent",
    author,
    about = "A tweet sentiment command line interface",
    version = get_version(),
)]
struct CommandArgs {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .ok();
}

fn train(args: TrainArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(max_features) = args.max_features {
        config.max_features = max_features;
    }
    if let Some(test_size) = args.test_size {
        config.test_size = test_size;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_iter) = args.max_iter {
        config.max_iter = max_iter;
    }

    let trainer = Trainer::new(config)?;
    let report = trainer.train(
        args.dataset_file.as_path(),
        args.model_file.as_path(),
        args.vectorizer_file.as_path(),
    )?;

    println!(
        "Trained on {} tweets with {} features ({} iterations).",
        report.train_size, report.n_features, report.n_iter
    );
    println!("Held-out result ({} tweets):", report.test_size);
    println!("{}", report.metrics);
    println!("Model and vectorizer saved.");
    Ok(())
}

fn predict(args: PredictArgs) -> Result<(), Box<dyn Error>> {
    let predictor = Predictor::load(args.model_file.as_path(), args.vectorizer_file.as_path())?;

    if let Some(text) = args.text {
        if text.trim().is_empty() {
            log::warn!("Please enter a tweet.");
            return Ok(());
        }
        println!("{}", predictor.predict(&text)?);
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        writeln!(writer, "{}", predictor.predict(line)?)?;
    }

    Ok(())
}

fn summary(args: SummaryArgs) -> Result<(), Box<dyn Error>> {
    let examples = corpus::load_corpus(args.dataset_file.as_path(), &Normalizer::new())?;
    let summary = corpus::summarize(&examples);

    println!("{}", summary);
    Ok(())
}

fn wordcloud(args: WordCloudArgs) -> Result<(), Box<dyn Error>> {
    let config = WordCloudConfig {
        sample_size: args.sample_size,
        seed: args.seed,
        max_words: args.max_words,
    };
    let examples = corpus::load_corpus(args.dataset_file.as_path(), &Normalizer::new())?;

    let sentiments = match args.sentiment {
        Some(sentiment) => vec![Sentiment::from(sentiment)],
        None => vec![Sentiment::Positive, Sentiment::Negative],
    };

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    for sentiment in sentiments {
        writeln!(writer, "# {} Tweets", sentiment)?;
        for entry in wordfreq::sentiment_word_frequencies(&examples, sentiment, &config) {
            writeln!(writer, "{}\t{}\t{:.4}", entry.word, entry.count, entry.weight)?;
        }
    }
    writer.flush()?;

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = CommandArgs::parse();
    setup_logging(args.verbose);

    match args.command {
        Commands::Train(args) => train(args),
        Commands::Predict(args) => predict(args),
        Commands::Summary(args) => summary(args),
        Commands::WordCloud(args) => wordcloud(args),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
