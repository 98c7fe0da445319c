use std::fmt;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TweetSentError};
use crate::normalizer::Normalizer;

/// Number of columns in a dataset row: `target,id,date,query,user,text`.
pub const NUM_COLUMNS: usize = 6;

/// Target codes used by the dataset.
pub const NEGATIVE_CODE: i64 = 0;
pub const NEUTRAL_CODE: i64 = 2;
pub const POSITIVE_CODE: i64 = 4;

/// Sentiment label of a tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    /// Maps a dataset target code to a sentiment.
    ///
    /// # Returns
    /// `Some(Negative)` for 0, `Some(Positive)` for 4 and `None` for the
    /// neutral code 2 and any unknown code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            NEGATIVE_CODE => Some(Sentiment::Negative),
            POSITIVE_CODE => Some(Sentiment::Positive),
            _ => None,
        }
    }

    /// `1.0` for Positive, `0.0` for Negative.
    pub fn as_target(self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Negative => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the dataset, as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Line on which the row starts in the file, counting from 1.
    pub line: u64,
    pub target: i64,
    pub id: String,
    pub date: String,
    pub query: String,
    pub user: String,
    pub text: String,
}

/// A tweet with its cleaned text and a non-neutral sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub clean_text: String,
    pub sentiment: Sentiment,
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads every row of a headerless six-column dataset file.
///
/// # Arguments
/// * `path` - The path to the dataset file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, if a row does not
/// have exactly six columns, or if its target is not an integer.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    let mut row = ByteRecord::new();
    while reader.read_byte_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        if row.len() != NUM_COLUMNS {
            return Err(TweetSentError::MalformedRecord {
                line,
                reason: format!("expected {} columns, found {}", NUM_COLUMNS, row.len()),
            });
        }

        let field = |i: usize| decode_latin1(&row[i]);
        let target_field = field(0);
        let target = target_field.trim().parse::<i64>().map_err(|_| {
            TweetSentError::MalformedRecord {
                line,
                reason: format!("target {:?} is not an integer", target_field),
            }
        })?;

        records.push(RawRecord {
            line,
            target,
            id: field(1),
            date: field(2),
            query: field(3),
            user: field(4),
            text: field(5),
        });

        if records.len() % 100_000 == 0 {
            log::debug!("read {} records", records.len());
        }
    }
    log::info!("read {} records from {}", records.len(), path.display());

    Ok(records)
}

/// Drops neutral rows and labels the rest.
///
/// # Errors
/// Returns [`TweetSentError::UnknownLabel`] for a target outside {0, 2, 4}.
pub fn label_records(records: Vec<RawRecord>) -> Result<Vec<(String, Sentiment)>> {
    let mut labeled = Vec::with_capacity(records.len());
    for record in records {
        if record.target == NEUTRAL_CODE {
            continue;
        }
        match Sentiment::from_code(record.target) {
            Some(sentiment) => labeled.push((record.text, sentiment)),
            None => {
                return Err(TweetSentError::UnknownLabel {
                    line: record.line,
                    code: record.target,
                })
            }
        }
    }
    Ok(labeled)
}

/// Loads the dataset and returns cleaned, labeled examples.
///
/// # Arguments
/// * `path` - The path to the dataset file.
/// * `normalizer` - The normalizer applied to every tweet.
///
/// # Returns
/// One [`LabeledExample`] per non-neutral row, in file order.
pub fn load_corpus(path: &Path, normalizer: &Normalizer) -> Result<Vec<LabeledExample>> {
    let labeled = label_records(read_records(path)?)?;
    let examples: Vec<LabeledExample> = labeled
        .into_par_iter()
        .map(|(text, sentiment)| LabeledExample {
            clean_text: normalizer.normalize(&text),
            sentiment,
        })
        .collect();
    log::info!("loaded {} labeled examples", examples.len());
    Ok(examples)
}

/// Counts of a labeled corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    /// Percentage of positive tweets, rounded to two decimals.
    pub positive_percentage: f64,
}

/// Groups the digits of `n` by thousands: `1600000` -> `1,600,000`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Prints the dataset metrics the way the dashboard showed them, e.g.
///
/// ```text
/// Total Tweets: 1,600,000
/// Positive %: 50.0 %
/// ```
///
/// The percentage keeps at least one decimal and drops trailing zeros.
impl fmt::Display for CorpusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Tweets: {}", group_thousands(self.total))?;
        if self.positive_percentage.fract() == 0.0 {
            write!(f, "Positive %: {:.1} %", self.positive_percentage)
        } else {
            write!(f, "Positive %: {} %", self.positive_percentage)
        }
    }
}

/// Summarizes a labeled corpus.
pub fn summarize(examples: &[LabeledExample]) -> CorpusSummary {
    let total = examples.len();
    let positive = examples
        .iter()
        .filter(|e| e.sentiment == Sentiment::Positive)
        .count();
    let positive_percentage = if total == 0 {
        0.0
    } else {
        (positive as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    };

    CorpusSummary {
        total,
        positive,
        negative: total - positive,
        positive_percentage,
    }
}

/// Shuffles `items` with a seeded RNG and splits them into (train, test).
///
/// The test split holds `ceil(test_size * n)` items.
///
/// # Errors
/// Returns [`TweetSentError::InvalidConfig`] if `test_size` is not in (0, 1).
pub fn train_test_split<T>(mut items: Vec<T>, test_size: f64, seed: u64) -> Result<(Vec<T>, Vec<T>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TweetSentError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let num_test = ((items.len() as f64) * test_size).ceil() as usize;
    let train = items.split_off(num_test.min(items.len()));
    Ok((train, items))
}
