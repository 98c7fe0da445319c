use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TweetSentError};
use crate::logistic::{DEFAULT_C, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE};
use crate::vectorizer::DEFAULT_MAX_FEATURES;

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLE_SIZE: usize = 8000;
pub const DEFAULT_MAX_WORDS: usize = 200;

/// Parameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum vocabulary size.
    pub max_features: usize,
    /// Fraction of the corpus held out for evaluation.
    pub test_size: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Maximum number of optimizer iterations.
    pub max_iter: usize,
    /// Inverse regularization strength.
    pub c: f64,
    /// Gradient tolerance for early stopping.
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            max_features: DEFAULT_MAX_FEATURES,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            max_iter: DEFAULT_MAX_ITER,
            c: DEFAULT_C,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl TrainingConfig {
    /// Reads a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: TrainingConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(TweetSentError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TweetSentError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.max_iter == 0 {
            return Err(TweetSentError::InvalidConfig(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(self.c > 0.0) {
            return Err(TweetSentError::InvalidConfig(format!(
                "c must be positive, got {}",
                self.c
            )));
        }
        if !(self.tolerance >= 0.0) {
            return Err(TweetSentError::InvalidConfig(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Parameters of the word-frequency report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCloudConfig {
    /// Tweets sampled per sentiment.
    pub sample_size: usize,
    pub seed: u64,
    /// Number of words kept per sentiment.
    pub max_words: usize,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        WordCloudConfig {
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}
