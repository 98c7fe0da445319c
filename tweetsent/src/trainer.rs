use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::corpus::{self, LabeledExample, Sentiment};
use crate::error::Result;
use crate::logistic::LogisticRegression;
use crate::metrics::Metrics;
use crate::normalizer::Normalizer;
use crate::predictor::Predictor;
use crate::store;
use crate::vectorizer::TfidfVectorizer;

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub n_features: usize,
    pub n_iter: usize,
    /// Evaluation on the held-out split.
    pub metrics: Metrics,
}

/// Trainer struct for managing the sentiment training process.
/// It splits the corpus, fits the vectorizer and the classifier on the
/// training split, evaluates them on the held-out split and saves the
/// resulting artifacts.
pub struct Trainer {
    config: TrainingConfig,
    normalizer: Normalizer,
}

impl Trainer {
    /// Creates a new instance of [`Trainer`].
    ///
    /// # Arguments
    /// * `config` - The training parameters.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            config,
            normalizer: Normalizer::new(),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fits a predictor on already loaded examples.
    ///
    /// # Arguments
    /// * `examples` - Cleaned, labeled examples.
    ///
    /// # Returns
    /// The fitted predictor and a report with held-out metrics.
    ///
    /// # Errors
    /// Returns an error if the training split is empty, contains a single
    /// sentiment, or yields an empty vocabulary.
    pub fn fit(&self, examples: Vec<LabeledExample>) -> Result<(Predictor, TrainingReport)> {
        let (train, test) =
            corpus::train_test_split(examples, self.config.test_size, self.config.seed)?;
        log::info!("split corpus: {} train / {} test", train.len(), test.len());

        let (train_texts, train_labels): (Vec<String>, Vec<Sentiment>) = train
            .into_iter()
            .map(|e| (e.clean_text, e.sentiment))
            .unzip();

        let mut vectorizer = TfidfVectorizer::new(self.config.max_features);
        let train_x = vectorizer.fit_transform(&train_texts)?;

        let mut model =
            LogisticRegression::new(self.config.c, self.config.max_iter, self.config.tolerance);
        model.fit(&train_x, &train_labels)?;
        let n_iter = model.state().map_or(0, |s| s.n_iter);

        let (test_texts, test_labels): (Vec<String>, Vec<Sentiment>) = test
            .into_iter()
            .map(|e| (e.clean_text, e.sentiment))
            .unzip();
        let test_x = vectorizer.transform_batch(&test_texts)?;
        let predicted = test_x
            .iter()
            .map(|x| model.predict(x))
            .collect::<Result<Vec<_>>>()?;
        let metrics = Metrics::from_predictions(&test_labels, &predicted);

        let report = TrainingReport {
            train_size: train_texts.len(),
            test_size: test_texts.len(),
            n_features: vectorizer.n_features(),
            n_iter,
            metrics,
        };
        Ok((Predictor::new(vectorizer, model)?, report))
    }

    /// Trains on a dataset file and writes both artifacts.
    ///
    /// # Arguments
    /// * `dataset_path` - The path to the six-column dataset.
    /// * `model_path` - Where to write the model artifact.
    /// * `vectorizer_path` - Where to write the vectorizer artifact.
    ///
    /// # Errors
    /// Returns an error if loading, training or saving fails. Existing
    /// artifacts are only replaced once both new ones are fully written.
    pub fn train(
        &self,
        dataset_path: &Path,
        model_path: &Path,
        vectorizer_path: &Path,
    ) -> Result<TrainingReport> {
        let examples = corpus::load_corpus(dataset_path, &self.normalizer)?;
        let (predictor, report) = self.fit(examples)?;

        store::save_artifacts(
            predictor.model(),
            predictor.vectorizer(),
            model_path,
            vectorizer_path,
        )?;

        Ok(report)
    }
}
