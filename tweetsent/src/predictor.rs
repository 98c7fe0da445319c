use std::path::Path;

use rayon::prelude::*;

use crate::corpus::Sentiment;
use crate::error::{Result, TweetSentError};
use crate::logistic::LogisticRegression;
use crate::normalizer::Normalizer;
use crate::store;
use crate::vectorizer::{SparseVector, TfidfVectorizer};

/// Predictor bundles the normalizer, a fitted vectorizer and a fitted model.
/// It is built once, never mutated, and shared by every prediction.
#[derive(Debug, Clone)]
pub struct Predictor {
    normalizer: Normalizer,
    vectorizer: TfidfVectorizer,
    model: LogisticRegression,
}

impl Predictor {
    /// Creates a new instance of [`Predictor`] from fitted components.
    ///
    /// # Errors
    /// Returns an error if either component is unfitted, if their dimensions
    /// differ, or if the vectorizer was fitted on text cleaned by another
    /// normalizer version.
    pub fn new(vectorizer: TfidfVectorizer, model: LogisticRegression) -> Result<Self> {
        let normalizer = Normalizer::new();
        let state = vectorizer
            .state()
            .ok_or(TweetSentError::NotFitted("TfidfVectorizer"))?;
        if state.normalizer_version != normalizer.version() {
            return Err(TweetSentError::NormalizerVersion {
                artifact: state.normalizer_version,
                runtime: normalizer.version(),
            });
        }
        if model.state().is_none() {
            return Err(TweetSentError::NotFitted("LogisticRegression"));
        }
        if vectorizer.n_features() != model.n_features() {
            return Err(TweetSentError::DimensionMismatch {
                expected: vectorizer.n_features(),
                got: model.n_features(),
            });
        }

        Ok(Predictor {
            normalizer,
            vectorizer,
            model,
        })
    }

    /// Loads the artifact pair written by the trainer.
    ///
    /// # Arguments
    /// * `model_path` - The path to the model artifact.
    /// * `vectorizer_path` - The path to the vectorizer artifact.
    pub fn load(model_path: &Path, vectorizer_path: &Path) -> Result<Self> {
        let model = store::load_model(model_path)?;
        let vectorizer = store::load_vectorizer(vectorizer_path)?;
        let predictor = Predictor::new(vectorizer, model)?;
        log::info!(
            "loaded predictor with {} features",
            predictor.n_features()
        );
        Ok(predictor)
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    /// Normalizes and vectorizes raw text.
    pub fn featurize(&self, text: &str) -> Result<SparseVector> {
        self.vectorizer.transform(&self.normalizer.normalize(text))
    }

    /// Predicts the sentiment of raw text.
    ///
    /// Empty or fully out-of-vocabulary text becomes the zero vector and is
    /// labeled by the intercept alone.
    pub fn predict(&self, text: &str) -> Result<Sentiment> {
        self.model.predict(&self.featurize(text)?)
    }

    /// Predicts many texts in parallel, preserving order.
    pub fn predict_batch(&self, texts: &[String]) -> Result<Vec<Sentiment>> {
        texts.par_iter().map(|t| self.predict(t)).collect()
    }
}
