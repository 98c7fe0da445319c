use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TweetSentError};
use crate::normalizer::NORMALIZER_VERSION;
use crate::stopwords::is_stop_word;

/// Default upper bound on the vocabulary size.
pub const DEFAULT_MAX_FEATURES: usize = 20_000;

/// A fixed-dimension sparse vector. `indices` are strictly increasing and
/// all below `dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Creates a sparse vector from parallel index and value lists.
    ///
    /// # Errors
    /// Returns [`TweetSentError::InvalidVector`] if the lists differ in
    /// length, the indices are not strictly increasing, or an index is not
    /// below `dim`.
    pub fn new(dim: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(TweetSentError::InvalidVector(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TweetSentError::InvalidVector(
                "indices are not strictly increasing".to_string(),
            ));
        }
        if let Some(&last) = indices.last() {
            if last >= dim {
                return Err(TweetSentError::InvalidVector(format!(
                    "index {} out of range for dimension {}",
                    last, dim
                )));
            }
        }
        Ok(SparseVector {
            dim,
            indices,
            values,
        })
    }

    /// Creates the all-zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        SparseVector {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Iterates `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product with a dense vector of the same dimension. Entries past
    /// the end of a shorter `dense` count as zero.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i).map(|d| v * d))
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Expands to a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Learned state of a [`TfidfVectorizer`]: what the vectorizer artifact holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    pub max_features: usize,
    /// Vocabulary terms in column order (alphabetical).
    pub terms: Vec<String>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    /// Version of the normalizer that produced the training text.
    pub normalizer_version: u32,
}

#[derive(Debug, Clone)]
struct Fitted {
    state: VectorizerState,
    columns: HashMap<String, usize>,
}

/// TF-IDF vectorizer with a bounded vocabulary and English stop words removed.
///
/// Tokens are runs of two or more word characters in the lowercased text.
/// Weights are raw term counts times the smoothed IDF
/// `ln((1 + n) / (1 + df)) + 1`, and each row is L2-normalized.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    token_pattern: Regex,
    fitted: Option<Fitted>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    /// Creates a new, unfitted instance of [`TfidfVectorizer`].
    ///
    /// # Arguments
    /// * `max_features` - Maximum vocabulary size; terms are ranked by their
    ///   total count across the training corpus.
    pub fn new(max_features: usize) -> Self {
        TfidfVectorizer {
            max_features,
            token_pattern: Regex::new(r"\b\w\w+\b").unwrap(),
            fitted: None,
        }
    }

    /// Rebuilds a fitted vectorizer from its learned state.
    ///
    /// # Errors
    /// Returns an error if the terms and IDF weights disagree in length, or if
    /// the terms are not strictly sorted.
    pub fn from_state(state: VectorizerState) -> Result<Self> {
        if state.terms.len() != state.idf.len() {
            return Err(TweetSentError::DimensionMismatch {
                expected: state.terms.len(),
                got: state.idf.len(),
            });
        }
        if !state.terms.windows(2).all(|w| w[0] < w[1]) {
            return Err(TweetSentError::InvalidConfig(
                "vectorizer terms must be unique and sorted".to_string(),
            ));
        }

        let mut vectorizer = TfidfVectorizer::new(state.max_features);
        let columns = state
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        vectorizer.fitted = Some(Fitted { state, columns });
        Ok(vectorizer)
    }

    /// Returns the learned state, or `None` before fitting.
    pub fn state(&self) -> Option<&VectorizerState> {
        self.fitted.as_ref().map(|f| &f.state)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Dimension of the produced vectors; zero before fitting.
    pub fn n_features(&self) -> usize {
        self.state().map_or(0, |s| s.terms.len())
    }

    /// Looks up the column of a vocabulary term.
    pub fn column(&self, term: &str) -> Option<usize> {
        self.fitted.as_ref().and_then(|f| f.columns.get(term).copied())
    }

    /// Splits text into lowercase tokens, dropping stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    /// Learns the vocabulary and IDF weights from a corpus.
    ///
    /// # Errors
    /// Returns [`TweetSentError::EmptyTrainingSet`] for an empty corpus and
    /// [`TweetSentError::EmptyVocabulary`] if no document contains a usable term.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(TweetSentError::EmptyTrainingSet);
        }

        // term -> (corpus term frequency, document frequency)
        let counts: HashMap<String, (u64, u64)> = documents
            .par_iter()
            .fold(HashMap::new, |mut acc: HashMap<String, (u64, u64)>, doc| {
                let mut doc_counts: HashMap<String, u64> = HashMap::new();
                for token in self.tokenize(doc) {
                    *doc_counts.entry(token).or_insert(0) += 1;
                }
                for (term, n) in doc_counts {
                    let entry = acc.entry(term).or_insert((0, 0));
                    entry.0 += n;
                    entry.1 += 1;
                }
                acc
            })
            .reduce(HashMap::new, |mut a, b| {
                for (term, (tf, df)) in b {
                    let entry = a.entry(term).or_insert((0, 0));
                    entry.0 += tf;
                    entry.1 += df;
                }
                a
            });

        if counts.is_empty() {
            return Err(TweetSentError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, u64, u64)> = counts
            .into_iter()
            .map(|(term, (tf, df))| (term, tf, df))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let selected: BTreeMap<String, u64> =
            ranked.into_iter().map(|(term, _, df)| (term, df)).collect();

        let n = documents.len() as f64;
        let (terms, idf): (Vec<String>, Vec<f64>) = selected
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .unzip();

        log::info!(
            "fitted vocabulary of {} terms on {} documents",
            terms.len(),
            documents.len()
        );

        *self = TfidfVectorizer::from_state(VectorizerState {
            max_features: self.max_features,
            terms,
            idf,
            normalizer_version: NORMALIZER_VERSION,
        })?;
        Ok(())
    }

    /// Converts one document to a TF-IDF vector.
    ///
    /// Out-of-vocabulary tokens are ignored, so an empty or unknown document
    /// yields the zero vector.
    ///
    /// # Errors
    /// Returns [`TweetSentError::NotFitted`] before [`TfidfVectorizer::fit`].
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(TweetSentError::NotFitted("TfidfVectorizer"))?;

        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in self.tokenize(document) {
            if let Some(&col) = fitted.columns.get(&token) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = SparseVector::zeros(fitted.state.terms.len());
        for (col, count) in counts {
            vector.indices.push(col);
            vector.values.push(count * fitted.state.idf[col]);
        }

        let norm = vector.norm();
        if norm > 0.0 {
            for v in &mut vector.values {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    /// Converts many documents, in parallel, preserving order.
    pub fn transform_batch(&self, documents: &[String]) -> Result<Vec<SparseVector>> {
        documents.par_iter().map(|d| self.transform(d)).collect()
    }

    /// Fits on `documents`, then transforms them.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        self.transform_batch(documents)
    }
}
