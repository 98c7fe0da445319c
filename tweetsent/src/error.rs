use thiserror::Error;

/// Errors that can occur while loading data, training, or predicting.
#[derive(Error, Debug)]
pub enum TweetSentError {
    /// I/O operation error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dataset could not be parsed as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An artifact or config file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A dataset row does not follow the six-column layout.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// A dataset row carries a target code other than 0, 2 or 4.
    #[error("Unknown label code {code} at line {line}")]
    UnknownLabel { line: u64, code: i64 },

    /// The component was asked to transform or predict before being fitted.
    #[error("{0} has not been fitted yet")]
    NotFitted(&'static str),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A sparse vector with indices out of order or out of range.
    #[error("Invalid sparse vector: {0}")]
    InvalidVector(String),

    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Every training document was empty or made only of stop words.
    #[error("Empty vocabulary: documents contain no usable terms")]
    EmptyVocabulary,

    /// Logistic regression needs examples of both sentiments.
    #[error("Training set contains only {0} examples")]
    SingleClass(String),

    #[error("Unexpected artifact format: expected {expected:?}, found {found:?}")]
    ArtifactFormat { expected: String, found: String },

    #[error("Unsupported artifact version {found} (supported: {supported})")]
    ArtifactVersion { found: u32, supported: u32 },

    /// The vectorizer was fitted on text cleaned by a different normalizer.
    #[error("Normalizer version mismatch: artifact uses {artifact}, runtime uses {runtime}")]
    NormalizerVersion { artifact: u32, runtime: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TweetSentError>;
