pub mod config;
pub mod corpus;
pub mod error;
pub mod logistic;
pub mod metrics;
pub mod normalizer;
pub mod predictor;
pub mod stopwords;
pub mod store;
pub mod trainer;
pub mod vectorizer;
pub mod wordfreq;

pub use corpus::Sentiment;
pub use error::{Result, TweetSentError};
pub use predictor::Predictor;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn get_version() -> &'static str {
    VERSION
}
