//! Word-frequency tables behind the per-sentiment word clouds.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::WordCloudConfig;
use crate::corpus::{LabeledExample, Sentiment};
use crate::stopwords::is_stop_word;

/// One entry of a word-frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// `count` relative to the most frequent word, in (0, 1].
    pub weight: f64,
}

/// Picks up to `sample_size` cleaned texts of one sentiment with a seeded RNG.
///
/// When fewer texts are available, all of them are returned.
pub fn sample_texts<'a>(
    examples: &'a [LabeledExample],
    sentiment: Sentiment,
    sample_size: usize,
    seed: u64,
) -> Vec<&'a str> {
    let candidates: Vec<&str> = examples
        .iter()
        .filter(|e| e.sentiment == sentiment)
        .map(|e| e.clean_text.as_str())
        .collect();
    let amount = sample_size.min(candidates.len());

    let mut rng = StdRng::seed_from_u64(seed);
    index::sample(&mut rng, candidates.len(), amount)
        .into_iter()
        .map(|i| candidates[i])
        .collect()
}

/// Counts words across normalized texts.
///
/// Words shorter than two letters and stop words are skipped. The result is
/// ordered by descending count, then alphabetically, and holds at most
/// `max_words` entries.
pub fn word_frequencies<'a, I>(texts: I, max_words: usize) -> Vec<WordFrequency>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for text in texts {
        for word in text.split_whitespace() {
            if word.len() >= 2 && !is_stop_word(word) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_words);

    let max_count = ranked.first().map_or(1, |(_, c)| *c) as f64;
    ranked
        .into_iter()
        .map(|(word, count)| WordFrequency {
            word: word.to_string(),
            count,
            weight: count as f64 / max_count,
        })
        .collect()
}

/// Builds the word-frequency table of one sentiment.
pub fn sentiment_word_frequencies(
    examples: &[LabeledExample],
    sentiment: Sentiment,
    config: &WordCloudConfig,
) -> Vec<WordFrequency> {
    let sample = sample_texts(examples, sentiment, config.sample_size, config.seed);
    log::info!("sampled {} {} tweets", sample.len(), sentiment);
    word_frequencies(sample, config.max_words)
}
