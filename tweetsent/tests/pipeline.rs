use std::io::Write;

use tempfile::{tempdir, NamedTempFile};

use tweetsent::config::TrainingConfig;
use tweetsent::corpus::{self, Sentiment};
use tweetsent::normalizer::Normalizer;
use tweetsent::trainer::Trainer;
use tweetsent::{Predictor, Result};

const ROWS: &[(u8, &str)] = &[
    (4, "I LOVE my new phone!!! http://bit.ly/abc"),
    (4, "@anna love you, see you tomorrow :)"),
    (4, "Such a great sunny morning"),
    (4, "Happy birthday @bob, have a great one"),
    (4, "love this song so much"),
    (4, "great game tonight, awesome win"),
    (0, "I hate traffic. http://t.co/xyz"),
    (0, "@carl so sad you left :("),
    (0, "Worst headache ever, hate this"),
    (0, "My phone broke again... sad"),
    (0, "hate rainy mondays"),
    (0, "terrible game, awful loss"),
    (2, "The bus arrives at noon"),
];

fn dataset() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file for dataset");
    for _ in 0..5 {
        for (i, (code, text)) in ROWS.iter().enumerate() {
            writeln!(
                file,
                "\"{}\",\"{}\",\"Mon Apr 06 22:19:45 PDT 2009\",\"NO_QUERY\",\"user{}\",\"{}\"",
                code, i, i, text
            )
            .expect("Failed to write row");
        }
    }
    file
}

#[test]
fn test_corpus_has_no_neutral_examples() -> Result<()> {
    let file = dataset();
    let examples = corpus::load_corpus(file.path(), &Normalizer::new())?;
    assert_eq!(examples.len(), 60);
    assert!(examples
        .iter()
        .all(|e| matches!(e.sentiment, Sentiment::Positive | Sentiment::Negative)));

    let summary = corpus::summarize(&examples);
    assert_eq!(summary.positive, 30);
    assert_eq!(summary.positive_percentage, 50.0);
    Ok(())
}

#[test]
fn test_train_save_load_predict() -> Result<()> {
    let file = dataset();
    let dir = tempdir()?;
    let model_path = dir.path().join("sentiment_model.json");
    let vectorizer_path = dir.path().join("tfidf_vectorizer.json");

    let trainer = Trainer::new(TrainingConfig::default())?;
    let report = trainer.train(file.path(), &model_path, &vectorizer_path)?;
    assert_eq!(report.train_size, 48);
    assert_eq!(report.test_size, 12);

    let predictor = Predictor::load(&model_path, &vectorizer_path)?;
    assert_eq!(
        predictor.predict("I LOVE this!!! http://x.co @friend")?,
        Sentiment::Positive
    );
    assert_eq!(predictor.predict("I hate this")?, Sentiment::Negative);

    // Empty input still yields a label, and always the same one.
    let empty = predictor.predict("")?;
    assert_eq!(predictor.predict("")?, empty);
    assert_eq!(predictor.predict("   !!! @nobody")?, empty);
    Ok(())
}

#[test]
fn test_round_trip_matches_in_memory_predictor() -> Result<()> {
    let file = dataset();
    let dir = tempdir()?;
    let model_path = dir.path().join("sentiment_model.json");
    let vectorizer_path = dir.path().join("tfidf_vectorizer.json");

    let examples = corpus::load_corpus(file.path(), &Normalizer::new())?;
    let trainer = Trainer::new(TrainingConfig::default())?;
    let (in_memory, _) = trainer.fit(examples)?;
    tweetsent::store::save_model(in_memory.model(), &model_path)?;
    tweetsent::store::save_vectorizer(in_memory.vectorizer(), &vectorizer_path)?;
    let loaded = Predictor::load(&model_path, &vectorizer_path)?;

    let held_out: Vec<String> = [
        "love love love",
        "sad and terrible",
        "phone",
        "",
        "completely unknown words",
        "great but I hate mondays",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(
        in_memory.predict_batch(&held_out)?,
        loaded.predict_batch(&held_out)?
    );
    for text in &held_out {
        assert_eq!(
            in_memory.model().decision_function(&in_memory.featurize(text)?)?,
            loaded.model().decision_function(&loaded.featurize(text)?)?
        );
    }
    Ok(())
}
