//! Reading and writing the two training artifacts.
//!
//! Each artifact is a JSON document with a small header:
//!
//! ```json
//! {"format": "tweetsent-model", "version": 1, "n_features": 20000, "payload": {...}}
//! ```
//!
//! The header is validated before the payload is decoded, so swapping the
//! files or loading an artifact written by an incompatible release fails
//! with a specific error instead of a confusing decode error.
//!
//! [`save_artifacts`] stages both files next to their destinations and
//! renames them into place only once both are fully written, so a failed
//! run never leaves a new model beside an old vectorizer.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, TweetSentError};
use crate::logistic::{LogisticRegression, ModelState};
use crate::vectorizer::{TfidfVectorizer, VectorizerState};

pub const VECTORIZER_FORMAT: &str = "tweetsent-vectorizer";
pub const MODEL_FORMAT: &str = "tweetsent-model";
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Artifact<T> {
    format: String,
    version: u32,
    n_features: usize,
    payload: T,
}

fn encode_artifact<T: Serialize>(file: &mut File, format: &str, n_features: usize, payload: &T) -> Result<()> {
    let artifact = Artifact {
        format: format.to_string(),
        version: ARTIFACT_VERSION,
        n_features,
        payload,
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &artifact)?;
    writer.flush()?;
    Ok(())
}

fn write_artifact<T: Serialize>(path: &Path, format: &str, n_features: usize, payload: &T) -> Result<()> {
    encode_artifact(&mut File::create(path)?, format, n_features, payload)?;
    log::info!("wrote {} artifact to {}", format, path.display());
    Ok(())
}

/// Creates a temporary file in the directory of `path`, so that the final
/// rename stays on one filesystem.
fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

fn read_artifact<T: DeserializeOwned>(path: &Path, format: &str) -> Result<(usize, T)> {
    let reader = BufReader::new(File::open(path)?);
    let artifact: Artifact<serde_json::Value> = serde_json::from_reader(reader)?;

    if artifact.format != format {
        return Err(TweetSentError::ArtifactFormat {
            expected: format.to_string(),
            found: artifact.format,
        });
    }
    if artifact.version != ARTIFACT_VERSION {
        return Err(TweetSentError::ArtifactVersion {
            found: artifact.version,
            supported: ARTIFACT_VERSION,
        });
    }

    let payload = serde_json::from_value(artifact.payload)?;
    Ok((artifact.n_features, payload))
}

/// Writes a fitted vectorizer.
///
/// # Errors
/// Returns [`TweetSentError::NotFitted`] for an unfitted vectorizer, or an
/// I/O or JSON error.
pub fn save_vectorizer(vectorizer: &TfidfVectorizer, path: &Path) -> Result<()> {
    let state = vectorizer
        .state()
        .ok_or(TweetSentError::NotFitted("TfidfVectorizer"))?;
    write_artifact(path, VECTORIZER_FORMAT, state.terms.len(), state)
}

/// Reads a vectorizer artifact.
///
/// # Errors
/// Returns an error if the file is missing or corrupt, carries another
/// format tag or version, or its declared dimension disagrees with its
/// vocabulary.
pub fn load_vectorizer(path: &Path) -> Result<TfidfVectorizer> {
    let (n_features, state): (usize, VectorizerState) = read_artifact(path, VECTORIZER_FORMAT)?;
    if state.terms.len() != n_features {
        return Err(TweetSentError::DimensionMismatch {
            expected: n_features,
            got: state.terms.len(),
        });
    }
    TfidfVectorizer::from_state(state)
}

/// Writes a fitted model.
pub fn save_model(model: &LogisticRegression, path: &Path) -> Result<()> {
    let state = model
        .state()
        .ok_or(TweetSentError::NotFitted("LogisticRegression"))?;
    write_artifact(path, MODEL_FORMAT, state.weights.len(), state)
}

/// Writes a fitted model and its vectorizer as a pair.
///
/// Both artifacts are written to temporary files first and moved to
/// `model_path` and `vectorizer_path` only after both writes succeeded.
///
/// # Errors
/// Returns [`TweetSentError::NotFitted`] if either component is unfitted, or
/// an I/O or JSON error. On error neither destination is touched, except
/// when the final rename of the vectorizer itself fails.
pub fn save_artifacts(
    model: &LogisticRegression,
    vectorizer: &TfidfVectorizer,
    model_path: &Path,
    vectorizer_path: &Path,
) -> Result<()> {
    let model_state = model
        .state()
        .ok_or(TweetSentError::NotFitted("LogisticRegression"))?;
    let vectorizer_state = vectorizer
        .state()
        .ok_or(TweetSentError::NotFitted("TfidfVectorizer"))?;

    let mut model_file = staging_file(model_path)?;
    let mut vectorizer_file = staging_file(vectorizer_path)?;
    encode_artifact(
        model_file.as_file_mut(),
        MODEL_FORMAT,
        model_state.weights.len(),
        model_state,
    )?;
    encode_artifact(
        vectorizer_file.as_file_mut(),
        VECTORIZER_FORMAT,
        vectorizer_state.terms.len(),
        vectorizer_state,
    )?;

    model_file.persist(model_path).map_err(|e| e.error)?;
    vectorizer_file.persist(vectorizer_path).map_err(|e| e.error)?;
    log::info!(
        "wrote model to {} and vectorizer to {}",
        model_path.display(),
        vectorizer_path.display()
    );
    Ok(())
}

/// Reads a model artifact.
pub fn load_model(path: &Path) -> Result<LogisticRegression> {
    let (n_features, state): (usize, ModelState) = read_artifact(path, MODEL_FORMAT)?;
    if state.weights.len() != n_features {
        return Err(TweetSentError::DimensionMismatch {
            expected: n_features,
            got: state.weights.len(),
        });
    }
    Ok(LogisticRegression::from_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    use crate::normalizer::NORMALIZER_VERSION;

    fn fitted_vectorizer() -> TfidfVectorizer {
        TfidfVectorizer::from_state(VectorizerState {
            max_features: 100,
            terms: vec!["day".to_string(), "hate".to_string(), "love".to_string()],
            idf: vec![1.0, 1.5, 1.5],
            normalizer_version: NORMALIZER_VERSION,
        })
        .unwrap()
    }

    fn fitted_model() -> LogisticRegression {
        LogisticRegression::from_state(ModelState {
            weights: vec![0.1, -2.0, 2.0],
            intercept: 0.05,
            n_iter: 12,
        })
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let vectorizer_path = dir.path().join("tfidf_vectorizer.json");
        let model_path = dir.path().join("sentiment_model.json");

        let vectorizer = fitted_vectorizer();
        let model = fitted_model();
        save_vectorizer(&vectorizer, &vectorizer_path)?;
        save_model(&model, &model_path)?;

        let loaded_vectorizer = load_vectorizer(&vectorizer_path)?;
        let loaded_model = load_model(&model_path)?;
        assert_eq!(loaded_vectorizer.state(), vectorizer.state());
        assert_eq!(loaded_model.state(), model.state());

        for text in ["love day", "hate", "", "unknown"] {
            let before = model.predict(&vectorizer.transform(text)?)?;
            let after = loaded_model.predict(&loaded_vectorizer.transform(text)?)?;
            assert_eq!(before, after);
        }
        Ok(())
    }

    #[test]
    fn test_save_artifacts_pair() -> Result<()> {
        let dir = tempdir()?;
        let vectorizer_path = dir.path().join("tfidf_vectorizer.json");
        let model_path = dir.path().join("sentiment_model.json");

        save_artifacts(&fitted_model(), &fitted_vectorizer(), &model_path, &vectorizer_path)?;
        assert_eq!(load_model(&model_path)?.state(), fitted_model().state());
        assert_eq!(load_vectorizer(&vectorizer_path)?.state(), fitted_vectorizer().state());

        // Only the two artifacts remain; no staging files are left behind.
        assert_eq!(fs::read_dir(dir.path())?.count(), 2);
        Ok(())
    }

    #[test]
    fn test_save_artifacts_writes_nothing_on_failure() -> Result<()> {
        let dir = tempdir()?;
        let model_path = dir.path().join("sentiment_model.json");
        let vectorizer_path = dir.path().join("missing").join("tfidf_vectorizer.json");

        let result = save_artifacts(&fitted_model(), &fitted_vectorizer(), &model_path, &vectorizer_path);
        assert!(result.is_err());
        assert!(!model_path.exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);

        let result = save_artifacts(
            &fitted_model(),
            &TfidfVectorizer::default(),
            &model_path,
            &dir.path().join("tfidf_vectorizer.json"),
        );
        assert!(matches!(result, Err(TweetSentError::NotFitted(_))));
        assert!(!model_path.exists());
        Ok(())
    }

    #[test]
    fn test_swapped_artifacts_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let vectorizer_path = dir.path().join("tfidf_vectorizer.json");
        let model_path = dir.path().join("sentiment_model.json");
        save_vectorizer(&fitted_vectorizer(), &vectorizer_path)?;
        save_model(&fitted_model(), &model_path)?;

        assert!(matches!(
            load_model(&vectorizer_path),
            Err(TweetSentError::ArtifactFormat { .. })
        ));
        assert!(matches!(
            load_vectorizer(&model_path),
            Err(TweetSentError::ArtifactFormat { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unsupported_version() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sentiment_model.json");
        fs::write(
            &path,
            r#"{"format":"tweetsent-model","version":99,"n_features":1,"payload":{"weights":[1.0],"intercept":0.0,"n_iter":1}}"#,
        )?;
        assert!(matches!(
            load_model(&path),
            Err(TweetSentError::ArtifactVersion { found: 99, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_declared_dimension_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sentiment_model.json");
        fs::write(
            &path,
            r#"{"format":"tweetsent-model","version":1,"n_features":3,"payload":{"weights":[1.0],"intercept":0.0,"n_iter":1}}"#,
        )?;
        assert!(matches!(
            load_model(&path),
            Err(TweetSentError::DimensionMismatch { expected: 3, got: 1 })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_and_corrupt_files() -> Result<()> {
        let dir = tempdir()?;
        assert!(matches!(
            load_model(&dir.path().join("missing.json")),
            Err(TweetSentError::Io(_))
        ));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{not json")?;
        assert!(matches!(
            load_vectorizer(&corrupt),
            Err(TweetSentError::Json(_))
        ));
        Ok(())
    }

    #[test]
    fn test_save_unfitted() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("model.json");
        assert!(matches!(
            save_model(&LogisticRegression::default(), &path),
            Err(TweetSentError::NotFitted(_))
        ));
        assert!(matches!(
            save_vectorizer(&TfidfVectorizer::default(), &path),
            Err(TweetSentError::NotFitted(_))
        ));
        Ok(())
    }
}
