use std::path::{Path, PathBuf};

use deckflow_core::sample::{SampleError, SampleRecord, sample_from_embedded, sample_from_file};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// A sample file read from disk: the raw text is kept for a later import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSample {
    pub file_name: String,
    pub text: String,
    pub record: SampleRecord,
}

/// Asks the user for a JSON file. `None` when the dialog is cancelled.
pub async fn pick_sample_file() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Choose sample card data")
        .add_filter("JSON", &["json"])
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Reads a JSON array file without blocking and takes its first record.
///
/// # Errors
///
/// `LoadError::Io` if the file cannot be read, otherwise the
/// `SampleError` describing why the content is not a usable array.
pub async fn read_sample_file(path: &Path) -> Result<LoadedSample, LoadError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let record = sample_from_file(&text).inspect_err(|err| {
        warn!(path = %path.display(), error = %err, "sample file rejected");
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(LoadedSample {
        file_name,
        text,
        record,
    })
}

/// Parses the sample embedded with an existing deck.
///
/// # Errors
///
/// `LoadError::Sample` for malformed JSON or a non-object value.
pub fn read_embedded_sample(text: &str) -> Result<SampleRecord, LoadError> {
    sample_from_embedded(text)
        .inspect_err(|err| warn!(error = %err, "embedded sample rejected"))
        .map_err(LoadError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn first_record_of_file_wins() {
        let file = temp_json(r#"[{"front":"犬"},{"front":"猫"}]"#);
        let loaded = read_sample_file(file.path()).await.unwrap();
        assert_eq!(loaded.record.get("front"), Some("犬"));
        assert!(loaded.file_name.ends_with(".json"));
        assert!(loaded.text.contains("猫"));
    }

    #[tokio::test]
    async fn file_errors_are_distinct() {
        let cases = [
            ("{not json", "Invalid JSON"),
            (r#"{"front":"犬"}"#, "JSON must be an array of card objects"),
            ("[]", "the array is empty"),
        ];
        for (content, expected) in cases {
            let file = temp_json(content);
            let err = read_sample_file(file.path()).await.unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{content}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sample_file(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn embedded_sample_must_be_an_object() {
        let record = read_embedded_sample(r#"{"front":"犬","n":1}"#).unwrap();
        assert_eq!(record.get("n"), Some("1"));
        assert!(read_embedded_sample("[1]").is_err());
        assert!(read_embedded_sample("{oops").is_err());
    }
}
