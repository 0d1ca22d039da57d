//! Persisting the annotated table, and reading it back for reports.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tweetscope_core::{AnnotatedRecord, Sentiment, TopicId};

use crate::error::{LoadError, WriteError};

/// Output columns, in order.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "text",
    "favorite_count",
    "retweets_count",
    "clean_text",
    "predicted_sentiment",
    "predicted_emotion",
    "topic",
];

#[derive(Serialize)]
struct OutputRow<'a> {
    text: &'a str,
    favorite_count: i64,
    retweets_count: i64,
    clean_text: &'a str,
    predicted_sentiment: u8,
    predicted_emotion: &'a str,
    topic: i32,
}

impl<'a> From<&'a AnnotatedRecord> for OutputRow<'a> {
    fn from(record: &'a AnnotatedRecord) -> Self {
        Self {
            text: &record.text,
            favorite_count: record.favorite_count,
            retweets_count: record.retweets_count,
            clean_text: &record.clean_text,
            predicted_sentiment: record.predicted_sentiment.as_code(),
            predicted_emotion: &record.predicted_emotion,
            topic: record.topic.get(),
        }
    }
}

#[derive(Deserialize)]
struct InputRow {
    text: String,
    favorite_count: i64,
    retweets_count: i64,
    clean_text: String,
    predicted_sentiment: i64,
    predicted_emotion: String,
    topic: i64,
}

/// A fully written table waiting in a temporary file beside its destination.
///
/// Dropping it without [`StagedTable::commit`] removes the temporary file and
/// leaves the destination untouched.
#[derive(Debug)]
pub struct StagedTable {
    temp: NamedTempFile,
    path: PathBuf,
    records: usize,
}

impl StagedTable {
    /// Final destination of the table.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the staged table into place, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Io`] if the rename fails.
    pub fn commit(self) -> Result<(), WriteError> {
        let Self {
            temp,
            path,
            records,
        } = self;
        temp.persist(&path).map_err(|e| WriteError::Io {
            path: path.clone(),
            source: e.error,
        })?;
        tracing::info!(path = %path.display(), records, "annotated table written");
        Ok(())
    }
}

/// Encode `records` as CSV into a temporary file in the directory of `path`.
///
/// Nothing is visible at `path` until the returned table is committed.
///
/// # Errors
///
/// Returns [`WriteError::Io`] if the destination directory is unwritable and
/// [`WriteError::Csv`] if encoding fails.
pub fn stage_records(path: &Path, records: &[AnnotatedRecord]) -> Result<StagedTable, WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source: csv::Error| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(temp);
    // An empty table still gets its header row.
    if records.is_empty() {
        writer.write_record(OUTPUT_COLUMNS).map_err(csv_err)?;
    }
    for record in records {
        writer.serialize(OutputRow::from(record)).map_err(csv_err)?;
    }
    let mut temp = writer
        .into_inner()
        .map_err(|e| io_err(e.into_error()))?;
    temp.flush().map_err(io_err)?;

    Ok(StagedTable {
        temp,
        path: path.to_path_buf(),
        records: records.len(),
    })
}

/// Write `records` as CSV to `path`, replacing any existing file atomically.
///
/// # Errors
///
/// See [`stage_records`] and [`StagedTable::commit`].
pub fn write_records(path: &Path, records: &[AnnotatedRecord]) -> Result<(), WriteError> {
    stage_records(path, records)?.commit()
}

/// Read a table written by [`write_records`].
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be opened and
/// [`LoadError::Parse`] naming the row for malformed content.
pub fn read_annotated(path: &Path) -> Result<Vec<AnnotatedRecord>, LoadError> {
    let parse_err = |reason: String| LoadError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let mut reader = csv::Reader::from_path(path).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => parse_err(format!("{other:?}")),
    })?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<InputRow>().enumerate() {
        let row = row.map_err(|e| parse_err(format!("row {index}: {e}")))?;
        let predicted_sentiment = Sentiment::from_code(row.predicted_sentiment)
            .map_err(|e| parse_err(format!("row {index}: {e}")))?;
        let topic =
            TopicId::new(row.topic).map_err(|e| parse_err(format!("row {index}: {e}")))?;
        records.push(AnnotatedRecord {
            text: row.text,
            favorite_count: row.favorite_count,
            retweets_count: row.retweets_count,
            clean_text: row.clean_text,
            predicted_sentiment,
            predicted_emotion: row.predicted_emotion,
            topic,
        });
    }
    tracing::debug!(path = %path.display(), records = records.len(), "annotated table read");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn annotated(text: &str, sentiment: Sentiment, topic: i64) -> AnnotatedRecord {
        AnnotatedRecord {
            text: text.to_string(),
            favorite_count: 2,
            retweets_count: 1,
            clean_text: text.to_lowercase(),
            predicted_sentiment: sentiment,
            predicted_emotion: "joy".to_string(),
            topic: TopicId::new(topic).unwrap(),
        }
    }

    #[test]
    fn header_and_sentiment_codes_are_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_records(
            &path,
            &[
                annotated("Great, thanks", Sentiment::Positive, 0),
                annotated("Awful line", Sentiment::Negative, -1),
            ],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "text,favorite_count,retweets_count,clean_text,predicted_sentiment,predicted_emotion,topic"
        );
        assert_eq!(lines.next().unwrap(), "\"Great, thanks\",2,1,\"great, thanks\",1,joy,0");
        assert_eq!(lines.next().unwrap(), "Awful line,2,1,awful line,0,joy,-1");
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        write_records(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap().trim_end(),
            OUTPUT_COLUMNS.join(",")
        );
        assert!(read_annotated(&path).unwrap().is_empty());
    }

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale").unwrap();
        write_records(&path, &[annotated("fresh", Sentiment::Positive, 4)]).unwrap();

        let read = read_annotated(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].text, "fresh");
        assert_eq!(read[0].topic.get(), 4);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_records(&path, &[]).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }

    #[test]
    fn dropped_stage_leaves_destination_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous").unwrap();

        let staged = stage_records(&path, &[annotated("new", Sentiment::Positive, 0)]).unwrap();
        assert_eq!(staged.path(), path);
        drop(staged);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn read_rejects_bad_sentiment_code() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "text,favorite_count,retweets_count,clean_text,predicted_sentiment,predicted_emotion,topic\nx,0,0,x,7,joy,0\n",
        )
        .unwrap();
        let err = read_annotated(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
