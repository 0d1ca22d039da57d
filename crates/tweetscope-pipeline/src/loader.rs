//! Input readers for the raw tweet table and the two labeled example sets.
//!
//! Every source is first read into a [`Table`] of loosely typed cells, whatever
//! its on-disk format, and then projected onto the columns the caller needs.
//! The format is picked from the file extension.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tweetscope_core::{EmotionExample, Record, Sentiment, SentimentExample};

use crate::error::LoadError;
use crate::normalize::clean;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

/// A source file read into memory, column names plus rows in file order.
#[derive(Debug)]
struct Table {
    path: PathBuf,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows[row].get(col).unwrap_or(&Cell::Missing)
    }

    fn text(&self, row: usize, col: usize) -> String {
        match self.cell(row, col) {
            Cell::Text(s) => s.clone(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Missing => String::new(),
        }
    }

    /// Integer cell. Missing values come back as `None`.
    fn integer(&self, row: usize, col: usize) -> Result<Option<i64>, LoadError> {
        let parse_err = |raw: &str| LoadError::Parse {
            path: self.path.clone(),
            reason: format!(
                "row {}: column `{}` is not an integer: {raw:?}",
                row + 1,
                self.columns[col]
            ),
        };
        match self.cell(row, col) {
            Cell::Int(v) => Ok(Some(*v)),
            Cell::Float(v) => float_to_int(*v).map(Some).ok_or_else(|| parse_err(&v.to_string())),
            Cell::Missing => Ok(None),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(Some(v));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(float_to_int)
                    .map(Some)
                    .ok_or_else(|| parse_err(trimmed))
            }
        }
    }
}

/// pandas stores integer columns with gaps as floats (`12.0`).
#[allow(clippy::cast_possible_truncation)]
fn float_to_int(v: f64) -> Option<i64> {
    #[allow(clippy::cast_precision_loss)]
    let in_range = v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64;
    in_range.then_some(v as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    JsonLines,
    Pickle,
}

fn detect_format(path: &Path) -> Result<Format, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(Format::Csv),
        Some("jsonl" | "ndjson") => Ok(Format::JsonLines),
        Some("p" | "pkl" | "pickle") => Ok(Format::Pickle),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_table(path: &Path) -> Result<Table, LoadError> {
    let table = match detect_format(path)? {
        Format::Csv => read_csv(path)?,
        Format::JsonLines => read_json_lines(path)?,
        Format::Pickle => read_pickle(path)?,
    };
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "read input table"
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(open(path)?);
    let csv_err = |e: csv::Error| LoadError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Missing
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table {
        path: path.to_path_buf(),
        columns,
        rows,
    })
}

fn json_cell(value: serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Missing,
        serde_json::Value::String(s) => Cell::Text(s),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Cell::Int)
            .or_else(|| n.as_f64().map(Cell::Float))
            .unwrap_or(Cell::Missing),
        other => Cell::Text(other.to_string()),
    }
}

fn read_json_lines(path: &Path) -> Result<Table, LoadError> {
    let reader = BufReader::new(open(path)?);
    let mut objects = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("line {}: {e}", idx + 1),
            })?;
        let serde_json::Value::Object(map) = value else {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("line {}: expected a JSON object", idx + 1),
            });
        };
        objects.push(map.into_iter().map(|(k, v)| (k, json_cell(v))).collect());
    }
    Ok(rows_to_table(path, objects))
}

/// Build a table from row maps, taking columns in first-seen order.
fn rows_to_table(path: &Path, objects: Vec<Vec<(String, Cell)>>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for (key, _) in object {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let rows = objects
        .into_iter()
        .map(|object| {
            let mut row = vec![Cell::Missing; columns.len()];
            for (key, cell) in object {
                if let Some(idx) = columns.iter().position(|c| *c == key) {
                    row[idx] = cell;
                }
            }
            row
        })
        .collect();
    Table {
        path: path.to_path_buf(),
        columns,
        rows,
    }
}

fn pickle_cell(value: serde_pickle::Value) -> Cell {
    use serde_pickle::Value;
    match value {
        Value::None => Cell::Missing,
        Value::I64(v) => Cell::Int(v),
        Value::F64(v) if v.is_nan() => Cell::Missing,
        Value::F64(v) => Cell::Float(v),
        Value::Bool(b) => Cell::Int(i64::from(b)),
        Value::String(s) => Cell::Text(s),
        Value::Bytes(b) => Cell::Text(String::from_utf8_lossy(&b).into_owned()),
        other => Cell::Text(format!("{other:?}")),
    }
}

fn pickle_key(key: &serde_pickle::HashableValue) -> Option<String> {
    match key {
        serde_pickle::HashableValue::String(s) => Some(s.clone()),
        serde_pickle::HashableValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}

/// Read a pickled table.
///
/// Accepts a list of row dicts (`df.to_dict("records")`), a dict of column
/// lists (`df.to_dict("list")`), or a dict of index-keyed column dicts
/// (`df.to_dict()`). A pickled `DataFrame` object itself cannot be decoded
/// outside Python.
fn read_pickle(path: &Path) -> Result<Table, LoadError> {
    use serde_pickle::Value;

    let parse_err = |reason: String| LoadError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let value = serde_pickle::value_from_reader(
        BufReader::new(open(path)?),
        serde_pickle::DeOptions::new(),
    )
    .map_err(|e| {
        parse_err(format!(
            "not a plain pickled table ({e}); export with df.to_dict(\"list\") first"
        ))
    })?;

    match value {
        Value::List(items) | Value::Tuple(items) => {
            let mut objects = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                let Value::Dict(map) = item else {
                    return Err(parse_err(format!("row {}: expected a dict", idx + 1)));
                };
                objects.push(
                    map.into_iter()
                        .filter_map(|(k, v)| pickle_key(&k).map(|k| (k, pickle_cell(v))))
                        .collect(),
                );
            }
            Ok(rows_to_table(path, objects))
        }
        Value::Dict(map) => {
            let mut columns = Vec::with_capacity(map.len());
            let mut data: Vec<Vec<Cell>> = Vec::with_capacity(map.len());
            for (key, column) in map {
                let Some(name) = pickle_key(&key) else {
                    continue;
                };
                let cells: Vec<Cell> = match column {
                    Value::List(values) | Value::Tuple(values) => {
                        values.into_iter().map(pickle_cell).collect()
                    }
                    Value::Dict(by_index) => by_index.into_values().map(pickle_cell).collect(),
                    _ => {
                        return Err(parse_err(format!(
                            "column `{name}` is not a list or dict"
                        )))
                    }
                };
                columns.push(name);
                data.push(cells);
            }
            let len = data.first().map_or(0, Vec::len);
            if let Some(pos) = data.iter().position(|c| c.len() != len) {
                return Err(parse_err(format!(
                    "column `{}` has {} values, expected {len}",
                    columns[pos],
                    data[pos].len()
                )));
            }
            let mut rows: Vec<Vec<Cell>> = vec![Vec::with_capacity(columns.len()); len];
            for column in data {
                for (row, cell) in rows.iter_mut().zip(column) {
                    row.push(cell);
                }
            }
            Ok(Table {
                path: path.to_path_buf(),
                columns,
                rows,
            })
        }
        other => Err(parse_err(format!(
            "expected a list of rows or a dict of columns, found {other:?}"
        ))),
    }
}

/// Load the raw tweet table: `text`, `favorite_count`, `retweets_count`.
///
/// Missing engagement values are read as `0`. Records are returned in file
/// order with no derived fields set.
///
/// # Errors
///
/// Returns [`LoadError`] if the file is unreadable, in an unknown format, or
/// lacks a required column.
pub fn load_raw_tweets(path: &Path) -> Result<Vec<Record>, LoadError> {
    let table = read_table(path)?;
    let text = table.column("text")?;
    let favorites = table.column("favorite_count")?;
    let retweets = table.column("retweets_count")?;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        records.push(Record::new(
            table.text(row, text),
            table.integer(row, favorites)?.unwrap_or(0),
            table.integer(row, retweets)?.unwrap_or(0),
        ));
    }
    tracing::info!(path = %path.display(), records = records.len(), "loaded raw tweets");
    Ok(records)
}

/// Load the emotion example set (`content` column), cleaned.
///
/// # Errors
///
/// Returns [`LoadError`] if the file is unreadable or lacks `content`.
pub fn load_emotion_examples(path: &Path) -> Result<Vec<EmotionExample>, LoadError> {
    let table = read_table(path)?;
    let content = table.column("content")?;
    let examples: Vec<EmotionExample> = (0..table.rows.len())
        .map(|row| {
            let content = table.text(row, content);
            EmotionExample {
                clean_text: clean(&content),
                content,
            }
        })
        .collect();
    tracing::info!(path = %path.display(), examples = examples.len(), "loaded emotion examples");
    Ok(examples)
}

/// Load the sentiment example set (`tweet`, `polarity`), cleaned and labeled.
///
/// Polarity `4` maps to [`Sentiment::Positive`]; every other value to
/// [`Sentiment::Negative`].
///
/// # Errors
///
/// Returns [`LoadError`] if the file is unreadable, lacks a column, or a row
/// has no integer polarity.
pub fn load_sentiment_examples(path: &Path) -> Result<Vec<SentimentExample>, LoadError> {
    let table = read_table(path)?;
    let tweet = table.column("tweet")?;
    let polarity_col = table.column("polarity")?;

    let mut examples = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let polarity = table
            .integer(row, polarity_col)?
            .ok_or_else(|| LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("row {}: polarity is empty", row + 1),
            })?;
        let tweet = table.text(row, tweet);
        examples.push(SentimentExample {
            clean_text: clean(&tweet),
            tweet,
            polarity,
            label: Sentiment::from_polarity(polarity),
        });
    }
    tracing::info!(path = %path.display(), examples = examples.len(), "loaded sentiment examples");
    Ok(examples)
}

/// Locations of the three input sources.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub raw_tweets: PathBuf,
    pub emotion_examples: PathBuf,
    pub sentiment_examples: PathBuf,
}

/// Everything the loader produced, in one value.
#[derive(Debug)]
pub struct LoadedSources {
    pub tweets: Vec<Record>,
    pub emotion_examples: Vec<EmotionExample>,
    pub sentiment_examples: Vec<SentimentExample>,
}

/// Load all three sources.
///
/// # Errors
///
/// Returns the first [`LoadError`] encountered.
pub fn load_sources(paths: &SourcePaths) -> Result<LoadedSources, LoadError> {
    Ok(LoadedSources {
        emotion_examples: load_emotion_examples(&paths.emotion_examples)?,
        sentiment_examples: load_sentiment_examples(&paths.sentiment_examples)?,
        tweets: load_raw_tweets(&paths.raw_tweets)?,
    })
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
