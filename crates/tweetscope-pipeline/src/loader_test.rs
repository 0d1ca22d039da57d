use std::io::Write;

use serde::Serialize;
use tempfile::TempDir;

use super::*;

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(contents).unwrap();
    path
}

#[test]
fn loads_raw_tweets_from_csv_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "tweets.csv",
        b"id,text,favorite_count,retweets_count\n1,\"Hello, DMV\",3,1\n2,Second,,7\n3,Third,2.0,0\n",
    );
    let records = load_raw_tweets(&path).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].text(), "Hello, DMV");
    assert_eq!(records[0].favorite_count(), 3);
    assert_eq!(records[1].favorite_count(), 0);
    assert_eq!(records[1].retweets_count(), 7);
    assert_eq!(records[2].favorite_count(), 2);
    assert!(records.iter().all(|r| r.clean_text().is_none()));
}

#[test]
fn missing_column_is_reported_by_name() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "tweets.csv", b"text,favorite_count\nhi,1\n");
    let err = load_raw_tweets(&path).unwrap_err();
    assert!(
        matches!(err, LoadError::MissingColumn { ref column, .. } if column == "retweets_count"),
        "got {err:?}"
    );
}

#[test]
fn unreadable_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_raw_tweets(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "tweets.xlsx", b"");
    let err = load_raw_tweets(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }), "got {err:?}");
}

#[test]
fn non_integer_count_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "tweets.csv",
        b"text,favorite_count,retweets_count\nhi,lots,1\n",
    );
    let err = load_raw_tweets(&path).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got {err:?}");
}

#[test]
fn sentiment_examples_map_polarity() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "senti.csv",
        b"polarity,tweet\n4,I love it http://x.co\n0,I hate it\n2,meh\n",
    );
    let examples = load_sentiment_examples(&path).unwrap();
    let labels: Vec<Sentiment> = examples.iter().map(|e| e.label).collect();
    assert_eq!(
        labels,
        vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Negative]
    );
    assert_eq!(examples[0].clean_text, "i love it");
}

#[test]
fn sentiment_example_without_polarity_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "senti.csv", b"polarity,tweet\n,orphan\n");
    let err = load_sentiment_examples(&path).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got {err:?}");
}

#[test]
fn emotion_examples_strip_bom_and_clean() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "emo.csv", "\u{feff}content\nSO happy!!! #blessed\n".as_bytes());
    let examples = load_emotion_examples(&path).unwrap();
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].clean_text, "so happy");
}

#[test]
fn loads_raw_tweets_from_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "tweets.jsonl",
        b"{\"text\":\"one\",\"favorite_count\":1,\"retweets_count\":2}\n\n{\"text\":\"two\",\"favorite_count\":null,\"retweets_count\":5}\n",
    );
    let records = load_raw_tweets(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].text(), "two");
    assert_eq!(records[1].favorite_count(), 0);
    assert_eq!(records[1].retweets_count(), 5);
}

#[derive(Serialize)]
struct PickledRow<'a> {
    text: &'a str,
    favorite_count: i64,
    retweets_count: i64,
}

#[derive(Serialize)]
struct PickledColumns<'a> {
    text: Vec<&'a str>,
    favorite_count: Vec<i64>,
    retweets_count: Vec<i64>,
}

#[test]
fn loads_raw_tweets_from_pickled_rows() {
    let dir = TempDir::new().unwrap();
    let rows = vec![
        PickledRow {
            text: "first",
            favorite_count: 10,
            retweets_count: 1,
        },
        PickledRow {
            text: "second",
            favorite_count: 0,
            retweets_count: 4,
        },
    ];
    let bytes = serde_pickle::to_vec(&rows, serde_pickle::SerOptions::new()).unwrap();
    let path = write_file(&dir, "tweets.p", &bytes);
    let records = load_raw_tweets(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text(), "first");
    assert_eq!(records[0].favorite_count(), 10);
    assert_eq!(records[1].retweets_count(), 4);
}

#[test]
fn loads_raw_tweets_from_pickled_columns() {
    let dir = TempDir::new().unwrap();
    let columns = PickledColumns {
        text: vec!["a", "b", "c"],
        favorite_count: vec![1, 2, 3],
        retweets_count: vec![0, 0, 9],
    };
    let bytes = serde_pickle::to_vec(&columns, serde_pickle::SerOptions::new()).unwrap();
    let path = write_file(&dir, "tweets.pkl", &bytes);
    let records = load_raw_tweets(&path).unwrap();
    let texts: Vec<&str> = records.iter().map(Record::text).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
    assert_eq!(records[2].retweets_count(), 9);
}

#[test]
fn ragged_pickled_columns_are_rejected() {
    let dir = TempDir::new().unwrap();
    let columns = PickledColumns {
        text: vec!["a", "b"],
        favorite_count: vec![1],
        retweets_count: vec![0, 0],
    };
    let bytes = serde_pickle::to_vec(&columns, serde_pickle::SerOptions::new()).unwrap();
    let path = write_file(&dir, "tweets.pkl", &bytes);
    let err = load_raw_tweets(&path).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got {err:?}");
}

#[test]
fn load_sources_reads_all_three() {
    let dir = TempDir::new().unwrap();
    let paths = SourcePaths {
        raw_tweets: write_file(
            &dir,
            "t.csv",
            b"text,favorite_count,retweets_count\nhey,1,1\n",
        ),
        emotion_examples: write_file(&dir, "e.csv", b"content\nyay\n"),
        sentiment_examples: write_file(&dir, "s.csv", b"tweet,polarity\nok,4\n"),
    };
    let loaded = load_sources(&paths).unwrap();
    assert_eq!(loaded.tweets.len(), 1);
    assert_eq!(loaded.emotion_examples.len(), 1);
    assert_eq!(loaded.sentiment_examples[0].label, Sentiment::Positive);
}
