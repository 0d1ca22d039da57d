//! `summary` command handler.

use std::path::Path;

use tweetscope_core::TopicId;
use tweetscope_pipeline::{read_annotated, summarize, SummaryOptions};

/// Print the aggregate report for the annotated table at `input`.
///
/// # Errors
///
/// Returns an error if the table cannot be read or JSON encoding fails.
pub(crate) fn run_summary(
    input: &Path,
    topic: Option<TopicId>,
    top_n: usize,
    json: bool,
) -> anyhow::Result<()> {
    let records = read_annotated(input)?;
    let summary = summarize(&records, &SummaryOptions { topic, top_n });

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
