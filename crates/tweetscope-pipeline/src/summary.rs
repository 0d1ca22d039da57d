//! Aggregate report over an annotated table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tweetscope_core::{AnnotatedRecord, Sentiment, TopicId};

const TOP_TOPICS: usize = 10;
const TOP_TWEETS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Restrict the per-subset figures to one topic. Topic rankings always
    /// cover the whole table.
    pub topic: Option<TopicId>,
    /// How many emotions to list.
    pub top_n: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            topic: None,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: TopicId,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub count: usize,
    /// Share of the subset, 0-100. Zero for an empty subset.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSentiment {
    pub topic: TopicId,
    /// Mean of the `0`/`1` sentiment codes.
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularTweet {
    pub text: String,
    pub favorite_count: i64,
    pub retweets_count: i64,
    pub popularity: i64,
    pub sentiment: Sentiment,
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: usize,
    pub topic: Option<TopicId>,
    pub subset_records: usize,
    pub top_topics: Vec<TopicCount>,
    /// Keyed by label; both labels are always present.
    pub sentiment: BTreeMap<Sentiment, SentimentShare>,
    pub top_emotions: Vec<EmotionCount>,
    pub topic_sentiment: Vec<TopicSentiment>,
    pub popular_tweets: Vec<PopularTweet>,
    /// `None` when the subset is empty.
    pub popular_average_sentiment: Option<f64>,
}

#[allow(clippy::cast_precision_loss)]
fn mean_sentiment<'a>(records: impl IntoIterator<Item = &'a AnnotatedRecord>) -> Option<f64> {
    let (sum, n) = records.into_iter().fold((0u64, 0usize), |(sum, n), r| {
        (sum + u64::from(r.predicted_sentiment.as_code()), n + 1)
    });
    (n > 0).then(|| sum as f64 / n as f64)
}

fn top_topics(records: &[AnnotatedRecord]) -> Vec<TopicCount> {
    let mut counts: BTreeMap<TopicId, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.topic).or_default() += 1;
    }
    let mut ranked: Vec<TopicCount> = counts
        .into_iter()
        .map(|(topic, count)| TopicCount { topic, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.topic.cmp(&b.topic)));
    ranked.truncate(TOP_TOPICS);
    ranked
}

#[allow(clippy::cast_precision_loss)]
fn sentiment_distribution(subset: &[&AnnotatedRecord]) -> BTreeMap<Sentiment, SentimentShare> {
    let mut counts: BTreeMap<Sentiment, usize> =
        Sentiment::ALL.iter().map(|s| (*s, 0)).collect();
    for record in subset {
        *counts.entry(record.predicted_sentiment).or_default() += 1;
    }
    let total = subset.len();
    counts
        .into_iter()
        .map(|(sentiment, count)| {
            let percent = if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            };
            (sentiment, SentimentShare { count, percent })
        })
        .collect()
}

fn top_emotions(subset: &[&AnnotatedRecord], top_n: usize) -> Vec<EmotionCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in subset {
        *counts.entry(record.predicted_emotion.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<EmotionCount> = counts
        .into_iter()
        .map(|(emotion, count)| EmotionCount {
            emotion: emotion.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emotion.cmp(&b.emotion)));
    ranked.truncate(top_n);
    ranked
}

fn topic_sentiment(records: &[AnnotatedRecord]) -> Vec<TopicSentiment> {
    let mut by_topic: BTreeMap<TopicId, Vec<&AnnotatedRecord>> = BTreeMap::new();
    for record in records {
        by_topic.entry(record.topic).or_default().push(record);
    }
    let mut averages: Vec<TopicSentiment> = by_topic
        .into_iter()
        .filter_map(|(topic, members)| {
            mean_sentiment(members).map(|average| TopicSentiment { topic, average })
        })
        .collect();
    averages.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then(a.topic.cmp(&b.topic))
    });
    averages
}

fn popular_tweets(subset: &[&AnnotatedRecord]) -> Vec<PopularTweet> {
    let mut ranked: Vec<&AnnotatedRecord> = subset.to_vec();
    // Stable: equal popularity keeps table order.
    ranked.sort_by_key(|r| std::cmp::Reverse(r.popularity()));
    ranked
        .into_iter()
        .take(TOP_TWEETS)
        .map(|r| PopularTweet {
            text: r.text.clone(),
            favorite_count: r.favorite_count,
            retweets_count: r.retweets_count,
            popularity: r.popularity(),
            sentiment: r.predicted_sentiment,
            emotion: r.predicted_emotion.clone(),
        })
        .collect()
}

/// Compute the dashboard figures for `records`.
#[must_use]
pub fn summarize(records: &[AnnotatedRecord], options: &SummaryOptions) -> Summary {
    let subset: Vec<&AnnotatedRecord> = records
        .iter()
        .filter(|r| options.topic.is_none_or(|t| r.topic == t))
        .collect();

    let popular = popular_tweets(&subset);
    let popular_average_sentiment = (!popular.is_empty()).then(|| {
        let sum: u32 = popular.iter().map(|p| u32::from(p.sentiment.as_code())).sum();
        f64::from(sum) / f64::from(u32::try_from(popular.len()).unwrap_or(u32::MAX))
    });

    Summary {
        total_records: records.len(),
        topic: options.topic,
        subset_records: subset.len(),
        top_topics: top_topics(records),
        sentiment: sentiment_distribution(&subset),
        top_emotions: top_emotions(&subset, options.top_n),
        topic_sentiment: topic_sentiment(records),
        popular_tweets: popular,
        popular_average_sentiment,
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Records: {}", self.total_records)?;
        match self.topic {
            Some(topic) => writeln!(f, "Topic filter: {topic} ({} records)", self.subset_records)?,
            None => writeln!(f, "Topic filter: all")?,
        }

        writeln!(f, "\nMost discussed topics:")?;
        for t in &self.top_topics {
            writeln!(f, "  {:>5}  {}", t.topic.get(), t.count)?;
        }

        writeln!(f, "\nSentiment distribution:")?;
        for (sentiment, share) in &self.sentiment {
            writeln!(
                f,
                "  {:<8}  {:>6}  {:>6.2}%",
                sentiment.to_string(),
                share.count,
                share.percent
            )?;
        }

        writeln!(f, "\nTop emotions:")?;
        for e in &self.top_emotions {
            writeln!(f, "  {:<10}  {}", e.emotion, e.count)?;
        }

        writeln!(f, "\nAverage sentiment per topic:")?;
        for t in &self.topic_sentiment {
            writeln!(f, "  {:>5}  {:.2}", t.topic.get(), t.average)?;
        }

        writeln!(f, "\nMost popular tweets (likes + retweets):")?;
        if let Some(avg) = self.popular_average_sentiment {
            writeln!(f, "  average sentiment: {avg:.2}")?;
        }
        for t in &self.popular_tweets {
            writeln!(
                f,
                "  [{}] {} | emotion {} | likes {} | retweets {} | {}",
                t.popularity, t.text, t.emotion, t.favorite_count, t.retweets_count, t.sentiment
            )?;
        }
        Ok(())
    }
}
