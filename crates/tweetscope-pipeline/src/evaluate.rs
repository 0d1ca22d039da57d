//! Sentiment classifier evaluation against the labeled training set.

use std::collections::BTreeMap;

use serde::Serialize;
use tweetscope_core::{CoreError, Record, Sentiment, SentimentExample};

use crate::classifier::SentimentClassifier;
use crate::labeler::{label_sentiment, LabelerOptions};

/// Counts indexed as `matrix[actual][predicted]` by sentiment code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix(pub [[usize; 2]; 2]);

impl ConfusionMatrix {
    fn add(&mut self, actual: Sentiment, predicted: Sentiment) {
        self.0[usize::from(actual.as_code())][usize::from(predicted.as_code())] += 1;
    }

    #[must_use]
    pub fn get(&self, actual: Sentiment, predicted: Sentiment) -> usize {
        self.0[usize::from(actual.as_code())][usize::from(predicted.as_code())]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Examples whose true label is this class.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Examples the classifier labeled.
    pub evaluated: usize,
    /// Examples whose classifier call failed; excluded from the metrics.
    pub failed: usize,
    pub accuracy: f64,
    pub per_class: BTreeMap<Sentiment, ClassMetrics>,
    pub confusion: ConfusionMatrix,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Score `(actual, predicted)` pairs.
#[must_use]
pub fn score(pairs: &[(Sentiment, Sentiment)], failed: usize) -> Evaluation {
    let mut confusion = ConfusionMatrix::default();
    for (actual, predicted) in pairs {
        confusion.add(*actual, *predicted);
    }

    let per_class = Sentiment::ALL
        .iter()
        .map(|&class| {
            let tp = confusion.get(class, class);
            let predicted: usize = Sentiment::ALL.iter().map(|&a| confusion.get(a, class)).sum();
            let support: usize = Sentiment::ALL.iter().map(|&p| confusion.get(class, p)).sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            (
                class,
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                },
            )
        })
        .collect();

    let correct: usize = Sentiment::ALL.iter().map(|&c| confusion.get(c, c)).sum();
    Evaluation {
        evaluated: pairs.len(),
        failed,
        accuracy: ratio(correct, confusion.total()),
        per_class,
        confusion,
    }
}

/// Run `classifier` over `examples` and score its predictions against their labels.
///
/// Examples go through the same bounded, time-limited labeler as the
/// annotation run.
///
/// # Errors
///
/// Returns [`CoreError`] only if a record invariant is violated internally.
pub async fn evaluate_sentiment<C>(
    classifier: &C,
    examples: &[SentimentExample],
    options: &LabelerOptions,
) -> Result<Evaluation, CoreError>
where
    C: SentimentClassifier + ?Sized,
{
    let mut records = examples
        .iter()
        .map(|ex| {
            let mut record = Record::new(ex.tweet.clone(), 0, 0);
            record.set_clean_text(ex.clean_text.clone())?;
            Ok(record)
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let failures = label_sentiment(classifier, &mut records, options).await?;

    let pairs: Vec<(Sentiment, Sentiment)> = examples
        .iter()
        .zip(&records)
        .filter_map(|(ex, record)| record.predicted_sentiment().map(|p| (ex.label, p)))
        .collect();

    let evaluation = score(&pairs, failures.len());
    tracing::info!(
        evaluated = evaluation.evaluated,
        failed = evaluation.failed,
        accuracy = evaluation.accuracy,
        "sentiment evaluation finished"
    );
    Ok(evaluation)
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<10} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1", "support")?;
        for (class, m) in &self.per_class {
            writeln!(
                f,
                "{:<10} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                class.to_string(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f, "\naccuracy: {:.3} over {} examples", self.accuracy, self.evaluated)?;
        if self.failed > 0 {
            writeln!(f, "failed:   {}", self.failed)?;
        }
        writeln!(f, "\nconfusion (rows actual, columns predicted):")?;
        writeln!(f, "{:<10} {:>9} {:>9}", "", "Negative", "Positive")?;
        for actual in Sentiment::ALL {
            writeln!(
                f,
                "{:<10} {:>9} {:>9}",
                actual.to_string(),
                self.confusion.get(actual, Sentiment::Negative),
                self.confusion.get(actual, Sentiment::Positive)
            )?;
        }
        Ok(())
    }
}
