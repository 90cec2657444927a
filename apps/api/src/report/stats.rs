use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean/min/max over `values`. None when there are no values.
pub fn summarize<I>(values: I) -> Option<NumericSummary>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    if count == 0 {
        return None;
    }
    Some(NumericSummary {
        count,
        mean: sum / count as f64,
        min,
        max,
    })
}

/// Occurrences per label, most frequent first, ties alphabetical.
/// Labels are trimmed and lowercased; blank labels are ignored.
pub fn frequency_counts<'a, I>(labels: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            continue;
        }
        *counts.entry(label).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
