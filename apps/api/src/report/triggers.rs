//! Food → heartburn correlation.
//!
//! For each food label eaten in the period, looks at the heartburn severity logged on the
//! days it was eaten:
//!
//! score = 0.7 × (mean severity on those days / 10) + 0.3 × (share of those days with heartburn)
//!
//! Days without a check-in count as severity 0.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::records::{FoodEntry, HealthEntry};

pub const MIN_OCCURRENCES: usize = 2;
pub const MAX_TRIGGERS: usize = 10;

const SEVERITY_WEIGHT: f64 = 0.7;
const FREQUENCY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerScore {
    pub label: String,
    pub occurrences: usize,
    pub heartburn_days: usize,
    pub mean_severity: f64,
    pub score: f64,
}

/// Ranked trigger candidates: at least `MIN_OCCURRENCES` entries, score desc, then
/// occurrences desc, then label, capped at `MAX_TRIGGERS`.
pub fn top_triggers(health: &[HealthEntry], food: &[FoodEntry]) -> Vec<TriggerScore> {
    let mut severity_by_day: HashMap<NaiveDate, i32> = HashMap::new();
    for entry in health {
        let severity = entry.heartburn_severity.unwrap_or(0).clamp(0, 10);
        let slot = severity_by_day.entry(entry.date).or_insert(0);
        *slot = (*slot).max(severity);
    }

    let mut by_label: HashMap<String, (usize, BTreeSet<NaiveDate>)> = HashMap::new();
    for entry in food {
        let label = entry.food_name.trim().to_lowercase();
        if label.is_empty() {
            continue;
        }
        let slot = by_label.entry(label).or_default();
        slot.0 += 1;
        slot.1.insert(entry.date);
    }

    let mut scores: Vec<TriggerScore> = by_label
        .into_iter()
        .filter(|(_, (occurrences, _))| *occurrences >= MIN_OCCURRENCES)
        .map(|(label, (occurrences, days))| {
            let severities: Vec<i32> = days
                .iter()
                .map(|d| severity_by_day.get(d).copied().unwrap_or(0))
                .collect();
            let heartburn_days = severities.iter().filter(|s| **s > 0).count();
            let mean_severity =
                severities.iter().map(|s| f64::from(*s)).sum::<f64>() / severities.len() as f64;
            let rate = heartburn_days as f64 / severities.len() as f64;
            let score = (SEVERITY_WEIGHT * mean_severity / 10.0 + FREQUENCY_WEIGHT * rate)
                .clamp(0.0, 1.0);
            TriggerScore {
                label,
                occurrences,
                heartburn_days,
                mean_severity,
                score,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| a.label.cmp(&b.label))
    });
    scores.truncate(MAX_TRIGGERS);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::fixtures::*;
    use uuid::Uuid;

    #[test]
    fn test_single_occurrence_excluded() {
        let user = Uuid::new_v4();
        let health = vec![health_entry(user, day(1), Some(8))];
        let food = vec![food_entry(user, day(1), "chili")];
        assert!(top_triggers(&health, &food).is_empty());
    }

    #[test]
    fn test_score_orders_by_severity_correlation() {
        let user = Uuid::new_v4();
        let health = vec![
            health_entry(user, day(1), Some(8)),
            health_entry(user, day(2), Some(6)),
            health_entry(user, day(3), Some(0)),
            health_entry(user, day(4), None),
        ];
        let food = vec![
            food_entry(user, day(1), "Coffee"),
            food_entry(user, day(2), "coffee"),
            food_entry(user, day(3), "oatmeal"),
            food_entry(user, day(4), "oatmeal"),
        ];

        let triggers = top_triggers(&health, &food);
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[0].label, "coffee");
        assert_eq!(triggers[0].heartburn_days, 2);
        // 0.7 * 0.7 + 0.3 * 1.0
        assert!((triggers[0].score - 0.79).abs() < 1e-9);
        assert_eq!(triggers[1].label, "oatmeal");
        assert_eq!(triggers[1].score, 0.0);
    }

    #[test]
    fn test_ties_broken_by_occurrences() {
        let user = Uuid::new_v4();
        let health = vec![health_entry(user, day(1), Some(5))];
        // Both eaten only on day 1, so both score the same.
        let food = vec![
            food_entry(user, day(1), "tomato"),
            food_entry(user, day(1), "tomato"),
            food_entry(user, day(1), "onion"),
            food_entry(user, day(1), "onion"),
            food_entry(user, day(1), "onion"),
        ];
        let triggers = top_triggers(&health, &food);
        assert_eq!(triggers[0].label, "onion");
        assert_eq!(triggers[0].occurrences, 3);
        assert_eq!(triggers[1].label, "tomato");
    }

    #[test]
    fn test_capped_at_ten() {
        let user = Uuid::new_v4();
        let health = vec![health_entry(user, day(1), Some(3))];
        let food: Vec<_> = (0..12)
            .flat_map(|i| {
                let name = format!("food {i:02}");
                vec![food_entry(user, day(1), &name), food_entry(user, day(1), &name)]
            })
            .collect();
        let triggers = top_triggers(&health, &food);
        assert_eq!(triggers.len(), MAX_TRIGGERS);
        assert_eq!(triggers[0].label, "food 00");
    }
}
