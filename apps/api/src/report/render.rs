//! Plain-text report layout: a header block, then one banner per section.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::records::SnapshotTables;
use crate::report::stats::{frequency_counts, summarize, NumericSummary};
use crate::report::template::{ReportSection, ReportTemplate};
use crate::report::triggers::top_triggers;
use crate::report::DateRange;

const RULE_HEAVY: &str = "========================================";
const RULE_LIGHT: &str = "----------------------------------------";
const NO_DATA: &str = "No data recorded for this period.";
const TOP_LABELS: usize = 10;

pub struct ReportInput<'a> {
    pub patient: &'a str,
    pub range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub template: &'a ReportTemplate,
    /// Rows already limited to `range`.
    pub data: &'a SnapshotTables,
}

pub fn render_report(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "HEALTH REPORT");
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "Patient: {}", input.patient);
    let _ = writeln!(out, "Period: {} to {}", input.range.from, input.range.to);
    let _ = writeln!(
        out,
        "Generated: {}",
        input.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out, "Template: {}", input.template.name);

    for section in &input.template.sections {
        out.push('\n');
        let _ = writeln!(out, "{RULE_LIGHT}");
        let _ = writeln!(out, "{}", section.title());
        let _ = writeln!(out, "{RULE_LIGHT}");
        let lines = section_lines(*section, input);
        if lines.is_empty() {
            let _ = writeln!(out, "{NO_DATA}");
        }
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

fn stat_line(label: &str, summary: Option<NumericSummary>, unit: &str) -> Option<String> {
    summary.map(|s| {
        format!(
            "{label}: avg {:.1}{unit}, min {}{unit}, max {}{unit} (n={})",
            s.mean, s.min, s.max, s.count
        )
    })
}

fn ints<'a, T: 'a>(
    rows: &'a [T],
    f: impl Fn(&T) -> Option<i32> + 'a,
) -> impl Iterator<Item = f64> + 'a {
    rows.iter().filter_map(move |r| f(r).map(f64::from))
}

fn floats<'a, T: 'a>(
    rows: &'a [T],
    f: impl Fn(&T) -> Option<f64> + 'a,
) -> impl Iterator<Item = f64> + 'a {
    rows.iter().filter_map(move |r| f(r))
}

fn frequency_line(label: &str, counts: Vec<(String, usize)>) -> Option<String> {
    if counts.is_empty() {
        return None;
    }
    let items: Vec<_> = counts
        .into_iter()
        .take(TOP_LABELS)
        .map(|(l, n)| format!("{l} ({n})"))
        .collect();
    Some(format!("{label}: {}", items.join(", ")))
}

/// Sums a per-day quantity and summarizes the daily totals.
fn daily_totals<T>(
    rows: &[T],
    date: impl Fn(&T) -> NaiveDate,
    value: impl Fn(&T) -> Option<f64>,
) -> Option<NumericSummary> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        if let Some(v) = value(row) {
            *totals.entry(date(row)).or_default() += v;
        }
    }
    summarize(totals.into_values())
}

fn section_lines(section: ReportSection, input: &ReportInput<'_>) -> Vec<String> {
    let d = input.data;
    let mut lines: Vec<Option<String>> = Vec::new();

    match section {
        ReportSection::Overview => {
            if d.health_entries.is_empty()
                && d.food_entries.is_empty()
                && d.activity_entries.is_empty()
            {
                return Vec::new();
            }
            let mut days: Vec<_> = d.health_entries.iter().map(|e| e.date).collect();
            days.sort();
            days.dedup();
            lines.push(Some(format!(
                "Days with check-ins: {} of {}",
                days.len(),
                input.range.days()
            )));
            lines.push(Some(format!("Meals logged: {}", d.food_entries.len())));
            lines.push(Some(format!(
                "Activity sessions logged: {}",
                d.activity_entries.len()
            )));
        }
        ReportSection::Vitals => {
            let v = &d.vitals;
            lines.push(stat_line("Systolic", summarize(ints(v, |e| e.systolic)), " mmHg"));
            lines.push(stat_line("Diastolic", summarize(ints(v, |e| e.diastolic)), " mmHg"));
            lines.push(stat_line("Heart rate", summarize(ints(v, |e| e.heart_rate)), " bpm"));
            lines.push(stat_line(
                "Temperature",
                summarize(floats(v, |e| e.temperature_c)),
                " C",
            ));
            lines.push(stat_line(
                "Oxygen saturation",
                summarize(floats(v, |e| e.oxygen_saturation)),
                "%",
            ));
            let weights = v
                .iter()
                .filter_map(|e| e.weight_kg)
                .chain(d.fitbit_weight.iter().map(|w| w.weight_kg));
            lines.push(stat_line("Weight", summarize(weights), " kg"));
        }
        ReportSection::Symptoms => {
            let h = &d.health_entries;
            lines.push(stat_line("Pain level", summarize(ints(h, |e| e.pain_level)), ""));
            lines.push(stat_line("Energy level", summarize(ints(h, |e| e.energy_level)), ""));
            lines.push(stat_line("Mood", summarize(ints(h, |e| e.mood)), ""));
            lines.push(stat_line("Sleep", summarize(floats(h, |e| e.sleep_hours)), " h"));
            lines.push(frequency_line(
                "Most reported symptoms",
                frequency_counts(h.iter().flat_map(|e| e.symptoms.iter().map(String::as_str))),
            ));
        }
        ReportSection::HeartburnTriggers => {
            let episodes: Vec<f64> = d
                .health_entries
                .iter()
                .filter_map(|e| e.heartburn_severity)
                .filter(|s| *s > 0)
                .map(f64::from)
                .collect();
            let triggers = top_triggers(&d.health_entries, &d.food_entries);
            if episodes.is_empty() && triggers.is_empty() {
                return Vec::new();
            }
            lines.push(Some(format!("Heartburn episodes: {}", episodes.len())));
            lines.push(stat_line("Severity", summarize(episodes), ""));
            if triggers.is_empty() {
                lines.push(Some("Top triggers: none with 2 or more occurrences".to_string()));
            } else {
                lines.push(Some("Top triggers:".to_string()));
                for (i, t) in triggers.iter().enumerate() {
                    lines.push(Some(format!(
                        "  {}. {} - score {:.2}, eaten {} times, heartburn on {} day(s), avg severity {:.1}",
                        i + 1,
                        t.label,
                        t.score,
                        t.occurrences,
                        t.heartburn_days,
                        t.mean_severity
                    )));
                }
            }
        }
        ReportSection::Nutrition => {
            let f = &d.food_entries;
            lines.push(stat_line(
                "Daily calories",
                daily_totals(f, |e| e.date, |e| e.calories),
                " kcal",
            ));
            lines.push(stat_line(
                "Daily protein",
                daily_totals(f, |e| e.date, |e| e.protein_g),
                " g",
            ));
            lines.push(stat_line(
                "Daily carbohydrates",
                daily_totals(f, |e| e.date, |e| e.carbs_g),
                " g",
            ));
            lines.push(stat_line("Daily fat", daily_totals(f, |e| e.date, |e| e.fat_g), " g"));
            lines.push(stat_line(
                "Daily water",
                daily_totals(&d.water_intake, |w| w.date, |w| Some(f64::from(w.amount_ml))),
                " ml",
            ));
            lines.push(frequency_line(
                "Most logged foods",
                frequency_counts(f.iter().map(|e| e.food_name.as_str())),
            ));
        }
        ReportSection::Activity => {
            let a = &d.activity_entries;
            if !a.is_empty() {
                let total: i32 = a.iter().filter_map(|e| e.duration_minutes).sum();
                lines.push(Some(format!("Sessions: {}, total {} min", a.len(), total)));
            }
            lines.push(stat_line(
                "Session length",
                summarize(ints(a, |e| e.duration_minutes)),
                " min",
            ));
            lines.push(frequency_line(
                "Activity types",
                frequency_counts(a.iter().map(|e| e.activity_type.as_str())),
            ));
            lines.push(stat_line(
                "Daily steps",
                summarize(ints(&d.fitbit_activity, |e| e.steps)),
                "",
            ));
            lines.push(stat_line(
                "Resting heart rate",
                summarize(ints(&d.fitbit_activity, |e| e.resting_heart_rate)),
                " bpm",
            ));
            lines.push(stat_line(
                "Sleep (Fitbit)",
                summarize(ints(&d.fitbit_sleep, |e| e.minutes_asleep)),
                " min",
            ));
        }
        ReportSection::Seizures => {
            let s = &d.seizure_entries;
            if s.is_empty() {
                return Vec::new();
            }
            lines.push(Some(format!("Seizures recorded: {}", s.len())));
            lines.push(stat_line(
                "Duration",
                summarize(ints(s, |e| e.duration_seconds)),
                " s",
            ));
            lines.push(stat_line("Severity", summarize(ints(s, |e| e.severity)), ""));
            lines.push(frequency_line(
                "Types",
                frequency_counts(s.iter().map(|e| e.seizure_type.as_str())),
            ));
            lines.push(frequency_line(
                "Reported triggers",
                frequency_counts(s.iter().flat_map(|e| e.triggers.iter().map(String::as_str))),
            ));
        }
        ReportSection::MentalHealth => {
            let m = &d.mental_health_entries;
            lines.push(stat_line("Mood score", summarize(ints(m, |e| e.mood_score)), ""));
            lines.push(stat_line("Anxiety", summarize(ints(m, |e| e.anxiety_level)), ""));
            lines.push(stat_line("Depression", summarize(ints(m, |e| e.depression_level)), ""));
            lines.push(stat_line("Stress", summarize(ints(m, |e| e.stress_level)), ""));
        }
        ReportSection::WomensHealth => {
            let m = &d.menstrual_entries;
            if !m.is_empty() {
                lines.push(Some(format!("Menstrual days logged: {}", m.len())));
            }
            lines.push(frequency_line(
                "Flow",
                frequency_counts(m.iter().filter_map(|e| e.flow_level.as_deref())),
            ));
            lines.push(frequency_line(
                "Cycle symptoms",
                frequency_counts(m.iter().flat_map(|e| e.symptoms.iter().map(String::as_str))),
            ));
            lines.push(stat_line(
                "Basal temperature",
                summarize(floats(&d.fertility_entries, |e| e.basal_temperature_c)),
                " C",
            ));
        }
        ReportSection::LabResults => {
            let mut labs: Vec<_> = d.lab_results.iter().collect();
            labs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.test_name.cmp(&b.test_name)));
            for lab in labs {
                let unit = lab
                    .unit
                    .as_deref()
                    .map(|u| format!(" {u}"))
                    .unwrap_or_default();
                let value = lab
                    .value
                    .map(|v| format!("{v}{unit}"))
                    .unwrap_or_else(|| "pending".to_string());
                let reference = match (lab.reference_low, lab.reference_high) {
                    (Some(lo), Some(hi)) => format!(" (ref {lo}-{hi})"),
                    (Some(lo), None) => format!(" (ref >= {lo})"),
                    (None, Some(hi)) => format!(" (ref <= {hi})"),
                    (None, None) => String::new(),
                };
                let flag = if lab.out_of_range() { " [OUT OF RANGE]" } else { "" };
                lines.push(Some(format!(
                    "{} {}: {value}{reference}{flag}",
                    lab.date, lab.test_name
                )));
            }
        }
    }

    lines.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::fixtures::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn range() -> DateRange {
        DateRange::new(day(1), day(31)).unwrap()
    }

    fn render(template: &ReportTemplate, data: &SnapshotTables) -> String {
        render_report(&ReportInput {
            patient: "Jayne",
            range: range(),
            generated_at: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
            template,
            data,
        })
    }

    #[test]
    fn test_header_and_banners() {
        let template = ReportTemplate::builtin("digestive").unwrap();
        let text = render(&template, &SnapshotTables::default());
        assert!(text.starts_with(RULE_HEAVY));
        assert!(text.contains("Patient: Jayne"));
        assert!(text.contains("Period: 2026-03-01 to 2026-03-31"));
        assert!(text.contains("\nHEARTBURN TRIGGERS\n"));
        assert!(text.contains("\nLAB RESULTS\n"));
        assert!(!text.contains("SEIZURES"));
        assert_eq!(text.matches(NO_DATA).count(), template.sections.len());
    }

    #[test]
    fn test_symptom_statistics_rendered() {
        let user = Uuid::new_v4();
        let mut a = health_entry(user, day(1), Some(4));
        a.pain_level = Some(2);
        let mut b = health_entry(user, day(2), None);
        b.pain_level = Some(6);
        let data = SnapshotTables {
            health_entries: vec![a, b],
            ..Default::default()
        };
        let template = ReportTemplate {
            name: "custom".to_string(),
            sections: vec![ReportSection::Symptoms],
        };
        let text = render(&template, &data);
        assert!(text.contains("Pain level: avg 4.0, min 2, max 6 (n=2)"));
        assert!(text.contains("Most reported symptoms: bloating (2)"));
    }

    #[test]
    fn test_trigger_list_rendered() {
        let user = Uuid::new_v4();
        let data = SnapshotTables {
            health_entries: vec![
                health_entry(user, day(1), Some(8)),
                health_entry(user, day(2), Some(6)),
            ],
            food_entries: vec![
                food_entry(user, day(1), "coffee"),
                food_entry(user, day(2), "coffee"),
            ],
            ..Default::default()
        };
        let template = ReportTemplate {
            name: "custom".to_string(),
            sections: vec![ReportSection::HeartburnTriggers],
        };
        let text = render(&template, &data);
        assert!(text.contains("Heartburn episodes: 2"));
        assert!(text.contains("1. coffee - score 0.79"));
    }

    #[test]
    fn test_out_of_range_lab_flagged() {
        let user = Uuid::new_v4();
        let data = SnapshotTables {
            lab_results: vec![lab_result(user, "glucose", 130.0)],
            ..Default::default()
        };
        let template = ReportTemplate {
            name: "custom".to_string(),
            sections: vec![ReportSection::LabResults],
        };
        let text = render(&template, &data);
        assert!(text.contains("2026-03-02 glucose: 130 mg/dL (ref 70-100) [OUT OF RANGE]"));
    }
}
