use serde::{Deserialize, Serialize};

use crate::models::tables::Table;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Overview,
    Vitals,
    Symptoms,
    HeartburnTriggers,
    Nutrition,
    Activity,
    Seizures,
    MentalHealth,
    WomensHealth,
    LabResults,
}

impl ReportSection {
    pub fn title(self) -> &'static str {
        match self {
            ReportSection::Overview => "OVERVIEW",
            ReportSection::Vitals => "VITAL SIGNS",
            ReportSection::Symptoms => "SYMPTOMS",
            ReportSection::HeartburnTriggers => "HEARTBURN TRIGGERS",
            ReportSection::Nutrition => "NUTRITION",
            ReportSection::Activity => "ACTIVITY",
            ReportSection::Seizures => "SEIZURES",
            ReportSection::MentalHealth => "MENTAL HEALTH",
            ReportSection::WomensHealth => "WOMEN'S HEALTH",
            ReportSection::LabResults => "LAB RESULTS",
        }
    }

    /// Tables the section reads.
    pub fn tables(self) -> &'static [Table] {
        match self {
            ReportSection::Overview => &[
                Table::HealthEntries,
                Table::FoodEntries,
                Table::ActivityEntries,
            ],
            ReportSection::Vitals => &[Table::Vitals, Table::FitbitWeight],
            ReportSection::Symptoms => &[Table::HealthEntries],
            ReportSection::HeartburnTriggers => &[Table::HealthEntries, Table::FoodEntries],
            ReportSection::Nutrition => &[Table::FoodEntries, Table::WaterIntake],
            ReportSection::Activity => &[
                Table::ActivityEntries,
                Table::FitbitActivity,
                Table::FitbitSleep,
            ],
            ReportSection::Seizures => &[Table::SeizureEntries],
            ReportSection::MentalHealth => &[Table::MentalHealthEntries],
            ReportSection::WomensHealth => &[Table::MenstrualEntries, Table::FertilityEntries],
            ReportSection::LabResults => &[Table::LabResults],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportTemplate {
    pub name: String,
    pub sections: Vec<ReportSection>,
}

impl ReportTemplate {
    pub fn builtin(name: &str) -> Option<ReportTemplate> {
        use ReportSection::*;
        let sections = match name {
            "comprehensive" => vec![
                Overview,
                Vitals,
                Symptoms,
                HeartburnTriggers,
                Nutrition,
                Activity,
                Seizures,
                MentalHealth,
                WomensHealth,
                LabResults,
            ],
            "digestive" => vec![Overview, Symptoms, HeartburnTriggers, Nutrition, LabResults],
            "neurology" => vec![Overview, Seizures, MentalHealth, Symptoms, Vitals],
            _ => return None,
        };
        Some(ReportTemplate {
            name: name.to_string(),
            sections,
        })
    }

    /// Union of the tables every section reads, each once.
    pub fn tables(&self) -> Vec<Table> {
        let mut tables: Vec<Table> = self
            .sections
            .iter()
            .flat_map(|s| s.tables().iter().copied())
            .collect();
        tables.sort();
        tables.dedup();
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates() {
        assert_eq!(ReportTemplate::builtin("comprehensive").unwrap().sections.len(), 10);
        assert!(ReportTemplate::builtin("digestive")
            .unwrap()
            .sections
            .contains(&ReportSection::HeartburnTriggers));
        assert!(ReportTemplate::builtin("unknown").is_none());
    }

    #[test]
    fn test_tables_deduplicated() {
        let template = ReportTemplate {
            name: "custom".to_string(),
            sections: vec![ReportSection::Symptoms, ReportSection::HeartburnTriggers],
        };
        assert_eq!(
            template.tables(),
            vec![Table::HealthEntries, Table::FoodEntries]
        );
    }

    #[test]
    fn test_section_deserializes_snake_case() {
        let s: ReportSection = serde_json::from_str("\"heartburn_triggers\"").unwrap();
        assert_eq!(s, ReportSection::HeartburnTriggers);
    }
}
