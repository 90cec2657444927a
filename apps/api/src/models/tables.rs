use serde::{Deserialize, Serialize};

/// Logical grouping used by snapshot summaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TableGroup {
    Core,
    Fitbit,
    WomensHealth,
    LabResults,
    Integrations,
}

/// Every per-user table covered by backup and restore.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    HealthEntries,
    FoodEntries,
    ActivityEntries,
    Vitals,
    WaterIntake,
    NutritionSummaries,
    WeightGoals,
    SeizureEntries,
    MentalHealthEntries,
    MenstrualEntries,
    FertilityEntries,
    LabResults,
    FitbitSleep,
    FitbitFood,
    FitbitWeight,
    FitbitActivity,
    Integrations,
}

impl Table {
    /// Children before parents, integration records last.
    pub const DELETE_ORDER: [Table; 17] = [
        Table::FitbitSleep,
        Table::FitbitFood,
        Table::FitbitWeight,
        Table::FitbitActivity,
        Table::LabResults,
        Table::MenstrualEntries,
        Table::FertilityEntries,
        Table::SeizureEntries,
        Table::MentalHealthEntries,
        Table::NutritionSummaries,
        Table::Vitals,
        Table::WaterIntake,
        Table::WeightGoals,
        Table::ActivityEntries,
        Table::FoodEntries,
        Table::HealthEntries,
        Table::Integrations,
    ];

    pub const ALL: [Table; 17] = Table::DELETE_ORDER;

    /// Parents first: health entries land before the food and activity rows that point at them.
    pub fn insert_order() -> impl Iterator<Item = Table> {
        Table::DELETE_ORDER.into_iter().rev()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Table::HealthEntries => "health_entries",
            Table::FoodEntries => "food_entries",
            Table::ActivityEntries => "activity_entries",
            Table::Vitals => "vitals",
            Table::WaterIntake => "water_intake",
            Table::NutritionSummaries => "nutrition_summaries",
            Table::WeightGoals => "weight_goals",
            Table::SeizureEntries => "seizure_entries",
            Table::MentalHealthEntries => "mental_health_entries",
            Table::MenstrualEntries => "menstrual_entries",
            Table::FertilityEntries => "fertility_entries",
            Table::LabResults => "lab_results",
            Table::FitbitSleep => "fitbit_sleep",
            Table::FitbitFood => "fitbit_food",
            Table::FitbitWeight => "fitbit_weight",
            Table::FitbitActivity => "fitbit_activity",
            Table::Integrations => "integrations",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn group(self) -> TableGroup {
        match self {
            Table::HealthEntries
            | Table::FoodEntries
            | Table::ActivityEntries
            | Table::Vitals
            | Table::WaterIntake
            | Table::NutritionSummaries
            | Table::WeightGoals
            | Table::SeizureEntries
            | Table::MentalHealthEntries => TableGroup::Core,
            Table::MenstrualEntries | Table::FertilityEntries => TableGroup::WomensHealth,
            Table::LabResults => TableGroup::LabResults,
            Table::FitbitSleep
            | Table::FitbitFood
            | Table::FitbitWeight
            | Table::FitbitActivity => TableGroup::Fitbit,
            Table::Integrations => TableGroup::Integrations,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_delete_order_covers_every_table_once() {
        let unique: HashSet<_> = Table::DELETE_ORDER.iter().collect();
        assert_eq!(unique.len(), Table::DELETE_ORDER.len());
    }

    #[test]
    fn test_children_deleted_before_parents() {
        let pos = |t: Table| Table::DELETE_ORDER.iter().position(|x| *x == t).unwrap();
        assert!(pos(Table::FoodEntries) < pos(Table::HealthEntries));
        assert!(pos(Table::ActivityEntries) < pos(Table::HealthEntries));
        assert!(pos(Table::FitbitSleep) < pos(Table::ActivityEntries));
        assert_eq!(*Table::DELETE_ORDER.last().unwrap(), Table::Integrations);
    }

    #[test]
    fn test_insert_order_starts_with_parents() {
        let order: Vec<_> = Table::insert_order().collect();
        assert_eq!(order[0], Table::Integrations);
        assert_eq!(order[1], Table::HealthEntries);
    }

    #[test]
    fn test_name_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.as_str()), Some(table));
        }
        assert_eq!(Table::from_name("nope"), None);
    }
}
