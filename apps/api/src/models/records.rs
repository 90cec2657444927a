//! Typed rows for every table covered by snapshots.
//!
//! Each record carries a client-assigned `id` so restored rows keep their identity and the
//! `health_entry_id` references from food and activity entries stay valid.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

use crate::models::tables::Table;

/// A row type stored in exactly one table and owned by exactly one user.
pub trait TableRecord:
    Clone
    + Send
    + Sync
    + Unpin
    + Serialize
    + DeserializeOwned
    + for<'r> FromRow<'r, PgRow>
    + 'static
{
    const TABLE: Table;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    fn set_user_id(&mut self, user_id: Uuid);

    /// Pushes one bind per entry of `COLUMNS`, in the same order.
    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>);
}

macro_rules! table_record {
    ($ty:ident, $table:expr, [$($field:ident),+ $(,)?]) => {
        impl TableRecord for $ty {
            const TABLE: Table = $table;
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn id(&self) -> Uuid {
                self.id
            }

            fn set_id(&mut self, id: Uuid) {
                self.id = id;
            }

            fn set_user_id(&mut self, user_id: Uuid) {
                self.user_id = user_id;
            }

            fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
                $( row.push_bind(self.$field.clone()); )+
            }
        }
    };
}

// ────────────────────────────────────────────────────────────────────────────
// Core entries
// ────────────────────────────────────────────────────────────────────────────

/// Daily check-in. Severity-style fields are on a 0–10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub pain_level: Option<i32>,
    pub energy_level: Option<i32>,
    pub mood: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub heartburn_severity: Option<i32>,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    HealthEntry,
    Table::HealthEntries,
    [
        id, user_id, date, pain_level, energy_level, mood, sleep_hours, heartburn_severity,
        symptoms, notes, created_at,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub health_entry_id: Option<Uuid>,
    pub date: NaiveDate,
    pub meal_type: String,
    pub food_name: String,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    FoodEntry,
    Table::FoodEntries,
    [
        id, user_id, health_entry_id, date, meal_type, food_name, calories, protein_g, carbs_g,
        fat_g, notes, created_at,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub health_entry_id: Option<Uuid>,
    pub date: NaiveDate,
    pub activity_type: String,
    pub duration_minutes: Option<i32>,
    pub intensity: Option<String>,
    pub calories_burned: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    ActivityEntry,
    Table::ActivityEntries,
    [
        id, user_id, health_entry_id, date, activity_type, duration_minutes, intensity,
        calories_burned, notes, created_at,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VitalsEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub heart_rate: Option<i32>,
    pub temperature_c: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    VitalsEntry,
    Table::Vitals,
    [
        id, user_id, date, systolic, diastolic, heart_rate, temperature_c, oxygen_saturation,
        weight_kg, created_at,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WaterIntake {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub amount_ml: i32,
    pub created_at: DateTime<Utc>,
}

table_record!(WaterIntake, Table::WaterIntake, [id, user_id, date, amount_ml, created_at]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutritionSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub total_calories: Option<f64>,
    pub total_protein_g: Option<f64>,
    pub total_carbs_g: Option<f64>,
    pub total_fat_g: Option<f64>,
    pub meal_count: i32,
    pub created_at: DateTime<Utc>,
}

table_record!(
    NutritionSummary,
    Table::NutritionSummaries,
    [
        id, user_id, date, total_calories, total_protein_g, total_carbs_g, total_fat_g, meal_count,
        created_at,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeightGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_weight_kg: f64,
    pub start_weight_kg: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

table_record!(
    WeightGoal,
    Table::WeightGoals,
    [id, user_id, target_weight_kg, start_weight_kg, target_date, active, created_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SeizureEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub seizure_type: String,
    pub duration_seconds: Option<i32>,
    pub severity: Option<i32>,
    pub triggers: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    SeizureEntry,
    Table::SeizureEntries,
    [id, user_id, date, seizure_type, duration_seconds, severity, triggers, notes, created_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MentalHealthEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood_score: Option<i32>,
    pub anxiety_level: Option<i32>,
    pub depression_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    MentalHealthEntry,
    Table::MentalHealthEntries,
    [
        id, user_id, date, mood_score, anxiety_level, depression_level, stress_level, notes,
        created_at,
    ]
);

// ────────────────────────────────────────────────────────────────────────────
// Women's health and lab results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MenstrualEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub flow_level: Option<String>,
    pub cycle_day: Option<i32>,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    MenstrualEntry,
    Table::MenstrualEntries,
    [id, user_id, date, flow_level, cycle_day, symptoms, notes, created_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FertilityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub basal_temperature_c: Option<f64>,
    pub cervical_mucus: Option<String>,
    pub ovulation_test: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    FertilityEntry,
    Table::FertilityEntries,
    [id, user_id, date, basal_temperature_c, cervical_mucus, ovulation_test, notes, created_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LabResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub test_name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub reference_low: Option<f64>,
    pub reference_high: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LabResult {
    /// True when the value falls outside whichever reference bounds are present.
    pub fn out_of_range(&self) -> bool {
        let Some(value) = self.value else {
            return false;
        };
        self.reference_low.is_some_and(|low| value < low)
            || self.reference_high.is_some_and(|high| value > high)
    }
}

table_record!(
    LabResult,
    Table::LabResults,
    [id, user_id, date, test_name, value, unit, reference_low, reference_high, notes, created_at]
);

// ────────────────────────────────────────────────────────────────────────────
// Fitbit sync tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FitbitSleep {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub minutes_asleep: Option<i32>,
    pub minutes_awake: Option<i32>,
    pub efficiency: Option<i32>,
    pub synced_at: DateTime<Utc>,
}

table_record!(
    FitbitSleep,
    Table::FitbitSleep,
    [id, user_id, date, minutes_asleep, minutes_awake, efficiency, synced_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FitbitFood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub food_name: String,
    pub meal_type: Option<String>,
    pub calories: Option<f64>,
    pub synced_at: DateTime<Utc>,
}

table_record!(
    FitbitFood,
    Table::FitbitFood,
    [id, user_id, date, food_name, meal_type, calories, synced_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FitbitWeight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub bmi: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub synced_at: DateTime<Utc>,
}

table_record!(
    FitbitWeight,
    Table::FitbitWeight,
    [id, user_id, date, weight_kg, bmi, body_fat_pct, synced_at]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FitbitActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub steps: Option<i32>,
    pub distance_km: Option<f64>,
    pub calories_out: Option<f64>,
    pub active_minutes: Option<i32>,
    pub resting_heart_rate: Option<i32>,
    pub synced_at: DateTime<Utc>,
}

table_record!(
    FitbitActivity,
    Table::FitbitActivity,
    [
        id, user_id, date, steps, distance_km, calories_out, active_minutes, resting_heart_rate,
        synced_at,
    ]
);

/// One row per (user, provider). Written by the sync process, never by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Integration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

table_record!(
    Integration,
    Table::Integrations,
    [id, user_id, provider, access_token, refresh_token, expires_at, last_synced_at, created_at]
);

// ────────────────────────────────────────────────────────────────────────────
// Per-table row batches
// ────────────────────────────────────────────────────────────────────────────

/// All rows of one table, tagged by table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRows {
    HealthEntries(Vec<HealthEntry>),
    FoodEntries(Vec<FoodEntry>),
    ActivityEntries(Vec<ActivityEntry>),
    Vitals(Vec<VitalsEntry>),
    WaterIntake(Vec<WaterIntake>),
    NutritionSummaries(Vec<NutritionSummary>),
    WeightGoals(Vec<WeightGoal>),
    SeizureEntries(Vec<SeizureEntry>),
    MentalHealthEntries(Vec<MentalHealthEntry>),
    MenstrualEntries(Vec<MenstrualEntry>),
    FertilityEntries(Vec<FertilityEntry>),
    LabResults(Vec<LabResult>),
    FitbitSleep(Vec<FitbitSleep>),
    FitbitFood(Vec<FitbitFood>),
    FitbitWeight(Vec<FitbitWeight>),
    FitbitActivity(Vec<FitbitActivity>),
    Integrations(Vec<Integration>),
}

impl TableRows {
    pub fn empty(table: Table) -> TableRows {
        match table {
            Table::HealthEntries => TableRows::HealthEntries(Vec::new()),
            Table::FoodEntries => TableRows::FoodEntries(Vec::new()),
            Table::ActivityEntries => TableRows::ActivityEntries(Vec::new()),
            Table::Vitals => TableRows::Vitals(Vec::new()),
            Table::WaterIntake => TableRows::WaterIntake(Vec::new()),
            Table::NutritionSummaries => TableRows::NutritionSummaries(Vec::new()),
            Table::WeightGoals => TableRows::WeightGoals(Vec::new()),
            Table::SeizureEntries => TableRows::SeizureEntries(Vec::new()),
            Table::MentalHealthEntries => TableRows::MentalHealthEntries(Vec::new()),
            Table::MenstrualEntries => TableRows::MenstrualEntries(Vec::new()),
            Table::FertilityEntries => TableRows::FertilityEntries(Vec::new()),
            Table::LabResults => TableRows::LabResults(Vec::new()),
            Table::FitbitSleep => TableRows::FitbitSleep(Vec::new()),
            Table::FitbitFood => TableRows::FitbitFood(Vec::new()),
            Table::FitbitWeight => TableRows::FitbitWeight(Vec::new()),
            Table::FitbitActivity => TableRows::FitbitActivity(Vec::new()),
            Table::Integrations => TableRows::Integrations(Vec::new()),
        }
    }

    pub fn table(&self) -> Table {
        match self {
            TableRows::HealthEntries(_) => Table::HealthEntries,
            TableRows::FoodEntries(_) => Table::FoodEntries,
            TableRows::ActivityEntries(_) => Table::ActivityEntries,
            TableRows::Vitals(_) => Table::Vitals,
            TableRows::WaterIntake(_) => Table::WaterIntake,
            TableRows::NutritionSummaries(_) => Table::NutritionSummaries,
            TableRows::WeightGoals(_) => Table::WeightGoals,
            TableRows::SeizureEntries(_) => Table::SeizureEntries,
            TableRows::MentalHealthEntries(_) => Table::MentalHealthEntries,
            TableRows::MenstrualEntries(_) => Table::MenstrualEntries,
            TableRows::FertilityEntries(_) => Table::FertilityEntries,
            TableRows::LabResults(_) => Table::LabResults,
            TableRows::FitbitSleep(_) => Table::FitbitSleep,
            TableRows::FitbitFood(_) => Table::FitbitFood,
            TableRows::FitbitWeight(_) => Table::FitbitWeight,
            TableRows::FitbitActivity(_) => Table::FitbitActivity,
            TableRows::Integrations(_) => Table::Integrations,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableRows::HealthEntries(rows) => rows.len(),
            TableRows::FoodEntries(rows) => rows.len(),
            TableRows::ActivityEntries(rows) => rows.len(),
            TableRows::Vitals(rows) => rows.len(),
            TableRows::WaterIntake(rows) => rows.len(),
            TableRows::NutritionSummaries(rows) => rows.len(),
            TableRows::WeightGoals(rows) => rows.len(),
            TableRows::SeizureEntries(rows) => rows.len(),
            TableRows::MentalHealthEntries(rows) => rows.len(),
            TableRows::MenstrualEntries(rows) => rows.len(),
            TableRows::FertilityEntries(rows) => rows.len(),
            TableRows::LabResults(rows) => rows.len(),
            TableRows::FitbitSleep(rows) => rows.len(),
            TableRows::FitbitFood(rows) => rows.len(),
            TableRows::FitbitWeight(rows) => rows.len(),
            TableRows::FitbitActivity(rows) => rows.len(),
            TableRows::Integrations(rows) => rows.len(),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Snapshot payload
// ────────────────────────────────────────────────────────────────────────────

/// Every table's rows for one user. Missing keys deserialize as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotTables {
    pub health_entries: Vec<HealthEntry>,
    pub food_entries: Vec<FoodEntry>,
    pub activity_entries: Vec<ActivityEntry>,
    pub vitals: Vec<VitalsEntry>,
    pub water_intake: Vec<WaterIntake>,
    pub nutrition_summaries: Vec<NutritionSummary>,
    pub weight_goals: Vec<WeightGoal>,
    pub seizure_entries: Vec<SeizureEntry>,
    pub mental_health_entries: Vec<MentalHealthEntry>,
    pub menstrual_entries: Vec<MenstrualEntry>,
    pub fertility_entries: Vec<FertilityEntry>,
    pub lab_results: Vec<LabResult>,
    pub fitbit_sleep: Vec<FitbitSleep>,
    pub fitbit_food: Vec<FitbitFood>,
    pub fitbit_weight: Vec<FitbitWeight>,
    pub fitbit_activity: Vec<FitbitActivity>,
    pub integrations: Vec<Integration>,
}

impl SnapshotTables {
    /// Replaces the list for `rows.table()`.
    pub fn set(&mut self, rows: TableRows) {
        match rows {
            TableRows::HealthEntries(r) => self.health_entries = r,
            TableRows::FoodEntries(r) => self.food_entries = r,
            TableRows::ActivityEntries(r) => self.activity_entries = r,
            TableRows::Vitals(r) => self.vitals = r,
            TableRows::WaterIntake(r) => self.water_intake = r,
            TableRows::NutritionSummaries(r) => self.nutrition_summaries = r,
            TableRows::WeightGoals(r) => self.weight_goals = r,
            TableRows::SeizureEntries(r) => self.seizure_entries = r,
            TableRows::MentalHealthEntries(r) => self.mental_health_entries = r,
            TableRows::MenstrualEntries(r) => self.menstrual_entries = r,
            TableRows::FertilityEntries(r) => self.fertility_entries = r,
            TableRows::LabResults(r) => self.lab_results = r,
            TableRows::FitbitSleep(r) => self.fitbit_sleep = r,
            TableRows::FitbitFood(r) => self.fitbit_food = r,
            TableRows::FitbitWeight(r) => self.fitbit_weight = r,
            TableRows::FitbitActivity(r) => self.fitbit_activity = r,
            TableRows::Integrations(r) => self.integrations = r,
        }
    }

    /// Clones one table's list into a tagged batch.
    #[cfg(test)]
    pub fn rows(&self, table: Table) -> TableRows {
        match table {
            Table::HealthEntries => TableRows::HealthEntries(self.health_entries.clone()),
            Table::FoodEntries => TableRows::FoodEntries(self.food_entries.clone()),
            Table::ActivityEntries => TableRows::ActivityEntries(self.activity_entries.clone()),
            Table::Vitals => TableRows::Vitals(self.vitals.clone()),
            Table::WaterIntake => TableRows::WaterIntake(self.water_intake.clone()),
            Table::NutritionSummaries => {
                TableRows::NutritionSummaries(self.nutrition_summaries.clone())
            }
            Table::WeightGoals => TableRows::WeightGoals(self.weight_goals.clone()),
            Table::SeizureEntries => TableRows::SeizureEntries(self.seizure_entries.clone()),
            Table::MentalHealthEntries => {
                TableRows::MentalHealthEntries(self.mental_health_entries.clone())
            }
            Table::MenstrualEntries => TableRows::MenstrualEntries(self.menstrual_entries.clone()),
            Table::FertilityEntries => TableRows::FertilityEntries(self.fertility_entries.clone()),
            Table::LabResults => TableRows::LabResults(self.lab_results.clone()),
            Table::FitbitSleep => TableRows::FitbitSleep(self.fitbit_sleep.clone()),
            Table::FitbitFood => TableRows::FitbitFood(self.fitbit_food.clone()),
            Table::FitbitWeight => TableRows::FitbitWeight(self.fitbit_weight.clone()),
            Table::FitbitActivity => TableRows::FitbitActivity(self.fitbit_activity.clone()),
            Table::Integrations => TableRows::Integrations(self.integrations.clone()),
        }
    }

    pub fn count(&self, table: Table) -> usize {
        match table {
            Table::HealthEntries => self.health_entries.len(),
            Table::FoodEntries => self.food_entries.len(),
            Table::ActivityEntries => self.activity_entries.len(),
            Table::Vitals => self.vitals.len(),
            Table::WaterIntake => self.water_intake.len(),
            Table::NutritionSummaries => self.nutrition_summaries.len(),
            Table::WeightGoals => self.weight_goals.len(),
            Table::SeizureEntries => self.seizure_entries.len(),
            Table::MentalHealthEntries => self.mental_health_entries.len(),
            Table::MenstrualEntries => self.menstrual_entries.len(),
            Table::FertilityEntries => self.fertility_entries.len(),
            Table::LabResults => self.lab_results.len(),
            Table::FitbitSleep => self.fitbit_sleep.len(),
            Table::FitbitFood => self.fitbit_food.len(),
            Table::FitbitWeight => self.fitbit_weight.len(),
            Table::FitbitActivity => self.fitbit_activity.len(),
            Table::Integrations => self.integrations.len(),
        }
    }

    #[cfg(test)]
    pub fn total_rows(&self) -> usize {
        Table::ALL.into_iter().map(|t| self.count(t)).sum()
    }

    /// Moves every row to `user_id` under a fresh primary key, so the rows can live alongside
    /// the account they were exported from. Links to health entries follow the new keys; a link
    /// to an entry outside the payload is dropped.
    pub fn reassign_user(&mut self, user_id: Uuid) {
        fn rekey<T: TableRecord>(rows: &mut [T], user_id: Uuid) -> HashMap<Uuid, Uuid> {
            rows.iter_mut()
                .map(|r| {
                    let fresh = Uuid::new_v4();
                    let old = r.id();
                    r.set_id(fresh);
                    r.set_user_id(user_id);
                    (old, fresh)
                })
                .collect()
        }
        let health_ids = rekey(&mut self.health_entries, user_id);
        let relink = |id: Option<Uuid>| id.and_then(|old| health_ids.get(&old).copied());

        rekey(&mut self.food_entries, user_id);
        for entry in &mut self.food_entries {
            entry.health_entry_id = relink(entry.health_entry_id);
        }
        rekey(&mut self.activity_entries, user_id);
        for entry in &mut self.activity_entries {
            entry.health_entry_id = relink(entry.health_entry_id);
        }
        rekey(&mut self.vitals, user_id);
        rekey(&mut self.water_intake, user_id);
        rekey(&mut self.nutrition_summaries, user_id);
        rekey(&mut self.weight_goals, user_id);
        rekey(&mut self.seizure_entries, user_id);
        rekey(&mut self.mental_health_entries, user_id);
        rekey(&mut self.menstrual_entries, user_id);
        rekey(&mut self.fertility_entries, user_id);
        rekey(&mut self.lab_results, user_id);
        rekey(&mut self.fitbit_sleep, user_id);
        rekey(&mut self.fitbit_food, user_id);
        rekey(&mut self.fitbit_weight, user_id);
        rekey(&mut self.fitbit_activity, user_id);
        rekey(&mut self.integrations, user_id);
    }

    /// Primary keys of one table's rows.
    #[cfg(test)]
    pub fn ids(&self, table: Table) -> Vec<Uuid> {
        fn ids_of<T: TableRecord>(rows: &[T]) -> Vec<Uuid> {
            rows.iter().map(TableRecord::id).collect()
        }
        match table {
            Table::HealthEntries => ids_of(&self.health_entries),
            Table::FoodEntries => ids_of(&self.food_entries),
            Table::ActivityEntries => ids_of(&self.activity_entries),
            Table::Vitals => ids_of(&self.vitals),
            Table::WaterIntake => ids_of(&self.water_intake),
            Table::NutritionSummaries => ids_of(&self.nutrition_summaries),
            Table::WeightGoals => ids_of(&self.weight_goals),
            Table::SeizureEntries => ids_of(&self.seizure_entries),
            Table::MentalHealthEntries => ids_of(&self.mental_health_entries),
            Table::MenstrualEntries => ids_of(&self.menstrual_entries),
            Table::FertilityEntries => ids_of(&self.fertility_entries),
            Table::LabResults => ids_of(&self.lab_results),
            Table::FitbitSleep => ids_of(&self.fitbit_sleep),
            Table::FitbitFood => ids_of(&self.fitbit_food),
            Table::FitbitWeight => ids_of(&self.fitbit_weight),
            Table::FitbitActivity => ids_of(&self.fitbit_activity),
            Table::Integrations => ids_of(&self.integrations),
        }
    }

    /// Tables that hold at least one row.
    pub fn populated_tables(&self) -> Vec<Table> {
        Table::ALL.into_iter().filter(|t| self.count(*t) > 0).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    pub fn health_entry(user_id: Uuid, date: NaiveDate, heartburn: Option<i32>) -> HealthEntry {
        HealthEntry {
            id: Uuid::new_v4(),
            user_id,
            date,
            pain_level: Some(3),
            energy_level: Some(6),
            mood: Some(7),
            sleep_hours: Some(7.5),
            heartburn_severity: heartburn,
            symptoms: vec!["bloating".to_string()],
            notes: None,
            created_at: ts(),
        }
    }

    pub fn food_entry(user_id: Uuid, date: NaiveDate, food_name: &str) -> FoodEntry {
        FoodEntry {
            id: Uuid::new_v4(),
            user_id,
            health_entry_id: None,
            date,
            meal_type: "lunch".to_string(),
            food_name: food_name.to_string(),
            calories: Some(450.0),
            protein_g: Some(20.0),
            carbs_g: Some(50.0),
            fat_g: Some(15.0),
            notes: None,
            created_at: ts(),
        }
    }

    pub fn lab_result(user_id: Uuid, test_name: &str, value: f64) -> LabResult {
        LabResult {
            id: Uuid::new_v4(),
            user_id,
            date: day(2),
            test_name: test_name.to_string(),
            value: Some(value),
            unit: Some("mg/dL".to_string()),
            reference_low: Some(70.0),
            reference_high: Some(100.0),
            notes: None,
            created_at: ts(),
        }
    }

    pub fn fitbit_sleep(user_id: Uuid, date: NaiveDate) -> FitbitSleep {
        FitbitSleep {
            id: Uuid::new_v4(),
            user_id,
            date,
            minutes_asleep: Some(420),
            minutes_awake: Some(30),
            efficiency: Some(91),
            synced_at: ts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_columns_match_table_and_start_with_keys() {
        assert_eq!(HealthEntry::TABLE, Table::HealthEntries);
        assert_eq!(HealthEntry::COLUMNS[0], "id");
        assert_eq!(HealthEntry::COLUMNS[1], "user_id");
        assert_eq!(Integration::COLUMNS.len(), 8);
    }

    #[test]
    fn test_set_and_count() {
        let user = Uuid::new_v4();
        let mut tables = SnapshotTables::default();
        tables.set(TableRows::FoodEntries(vec![
            food_entry(user, day(1), "toast"),
            food_entry(user, day(2), "coffee"),
        ]));
        assert_eq!(tables.count(Table::FoodEntries), 2);
        assert_eq!(tables.total_rows(), 2);
        assert_eq!(tables.populated_tables(), vec![Table::FoodEntries]);
        assert_eq!(tables.rows(Table::FoodEntries).len(), 2);
        assert!(tables.rows(Table::Vitals).is_empty());
    }

    #[test]
    fn test_reassign_user_rekeys_all_rows() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        let entry = health_entry(old, day(1), None);
        let mut linked = food_entry(old, day(1), "coffee");
        linked.health_entry_id = Some(entry.id);
        let mut dangling = food_entry(old, day(2), "toast");
        dangling.health_entry_id = Some(Uuid::new_v4());
        let original_ids = (entry.id, linked.id);
        let mut tables = SnapshotTables {
            health_entries: vec![entry],
            food_entries: vec![linked, dangling],
            lab_results: vec![lab_result(old, "glucose", 90.0)],
            ..Default::default()
        };

        tables.reassign_user(new);

        let entry = &tables.health_entries[0];
        assert_eq!(entry.user_id, new);
        assert_ne!(entry.id, original_ids.0);
        assert_ne!(tables.food_entries[0].id, original_ids.1);
        assert_eq!(tables.food_entries[0].health_entry_id, Some(entry.id));
        assert_eq!(tables.food_entries[1].health_entry_id, None);
        assert_eq!(tables.lab_results[0].user_id, new);
    }

    #[test]
    fn test_missing_tables_deserialize_empty() {
        let tables: SnapshotTables = serde_json::from_str(r#"{"health_entries": []}"#).unwrap();
        assert_eq!(tables.total_rows(), 0);
    }

    #[test]
    fn test_lab_out_of_range() {
        let user = Uuid::new_v4();
        assert!(!lab_result(user, "glucose", 90.0).out_of_range());
        assert!(lab_result(user, "glucose", 130.0).out_of_range());
        assert!(lab_result(user, "glucose", 60.0).out_of_range());
    }

    #[test]
    fn test_empty_rows_tagged_with_table() {
        for table in Table::ALL {
            let rows = TableRows::empty(table);
            assert_eq!(rows.table(), table);
            assert!(rows.is_empty());
        }
    }
}
