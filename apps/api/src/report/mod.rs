// Medical report generation.
// Pulls the tables a template needs for one user and date range, computes descriptive
// statistics, and renders a plain-text document. Read-only.

pub mod handlers;
pub mod render;
pub mod stats;
pub mod template;
pub mod triggers;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::SnapshotTables;
use crate::report::render::{render_report, ReportInput};
use crate::report::template::ReportTemplate;
use crate::store::RecordStore;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::Validation(format!(
                "Report range start {from} is after its end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// Drops every dated row outside `range`. Undated tables are left alone.
fn within_range(mut data: SnapshotTables, range: DateRange) -> SnapshotTables {
    let keep = |d: NaiveDate| range.contains(d);
    data.health_entries.retain(|e| keep(e.date));
    data.food_entries.retain(|e| keep(e.date));
    data.activity_entries.retain(|e| keep(e.date));
    data.vitals.retain(|e| keep(e.date));
    data.water_intake.retain(|e| keep(e.date));
    data.nutrition_summaries.retain(|e| keep(e.date));
    data.seizure_entries.retain(|e| keep(e.date));
    data.mental_health_entries.retain(|e| keep(e.date));
    data.menstrual_entries.retain(|e| keep(e.date));
    data.fertility_entries.retain(|e| keep(e.date));
    data.lab_results.retain(|e| keep(e.date));
    data.fitbit_sleep.retain(|e| keep(e.date));
    data.fitbit_food.retain(|e| keep(e.date));
    data.fitbit_weight.retain(|e| keep(e.date));
    data.fitbit_activity.retain(|e| keep(e.date));
    data
}

/// Builds the text report. Tables that cannot be read are reported as empty.
pub async fn generate_report(
    records: &dyn RecordStore,
    user_id: Uuid,
    range: DateRange,
    template: &ReportTemplate,
) -> Result<String, AppError> {
    let user = records
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let mut data = SnapshotTables::default();
    for table in template.tables() {
        match records.select_rows(table, user_id).await {
            Ok(rows) => data.set(rows),
            Err(e) => warn!("Report for user {user_id}: reading {table} failed: {e}"),
        }
    }
    let data = within_range(data, range);

    let text = render_report(&ReportInput {
        patient: &user.display_name,
        range,
        generated_at: Utc::now(),
        template,
        data: &data,
    });
    info!(
        "Generated '{}' report for user {user_id} ({} to {})",
        template.name, range.from, range.to
    );
    Ok(text)
}
