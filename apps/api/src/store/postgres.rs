use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::*;
use crate::models::tables::Table;
use crate::models::user::User;
use crate::store::RecordStore;

/// Postgres caps a single statement at 65535 bind parameters.
const MAX_BINDS: usize = 65_535;

/// `RecordStore` over the application's Postgres schema.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Constraint violations mean the payload disagrees with rows outside the user's data.
fn restore_error(table: Table, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            AppError::Conflict(format!("Restoring {table} violates a constraint: {}", db.message()))
        }
        other => AppError::Database(other),
    }
}

async fn select_for_user<T: TableRecord>(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<T>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM {} WHERE user_id = $1 ORDER BY id",
        T::COLUMNS.join(", "),
        T::TABLE
    );
    sqlx::query_as::<_, T>(&sql).bind(user_id).fetch_all(pool).await
}

async fn insert_batch<T: TableRecord>(
    conn: &mut PgConnection,
    rows: &[T],
) -> Result<usize, sqlx::Error> {
    let per_statement = (MAX_BINDS / T::COLUMNS.len()).max(1);
    for chunk in rows.chunks(per_statement) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        qb.push_values(chunk, |mut b, row| row.push_binds(&mut b));
        qb.build().execute(&mut *conn).await?;
    }
    Ok(rows.len())
}

async fn insert_table(
    conn: &mut PgConnection,
    table: Table,
    tables: &SnapshotTables,
) -> Result<usize, sqlx::Error> {
    match table {
        Table::HealthEntries => insert_batch(conn, &tables.health_entries).await,
        Table::FoodEntries => insert_batch(conn, &tables.food_entries).await,
        Table::ActivityEntries => insert_batch(conn, &tables.activity_entries).await,
        Table::Vitals => insert_batch(conn, &tables.vitals).await,
        Table::WaterIntake => insert_batch(conn, &tables.water_intake).await,
        Table::NutritionSummaries => insert_batch(conn, &tables.nutrition_summaries).await,
        Table::WeightGoals => insert_batch(conn, &tables.weight_goals).await,
        Table::SeizureEntries => insert_batch(conn, &tables.seizure_entries).await,
        Table::MentalHealthEntries => insert_batch(conn, &tables.mental_health_entries).await,
        Table::MenstrualEntries => insert_batch(conn, &tables.menstrual_entries).await,
        Table::FertilityEntries => insert_batch(conn, &tables.fertility_entries).await,
        Table::LabResults => insert_batch(conn, &tables.lab_results).await,
        Table::FitbitSleep => insert_batch(conn, &tables.fitbit_sleep).await,
        Table::FitbitFood => insert_batch(conn, &tables.fitbit_food).await,
        Table::FitbitWeight => insert_batch(conn, &tables.fitbit_weight).await,
        Table::FitbitActivity => insert_batch(conn, &tables.fitbit_activity).await,
        Table::Integrations => insert_batch(conn, &tables.integrations).await,
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, display_name, role, preferences, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn available_tables(&self) -> Result<HashSet<Table>, AppError> {
        let names: Vec<String> = Table::ALL.iter().map(|t| t.as_str().to_string()).collect();
        let found: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = ANY($1)
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await?;

        Ok(found.iter().filter_map(|n| Table::from_name(n)).collect())
    }

    async fn select_rows(&self, table: Table, user_id: Uuid) -> Result<TableRows, AppError> {
        let pool = &self.pool;
        let rows = match table {
            Table::HealthEntries => TableRows::HealthEntries(select_for_user(pool, user_id).await?),
            Table::FoodEntries => TableRows::FoodEntries(select_for_user(pool, user_id).await?),
            Table::ActivityEntries => {
                TableRows::ActivityEntries(select_for_user(pool, user_id).await?)
            }
            Table::Vitals => TableRows::Vitals(select_for_user(pool, user_id).await?),
            Table::WaterIntake => TableRows::WaterIntake(select_for_user(pool, user_id).await?),
            Table::NutritionSummaries => {
                TableRows::NutritionSummaries(select_for_user(pool, user_id).await?)
            }
            Table::WeightGoals => TableRows::WeightGoals(select_for_user(pool, user_id).await?),
            Table::SeizureEntries => {
                TableRows::SeizureEntries(select_for_user(pool, user_id).await?)
            }
            Table::MentalHealthEntries => {
                TableRows::MentalHealthEntries(select_for_user(pool, user_id).await?)
            }
            Table::MenstrualEntries => {
                TableRows::MenstrualEntries(select_for_user(pool, user_id).await?)
            }
            Table::FertilityEntries => {
                TableRows::FertilityEntries(select_for_user(pool, user_id).await?)
            }
            Table::LabResults => TableRows::LabResults(select_for_user(pool, user_id).await?),
            Table::FitbitSleep => TableRows::FitbitSleep(select_for_user(pool, user_id).await?),
            Table::FitbitFood => TableRows::FitbitFood(select_for_user(pool, user_id).await?),
            Table::FitbitWeight => TableRows::FitbitWeight(select_for_user(pool, user_id).await?),
            Table::FitbitActivity => {
                TableRows::FitbitActivity(select_for_user(pool, user_id).await?)
            }
            Table::Integrations => TableRows::Integrations(select_for_user(pool, user_id).await?),
        };
        Ok(rows)
    }

    async fn replace_user_data(
        &self,
        user_id: Uuid,
        tables: &SnapshotTables,
        present: &HashSet<Table>,
    ) -> Result<BTreeMap<Table, usize>, AppError> {
        // Dropping `tx` on any early return rolls the whole replacement back.
        let mut tx = self.pool.begin().await?;

        for table in Table::DELETE_ORDER.into_iter().filter(|t| present.contains(t)) {
            let deleted = sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| restore_error(table, e))?
                .rows_affected();
            debug!("Deleted {deleted} rows from {table} for user {user_id}");
        }

        let mut inserted = BTreeMap::new();
        for table in Table::insert_order() {
            if tables.count(table) == 0 {
                continue;
            }
            let n = insert_table(&mut *tx, table, tables)
                .await
                .map_err(|e| restore_error(table, e))?;
            inserted.insert(table, n);
        }

        tx.commit().await?;
        info!("Replaced data for user {user_id} across {} tables", present.len());
        Ok(inserted)
    }
}
