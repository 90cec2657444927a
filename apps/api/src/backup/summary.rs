use crate::errors::AppError;
use crate::models::records::SnapshotTables;
use crate::models::snapshot::SnapshotCounts;
use crate::models::tables::{Table, TableGroup};

/// Per-table and per-group row counts. Every table appears in `tables`, zero or not.
pub fn compute_counts(tables: &SnapshotTables) -> SnapshotCounts {
    let mut counts = SnapshotCounts::default();
    for table in Table::ALL {
        let n = tables.count(table);
        counts.tables.insert(table, n);
        match table.group() {
            TableGroup::Core => counts.core_entries += n,
            TableGroup::Fitbit => counts.fitbit_data += n,
            TableGroup::WomensHealth => counts.womens_health += n,
            TableGroup::LabResults => counts.lab_results += n,
            TableGroup::Integrations => counts.integrations += n,
        }
        counts.total += n;
    }
    counts
}

/// Approximate size: the serialized length of the table payload.
pub fn payload_size(tables: &SnapshotTables) -> Result<usize, AppError> {
    Ok(serde_json::to_vec(tables)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::fixtures::*;
    use uuid::Uuid;

    #[test]
    fn test_counts_grouped_and_totalled() {
        let user = Uuid::new_v4();
        let tables = SnapshotTables {
            health_entries: vec![
                health_entry(user, day(1), None),
                health_entry(user, day(2), None),
            ],
            food_entries: vec![food_entry(user, day(1), "rice")],
            lab_results: vec![lab_result(user, "ferritin", 40.0)],
            fitbit_sleep: vec![fitbit_sleep(user, day(1)), fitbit_sleep(user, day(2))],
            ..Default::default()
        };

        let counts = compute_counts(&tables);
        assert_eq!(counts.core_entries, 3);
        assert_eq!(counts.lab_results, 1);
        assert_eq!(counts.fitbit_data, 2);
        assert_eq!(counts.womens_health, 0);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.tables[&Table::HealthEntries], 2);
        assert_eq!(counts.tables[&Table::Vitals], 0);
        assert_eq!(counts.tables.len(), Table::ALL.len());
    }

    #[test]
    fn test_empty_payload_still_has_size() {
        let size = payload_size(&SnapshotTables::default()).unwrap();
        assert!(size > 2);
    }

    #[test]
    fn test_size_grows_with_rows() {
        let user = Uuid::new_v4();
        let empty = payload_size(&SnapshotTables::default()).unwrap();
        let one = payload_size(&SnapshotTables {
            health_entries: vec![health_entry(user, day(1), Some(4))],
            ..Default::default()
        })
        .unwrap();
        assert!(one > empty);
    }
}
