use uuid::Uuid;

use crate::models::snapshot::SnapshotSummary;

/// Inserts `latest` into the summary list, orders it newest-first, and cuts it to `keep`.
/// Returns the retained list and the ids of evicted snapshots.
pub fn apply_retention(
    mut index: Vec<SnapshotSummary>,
    latest: SnapshotSummary,
    keep: usize,
) -> (Vec<SnapshotSummary>, Vec<Uuid>) {
    index.retain(|s| s.id != latest.id);
    index.insert(0, latest);
    // Stable: on equal timestamps the just-created snapshot stays in front.
    index.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let keep = keep.max(1);
    let evicted = if index.len() > keep {
        index.split_off(keep).into_iter().map(|s| s.id).collect()
    } else {
        Vec::new()
    };
    (index, evicted)
}
