//! Purpose: Render a decoded model snapshot as the CLI's stdout JSON.
//! Exports: `snapshot_json`.
//! Invariants: Field names are stable; records keep the model's row order.
use remote_model::api::Snapshot;
use serde_json::{Value, json};

pub(crate) fn snapshot_json(snapshot: &Snapshot) -> Value {
    json!({
        "dataset": snapshot.dataset_name,
        "column_types": snapshot.column_types,
        "seqnum": {
            "before": snapshot.seqnum_before,
            "after": snapshot.seqnum_after,
        },
        "records": snapshot.records,
    })
}
