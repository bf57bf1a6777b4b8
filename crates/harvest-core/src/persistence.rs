//! Value-table persistence codec.
//!
//! Tables cross the boundary as one JSON object keyed by unit id, each value
//! a list of `(signature, action, value)` rows:
//!
//! ```json
//! { "0": [ { "signature": { ... }, "action": "harvest", "value": 8.1 } ] }
//! ```
//!
//! Decoding never fails. A document that does not parse yields no tables,
//! and a unit whose rows do not parse or hold non-finite values is dropped.
//! Either way the affected units start with empty tables.

use std::collections::BTreeMap;

use harvest_agents::ValueTable;
use harvest_types::{UnitId, ValueTableEntry};
use tracing::{debug, warn};

/// Value tables keyed by unit id.
pub type PersistedTables = BTreeMap<UnitId, ValueTable>;

/// Serialize tables to the JSON exchange format.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn encode_tables(tables: &PersistedTables) -> Result<String, serde_json::Error> {
    let document: BTreeMap<UnitId, Vec<ValueTableEntry>> = tables
        .iter()
        .map(|(&id, table)| (id, table.to_entries()))
        .collect();
    serde_json::to_string_pretty(&document)
}

/// Parse tables from the JSON exchange format, dropping anything corrupt.
pub fn decode_tables(json: &str) -> PersistedTables {
    let document: BTreeMap<String, serde_json::Value> = match serde_json::from_str(json) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, "Value-table document is unreadable; starting with empty tables");
            return PersistedTables::new();
        }
    };

    let mut tables = PersistedTables::new();
    for (key, rows) in document {
        let Ok(raw_id) = key.parse::<u32>() else {
            warn!(key = %key, "Ignoring value table with a non-numeric unit id");
            continue;
        };
        let id = UnitId::new(raw_id);
        let entries: Vec<ValueTableEntry> = match serde_json::from_value(rows) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(unit = %id, error = %err, "Value table is corrupt; unit starts empty");
                continue;
            }
        };
        match ValueTable::from_entries(&entries) {
            Ok(table) => {
                debug!(unit = %id, states = table.len(), "Value table loaded");
                tables.insert(id, table);
            }
            Err(err) => {
                warn!(unit = %id, error = %err, "Value table rejected; unit starts empty");
            }
        }
    }
    tables
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use harvest_types::{Action, CropSignal, FuelBucket, LoadBucket, StateSignature};

    use super::*;

    fn sample_table() -> ValueTable {
        let sig = StateSignature {
            fuel: FuelBucket::Low,
            load: LoadBucket::NotFull,
            crops: [
                CropSignal::OutOfBounds,
                CropSignal::Ready,
                CropSignal::Bare,
                CropSignal::Bare,
            ],
            occupied: [false, false, true, false],
        };
        let mut table = ValueTable::new();
        table.update(sig, Action::Refuel, 4.0, &sig, 0.1, 0.9);
        table
    }

    #[test]
    fn encoded_tables_decode_to_the_same_values() {
        let mut tables = PersistedTables::new();
        tables.insert(UnitId::new(0), sample_table());
        tables.insert(UnitId::new(3), ValueTable::new());
        let json = encode_tables(&tables).unwrap();
        assert!(json.contains("\"3\""));
        let decoded = decode_tables(&json);
        assert_eq!(decoded, tables);
    }

    #[test]
    fn garbage_document_yields_no_tables() {
        assert!(decode_tables("not json at all").is_empty());
        assert!(decode_tables("[1, 2, 3]").is_empty());
    }

    #[test]
    fn corrupt_unit_is_dropped_and_others_survive() {
        let mut tables = PersistedTables::new();
        tables.insert(UnitId::new(1), sample_table());
        let good = encode_tables(&tables).unwrap();
        let good_rows: serde_json::Value = serde_json::from_str(&good).unwrap();

        let mut document = serde_json::Map::new();
        document.insert("1".to_owned(), good_rows["1"].clone());
        document.insert("2".to_owned(), serde_json::json!([{ "signature": 5 }]));
        document.insert(
            "4".to_owned(),
            serde_json::json!([{
                "signature": good_rows["1"][0]["signature"].clone(),
                "action": "harvest",
                "value": null
            }]),
        );
        document.insert("unit-x".to_owned(), serde_json::json!([]));

        let decoded = decode_tables(&serde_json::Value::Object(document).to_string());
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get(&UnitId::new(1)), Some(&sample_table()));
    }
}
