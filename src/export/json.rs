use crate::db::dataset::{DataColumn, DataRow, DataTable};
use crate::errors::AppResult;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;

/// One row rendered as a JSON object, keys in column order.
struct RowObject<'a> {
    columns: &'a [DataColumn],
    row: &'a DataRow,
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, value) in self.columns.iter().zip(self.row.values()) {
            map.serialize_entry(&col.name, value)?;
        }
        map.end()
    }
}

/// Writes `table` as a pretty-printed JSON array of objects.
pub fn write_json<W: Write>(table: &DataTable, mut out: W) -> AppResult<()> {
    let rows: Vec<RowObject<'_>> = table
        .rows
        .iter()
        .map(|row| RowObject {
            columns: &table.columns,
            row,
        })
        .collect();

    serde_json::to_writer_pretty(&mut out, &rows)?;
    writeln!(out)?;
    Ok(())
}
