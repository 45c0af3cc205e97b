use crate::db::dataset::DataTable;
use crate::db::value::DbValue;
use crate::errors::AppResult;
use std::io::Write;

/// Writes `table` as CSV with a header row. NULL becomes an empty field.
pub fn write_csv<W: Write>(table: &DataTable, out: W) -> AppResult<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(table.column_names())?;

    for row in &table.rows {
        wtr.write_record(row.values().iter().map(|v| match v {
            DbValue::Null => String::new(),
            other => other.to_string(),
        }))?;
    }

    wtr.flush()?;
    Ok(())
}
