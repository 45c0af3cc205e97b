// src/export/mod.rs

mod csv;
mod fs_utils;
mod json;

pub use self::csv::write_csv;
pub use self::json::write_json;

use crate::db::dataset::DataTable;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use clap::ValueEnum;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Writes `table` to `path`, asking before overwriting unless `force`.
pub fn export_table(
    table: &DataTable,
    format: ExportFormat,
    path: &Path,
    force: bool,
) -> AppResult<()> {
    fs_utils::ensure_writable(path, force)?;

    info(format!(
        "Exporting {} row(s) to {}: {}",
        table.row_count(),
        format.as_str().to_uppercase(),
        path.display()
    ));

    let mut out = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_csv(table, &mut out)?,
        ExportFormat::Json => write_json(table, &mut out)?,
    }
    out.flush()?;

    success(format!(
        "{} export completed: {}",
        format.as_str().to_uppercase(),
        path.display()
    ));
    Ok(())
}
