//! Disconnected, fully buffered result tables.

use crate::db::value::DbValue;
use crate::errors::AppResult;
use std::ops::Index;

/// Name given to the table produced by a plain fill.
pub const DEFAULT_TABLE_NAME: &str = "Table";

#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    pub name: String,
    /// Declared column type, when the column maps to a table column.
    pub decl_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow {
    values: Vec<DbValue>,
}

impl DataRow {
    pub fn new(values: Vec<DbValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[DbValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<DbValue> {
        self.values
    }
}

impl Index<usize> for DataRow {
    type Output = DbValue;

    fn index(&self, index: usize) -> &DbValue {
        &self.values[index]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Case-insensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&DbValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    pub tables: Vec<DataTable>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&DataTable> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// First table, the one a plain fill produces.
    pub fn first(&self) -> Option<&DataTable> {
        self.tables.first()
    }

    /// Inserts `table`, replacing a table with the same name.
    pub fn put(&mut self, table: DataTable) {
        match self
            .tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(&table.name))
        {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Appends rows to the named table, creating it on first use. The
    /// existing column list wins when the table is already there.
    pub(crate) fn merge(&mut self, table: DataTable) -> usize {
        let added = table.rows.len();
        match self
            .tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(&table.name))
        {
            Some(existing) => {
                if existing.columns.is_empty() {
                    existing.columns = table.columns;
                }
                existing.rows.extend(table.rows);
            }
            None => self.tables.push(table),
        }
        added
    }
}

/// Reads the column layout of a prepared statement.
pub(crate) fn columns_of(stmt: &rusqlite::Statement<'_>) -> Vec<DataColumn> {
    stmt.columns()
        .into_iter()
        .map(|c| DataColumn {
            name: c.name().to_string(),
            decl_type: c.decl_type().map(str::to_string),
        })
        .collect()
}

/// Copies one row into owned values.
pub(crate) fn read_row(row: &rusqlite::Row<'_>, column_count: usize) -> rusqlite::Result<DataRow> {
    let values = (0..column_count)
        .map(|i| row.get_ref(i).map(DbValue::from))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(DataRow::new(values))
}

/// Steps every remaining row of `rows` into owned values.
pub(crate) fn collect_rows(
    mut rows: rusqlite::Rows<'_>,
    column_count: usize,
) -> AppResult<Vec<DataRow>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_row(row, column_count)?);
    }
    Ok(out)
}
