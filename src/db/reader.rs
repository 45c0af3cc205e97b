//! Forward-only cursor returned by `Session::execute_reader`.

use crate::db::dataset::{DataColumn, DataRow, DataTable};
use crate::db::session::{ConnectionState, Session};
use crate::db::value::DbValue;

/// Rows are handed out in order, once, one result set after the other
/// (`next_result`). The reader owns the session's open connection:
/// `close()` (or dropping the reader) closes it.
#[derive(Debug)]
pub struct DataReader<'s> {
    session: &'s mut Session,
    pending: std::vec::IntoIter<DataTable>,
    columns: Vec<DataColumn>,
    rows: std::vec::IntoIter<DataRow>,
    current: Option<DataRow>,
    has_rows: bool,
    records_affected: Option<usize>,
    closed: bool,
}

impl<'s> DataReader<'s> {
    pub(crate) fn new(
        session: &'s mut Session,
        results: Vec<DataTable>,
        records_affected: Option<usize>,
    ) -> Self {
        let mut reader = Self {
            session,
            pending: results.into_iter(),
            columns: Vec::new(),
            rows: Vec::new().into_iter(),
            current: None,
            has_rows: false,
            records_affected,
            closed: false,
        };
        reader.load_next();
        reader
    }

    fn load_next(&mut self) -> bool {
        let table = self.pending.next();
        let loaded = table.is_some();
        let table = table.unwrap_or_default();
        self.columns = table.columns;
        self.has_rows = !table.rows.is_empty();
        self.rows = table.rows.into_iter();
        self.current = None;
        loaded
    }

    /// Moves to the next result set of a batch. Returns false when there is
    /// none left or the reader is closed.
    pub fn next_result(&mut self) -> bool {
        !self.closed && self.load_next()
    }

    /// Advances to the next row. Returns false once the rows are exhausted
    /// or the reader is closed.
    pub fn read(&mut self) -> bool {
        if self.closed {
            self.current = None;
            return false;
        }
        self.current = self.rows.next();
        self.current.is_some()
    }

    /// Value of column `index` in the current row.
    pub fn get(&self, index: usize) -> Option<&DbValue> {
        self.current.as_ref()?.get(index)
    }

    /// Value of the named column (case-insensitive) in the current row.
    pub fn get_by_name(&self, name: &str) -> Option<&DbValue> {
        let idx = self.ordinal(name)?;
        self.get(idx)
    }

    pub fn current_row(&self) -> Option<&DataRow> {
        self.current.as_ref()
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn has_rows(&self) -> bool {
        self.has_rows
    }

    /// Rows changed by the statement; `None` for read-only statements.
    pub fn records_affected(&self) -> Option<usize> {
        self.records_affected
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    /// Closes the reader and the session's connection. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.current = None;
            self.session.close_connection();
        }
    }
}

impl Iterator for DataReader<'_> {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        if self.read() {
            self.current.clone()
        } else {
            None
        }
    }
}

impl Drop for DataReader<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
