//! Fill handle returned by `Session::get_data_adapter`.

use crate::db::command::Command;
use crate::db::dataset::{DEFAULT_TABLE_NAME, DataSet};
use crate::db::session::{ConnectionState, Session};
use crate::errors::AppResult;

/// Runs the session's prepared command on demand and loads the rows into
/// a `DataSet`. The adapter owns the session's open connection until it is
/// closed or dropped.
#[derive(Debug)]
pub struct DataAdapter<'s> {
    session: &'s mut Session,
    closed: bool,
}

impl<'s> DataAdapter<'s> {
    pub(crate) fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    /// The command the adapter runs.
    pub fn select_command(&self) -> &Command {
        self.session.command()
    }

    /// Appends the command's rows to the `Table` table of `data_set` (and
    /// `Table1`, `Table2`, ... for further result sets of a batch).
    /// Returns the number of rows added.
    pub fn fill(&mut self, data_set: &mut DataSet) -> AppResult<usize> {
        self.fill_table(data_set, DEFAULT_TABLE_NAME)
    }

    /// Appends the command's rows to the table `name` of `data_set`,
    /// creating it if needed. Further result sets go to `name1`, `name2`, ...
    pub fn fill_table(&mut self, data_set: &mut DataSet, name: &str) -> AppResult<usize> {
        let tables = self.session.fill_current(name, false)?;
        self.closed = false;
        Ok(tables.into_iter().map(|t| data_set.merge(t)).sum())
    }

    /// Adds the command's column layouts to `data_set` without running it.
    pub fn fill_schema(&mut self, data_set: &mut DataSet) -> AppResult<()> {
        let tables = self.session.fill_current(DEFAULT_TABLE_NAME, true)?;
        self.closed = false;
        for table in tables {
            data_set.merge(table);
        }
        Ok(())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    /// Closes the session's connection. Idempotent; a later fill reopens.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.session.close_connection();
        }
    }
}

impl Drop for DataAdapter<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
