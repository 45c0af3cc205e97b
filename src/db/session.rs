//! Database session: one connection, one reusable command.
//!
//! Every execution follows the same steps: prepare the command, open the
//! connection, run the statement, close the connection, return the result.
//! `execute_reader` and `get_data_adapter` skip the final close on success
//! and hand the open connection to the returned handle instead; on failure
//! they close it like every other operation.
//!
//! A session is meant for one caller at a time. All executions take
//! `&mut self`, and the reader/adapter handles keep the session mutably
//! borrowed until they are closed or dropped.

use crate::config::{ConnectionStringSource, DEFAULT_CONNECTION_NAME};
use crate::db::adapter::DataAdapter;
use crate::db::command::{Command, Statement};
use crate::db::connection_string::ConnectOptions;
use crate::db::dataset::{
    DEFAULT_TABLE_NAME, DataColumn, DataRow, DataSet, DataTable, collect_rows, columns_of,
    read_row,
};
use crate::db::parameter::{DbType, Parameter, ParameterDirection};
use crate::db::reader::DataReader;
use crate::db::value::DbValue;
use crate::errors::{AppError, AppResult};
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

#[derive(Debug)]
pub struct Session {
    conn_string: String,
    connection: Option<Connection>,
    command: Command,
    procedures: BTreeMap<String, String>,
}

impl Session {
    /// Session on the default connection name (`DbHelper`).
    pub fn new<S: ConnectionStringSource + ?Sized>(source: &S) -> AppResult<Self> {
        Self::with_name(source, DEFAULT_CONNECTION_NAME)
    }

    /// Session on an explicitly named connection string.
    pub fn with_name<S: ConnectionStringSource + ?Sized>(source: &S, name: &str) -> AppResult<Self> {
        let conn_string = source
            .connection_string(name)
            .ok_or_else(|| AppError::ConfigurationMissing(name.to_string()))?;

        log::debug!("session created for connection '{name}'");

        Ok(Self {
            conn_string,
            connection: None,
            command: Command::default(),
            procedures: source.procedures(),
        })
    }

    // ---------------------------
    // Connection
    // ---------------------------

    pub fn connection_string(&self) -> &str {
        &self.conn_string
    }

    /// Takes effect the next time the connection is opened.
    pub fn set_connection_string(&mut self, conn_string: impl Into<String>) {
        self.conn_string = conn_string.into();
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.connection.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens the connection with the current connection string unless it is
    /// already open.
    pub fn open_connection(&mut self) -> AppResult<()> {
        if self.connection.is_none() {
            let options = ConnectOptions::parse(&self.conn_string)?;
            let conn = options.open()?;
            log::debug!("connection opened: {}", options.data_source);
            self.connection = Some(conn);
        }
        Ok(())
    }

    /// Closes the connection if it is open.
    pub fn close_connection(&mut self) {
        if let Some(conn) = self.connection.take() {
            match conn.close() {
                Ok(()) => log::debug!("connection closed"),
                // The handle is dropped either way; SQLite finishes the close
                // once outstanding statements are finalized.
                Err((_conn, e)) => log::warn!("error while closing connection: {e}"),
            }
        }
    }

    // ---------------------------
    // Command & parameters
    // ---------------------------

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Registers (or replaces) a named statement for
    /// `CommandType::StoredProcedure`.
    pub fn register_procedure(&mut self, name: impl Into<String>, sql: impl Into<String>) {
        self.procedures.insert(name.into(), sql.into());
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.command.parameters()
    }

    /// Value of an attached parameter, matched with or without prefix.
    pub fn parameter_value(&self, name: &str) -> Option<&DbValue> {
        let wanted = name.trim_start_matches(['@', ':', '$']);
        self.command
            .parameters()
            .iter()
            .find(|p| p.bare_name().eq_ignore_ascii_case(wanted))
            .map(|p| &p.value)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> &Parameter {
        self.command.attach([parameter]);
        let params = self.command.parameters();
        &params[params.len() - 1]
    }

    pub fn add_parameter_value(
        &mut self,
        name: &str,
        db_type: DbType,
        value: impl Into<DbValue>,
    ) -> &Parameter {
        self.add_parameter_value_with_direction(name, db_type, value, ParameterDirection::Input)
    }

    pub fn add_parameter_value_with_direction(
        &mut self,
        name: &str,
        db_type: DbType,
        value: impl Into<DbValue>,
        direction: ParameterDirection,
    ) -> &Parameter {
        self.add_parameter(Parameter::new(name, db_type, value).with_direction(direction))
    }

    pub fn add_sized_parameter(
        &mut self,
        name: &str,
        db_type: DbType,
        size: usize,
        value: impl Into<DbValue>,
    ) -> &Parameter {
        self.add_sized_parameter_with_direction(
            name,
            db_type,
            size,
            value,
            ParameterDirection::Input,
        )
    }

    pub fn add_sized_parameter_with_direction(
        &mut self,
        name: &str,
        db_type: DbType,
        size: usize,
        value: impl Into<DbValue>,
        direction: ParameterDirection,
    ) -> &Parameter {
        self.add_parameter(Parameter::sized(name, db_type, size, value).with_direction(direction))
    }

    pub fn add_range_parameters(&mut self, parameters: impl IntoIterator<Item = Parameter>) {
        self.command.attach(parameters);
    }

    /// Attaches all of `parameters`; an empty slice is ignored.
    pub fn add_parameters(&mut self, parameters: &[Parameter]) {
        if !parameters.is_empty() {
            self.command.attach(parameters.iter().cloned());
        }
    }

    pub fn clear_parameters(&mut self) {
        self.command.clear_parameters();
    }

    // ---------------------------
    // Execution
    // ---------------------------

    /// First column of the first row of the first result set; `None` when
    /// no row comes back. Every statement of a batch runs. The connection is
    /// closed afterwards.
    pub fn execute_scalar(&mut self, statement: impl Into<Statement>) -> AppResult<Option<DbValue>> {
        self.run_closing(statement.into(), |conn, command, procedures| {
            let mut first: Option<(Vec<DataColumn>, Option<DataRow>)> = None;

            run_batch(conn, command, procedures, |stmt| {
                let columns = columns_of(stmt);
                if first.is_some() || columns.is_empty() {
                    return execute_statement(stmt, DEFAULT_TABLE_NAME).map(drop);
                }
                let mut rows = stmt.raw_query();
                let row = match rows.next()? {
                    Some(row) => Some(read_row(row, columns.len())?),
                    None => None,
                };
                first = Some((columns, row));
                Ok(())
            })?;

            let (columns, row) = first.unwrap_or_default();
            let scalar = row.as_ref().and_then(|r| r.get(0)).cloned();
            apply_outputs(command, &columns, row.as_ref(), scalar.clone());
            Ok(scalar)
        })
    }

    /// Number of rows changed by all statements of the batch (0 for
    /// read-only statements). The connection is closed afterwards.
    pub fn execute_non_query(&mut self, statement: impl Into<Statement>) -> AppResult<usize> {
        self.run_closing(statement.into(), |conn, command, procedures| {
            let before = conn.total_changes();
            let mut first: Option<DataTable> = None;

            // Statements with a RETURNING clause (or plain SELECTs) are stepped
            // to completion; the first row feeds output parameters.
            run_batch(conn, command, procedures, |stmt| {
                if let Some(table) = execute_statement(stmt, DEFAULT_TABLE_NAME)?
                    && first.is_none()
                {
                    first = Some(table);
                }
                Ok(())
            })?;

            let affected = changes_since(conn, before);
            let (columns, row) = match &first {
                Some(table) => (table.columns.as_slice(), table.rows.first()),
                None => (&[][..], None),
            };
            apply_outputs(
                command,
                columns,
                row,
                Some(DbValue::Integer(affected as i64)),
            );
            Ok(affected)
        })
    }

    /// Forward-only reader over the statement's result sets.
    ///
    /// The statements run to completion here and their rows are buffered;
    /// the reader then hands them out in order. The memory held is that of
    /// the whole result, not of one row.
    ///
    /// On success the connection is left **open**: the caller owns it
    /// through the reader and must `close()` the reader (dropping it also
    /// closes). On failure the connection is closed before returning.
    pub fn execute_reader(&mut self, statement: impl Into<Statement>) -> AppResult<DataReader<'_>> {
        let (results, records_affected) =
            self.run_open(statement.into(), |conn, command, procedures| {
                let before = conn.total_changes();
                let mut results: Vec<DataTable> = Vec::new();
                let mut readonly = true;

                run_batch(conn, command, procedures, |stmt| {
                    readonly &= stmt.readonly();
                    let name = result_set_name(DEFAULT_TABLE_NAME, results.len());
                    if let Some(table) = execute_statement(stmt, &name)? {
                        results.push(table);
                    }
                    Ok(())
                })?;

                let records_affected = if readonly {
                    None
                } else {
                    Some(changes_since(conn, before))
                };
                if let Some(table) = results.first() {
                    apply_outputs(command, &table.columns, table.rows.first(), None);
                }
                Ok((results, records_affected))
            })?;

        Ok(DataReader::new(self, results, records_affected))
    }

    /// Buffers every result set into a `DataSet`, one table per
    /// row-returning statement: `Table`, `Table1`, `Table2`, ...
    /// Statements returning no columns add no table. The connection is
    /// closed afterwards.
    pub fn get_data_set(&mut self, statement: impl Into<Statement>) -> AppResult<DataSet> {
        self.run_closing(statement.into(), |conn, command, procedures| {
            let tables = fill_tables(conn, command, procedures, DEFAULT_TABLE_NAME, false)?;
            let mut data_set = DataSet::new();
            for table in tables {
                data_set.put(table);
            }
            Ok(data_set)
        })
    }

    /// Adapter bound to the prepared command, for repeated fills.
    ///
    /// The statement is compiled (so SQL errors surface here) but not run.
    /// For a batch only the first statement is compiled. On success the
    /// connection is left **open** for the adapter; the caller must
    /// `close()` it (dropping it also closes). On failure the connection is
    /// closed before returning.
    pub fn get_data_adapter(&mut self, statement: impl Into<Statement>) -> AppResult<DataAdapter<'_>> {
        self.run_open(statement.into(), compile)?;
        Ok(DataAdapter::new(self))
    }

    /// Runs the current command again and returns its result sets named
    /// `name`, `name1`, ..., without re-preparing it. Opens the connection
    /// if needed and leaves it as it is afterwards.
    pub(crate) fn fill_current(
        &mut self,
        name: &str,
        schema_only: bool,
    ) -> AppResult<Vec<DataTable>> {
        self.open_connection()?;
        let (conn, command, procedures) = self.parts()?;
        fill_tables(conn, command, procedures, name, schema_only)
    }

    // ---------------------------
    // Internals
    // ---------------------------

    fn parts(&mut self) -> AppResult<(&Connection, &mut Command, &BTreeMap<String, String>)> {
        let conn = self
            .connection
            .as_ref()
            .ok_or_else(|| AppError::DatabaseOperationFailed("connection is closed".into()))?;
        Ok((conn, &mut self.command, &self.procedures))
    }

    /// prepare → open → run → close, the close happening on every path.
    fn run_closing<T>(
        &mut self,
        statement: Statement,
        op: impl FnOnce(&Connection, &mut Command, &BTreeMap<String, String>) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut guard = CloseOnDrop(self);
        guard.prepare(statement);
        guard.open_connection()?;
        let (conn, command, procedures) = guard.parts()?;
        let result = op(conn, command, procedures);
        drop(guard);
        result
    }

    /// prepare → open → run, closing only when something failed.
    fn run_open<T>(
        &mut self,
        statement: Statement,
        op: impl FnOnce(&Connection, &mut Command, &BTreeMap<String, String>) -> AppResult<T>,
    ) -> AppResult<T> {
        self.prepare(statement);
        let result = self.open_connection().and_then(|()| {
            let (conn, command, procedures) = self.parts()?;
            op(conn, command, procedures)
        });
        if result.is_err() {
            self.close_connection();
        }
        result
    }

    fn prepare(&mut self, statement: Statement) {
        log::debug!(
            "prepare {:?} command: {} ({} parameter(s))",
            statement.command_type,
            statement.text,
            statement.parameters.len()
        );
        self.command.prepare(statement);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close_connection();
    }
}

/// Closes the session's connection when it goes out of scope.
struct CloseOnDrop<'a>(&'a mut Session);

impl Deref for CloseOnDrop<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.0
    }
}

impl DerefMut for CloseOnDrop<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.0
    }
}

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close_connection();
    }
}

fn bound_parameters(command: &Command) -> Vec<&Parameter> {
    command
        .parameters()
        .iter()
        .filter(|p| p.direction.is_bound())
        .collect()
}

/// Binds every parameter whose placeholder appears in `stmt` and marks it
/// in `used`.
fn bind_parameters(
    stmt: &mut rusqlite::Statement<'_>,
    bound: &[&Parameter],
    used: &mut [bool],
) -> AppResult<()> {
    for (param, used) in bound.iter().zip(used.iter_mut()) {
        let index = param
            .placeholder_candidates()
            .iter()
            .find_map(|name| stmt.parameter_index(name).transpose())
            .transpose()?;
        if let Some(index) = index {
            stmt.raw_bind_parameter(index, param.bound_value()?)?;
            *used = true;
        }
    }
    Ok(())
}

fn ensure_all_used(bound: &[&Parameter], used: &[bool]) -> AppResult<()> {
    match bound.iter().zip(used).find(|(_, used)| !**used) {
        Some((param, _)) => Err(AppError::DatabaseOperationFailed(format!(
            "parameter {} does not appear in the statement",
            param.name
        ))),
        None => Ok(()),
    }
}

/// Runs every statement of the command's SQL in order. Each statement is
/// compiled only once the previous one has run, and gets the parameters
/// whose placeholder it contains. A parameter no statement uses is an
/// error, reported once the batch has run.
fn run_batch(
    conn: &Connection,
    command: &Command,
    procedures: &BTreeMap<String, String>,
    mut step: impl FnMut(&mut rusqlite::Statement<'_>) -> AppResult<()>,
) -> AppResult<()> {
    let sql = command.resolve_sql(|name| procedures.get(name).cloned())?;
    let bound = bound_parameters(command);
    let mut used = vec![false; bound.len()];

    let mut batch = Batch::new(conn, &sql);
    while let Some(mut stmt) = batch.next()? {
        bind_parameters(&mut stmt, &bound, &mut used)?;
        step(&mut stmt)?;
    }
    ensure_all_used(&bound, &used)
}

/// Compiles the first statement of the command and binds its parameters
/// without running it. Later statements of a batch may depend on earlier
/// ones, so they are left for execution time.
fn compile(
    conn: &Connection,
    command: &mut Command,
    procedures: &BTreeMap<String, String>,
) -> AppResult<()> {
    let sql = command.resolve_sql(|name| procedures.get(name).cloned())?;
    let bound = bound_parameters(command);
    let mut used = vec![false; bound.len()];

    if let Some(mut stmt) = Batch::new(conn, &sql).next()? {
        bind_parameters(&mut stmt, &bound, &mut used)?;
    }
    Ok(())
}

/// Executes `stmt`, collecting its rows as `name` when it returns columns.
fn execute_statement(
    stmt: &mut rusqlite::Statement<'_>,
    name: &str,
) -> AppResult<Option<DataTable>> {
    let columns = columns_of(stmt);
    if columns.is_empty() {
        stmt.raw_execute()?;
        return Ok(None);
    }
    let mut table = DataTable::new(name);
    table.rows = collect_rows(stmt.raw_query(), columns.len())?;
    table.columns = columns;
    Ok(Some(table))
}

/// `Table`, `Table1`, `Table2`, ...
fn result_set_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}{index}")
    }
}

fn fill_tables(
    conn: &Connection,
    command: &mut Command,
    procedures: &BTreeMap<String, String>,
    name: &str,
    schema_only: bool,
) -> AppResult<Vec<DataTable>> {
    let mut tables: Vec<DataTable> = Vec::new();

    run_batch(conn, command, procedures, |stmt| {
        let table_name = result_set_name(name, tables.len());
        if schema_only {
            let columns = columns_of(stmt);
            if !columns.is_empty() {
                let mut table = DataTable::new(table_name);
                table.columns = columns;
                tables.push(table);
            }
        } else if let Some(table) = execute_statement(stmt, &table_name)? {
            tables.push(table);
        }
        Ok(())
    })?;

    if let Some(table) = tables.first() {
        apply_outputs(command, &table.columns, table.rows.first(), None);
    }
    Ok(tables)
}

/// Rows changed by INSERT, UPDATE and DELETE statements (triggers
/// included) since `before` was read from `conn.total_changes()`.
fn changes_since(conn: &Connection, before: u64) -> usize {
    conn.total_changes().saturating_sub(before) as usize
}

/// Copies results back into output-style parameters: `Output` and
/// `InputOutput` take the same-named column of the first row, `ReturnValue`
/// takes the operation's primary result when there is one.
fn apply_outputs(
    command: &mut Command,
    columns: &[DataColumn],
    first_row: Option<&DataRow>,
    primary: Option<DbValue>,
) {
    for param in command.parameters_mut() {
        if param.direction.receives_row() {
            let value = columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(param.bare_name()))
                .and_then(|idx| first_row.and_then(|row| row.get(idx)));
            if let Some(value) = value {
                param.value = value.clone();
            }
        } else if param.direction == ParameterDirection::ReturnValue
            && let Some(primary) = &primary
        {
            param.value = primary.clone();
        }
    }
}
