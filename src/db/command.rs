//! The reusable command handle and the per-call statement request.

use crate::db::parameter::Parameter;
use crate::errors::{AppError, AppResult};

/// How the command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandType {
    /// Free-form SQL.
    #[default]
    Text,
    /// Name of a procedure registered in the configuration.
    StoredProcedure,
    /// Name of a table; runs `SELECT * FROM` it.
    TableDirect,
}

/// One unit of work: type, text and the parameters to bind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub command_type: CommandType,
    pub text: String,
    pub parameters: Vec<Parameter>,
}

impl Statement {
    /// Plain SQL text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(CommandType::Text, text)
    }

    pub fn new(command_type: CommandType, text: impl Into<String>) -> Self {
        Self {
            command_type,
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    pub fn procedure(name: impl Into<String>) -> Self {
        Self::new(CommandType::StoredProcedure, name)
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::new(CommandType::TableDirect, name)
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::text(text)
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::text(text)
    }
}

/// Command state owned by a session and reconfigured on every call.
///
/// Parameters attached through the session between two executions are
/// staged for the next statement that carries none of its own; a statement
/// with parameters replaces them. Once a statement has been prepared the
/// list is considered consumed: the next attach or prepare starts from an
/// empty list.
#[derive(Debug, Default)]
pub struct Command {
    text: String,
    command_type: CommandType,
    parameters: Vec<Parameter>,
    consumed: bool,
}

impl Command {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Parameters of the last prepared statement (with any output values
    /// filled in) or the ones staged since.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    pub(crate) fn attach(&mut self, parameters: impl IntoIterator<Item = Parameter>) {
        self.reset_if_consumed();
        self.parameters.extend(parameters);
    }

    pub(crate) fn clear_parameters(&mut self) {
        self.parameters.clear();
        self.consumed = false;
    }

    /// Configures text, type and parameters. Never touches the connection.
    pub(crate) fn prepare(&mut self, statement: Statement) {
        self.reset_if_consumed();
        if !statement.parameters.is_empty() {
            self.parameters.clear();
        }
        self.text = statement.text;
        self.command_type = statement.command_type;
        self.parameters.extend(statement.parameters);
        self.consumed = true;
    }

    fn reset_if_consumed(&mut self) {
        if self.consumed {
            self.parameters.clear();
            self.consumed = false;
        }
    }

    /// SQL actually handed to SQLite for the current command type.
    pub(crate) fn resolve_sql(
        &self,
        procedure: impl FnOnce(&str) -> Option<String>,
    ) -> AppResult<String> {
        match self.command_type {
            CommandType::Text => Ok(self.text.clone()),
            CommandType::StoredProcedure => procedure(self.text.trim()).ok_or_else(|| {
                AppError::DatabaseOperationFailed(format!(
                    "no such procedure: {}",
                    self.text.trim()
                ))
            }),
            CommandType::TableDirect => Ok(format!(
                "SELECT * FROM \"{}\"",
                self.text.trim().replace('"', "\"\"")
            )),
        }
    }
}
