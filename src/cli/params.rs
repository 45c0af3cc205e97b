//! Parsing of `--param` values and building statements from CLI args.

use crate::cli::parser::StatementArgs;
use crate::db::{CommandType, DbType, DbValue, Parameter, Statement};
use crate::errors::{AppError, AppResult};

/// Parses `NAME=VALUE` or `NAME:TYPE=VALUE`.
///
/// Without a type, integers bind as `BigInt`, decimals as `Real` and
/// anything else as `Text`. A bare `NULL` (any case) binds SQL NULL.
pub fn parse_param(raw: &str) -> AppResult<Parameter> {
    let (lhs, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::InvalidParameter(format!("expected NAME=VALUE, got '{raw}'")))?;

    // `:name` is a placeholder prefix, not a type separator.
    let (name, type_name) = match lhs.rsplit_once(':') {
        Some((name, ty)) if !name.trim().trim_start_matches(['@', ':', '$']).is_empty() => {
            (name.trim(), Some(ty.trim()))
        }
        _ => (lhs.trim(), None),
    };

    if name.trim_start_matches(['@', ':', '$']).is_empty() {
        return Err(AppError::InvalidParameter(format!("missing name in '{raw}'")));
    }

    let value_is_null = value.eq_ignore_ascii_case("null");

    let db_type = match type_name {
        Some(ty) => DbType::from_name(ty)
            .ok_or_else(|| AppError::InvalidParameter(format!("unknown type '{ty}'")))?,
        None if value.parse::<i64>().is_ok() => DbType::BigInt,
        None if value.parse::<f64>().is_ok() => DbType::Real,
        None => DbType::Text,
    };

    let value = if value_is_null {
        DbValue::Null
    } else {
        DbValue::from(value)
    };

    let param = Parameter::new(name, db_type, value);
    // Surface conversion problems as input errors rather than database errors.
    param
        .bound_value()
        .map_err(|e| AppError::InvalidParameter(e.to_string()))?;
    Ok(param)
}

pub fn build_statement(args: &StatementArgs) -> AppResult<Statement> {
    let command_type = if args.procedure {
        CommandType::StoredProcedure
    } else if args.table {
        CommandType::TableDirect
    } else {
        CommandType::Text
    };

    let params = args
        .params
        .iter()
        .map(|p| parse_param(p))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Statement::new(command_type, args.sql.clone()).with_parameters(params))
}
