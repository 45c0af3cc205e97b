mod common;
use common::{session_for, session_with_people};
use dbhelper::{
    AppError, CommandType, DbType, DbValue, Parameter, ParameterDirection, Statement,
};

#[test]
fn test_sized_text_parameter_is_truncated() {
    let param = Parameter::sized("@code", DbType::VarChar, 3, "ABCDEF");
    assert_eq!(param.bound_value().unwrap(), DbValue::Text("ABC".into()));

    let blob = Parameter::sized("@bin", DbType::VarBinary, 2, vec![1u8, 2, 3]);
    assert_eq!(blob.bound_value().unwrap(), DbValue::Blob(vec![1, 2]));

    // size 0 means "no limit"
    let unlimited = Parameter::sized("@code", DbType::Text, 0, "ABCDEF");
    assert_eq!(unlimited.bound_value().unwrap(), DbValue::Text("ABCDEF".into()));
}

#[test]
fn test_sized_parameter_roundtrips_through_table() {
    let mut session = session_for("sized_param_table");
    session
        .execute_non_query("CREATE TABLE codes(code TEXT)")
        .unwrap();

    session.add_sized_parameter("@code", DbType::Char, 2, "XYZ");
    session
        .execute_non_query("INSERT INTO codes VALUES (@code)")
        .unwrap();

    let code = session.execute_scalar("SELECT code FROM codes").unwrap();
    assert_eq!(code, Some(DbValue::Text("XY".into())));
}

#[test]
fn test_type_tags_coerce_values() {
    let bit = Parameter::new("@b", DbType::Bit, "true");
    assert_eq!(bit.bound_value().unwrap(), DbValue::Integer(1));

    let bit_from_int = Parameter::new("@b", DbType::Bit, 7);
    assert_eq!(bit_from_int.bound_value().unwrap(), DbValue::Integer(1));

    let int_from_text = Parameter::new("@i", DbType::BigInt, " 12 ");
    assert_eq!(int_from_text.bound_value().unwrap(), DbValue::Integer(12));

    let real_from_int = Parameter::new("@r", DbType::Decimal, 3);
    assert_eq!(real_from_int.bound_value().unwrap(), DbValue::Real(3.0));

    let text_from_int = Parameter::new("@t", DbType::Text, 99);
    assert_eq!(text_from_int.bound_value().unwrap(), DbValue::Text("99".into()));

    let date = Parameter::new("@d", DbType::Date, "2025-09-15 08:30:00");
    assert_eq!(date.bound_value().unwrap(), DbValue::Text("2025-09-15".into()));

    let datetime = Parameter::new("@dt", DbType::DateTime, "2025-09-15T08:30:00");
    assert_eq!(
        datetime.bound_value().unwrap(),
        DbValue::Text("2025-09-15 08:30:00".into())
    );

    let null = Parameter::new("@n", DbType::Integer, DbValue::Null);
    assert_eq!(null.bound_value().unwrap(), DbValue::Null);
}

#[test]
fn test_bad_coercion_is_database_error() {
    let param = Parameter::new("@i", DbType::Integer, "not a number");
    match param.bound_value() {
        Err(AppError::DatabaseOperationFailed(msg)) => assert!(msg.contains("@i"), "{msg}"),
        other => panic!("expected DatabaseOperationFailed, got {other:?}"),
    }
}

#[test]
fn test_bad_coercion_fails_execution_and_closes() {
    let mut session = session_for("bad_coercion_exec");
    let err = session
        .execute_scalar(
            Statement::text("SELECT @flag")
                .with_parameter(Parameter::new("@flag", DbType::Bit, "maybe")),
        )
        .err()
        .expect("coercion must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(_)));
    assert!(!session.is_open());
}

#[test]
fn test_parameter_names_match_any_prefix() {
    let mut session = session_for("param_prefix");

    let value = session
        .execute_scalar(
            Statement::text("SELECT :value * 2")
                .with_parameter(Parameter::new("value", DbType::Integer, 21)),
        )
        .unwrap();
    assert_eq!(value, Some(DbValue::Integer(42)));

    let value = session
        .execute_scalar(
            Statement::text("SELECT $v || '!'")
                .with_parameter(Parameter::new("@v", DbType::Text, "hi")),
        )
        .unwrap();
    assert_eq!(value, Some(DbValue::Text("hi!".into())));
}

#[test]
fn test_parameter_without_placeholder_fails() {
    let mut session = session_for("param_missing_placeholder");
    let err = session
        .execute_scalar(
            Statement::text("SELECT 1").with_parameter(Parameter::new("@x", DbType::Integer, 1)),
        )
        .err()
        .expect("unbound parameter must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("@x")));
}

#[test]
fn test_output_parameters_read_returning_row() {
    let mut session = session_with_people("output_returning");

    let affected = session
        .execute_non_query(
            Statement::text("INSERT INTO people (name, age) VALUES (@name, @age) RETURNING id")
                .with_parameter(Parameter::new("@name", DbType::Text, "Barbara"))
                .with_parameter(Parameter::new("@age", DbType::Integer, 41))
                .with_parameter(Parameter::output("@id", DbType::Integer))
                .with_parameter(
                    Parameter::new("@rows", DbType::Integer, DbValue::Null)
                        .with_direction(ParameterDirection::ReturnValue),
                ),
        )
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(session.parameter_value("@id"), Some(&DbValue::Integer(4)));
    assert_eq!(session.parameter_value("rows"), Some(&DbValue::Integer(1)));
    // input parameters keep their values
    assert_eq!(
        session.parameter_value("@name"),
        Some(&DbValue::Text("Barbara".into()))
    );
}

#[test]
fn test_return_value_receives_scalar() {
    let mut session = session_with_people("return_scalar");

    session.add_parameter_value_with_direction(
        "@result",
        DbType::Integer,
        DbValue::Null,
        ParameterDirection::ReturnValue,
    );
    let count = session.execute_scalar("SELECT COUNT(*) FROM people").unwrap();

    assert_eq!(count, Some(DbValue::Integer(3)));
    assert_eq!(session.parameter_value("result"), Some(&DbValue::Integer(3)));
}

#[test]
fn test_input_output_parameter_is_bound_and_refreshed() {
    let mut session = session_with_people("input_output");

    session.add_sized_parameter_with_direction(
        "@age",
        DbType::Integer,
        0,
        36,
        ParameterDirection::InputOutput,
    );
    session
        .execute_non_query("UPDATE people SET age = @age + 1 WHERE age = @age RETURNING age")
        .unwrap();

    assert_eq!(session.parameter_value("@age"), Some(&DbValue::Integer(37)));
}

#[test]
fn test_stored_procedure_runs_registered_sql() {
    let mut session = session_with_people("procedure");
    session.register_procedure("adults", "SELECT name FROM people WHERE age >= @min ORDER BY name");

    let ds = session
        .get_data_set(
            Statement::procedure("adults")
                .with_parameter(Parameter::new("@min", DbType::Integer, 30)),
        )
        .unwrap();

    let table = ds.first().expect("one table");
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.value(0, "name"), Some(&DbValue::Text("Ada".into())));
}

#[test]
fn test_unknown_procedure_fails() {
    let mut session = session_for("unknown_procedure");
    let err = session
        .execute_non_query(Statement::new(CommandType::StoredProcedure, "nope"))
        .err()
        .expect("unknown procedure must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("no such procedure")));
    assert!(!session.is_open());
}

#[test]
fn test_table_direct_selects_all_rows() {
    let mut session = session_with_people("table_direct");
    let ds = session.get_data_set(Statement::table("people")).unwrap();
    let table = ds.table("Table").expect("default table name");
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_names(), vec!["id", "name", "age"]);
}
