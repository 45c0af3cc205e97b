mod common;
use common::{connection_strings, session_for, setup_test_db};
use dbhelper::{
    AppError, ConnectionState, DEFAULT_CONNECTION_NAME, DbType, DbValue, Parameter, Session,
    Statement,
};
use std::collections::HashMap;

#[test]
fn test_unknown_connection_name_is_configuration_missing() {
    let source: HashMap<String, String> = HashMap::new();

    match Session::new(&source) {
        Err(AppError::ConfigurationMissing(name)) => assert_eq!(name, "DbHelper"),
        other => panic!("expected ConfigurationMissing, got {other:?}"),
    }

    let db = setup_test_db("named_missing");
    match Session::with_name(&connection_strings(&db), "Reporting") {
        Err(AppError::ConfigurationMissing(name)) => assert_eq!(name, "Reporting"),
        other => panic!("expected ConfigurationMissing, got {other:?}"),
    }
}

#[test]
fn test_construction_does_not_open_connection() {
    let session = session_for("construct_closed");
    assert_eq!(session.connection_state(), ConnectionState::Closed);
    assert!(session.connection_string().starts_with("Data Source="));
}

#[test]
fn test_open_connection_is_idempotent() {
    let mut session = session_for("open_twice");

    session.open_connection().expect("first open");
    session.open_connection().expect("second open");
    assert_eq!(session.connection_state(), ConnectionState::Open);

    session.close_connection();
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_close_connection_is_idempotent() {
    let mut session = session_for("close_twice");

    session.close_connection();
    session.close_connection();
    assert_eq!(session.connection_state(), ConnectionState::Closed);

    session.open_connection().expect("open");
    session.close_connection();
    session.close_connection();
    assert!(!session.is_open());
}

#[test]
fn test_create_table_then_count_is_zero() {
    let mut session = session_for("create_count");

    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");
    let count = session
        .execute_scalar("SELECT COUNT(*) FROM t")
        .expect("count");

    assert_eq!(count, Some(DbValue::Integer(0)));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_parameterized_insert_then_select() {
    let mut session = session_for("insert_42");

    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");

    let affected = session
        .execute_non_query(
            Statement::text("INSERT INTO t(id) VALUES (@id)")
                .with_parameter(Parameter::new("@id", DbType::Integer, 42)),
        )
        .expect("insert");
    assert_eq!(affected, 1);

    let id = session.execute_scalar("SELECT id FROM t").expect("select");
    assert_eq!(id, Some(DbValue::Integer(42)));
}

#[test]
fn test_scalar_without_rows_is_none() {
    let mut session = session_for("scalar_none");
    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");

    let value = session
        .execute_scalar("SELECT id FROM t")
        .expect("select");
    assert_eq!(value, None);

    let null = session.execute_scalar("SELECT NULL").expect("select null");
    assert_eq!(null, Some(DbValue::Null));
}

#[test]
fn test_closing_variants_end_closed_on_success() {
    let mut session = session_for("closing_success");

    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");
    assert_eq!(session.connection_state(), ConnectionState::Closed);

    session.execute_scalar("SELECT 1").expect("scalar");
    assert_eq!(session.connection_state(), ConnectionState::Closed);

    let ds = session.get_data_set("SELECT * FROM t").expect("data set");
    assert_eq!(ds.tables.len(), 1);
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_invalid_scalar_fails_and_closes() {
    let mut session = session_for("scalar_invalid");

    let err = session
        .execute_scalar("SELEC 1 FROM")
        .err()
        .expect("invalid SQL must fail");

    match err {
        AppError::DatabaseOperationFailed(msg) => assert!(msg.contains("syntax error"), "{msg}"),
        other => panic!("expected DatabaseOperationFailed, got {other:?}"),
    }
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_non_query_and_data_set_failures_close() {
    let mut session = session_for("closing_failure");

    let err = session
        .execute_non_query("INSERT INTO missing_table VALUES (1)")
        .err()
        .expect("missing table must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("missing_table")));
    assert_eq!(session.connection_state(), ConnectionState::Closed);

    let err = session
        .get_data_set("SELECT * FROM missing_table")
        .err()
        .expect("missing table must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(_)));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_clear_parameters_leaves_none_attached() {
    let mut session = session_for("clear_params");

    session.add_parameter_value("@a", DbType::Integer, 1);
    session.add_sized_parameter("@b", DbType::VarChar, 10, "text");
    session.add_parameters(&[Parameter::new("@c", DbType::Real, 1.5)]);
    assert_eq!(session.parameters().len(), 3);

    session.clear_parameters();
    assert!(session.parameters().is_empty());

    // clearing an empty list is fine too
    session.clear_parameters();
    assert!(session.parameters().is_empty());
}

#[test]
fn test_add_parameters_ignores_empty_slice() {
    let mut session = session_for("add_empty");
    session.add_parameters(&[]);
    assert!(session.parameters().is_empty());

    session.add_range_parameters(vec![
        Parameter::new("@x", DbType::Integer, 1),
        Parameter::new("@y", DbType::Integer, 2),
    ]);
    assert_eq!(session.parameters().len(), 2);
}

#[test]
fn test_parameters_do_not_leak_between_statements() {
    let mut session = session_for("no_leak");
    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");

    session
        .execute_non_query(
            Statement::text("INSERT INTO t(id) VALUES (@id)")
                .with_parameter(Parameter::new("@id", DbType::Integer, 7)),
        )
        .expect("insert");
    assert_eq!(session.parameters().len(), 1);

    // A leaked @id would fail to bind: the next statement has no placeholder.
    let count = session
        .execute_scalar("SELECT COUNT(*) FROM t")
        .expect("count");
    assert_eq!(count, Some(DbValue::Integer(1)));
    assert!(session.parameters().is_empty());
}

#[test]
fn test_staged_parameters_bind_to_next_statement() {
    let mut session = session_for("staged_params");
    session
        .execute_non_query("CREATE TABLE t(id INT, name TEXT)")
        .expect("create table");

    let param = session.add_parameter_value("@id", DbType::Integer, 5);
    assert_eq!(param.value, DbValue::Integer(5));
    session.add_parameter_value("@name", DbType::Text, "five");

    session
        .execute_non_query("INSERT INTO t(id, name) VALUES (@id, @name)")
        .expect("insert with staged params");

    let name = session
        .execute_scalar("SELECT name FROM t WHERE id = 5")
        .expect("select");
    assert_eq!(name, Some(DbValue::Text("five".into())));
}

#[test]
fn test_statement_parameters_replace_staged_ones() {
    let mut session = session_for("staged_replaced");

    session.add_parameter_value("@a", DbType::Integer, 1);
    let value = session
        .execute_scalar(
            Statement::text("SELECT @b").with_parameter(Parameter::new("@b", DbType::Integer, 7)),
        )
        .expect("staged @a must not be bound");

    assert_eq!(value, Some(DbValue::Integer(7)));
    assert_eq!(session.parameters().len(), 1);
    assert_eq!(session.parameters()[0].name, "@b");
}

#[test]
fn test_non_query_runs_every_statement_of_a_batch() {
    let mut session = session_for("batch_non_query");

    let affected = session
        .execute_non_query("CREATE TABLE a(x INT); CREATE TABLE b(y INT)")
        .expect("batch");
    assert_eq!(affected, 0);
    assert_eq!(session.connection_state(), ConnectionState::Closed);

    let tables = session
        .execute_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name IN ('a', 'b')")
        .expect("count tables");
    assert_eq!(tables, Some(DbValue::Integer(2)));

    // one parameter shared by several statements, trailing separator
    let affected = session
        .execute_non_query(
            Statement::text(
                "INSERT INTO a VALUES (@v); INSERT INTO b VALUES (@v); INSERT INTO b VALUES (@v + 1);",
            )
            .with_parameter(Parameter::new("@v", DbType::Integer, 5)),
        )
        .expect("insert batch");
    assert_eq!(affected, 3);

    let sum = session
        .execute_scalar("SELECT SUM(y) FROM b")
        .expect("sum");
    assert_eq!(sum, Some(DbValue::Integer(11)));
}

#[test]
fn test_batch_statements_see_earlier_ones() {
    let mut session = session_for("batch_dependent");

    let affected = session
        .execute_non_query("CREATE TABLE t(id INT); INSERT INTO t VALUES (1), (2)")
        .expect("create then insert");
    assert_eq!(affected, 2);

    let count = session
        .execute_scalar("INSERT INTO t VALUES (3); SELECT COUNT(*) FROM t")
        .expect("scalar from later statement");
    assert_eq!(count, Some(DbValue::Integer(3)));
}

#[test]
fn test_batch_parameter_used_by_no_statement_fails() {
    let mut session = session_for("batch_unused_param");

    let err = session
        .execute_non_query(
            Statement::text("CREATE TABLE t(id INT); INSERT INTO t VALUES (@id)")
                .with_parameter(Parameter::new("@id", DbType::Integer, 1))
                .with_parameter(Parameter::new("@other", DbType::Integer, 2)),
        )
        .err()
        .expect("unused parameter must fail");

    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("@other")));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_dropping_open_session_releases_database() {
    let db_path = setup_test_db("drop_open_session");
    let mut holder = Session::new(&connection_strings(&db_path)).expect("session");
    holder
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");

    // Keep an exclusive transaction running on the session's connection,
    // without letting the reader close it.
    let reader = holder.execute_reader("BEGIN EXCLUSIVE").expect("begin");
    std::mem::forget(reader);
    assert!(holder.is_open());

    let mut source = connection_strings(&db_path);
    source.insert(
        DEFAULT_CONNECTION_NAME.to_string(),
        format!("Data Source={db_path};Busy Timeout=0"),
    );
    let mut other = Session::new(&source).expect("second session");

    let err = other
        .execute_non_query("INSERT INTO t VALUES (1)")
        .err()
        .expect("database is locked while the first session is open");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("locked")));

    drop(holder);

    let affected = other
        .execute_non_query("INSERT INTO t VALUES (1)")
        .expect("lock released on drop");
    assert_eq!(affected, 1);
}

#[test]
fn test_connection_string_change_applies_on_next_open() {
    let db_a = setup_test_db("conn_change_a");
    let db_b = setup_test_db("conn_change_b");
    let mut session = Session::new(&connection_strings(&db_a)).expect("session");

    session.open_connection().expect("open a");
    session.set_connection_string(format!("Data Source={db_b}"));
    assert_eq!(session.connection_state(), ConnectionState::Open);

    // Still connected to A: the already-open connection is reused.
    session.open_connection().expect("noop open");
    session.close_connection();

    session
        .execute_non_query("CREATE TABLE only_in_b(id INT)")
        .expect("create in b");

    let mut check_a = Session::new(&connection_strings(&db_a)).expect("session a");
    let in_a = check_a
        .execute_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name = 'only_in_b'")
        .expect("query a");
    assert_eq!(in_a, Some(DbValue::Integer(0)));

    let in_b = session
        .execute_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name = 'only_in_b'")
        .expect("query b");
    assert_eq!(in_b, Some(DbValue::Integer(1)));
}

#[test]
fn test_invalid_connection_string_fails_on_open() {
    let mut source = HashMap::new();
    source.insert("DbHelper".to_string(), "Data Source=x.db;Colour=blue".to_string());

    let mut session = Session::new(&source).expect("construction does not parse");
    let err = session
        .execute_scalar("SELECT 1")
        .err()
        .expect("bad keyword must fail");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("colour")));
    assert_eq!(session.connection_state(), ConnectionState::Closed);
}

#[test]
fn test_memory_mode_session() {
    let mut source = HashMap::new();
    source.insert("Mem".to_string(), "Mode=Memory".to_string());

    let mut session = Session::with_name(&source, "Mem").expect("session");
    let sum = session.execute_scalar("SELECT 40 + 2").expect("scalar");
    assert_eq!(sum, Some(DbValue::Integer(42)));
}

#[test]
fn test_memory_database_does_not_outlive_closing_calls() {
    let mut source = HashMap::new();
    source.insert("Mem".to_string(), ":memory:".to_string());
    let mut session = Session::with_name(&source, "Mem").expect("session");

    session
        .execute_non_query("CREATE TABLE t(id INT)")
        .expect("create table");

    // the connection was closed, and the memory database with it
    let err = session
        .execute_scalar("SELECT COUNT(*) FROM t")
        .err()
        .expect("table is gone");
    assert!(matches!(err, AppError::DatabaseOperationFailed(ref m) if m.contains("no such table")));
}
