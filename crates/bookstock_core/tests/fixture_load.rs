use bookstock_core::db::open_db_in_memory;
use bookstock_core::{
    load_fixture_file, load_records, EntityKind, FixtureRecord, LoadError, SqliteStoreRepository,
    StoreRepository,
};
use rusqlite::Connection;
use serde_json::json;

fn record(value: serde_json::Value) -> FixtureRecord {
    serde_json::from_value(value).expect("fixture record should decode")
}

// Deliberately lists children before parents so the dependency sort is
// exercised by every test that uses it.
fn full_document() -> Vec<FixtureRecord> {
    vec![
        record(json!({
            "model": "sale",
            "pk": 1000,
            "fields": {"id_stock": 100, "price": 600.5, "date_sale": "2024-03-15"}
        })),
        record(json!({
            "model": "stock",
            "pk": 100,
            "fields": {"id_book": 10, "id_shop": 5, "count": 3}
        })),
        record(json!({
            "model": "book",
            "pk": 10,
            "fields": {"title": "Dead Souls", "id_publisher": 1}
        })),
        record(json!({
            "model": "shop",
            "pk": 5,
            "fields": {"name": "Book Mart"}
        })),
        record(json!({
            "model": "publisher",
            "pk": 1,
            "fields": {"name": "Northern House"}
        })),
    ]
}

fn table_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn loads_out_of_order_document_and_returns_count() {
    let mut conn = open_db_in_memory().unwrap();

    let count = load_records(&mut conn, &full_document()).unwrap();
    assert_eq!(count, 5);

    let repo = SqliteStoreRepository::new(&conn);
    let book = repo.get_book(10).unwrap().unwrap();
    assert_eq!(book.title, "Dead Souls");
    assert_eq!(book.id_publisher, 1);

    let stock = repo.get_stock(100).unwrap().unwrap();
    assert_eq!(stock.id_book, 10);
    assert_eq!(stock.id_shop, 5);
    assert_eq!(stock.count, 3);

    let sale = repo.get_sale(1000).unwrap().unwrap();
    assert_eq!(sale.id_stock, 100);
    assert_eq!(sale.date_sale.to_string(), "2024-03-15");

    assert!(repo.get_publisher(1).unwrap().is_some());
    assert!(repo.get_shop(5).unwrap().is_some());
}

#[test]
fn book_with_missing_publisher_rolls_back_everything() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "pk": 1, "fields": {"name": "Valid House"}})),
        record(json!({"model": "book", "pk": 10, "fields": {"title": "Orphan", "id_publisher": 99}})),
    ];

    let err = load_records(&mut conn, &document).unwrap_err();
    match err {
        LoadError::Reference {
            kind,
            pk,
            field,
            missing_id,
            ..
        } => {
            assert_eq!(kind, EntityKind::Book);
            assert_eq!(pk, Some(10));
            assert_eq!(field, "id_publisher");
            assert_eq!(missing_id, 99);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The valid publisher staged before the failure must not survive.
    assert_eq!(table_count(&conn, "publishers"), 0);
    assert_eq!(table_count(&conn, "books"), 0);
}

#[test]
fn missing_shop_scenario_keeps_database_empty() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "pk": 1, "fields": {"name": "A"}})),
        record(json!({"model": "book", "pk": 10, "fields": {"title": "T", "id_publisher": 1}})),
        record(json!({"model": "stock", "pk": 100, "fields": {"id_book": 10, "id_shop": 5, "count": 3}})),
    ];

    let err = load_records(&mut conn, &document).unwrap_err();
    match err {
        LoadError::Reference {
            kind,
            pk,
            field,
            target,
            missing_id,
        } => {
            assert_eq!(kind, EntityKind::Stock);
            assert_eq!(pk, Some(100));
            assert_eq!(field, "id_shop");
            assert_eq!(target, EntityKind::Shop);
            assert_eq!(missing_id, 5);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(table_count(&conn, "publishers"), 0);
    assert_eq!(table_count(&conn, "books"), 0);
    assert_eq!(table_count(&conn, "stocks"), 0);
}

#[test]
fn same_kind_records_keep_input_order() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "fields": {"name": "First House"}})),
        record(json!({"model": "publisher", "fields": {"name": "Second House"}})),
        record(json!({"model": "publisher", "fields": {"name": "Third House"}})),
    ];

    load_records(&mut conn, &document).unwrap();

    // SQLite assigns rowids in insertion order, so id order mirrors it.
    let mut stmt = conn
        .prepare("SELECT name FROM publishers ORDER BY id;")
        .unwrap();
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, ["First House", "Second House", "Third House"]);
}

#[test]
fn reloading_same_document_fails_on_pk_uniqueness() {
    let mut conn = open_db_in_memory().unwrap();

    load_records(&mut conn, &full_document()).unwrap();
    let err = load_records(&mut conn, &full_document()).unwrap_err();
    assert!(matches!(err, LoadError::Storage(_)));

    // The first load's rows survive the second load's rollback.
    assert_eq!(table_count(&conn, "publishers"), 1);
    assert_eq!(table_count(&conn, "sales"), 1);
}

#[test]
fn connection_stays_usable_after_rollback() {
    let mut conn = open_db_in_memory().unwrap();

    let broken = vec![record(
        json!({"model": "book", "pk": 10, "fields": {"title": "Orphan", "id_publisher": 1}}),
    )];
    load_records(&mut conn, &broken).unwrap_err();

    let count = load_records(&mut conn, &full_document()).unwrap();
    assert_eq!(count, 5);
}

#[test]
fn invalid_date_format_fails_the_batch() {
    let mut conn = open_db_in_memory().unwrap();

    let mut document = full_document();
    document[0] = record(json!({
        "model": "sale",
        "pk": 1000,
        "fields": {"id_stock": 100, "price": 600.5, "date_sale": "15/03/2024"}
    }));

    let err = load_records(&mut conn, &document).unwrap_err();
    match err {
        LoadError::Format { kind, pk, field, .. } => {
            assert_eq!(kind, EntityKind::Sale);
            assert_eq!(pk, Some(1000));
            assert_eq!(field, "date_sale");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(table_count(&conn, "sales"), 0);
    assert_eq!(table_count(&conn, "publishers"), 0);
}

#[test]
fn non_string_date_is_a_format_error() {
    let mut conn = open_db_in_memory().unwrap();

    let mut document = full_document();
    document[0] = record(json!({
        "model": "sale",
        "pk": 1000,
        "fields": {"id_stock": 100, "price": 600.5, "date_sale": 20240315}
    }));

    let err = load_records(&mut conn, &document).unwrap_err();
    assert!(matches!(err, LoadError::Format { field: "date_sale", .. }));
}

#[test]
fn missing_required_field_is_a_format_error() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "pk": 1, "fields": {"name": "A"}})),
        record(json!({"model": "book", "pk": 10, "fields": {"id_publisher": 1}})),
    ];

    let err = load_records(&mut conn, &document).unwrap_err();
    match err {
        LoadError::Format { kind, field, .. } => {
            assert_eq!(kind, EntityKind::Book);
            assert_eq!(field, "title");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unrecognized_kinds_are_skipped_not_counted() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "pk": 1, "fields": {"name": "A"}})),
        record(json!({"model": "author", "pk": 7, "fields": {"name": "N. Gogol"}})),
    ];

    let count = load_records(&mut conn, &document).unwrap();
    assert_eq!(count, 1);
    assert_eq!(table_count(&conn, "publishers"), 1);
}

#[test]
fn string_price_is_accepted() {
    let mut conn = open_db_in_memory().unwrap();

    let mut document = full_document();
    document[0] = record(json!({
        "model": "sale",
        "pk": 1000,
        "fields": {"id_stock": 100, "price": "600.50", "date_sale": "2024-03-15"}
    }));

    load_records(&mut conn, &document).unwrap();

    let repo = SqliteStoreRepository::new(&conn);
    let sale = repo.get_sale(1000).unwrap().unwrap();
    assert!((sale.price - 600.5).abs() < f64::EPSILON);
}

#[test]
fn records_without_pk_get_assigned_ids() {
    let mut conn = open_db_in_memory().unwrap();

    let document = vec![
        record(json!({"model": "publisher", "fields": {"name": "Assigned House"}})),
        record(json!({"model": "book", "fields": {"title": "Assigned", "id_publisher": 1}})),
    ];

    let count = load_records(&mut conn, &document).unwrap();
    assert_eq!(count, 2);

    let repo = SqliteStoreRepository::new(&conn);
    let book = repo.get_book(1).unwrap().unwrap();
    assert_eq!(book.id_publisher, 1);
}

#[test]
fn load_fixture_file_reads_and_loads_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.json");
    std::fs::write(&path, serde_json::to_string(&full_document()).unwrap()).unwrap();

    let mut conn = open_db_in_memory().unwrap();
    let count = load_fixture_file(&mut conn, &path).unwrap();
    assert_eq!(count, 5);
}

#[test]
fn load_fixture_file_surfaces_document_errors() {
    let dir = tempfile::tempdir().unwrap();

    let mut conn = open_db_in_memory().unwrap();
    let err = load_fixture_file(&mut conn, dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, LoadError::Document(_)));

    std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
    let err = load_fixture_file(&mut conn, dir.path().join("broken.json")).unwrap_err();
    assert!(matches!(err, LoadError::Document(_)));
}
