//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    shipyard_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("idea"), "missing idea table");
    assert!(info_str.contains("resource"), "missing resource table");
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn schema_v1_applies_on_its_own() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let ddl = shipyard_db::schema_v1();
    assert!(ddl.contains("DEFINE TABLE idea"));
    db.query(ddl).await.unwrap().check().unwrap();

    let mut result = db.query("INFO FOR TABLE idea").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR TABLE should return a value"));
    assert!(info_str.contains("steps"), "missing steps field");
    assert!(info_str.contains("metrics"), "missing metrics field");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    shipyard_db::run_migrations(&db).await.unwrap();
    shipyard_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shipyard_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE idea SET \
             user_id = 'alice', name = 'Tracker', \
             status = 'Abandoned'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "status outside the enum should be rejected");
}

#[tokio::test]
async fn unknown_resource_type_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shipyard_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE resource SET \
             idea_id = 'x', step_id = 'idea', user_id = 'alice', \
             title = 'Docs', url = 'https://example.com', \
             resource_type = 'video'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "resource type outside the enum should be rejected");
}
