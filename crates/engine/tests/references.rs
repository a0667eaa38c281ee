use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{BillCmd, Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, 1, "alice@example.com").await;
    seed_user(&db, 2, "bob@example.com").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_user(db: &DatabaseConnection, id: i64, email: &str) {
    let backend = db.get_database_backend();
    let now = Utc::now();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users \
         (id, first_name, last_name, email, password, phone, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            "Test".into(),
            "User".into(),
            email.into(),
            "password".into(),
            "".into(),
            "user".into(),
            now.into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn rename_consumer_updates_the_row() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    let anna_id = bill.consumers[0].id;

    let renamed = engine.rename_consumer(anna_id, " Anne ", 1).await.unwrap();
    assert_eq!(renamed.name, "Anne");

    let fetched = engine.consumer(anna_id, 1).await.unwrap();
    assert_eq!(fetched.name, "Anne");
}

#[tokio::test]
async fn rename_conflicts_even_with_a_soft_deleted_namesake() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumers(["Anna", "Marco"]))
        .await
        .unwrap();
    let anna_id = bill
        .consumers
        .iter()
        .find(|c| c.name == "Anna")
        .unwrap()
        .id;
    let marco_id = bill
        .consumers
        .iter()
        .find(|c| c.name == "Marco")
        .unwrap()
        .id;

    engine.delete_consumer(marco_id, 1).await.unwrap();

    let err = engine.rename_consumer(anna_id, "Marco", 1).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Marco".to_string()));

    // The failed rename left the row alone.
    let unchanged = engine.consumer(anna_id, 1).await.unwrap();
    assert_eq!(unchanged.name, "Anna");
}

#[tokio::test]
async fn rename_rejects_empty_names() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();

    let err = engine
        .rename_consumer(bill.consumers[0].id, "   ", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
}

#[tokio::test]
async fn reference_ops_are_scoped_to_the_owner() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    let anna_id = bill.consumers[0].id;

    let err = engine.consumer(anna_id, 2).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("consumer not exists".to_string())
    );

    let err = engine.rename_consumer(anna_id, "Mine", 2).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not update the consumer.".to_string())
    );

    let err = engine.delete_consumer(anna_id, 2).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not delete the consumer.".to_string())
    );
}

#[tokio::test]
async fn delete_and_restore_consumer_round_trip() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    let anna_id = bill.consumers[0].id;

    let deleted = engine.delete_consumer(anna_id, 1).await.unwrap();
    assert!(deleted.lifecycle.is_deleted());

    let err = engine.consumer(anna_id, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("consumer not exists".to_string())
    );

    let err = engine.delete_consumer(anna_id, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not delete the consumer.".to_string())
    );

    let restored = engine.restore_consumer(anna_id, 1).await.unwrap();
    assert!(restored.lifecycle.is_active());
    assert_eq!(engine.consumer(anna_id, 1).await.unwrap().name, "Anna");
}

#[tokio::test]
async fn deleted_consumer_still_resolves_by_name() {
    let (engine, db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    engine.delete_consumer(bill.consumers[0].id, 1).await.unwrap();

    // A new bill for the same name reuses the soft-deleted row instead of
    // creating a twin.
    let second = engine
        .create_bill(BillCmd::new(1, "200", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    assert_eq!(second.consumers[0].id, bill.consumers[0].id);

    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM consumers".to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i64>("", "n").unwrap(), 1);
}

#[tokio::test]
async fn receiver_and_location_ops_mirror_consumers() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .create_bill(BillCmd::new(1, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();

    let renamed = engine
        .rename_receiver(bill.receiver.id, "Acea", 1)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Acea");

    let deleted = engine.delete_location(bill.location.id, 1).await.unwrap();
    assert!(deleted.lifecycle.is_deleted());
    let err = engine.location(bill.location.id, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("location not exists".to_string())
    );
    engine.restore_location(bill.location.id, 1).await.unwrap();
    assert_eq!(
        engine.location(bill.location.id, 1).await.unwrap().name,
        "Rome"
    );
}
