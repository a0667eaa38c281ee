use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{BillCmd, Engine, EngineError, Notifier, UserCmd, UserEvent};
use migration::MigratorTrait;

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<UserEvent>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: &UserEvent) -> Result<(), EngineError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _event: &UserEvent) -> Result<(), EngineError> {
        Err(EngineError::Publish("queue unavailable".to_string()))
    }
}

async fn engine_with_db(notifier: Option<Arc<dyn Notifier>>) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, 1, "alice@example.com").await;
    seed_user(&db, 2, "bob@example.com").await;
    let mut builder = Engine::builder().database(db.clone());
    if let Some(notifier) = notifier {
        builder = builder.notifier(notifier);
    }
    let engine = builder.build().await.unwrap();
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

async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(backend, sql.to_string()))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

#[tokio::test]
async fn create_user_persists_and_emits_event() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, db) = engine_with_db(Some(notifier.clone())).await;

    let created = engine
        .create_user(
            UserCmd::new(10, "carol@example.com", "secret").first_name("Carol"),
            1,
        )
        .await
        .unwrap();

    assert_eq!(created.id, 10);
    assert_eq!(created.created_by, Some(1));
    assert_eq!(created.role, "user");
    assert!(created.lifecycle.is_active());
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM users").await, 3);

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        UserEvent::CreatedUser { payload, user } => {
            assert_eq!(payload.id, 10);
            assert_eq!(payload.first_name, "Carol");
            assert_eq!(user.id, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn create_user_rejects_taken_email_even_if_soft_deleted() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, db) = engine_with_db(Some(notifier.clone())).await;

    let err = engine
        .create_user(UserCmd::new(10, "bob@example.com", "secret"), 1)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("bob@example.com".to_string()));

    engine
        .create_user(UserCmd::new(11, "carol@example.com", "secret"), 1)
        .await
        .unwrap();
    engine.delete_user(11, 1).await.unwrap();

    let err = engine
        .create_user(UserCmd::new(12, "carol@example.com", "secret"), 1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey("carol@example.com".to_string())
    );

    // Only the successful create and delete made it out.
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM users").await, 3);
    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn create_user_requires_a_live_acting_user() {
    let (engine, db) = engine_with_db(None).await;

    let err = engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 99)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM users").await, 2);
}

#[tokio::test]
async fn update_user_is_scoped_to_the_creator() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, _db) = engine_with_db(Some(notifier.clone())).await;

    engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 1)
        .await
        .unwrap();

    // Bob did not create Carol, so his update matches nothing.
    let err = engine
        .update_user(
            UserCmd::new(10, "carol@example.com", "secret").first_name("Hijack"),
            2,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not update the user.".to_string())
    );

    let updated = engine
        .update_user(
            UserCmd::new(10, "carol@new.example.com", "secret").first_name("Carol"),
            1,
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "carol@new.example.com");

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], UserEvent::UpdatedUser { payload, user }
        if payload.email == "carol@new.example.com" && user.id == 1));
}

#[tokio::test]
async fn delete_user_cascades_and_restore_mirrors_it() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, _db) = engine_with_db(Some(notifier.clone())).await;

    engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 1)
        .await
        .unwrap();

    let kept = engine
        .create_bill(BillCmd::new(10, "100", "Enel", "Rome").consumer("Anna"))
        .await
        .unwrap();
    let dropped = engine
        .create_bill(BillCmd::new(10, "200", "Acea", "Milan").consumer("Marco"))
        .await
        .unwrap();
    let anna_id = kept.consumers[0].id;

    // Carol had already deleted one bill on her own before the cascade.
    engine.delete_bill(dropped.id, 10).await.unwrap();

    let deleted = engine.delete_user(10, 1).await.unwrap();
    assert!(deleted.lifecycle.is_deleted());

    let err = engine.bill(kept.id, 10).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("bill not exists".to_string()));
    let err = engine.consumer(anna_id, 10).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("consumer not exists".to_string())
    );
    let err = engine.receiver(kept.receiver.id, 10).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("receiver not exists".to_string())
    );

    let restored = engine.restore_user(10, 1).await.unwrap();
    assert!(restored.lifecycle.is_active());

    // Everything the cascade took down is back.
    assert_eq!(engine.bill(kept.id, 10).await.unwrap().amount, "100");
    assert_eq!(engine.consumer(anna_id, 10).await.unwrap().name, "Anna");
    assert_eq!(
        engine.location(kept.location.id, 10).await.unwrap().name,
        "Rome"
    );

    // The bill Carol deleted herself keeps its own deletion.
    let err = engine.bill(dropped.id, 10).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("bill not exists".to_string()));
    assert_eq!(engine.deleted_bill(dropped.id, 10).await.unwrap().id, dropped.id);

    let events = notifier.events.lock().unwrap();
    let names: Vec<&str> = events.iter().map(UserEvent::name).collect();
    assert_eq!(
        names,
        vec!["created_user", "deleted_user", "restored_user"]
    );
}

#[tokio::test]
async fn delete_user_is_scoped_to_the_creator() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (engine, _db) = engine_with_db(Some(notifier.clone())).await;

    engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 1)
        .await
        .unwrap();

    let err = engine.delete_user(10, 2).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not delete the user.".to_string())
    );

    let err = engine.restore_user(10, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NoEffect("Could not restore the user.".to_string())
    );

    // Only the create emitted an event.
    assert_eq!(notifier.events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn publish_failure_surfaces_but_the_commit_stands() {
    let (engine, db) = engine_with_db(Some(Arc::new(FailingNotifier))).await;

    let err = engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 1)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Publish("queue unavailable".to_string()));

    // The row exists regardless: the event is lost, the state is not.
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM users WHERE id = 10").await,
        1
    );
}

#[tokio::test]
async fn mutations_without_a_notifier_still_work() {
    let (engine, _db) = engine_with_db(None).await;

    let created = engine
        .create_user(UserCmd::new(10, "carol@example.com", "secret"), 1)
        .await
        .unwrap();
    assert_eq!(created.id, 10);
}
