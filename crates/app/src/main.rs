use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bolletta={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;

    let mut builder = engine::Engine::builder().database(db);
    if let Some(redis) = settings.redis {
        tracing::info!("Found redis settings...");
        let mut notifier = engine::RedisNotifier::connect(&redis.url).await?;
        if let Some(queue) = redis.queue {
            notifier = notifier.queue_name(queue);
        }
        builder = builder.notifier(Arc::new(notifier));
    }
    let _engine = builder.build().await?;

    tracing::info!("Engine ready.");
    tokio::signal::ctrl_c().await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
