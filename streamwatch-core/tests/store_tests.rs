// tests/store_tests.rs
use std::sync::Arc;

use sqlx::Row;

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::{StreamKey, StreamRecord};
use streamwatch_core::{
    db::Database,
    repositories::{SqliteStreamStore, StreamStore},
    services::StreamRegistry,
    Error,
};

async fn setup_test_database() -> Result<Database, Error> {
    let db = Database::new("sqlite::memory:").await?;
    db.migrate().await?;
    Ok(db)
}

fn live_record() -> StreamRecord {
    let mut rec = StreamRecord::new(Platform::Twitch, "afro", "7");
    rec.session_id = "40123".into();
    rec.category = "Just Chatting".into();
    rec.started_at = 1_700_000_000;
    rec.stopped_at = 1_699_990_000;
    rec
}

#[tokio::test]
async fn test_put_then_load_all() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store = SqliteStreamStore::new(db.pool().clone());

    let rec = live_record();
    store.put(&rec).await?;

    let loaded = store.load_all().await?;
    assert_eq!(loaded, vec![rec]);
    Ok(())
}

#[tokio::test]
async fn test_put_is_an_upsert() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store = SqliteStreamStore::new(db.pool().clone());

    let mut rec = live_record();
    store.put(&rec).await?;
    rec.session_id.clear();
    rec.stopped_at = rec.started_at + 3600;
    store.put(&rec).await?;

    let loaded = store.load_all().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], rec);
    Ok(())
}

#[tokio::test]
async fn test_row_is_keyed_and_shaped() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store = SqliteStreamStore::new(db.pool().clone());
    store.put(&live_record()).await?;

    let row = sqlx::query("SELECT key, value FROM stream_records")
        .fetch_one(db.pool())
        .await?;
    let key: String = row.try_get("key")?;
    let value: String = row.try_get("value")?;
    assert_eq!(key, "twitch:afro");

    let json: serde_json::Value = serde_json::from_str(&value)?;
    assert_eq!(json["platform"], "twitch");
    assert_eq!(json["memberID"], "7");
    assert_eq!(json["serviceID"], "afro");
    assert_eq!(json["sessionID"], "40123");
    assert_eq!(json["category"], "Just Chatting");
    assert_eq!(json["startedAt"], 1_700_000_000i64);
    assert_eq!(json["stoppedAt"], 1_699_990_000i64);
    Ok(())
}

#[tokio::test]
async fn test_delete_is_idempotent() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store = SqliteStreamStore::new(db.pool().clone());
    let rec = live_record();
    store.put(&rec).await?;

    store.delete(&rec.key()).await?;
    store.delete(&rec.key()).await?;
    assert!(store.load_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_rows_are_skipped() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store = SqliteStreamStore::new(db.pool().clone());
    store.put(&live_record()).await?;

    sqlx::query("INSERT INTO stream_records (key, value, updated_at) VALUES (?, ?, 0)")
        .bind("youtube:UCbroken")
        .bind("{not json")
        .execute(db.pool())
        .await?;

    let loaded = store.load_all().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].service_id, "afro");
    Ok(())
}

#[tokio::test]
async fn test_registry_reload_after_restart() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let store: Arc<dyn StreamStore> = Arc::new(SqliteStreamStore::new(db.pool().clone()));

    let registry = StreamRegistry::new(store.clone());
    registry.add(Platform::Twitch, "afro", "7").await?;
    registry.add(Platform::YouTube, "UC123", "8").await?;
    registry.add(Platform::Legacy, "bob", "9").await?;
    registry.remove(Platform::Legacy, "bob").await?;

    let key = StreamKey::new(Platform::Twitch, "afro");
    registry
        .update_with(&key, |cur| {
            let mut next = cur.clone();
            next.session_id = "s1".into();
            next.category = "Art".into();
            next.started_at = 1000;
            (Some(next), ())
        })
        .await;

    // Simulate a restart: a fresh registry from the same database.
    let reloaded = StreamRegistry::load(store).await?;
    assert_eq!(reloaded.len().await, 2);
    assert_eq!(reloaded.get(&key).await, registry.get(&key).await);
    assert!(reloaded.get(&StreamKey::new(Platform::Legacy, "bob")).await.is_none());
    assert_eq!(reloaded.by_member_id("8").await.map(|r| r.service_id), Some("UC123".to_string()));
    Ok(())
}
