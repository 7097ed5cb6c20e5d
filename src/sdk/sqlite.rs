//! SQLite document store
//!
//! Every document is one JSON row keyed by `(collection, id)`. Queries load
//! the collection and evaluate filters in process, which is fine for the
//! handful of rooms and months a boarding house has.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::store::{Document, DocumentStore, Fields, Query};
use super::SdkError;

/// Connection work runs on the blocking pool, one statement batch per call
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self, SdkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SdkError::Config(format!("{}: {}", parent.display(), e)))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        Self::init(conn)
    }

    /// Private database, gone when dropped
    pub fn in_memory() -> Result<Self, SdkError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SdkError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection off the async workers
    async fn with_conn<T, F>(&self, f: F) -> Result<T, SdkError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SdkError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| SdkError::Lock(e.to_string()))?;
            f(&guard)
        })
        .await?
    }

    fn read(conn: &Connection, collection: &str, id: &str) -> Result<Option<Fields>, SdkError> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ? AND id = ?",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| decode_body(&b)).transpose()
    }

    fn write(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<(), SdkError> {
        let body = serde_json::to_string(fields)?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
             ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
            params![collection, id, body],
        )?;
        Ok(())
    }
}

fn decode_body(body: &str) -> Result<Fields, SdkError> {
    match serde_json::from_str(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(SdkError::Serialization("stored document is not an object".to_string())),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SdkError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            Ok(Self::read(conn, &collection, &id)?.map(|fields| Document::new(id, fields)))
        })
        .await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| Self::write(conn, &collection, &id, &fields))
            .await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, SdkError> {
        let collection = collection.to_string();
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.with_conn(move |conn| {
            Self::write(conn, &collection, &id, &fields)?;
            Ok(id)
        })
        .await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            let mut existing = Self::read(conn, &collection, &id)?
                .ok_or_else(|| SdkError::not_found(&collection, &id))?;
            existing.extend(fields);
            Self::write(conn, &collection, &id, &existing)
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SdkError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM documents WHERE collection = ? AND id = ?",
                params![collection, id],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_field(&self, collection: &str, id: &str, field: &str) -> Result<(), SdkError> {
        let (collection, id, field) = (collection.to_string(), id.to_string(), field.to_string());
        self.with_conn(move |conn| {
            let mut existing = Self::read(conn, &collection, &id)?
                .ok_or_else(|| SdkError::not_found(&collection, &id))?;
            existing.remove(&field);
            Self::write(conn, &collection, &id, &existing)
        })
        .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, SdkError> {
        let collection = query.collection.clone();
        let docs = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, body FROM documents WHERE collection = ? ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![collection], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;

                let mut docs = Vec::new();
                for row in rows {
                    let (id, body) = row?;
                    docs.push(Document::new(id, decode_body(&body)?));
                }
                Ok(docs)
            })
            .await?;

        Ok(query.apply(docs))
    }

    async fn ping(&self) -> Result<(), SdkError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::store::{Direction, FieldFilter};
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_set_get_update() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .set("rooms", "r1", fields(json!({"number": "101", "limit_kwh": 10.0})))
            .await
            .unwrap();

        store
            .update("rooms", "r1", fields(json!({"tenant_id": "u1"})))
            .await
            .unwrap();
        let doc = store.get("rooms", "r1").await.unwrap().unwrap();
        assert_eq!(doc.get("number"), Some(&json!("101")));
        assert_eq!(doc.get("tenant_id"), Some(&json!("u1")));

        store.remove_field("rooms", "r1", "tenant_id").await.unwrap();
        let doc = store.get("rooms", "r1").await.unwrap().unwrap();
        assert!(doc.get("tenant_id").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.update("rooms", "nope", Fields::new()).await.unwrap_err();
        assert!(matches!(err, SdkError::NotFound { .. }));
        // delete of a missing document is fine
        store.delete("rooms", "nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_add_and_query() {
        let store = SqliteStore::in_memory().unwrap();
        for (room, month) in [("r1", "2024-04"), ("r2", "2024-05"), ("r1", "2024-05")] {
            store
                .add("bills", fields(json!({"room_id": room, "month": month})))
                .await
                .unwrap();
        }

        let query = Query::collection("bills")
            .filter(FieldFilter::eq("room_id", "r1"))
            .order_by("month", Direction::Descending);
        let docs = store.query(&query).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get("month"), Some(&json!("2024-05")));
        assert!(store.query(&Query::collection("rooms")).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writers_share_connection() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add("power_samples", fields(json!({"room_id": "r1", "watts": i})))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let docs = store.query(&Query::collection("power_samples")).await.unwrap();
        assert_eq!(docs.len(), 20);
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("daya.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("users", "u1", fields(json!({"name": "Ayu"}))).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get("users", "u1").await.unwrap().is_some());
        store.ping().await.unwrap();
    }
}
