//! SQLite-backed document store
//!
//! Every document lives in one `documents` table keyed by database,
//! collection and id, with its body kept as JSON text.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::TodoStore;
use crate::error::{Error, Result};
use crate::types::{ObjectId, TodoDocument, TodoUpdate};

/// A connection to the document store
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// A private store that disappears with the connection
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = lock(&self.conn)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                database TEXT NOT NULL,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (database, collection, id)
            );
            "#,
        )?;

        Ok(())
    }

    /// Handle to one named collection inside one named database
    pub fn collection(&self, database: &str, collection: &str) -> Collection {
        Collection {
            conn: Arc::clone(&self.conn),
            database: database.to_string(),
            name: collection.to_string(),
        }
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| Error::Other("store connection lock poisoned".into()))
}

/// One collection of todo documents
#[derive(Clone)]
pub struct Collection {
    conn: Arc<Mutex<Connection>>,
    database: String,
    name: String,
}

impl Collection {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of documents currently stored
    pub fn count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE database = ?1 AND collection = ?2",
            params![self.database, self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &str, &str) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let database = self.database.clone();
        let name = self.name.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            f(&conn, &database, &name)
        })
        .await?
    }
}

#[async_trait]
impl TodoStore for Collection {
    async fn insert(&self, doc: &TodoDocument) -> Result<ObjectId> {
        let body = serde_json::to_string(doc)?;
        let id = doc.id;

        self.with_conn(move |conn, database, name| {
            conn.execute(
                "INSERT INTO documents (database, collection, id, body) VALUES (?1, ?2, ?3, ?4)",
                params![database, name, id.to_hex(), body],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(collection = %self.name, %id, "inserted document");
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<TodoDocument>> {
        let bodies = self
            .with_conn(|conn, database, name| {
                let mut stmt = conn.prepare(
                    "SELECT body FROM documents WHERE database = ?1 AND collection = ?2 ORDER BY rowid",
                )?;
                let bodies = stmt
                    .query_map(params![database, name], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(bodies)
            })
            .await?;

        let docs = bodies
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<std::result::Result<Vec<TodoDocument>, _>>()?;

        Ok(docs)
    }

    async fn update_by_id(&self, id: ObjectId, update: &TodoUpdate) -> Result<()> {
        let completed = if update.completed { "true" } else { "false" };
        let title = update.title.clone();

        let changed = self
            .with_conn(move |conn, database, name| {
                let changed = conn.execute(
                    r#"
                    UPDATE documents
                    SET body = json_set(body, '$.title', ?1, '$.completed', json(?2))
                    WHERE database = ?3 AND collection = ?4 AND id = ?5
                    "#,
                    params![title, completed, database, name, id.to_hex()],
                )?;
                Ok(changed)
            })
            .await?;

        if changed == 0 {
            return Err(Error::NotFound(id.to_hex()));
        }
        tracing::debug!(collection = %self.name, %id, "updated document");
        Ok(())
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<()> {
        let removed = self
            .with_conn(move |conn, database, name| {
                let removed = conn.execute(
                    "DELETE FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
                    params![database, name, id.to_hex()],
                )?;
                Ok(removed)
            })
            .await?;

        if removed == 0 {
            return Err(Error::NotFound(id.to_hex()));
        }
        tracing::debug!(collection = %self.name, %id, "deleted document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn todos() -> Collection {
        DocumentStore::open_in_memory()
            .unwrap()
            .collection("demo_todo", "todo")
    }

    #[tokio::test]
    async fn test_insert_then_find_all() {
        let todos = todos();
        let first = TodoDocument::new("first".into());
        let second = TodoDocument::new("second".into());

        assert_eq!(todos.insert(&first).await.unwrap(), first.id);
        todos.insert(&second).await.unwrap();

        let docs = todos.find_all().await.unwrap();
        assert_eq!(docs, vec![first, second]);
        assert_eq!(todos.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let todos = todos();
        let doc = TodoDocument::new("once".into());
        todos.insert(&doc).await.unwrap();

        let err = todos.insert(&doc).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(todos.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_changes_only_title_and_completed() {
        let todos = todos();
        let doc = TodoDocument::new("draft".into());
        todos.insert(&doc).await.unwrap();

        let update = TodoUpdate {
            title: "final".into(),
            completed: true,
        };
        todos.update_by_id(doc.id, &update).await.unwrap();

        let docs = todos.find_all().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, doc.id);
        assert_eq!(docs[0].title, "final");
        assert!(docs[0].completed);
        assert_eq!(docs[0].created_at, doc.created_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_id_report_not_found() {
        let todos = todos();
        let id = ObjectId::new();
        let update = TodoUpdate {
            title: "x".into(),
            completed: false,
        };

        assert!(matches!(
            todos.update_by_id(id, &update).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(todos.delete_by_id(id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let todos = todos();
        let doc = TodoDocument::new("gone".into());
        todos.insert(&doc).await.unwrap();

        todos.delete_by_id(doc.id).await.unwrap();
        assert!(todos.find_all().await.unwrap().is_empty());
        assert!(matches!(
            todos.delete_by_id(doc.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_share_one_connection() {
        let todos = todos();
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let todos = todos.clone();
            tasks.spawn(async move {
                todos.insert(&TodoDocument::new(format!("task {i}"))).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        assert_eq!(todos.count().unwrap(), 32);
        assert_eq!(todos.find_all().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = DocumentStore::open_in_memory().unwrap();
        let todo = store.collection("demo_todo", "todo");
        let other = store.collection("demo_todo", "archive");
        let other_db = store.collection("elsewhere", "todo");

        todo.insert(&TodoDocument::new("mine".into())).await.unwrap();

        assert_eq!(todo.find_all().await.unwrap().len(), 1);
        assert!(other.find_all().await.unwrap().is_empty());
        assert!(other_db.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.db");
        let doc = TodoDocument::new("persisted".into());

        {
            let store = DocumentStore::open(&path).unwrap();
            store.collection("demo_todo", "todo").insert(&doc).await.unwrap();
        }

        let store = DocumentStore::open(&path).unwrap();
        let docs = store.collection("demo_todo", "todo").find_all().await.unwrap();
        assert_eq!(docs, vec![doc]);
    }

    #[test]
    fn test_open_fails_for_unreachable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("todo.db");
        assert!(matches!(DocumentStore::open(&path), Err(Error::Database(_))));
    }
}
