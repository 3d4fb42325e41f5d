//! SQLite implementation of the DocumentStore.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DocumentKey, NewDocument, StoredDocument};
use crate::domain::ports::DocumentStore;

#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, document: NewDocument) -> DomainResult<DocumentKey> {
        let key = DocumentKey::parse(&Uuid::new_v4().to_string())?;
        let metadata_json = serde_json::to_string(&document.metadata)?;

        sqlx::query(
            "INSERT INTO documents (id, text, metadata, created_at) VALUES (?, ?, ?, ?)"
        )
        .bind(key.as_str())
        .bind(&document.text)
        .bind(&metadata_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(key)
    }

    async fn find_by_key(&self, key: &DocumentKey) -> DomainResult<Option<StoredDocument>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, text, content, metadata, created_at FROM documents WHERE id = ?"
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, key: &DocumentKey) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::DocumentNotFound(key.to_string()));
        }
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn iterate(&self) -> BoxStream<'_, DomainResult<StoredDocument>> {
        sqlx::query_as::<_, DocumentRow>(
            "SELECT id, text, content, metadata, created_at FROM documents ORDER BY seq"
        )
        .fetch(&self.pool)
        .map(|row| row.map_err(DomainError::from).and_then(StoredDocument::try_from))
        .boxed()
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    text: Option<String>,
    content: Option<String>,
    metadata: Option<String>,
    created_at: String,
}

impl TryFrom<DocumentRow> for StoredDocument {
    type Error = DomainError;

    fn try_from(row: DocumentRow) -> DomainResult<Self> {
        Ok(Self {
            key: DocumentKey::parse(&row.id)?,
            text: row.text,
            content: row.content,
            metadata: parse_json_or_default(row.metadata)?,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::Metadata;
    use futures::TryStreamExt;
    use serde_json::json;

    async fn setup() -> SqliteDocumentStore {
        SqliteDocumentStore::new(create_migrated_test_pool().await.unwrap())
    }

    fn metadata(title: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("title".to_string(), json!(title));
        m
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = setup().await;
        let key = store.insert(NewDocument::new("hello world", metadata("t1"))).await.unwrap();

        let doc = store.find_by_key(&key).await.unwrap().unwrap();
        assert_eq!(doc.key, key);
        assert_eq!(doc.body(), Some("hello world"));
        assert_eq!(doc.metadata["title"], "t1");
        assert!(doc.content.is_none());
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = setup().await;
        let key = DocumentKey::parse("does-not-exist").unwrap();
        assert!(store.find_by_key(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup().await;
        let key = store.insert(NewDocument::new("to delete", Metadata::new())).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.delete(&key).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(matches!(store.delete(&key).await, Err(DomainError::DocumentNotFound(_))));
    }

    #[tokio::test]
    async fn test_iterate_in_insertion_order() {
        let store = setup().await;
        let mut keys = Vec::new();
        for text in ["one", "two", "three"] {
            keys.push(store.insert(NewDocument::new(text, Metadata::new())).await.unwrap());
        }

        let docs: Vec<StoredDocument> = store.iterate().try_collect().await.unwrap();
        let seen: Vec<DocumentKey> = docs.into_iter().map(|d| d.key).collect();
        assert_eq!(seen, keys);
    }

    #[tokio::test]
    async fn test_reads_legacy_content_field() {
        let store = setup().await;
        sqlx::query("INSERT INTO documents (id, content, created_at) VALUES (?, ?, ?)")
            .bind("legacy-1")
            .bind("body stored under content")
            .bind(Utc::now().to_rfc3339())
            .execute(store.pool())
            .await
            .unwrap();

        let key = DocumentKey::parse("legacy-1").unwrap();
        let doc = store.find_by_key(&key).await.unwrap().unwrap();
        assert!(doc.text.is_none());
        assert_eq!(doc.body(), Some("body stored under content"));
        assert!(doc.metadata.is_empty());
    }
}
