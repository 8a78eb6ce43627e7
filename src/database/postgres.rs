use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::store::{Store, UnitOfWork};
use crate::models::{Category, MaterializedPath, PartDefinition, Platform};

const CATEGORY_COLUMNS: &str =
    "id, name, description, parent_id, path, depth, platform_id, created_at, updated_at";

/// PostgreSQL-backed store. Platforms and part definitions are JSONB
/// documents; categories are rows so the materialized path can be indexed.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: String,
    parent_id: Option<Uuid>,
    path: String,
    depth: i32,
    platform_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = DatabaseError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let path: MaterializedPath = row
            .path
            .parse()
            .map_err(|e| DatabaseError::QueryError(format!("category {}: {}", row.id, e)))?;

        Ok(Category {
            id: row.id,
            name: row.name,
            description: row.description,
            parent_id: row.parent_id,
            path,
            depth: row.depth,
            platform_id: row.platform_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_rows(rows: Vec<CategoryRow>) -> Result<Vec<Category>, DatabaseError> {
    rows.into_iter().map(Category::try_from).collect()
}

fn decode_document<T: DeserializeOwned>(document: Value) -> Result<T, DatabaseError> {
    Ok(serde_json::from_value(document)?)
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn fetch_document<T: DeserializeOwned + Send>(
        &mut self,
        sql: &str,
        id: Uuid,
    ) -> Result<Option<T>, DatabaseError> {
        let document: Option<Value> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        document.map(decode_document).transpose()
    }

    async fn fetch_documents<T: DeserializeOwned + Send>(
        &mut self,
        sql: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let documents: Vec<Value> = sqlx::query_scalar(sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        documents.into_iter().map(decode_document).collect()
    }

    async fn execute_by_id(&mut self, sql: &str, id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        Ok(result.rows_affected())
    }
}

fn ensure_found(rows_affected: u64, what: &str, id: Uuid) -> Result<(), DatabaseError> {
    if rows_affected == 0 {
        return Err(DatabaseError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_category(&mut self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        let row: Option<CategoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        row.map(Category::try_from).transpose()
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, DatabaseError> {
        let sql = format!("SELECT {} FROM categories ORDER BY seq", CATEGORY_COLUMNS);
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        decode_rows(rows)
    }

    async fn list_subtree(&mut self, root: &Category) -> Result<Vec<Category>, DatabaseError> {
        // Descendants share the path prefix ending in the root's own id.
        let prefix = format!("{}%", MaterializedPath::child_of(root));
        let sql = format!(
            "SELECT {} FROM categories WHERE id = $1 OR path LIKE $2 ORDER BY seq",
            CATEGORY_COLUMNS
        );
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql)
            .bind(root.id)
            .bind(prefix)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        decode_rows(rows)
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO categories \
             (id, name, description, parent_id, path, depth, platform_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.path.to_string())
        .bind(category.depth)
        .bind(category.platform_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::classify)?;
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<(), DatabaseError> {
        // Path, depth and parent are write-once.
        let result = sqlx::query(
            "UPDATE categories SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::classify)?;
        ensure_found(result.rows_affected(), "category", category.id)
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .execute_by_id("DELETE FROM categories WHERE id = $1", id)
            .await?;
        Ok(deleted > 0)
    }

    async fn find_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError> {
        self.fetch_document("SELECT document FROM platforms WHERE id = $1", id)
            .await
    }

    async fn lock_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError> {
        self.fetch_document("SELECT document FROM platforms WHERE id = $1 FOR UPDATE", id)
            .await
    }

    async fn list_platforms(&mut self) -> Result<Vec<Platform>, DatabaseError> {
        self.fetch_documents("SELECT document FROM platforms ORDER BY seq")
            .await
    }

    async fn insert_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO platforms (id, document, created_at) VALUES ($1, $2, $3)")
            .bind(platform.id)
            .bind(serde_json::to_value(platform)?)
            .bind(platform.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        Ok(())
    }

    async fn update_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE platforms SET document = $2 WHERE id = $1")
            .bind(platform.id)
            .bind(serde_json::to_value(platform)?)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        ensure_found(result.rows_affected(), "platform", platform.id)
    }

    async fn delete_platform(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .execute_by_id("DELETE FROM platforms WHERE id = $1", id)
            .await?;
        Ok(deleted > 0)
    }

    async fn find_part(&mut self, id: Uuid) -> Result<Option<PartDefinition>, DatabaseError> {
        self.fetch_document("SELECT document FROM part_definitions WHERE id = $1", id)
            .await
    }

    async fn find_parts(&mut self, ids: &[Uuid]) -> Result<Vec<PartDefinition>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let documents: Vec<Value> = sqlx::query_scalar(
            "SELECT document FROM part_definitions WHERE id = ANY($1) ORDER BY seq",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DatabaseError::classify)?;
        documents.into_iter().map(decode_document).collect()
    }

    async fn insert_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO part_definitions (id, created_platform_id, document, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(part.id)
        .bind(part.created_platform_id)
        .bind(serde_json::to_value(part)?)
        .bind(part.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::classify)?;
        Ok(())
    }

    async fn update_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE part_definitions SET document = $2 WHERE id = $1")
            .bind(part.id)
            .bind(serde_json::to_value(part)?)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::classify)?;
        ensure_found(result.rows_affected(), "part definition", part.id)
    }

    async fn delete_part(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .execute_by_id("DELETE FROM part_definitions WHERE id = $1", id)
            .await?;
        Ok(deleted > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
