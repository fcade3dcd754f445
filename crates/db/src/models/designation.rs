use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A job title users can be assigned. Names are unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Designation {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateDesignation {
    pub name: String,
}

impl Designation {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Designation>(
            "SELECT id, name, created_at FROM designations ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Designation>(
            "SELECT id, name, created_at FROM designations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Fails with a unique violation when the name is already taken.
    pub async fn create(pool: &SqlitePool, data: &CreateDesignation) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Designation>(
            r#"INSERT INTO designations (id, name, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, created_at"#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM designations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
