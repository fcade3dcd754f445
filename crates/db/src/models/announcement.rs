use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A portal-wide notice shown on the dashboard.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Announcement {
    pub id: Uuid,
    pub announcement: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateAnnouncement {
    pub announcement: String,
    pub created_by: String,
}

impl Announcement {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Announcement>(
            r#"SELECT id, announcement, created_by, created_at
            FROM announcements
            ORDER BY created_at ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    /// The most recently created announcement, if any exist.
    pub async fn find_latest(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Announcement>(
            r#"SELECT id, announcement, created_by, created_at
            FROM announcements
            ORDER BY created_at DESC
            LIMIT 1"#,
        )
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateAnnouncement,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (id, announcement, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, announcement, created_by, created_at"#,
        )
        .bind(id)
        .bind(&data.announcement)
        .bind(&data.created_by)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }
}
