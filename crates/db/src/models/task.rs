//! Branch-scoped tasks with a start date and a deadline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Filter value meaning "every zone" / "every branch".
pub const ALL_SCOPE: &str = "All";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub task_name: String,
    pub date: NaiveDate,
    pub deadline: NaiveDate,
    pub zone: String,
    pub branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a task. Every field is required; they are
/// optional here so a missing field can be reported as a validation error.
#[derive(Debug, Default, Deserialize, TS)]
pub struct CreateTask {
    pub task_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub zone: Option<String>,
    pub branch: Option<String>,
}

/// A fully specified task, ready to insert.
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub task_name: String,
    pub date: NaiveDate,
    pub deadline: NaiveDate,
    pub zone: String,
    pub branch: String,
}

impl CreateTask {
    /// `None` when any field is missing or blank.
    pub fn into_fields(self) -> Option<TaskFields> {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Some(TaskFields {
            task_name: non_blank(self.task_name)?,
            date: self.date?,
            deadline: self.deadline?,
            zone: non_blank(self.zone)?,
            branch: non_blank(self.branch)?,
        })
    }
}

#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub task_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub zone: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, TS)]
pub struct TaskFilter {
    pub zone: Option<String>,
    pub branch: Option<String>,
}

impl TaskFilter {
    fn scoped(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .filter(|v| !v.is_empty() && *v != ALL_SCOPE)
    }

    pub fn zone(&self) -> Option<&str> {
        Self::scoped(&self.zone)
    }

    pub fn branch(&self) -> Option<&str> {
        Self::scoped(&self.branch)
    }
}

impl Task {
    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, task_name, date, deadline, zone, branch, created_at, updated_at
            FROM tasks
            WHERE ($1 IS NULL OR zone = $1)
              AND ($2 IS NULL OR branch = $2)
            ORDER BY deadline ASC, created_at ASC"#,
        )
        .bind(filter.zone())
        .bind(filter.branch())
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, task_name, date, deadline, zone, branch, created_at, updated_at
            FROM tasks
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &TaskFields) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, task_name, date, deadline, zone, branch, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, task_name, date, deadline, zone, branch, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.task_name)
        .bind(data.date)
        .bind(data.deadline)
        .bind(&data.zone)
        .bind(&data.branch)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Apply the provided fields, keeping the existing value for the rest.
    pub async fn update(pool: &SqlitePool, id: Uuid, data: &UpdateTask) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let task_name = data.task_name.as_ref().unwrap_or(&existing.task_name);
        let date = data.date.unwrap_or(existing.date);
        let deadline = data.deadline.unwrap_or(existing.deadline);
        let zone = data.zone.as_ref().unwrap_or(&existing.zone);
        let branch = data.branch.as_ref().unwrap_or(&existing.branch);

        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
            SET task_name = $2, date = $3, deadline = $4, zone = $5, branch = $6, updated_at = $7
            WHERE id = $1
            RETURNING id, task_name, date, deadline, zone, branch, created_at, updated_at"#,
        )
        .bind(id)
        .bind(task_name)
        .bind(date)
        .bind(deadline)
        .bind(zone)
        .bind(branch)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CreateTask {
        CreateTask {
            task_name: Some("Renew fire certificate".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
            deadline: NaiveDate::from_ymd_opt(2025, 3, 31),
            zone: Some("North".to_string()),
            branch: Some("Gulberg".to_string()),
        }
    }

    #[test]
    fn test_into_fields_complete() {
        let fields = complete().into_fields().expect("all fields present");
        assert_eq!(fields.zone, "North");
        assert_eq!(fields.branch, "Gulberg");
    }

    #[test]
    fn test_into_fields_rejects_missing_or_blank() {
        let missing_deadline = CreateTask {
            deadline: None,
            ..complete()
        };
        assert!(missing_deadline.into_fields().is_none());

        let blank_branch = CreateTask {
            branch: Some("   ".to_string()),
            ..complete()
        };
        assert!(blank_branch.into_fields().is_none());
    }

    #[test]
    fn test_filter_treats_all_as_unscoped() {
        let filter = TaskFilter {
            zone: Some(ALL_SCOPE.to_string()),
            branch: Some("Gulberg".to_string()),
        };
        assert_eq!(filter.zone(), None);
        assert_eq!(filter.branch(), Some("Gulberg"));
        assert_eq!(TaskFilter::default().zone(), None);
    }
}
