use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::TaskStatus;
use crate::utils::datetime::initial_reminder;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub practice_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub description: String,
    pub status: TaskStatus,
    pub next_reminder: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields an intake operation must supply. Status and the seeded reminder are
/// derived, never caller-chosen.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: String,
    pub practice_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub description: String,
}

/// One row of the due set: the task plus the owner's delivery endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct DueReminder {
    pub task_id: String,
    pub description: String,
    pub practice_name: Option<String>,
    pub end_date: NaiveDate,
    pub tg_user_id: Option<i64>,
    pub full_name: String,
}

/// Flattened task row for the admin export.
#[derive(Debug, Clone, FromRow)]
pub struct ExportRow {
    pub practice_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub full_name: String,
    pub tg_username: Option<String>,
    pub phone: Option<String>,
    pub description: String,
    pub status: TaskStatus,
    pub next_reminder: Option<NaiveDateTime>,
}

impl Task {
    /// Inserts a task with status `unseen` and the reminder seeded at
    /// due-date minus seven days, 09:00.
    pub async fn create(pool: &sqlx::SqlitePool, new: NewTask) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Local::now().naive_local();
        let next_reminder = initial_reminder(new.end_date);

        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, practice_name, start_date, end_date, description,
                               status, next_reminder, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(&new.practice_name)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.description)
        .bind(TaskStatus::Unseen)
        .bind(next_reminder)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(Task {
            id,
            user_id: new.user_id,
            practice_name: new.practice_name,
            start_date: new.start_date,
            end_date: new.end_date,
            description: new.description,
            status: TaskStatus::Unseen,
            next_reminder: Some(next_reminder),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        task_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_owner(
        pool: &sqlx::SqlitePool,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = ? ORDER BY end_date, created_at")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// The due set for one reminder pass: armed, due, and not done.
    pub async fn find_due(
        pool: &sqlx::SqlitePool,
        now: NaiveDateTime,
    ) -> Result<Vec<DueReminder>, sqlx::Error> {
        sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT t.id AS task_id, t.description, t.practice_name, t.end_date,
                   u.tg_user_id, u.full_name
            FROM tasks t
            JOIN users u ON t.user_id = u.id
            WHERE t.next_reminder IS NOT NULL AND t.next_reminder <= ? AND t.status != 'done'
            ORDER BY t.next_reminder
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Writes a transition result. Status and the reminder clear happen in
    /// one statement so a crash cannot separate them.
    pub async fn update_status(
        pool: &sqlx::SqlitePool,
        task_id: &str,
        status: TaskStatus,
        clear_reminder: bool,
    ) -> Result<(), sqlx::Error> {
        let now = Local::now().naive_local();
        let query = if clear_reminder {
            "UPDATE tasks SET status = ?, next_reminder = NULL, updated_at = ? WHERE id = ?"
        } else {
            "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?"
        };

        sqlx::query(query)
            .bind(status)
            .bind(now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update_next_reminder(
        pool: &sqlx::SqlitePool,
        task_id: &str,
        next_reminder: NaiveDateTime,
    ) -> Result<(), sqlx::Error> {
        let now = Local::now().naive_local();
        sqlx::query("UPDATE tasks SET next_reminder = ?, updated_at = ? WHERE id = ?")
            .bind(next_reminder)
            .bind(now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Identical-tuple check that makes repeated imports idempotent. `IS ?`
    /// so a NULL practice name compares equal to NULL.
    pub async fn duplicate_exists(
        pool: &sqlx::SqlitePool,
        user_id: &str,
        practice_name: Option<&str>,
        description: &str,
        end_date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE user_id = ? AND end_date = ? AND practice_name IS ? AND description = ?
            "#,
        )
        .bind(user_id)
        .bind(end_date)
        .bind(practice_name)
        .bind(description)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn wipe_all(pool: &sqlx::SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks").execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn all_for_export(pool: &sqlx::SqlitePool) -> Result<Vec<ExportRow>, sqlx::Error> {
        sqlx::query_as::<_, ExportRow>(
            r#"
            SELECT t.practice_name, t.start_date, t.end_date,
                   u.full_name, u.tg_username, u.phone,
                   t.description, t.status, t.next_reminder
            FROM tasks t
            JOIN users u ON t.user_id = u.id
            ORDER BY u.full_name, t.end_date
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
