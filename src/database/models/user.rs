use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tg_user_id: Option<i64>,
    pub full_name: String,
    pub tg_username: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl User {
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_tg_id(
        pool: &sqlx::SqlitePool,
        tg_user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE tg_user_id = ?")
            .bind(tg_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Exact full-name search. Full names are not unique; callers get every
    /// match and must surface ambiguity rather than pick one.
    pub async fn search_by_full_name(
        pool: &sqlx::SqlitePool,
        full_name: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE full_name = ? ORDER BY created_at")
            .bind(full_name)
            .fetch_all(pool)
            .await
    }

    /// Import-side owner resolution: first name match wins, otherwise a new
    /// record with no chat identity is created. Such owners cannot be
    /// notified until they register.
    pub async fn get_or_create_by_full_name(
        pool: &sqlx::SqlitePool,
        full_name: &str,
        tg_username: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        if let Some(existing) = Self::search_by_full_name(pool, full_name).await?.into_iter().next() {
            return Ok(existing);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            tg_user_id: None,
            full_name: full_name.to_string(),
            tg_username: tg_username.map(str::to_string),
            phone: phone.map(str::to_string),
            is_admin: false,
            created_at: Local::now().naive_local(),
        };
        user.insert(pool).await?;
        Ok(user)
    }

    /// Registration from the chat: claims an imported, identity-less record
    /// with the same full name if one exists, so earlier tasks attach to the
    /// person; otherwise inserts a fresh record.
    pub async fn register(
        pool: &sqlx::SqlitePool,
        tg_user_id: i64,
        full_name: &str,
        tg_username: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let unclaimed = Self::search_by_full_name(pool, full_name)
            .await?
            .into_iter()
            .find(|u| u.tg_user_id.is_none());

        if let Some(mut user) = unclaimed {
            sqlx::query("UPDATE users SET tg_user_id = ?, tg_username = COALESCE(?, tg_username) WHERE id = ?")
                .bind(tg_user_id)
                .bind(tg_username)
                .bind(&user.id)
                .execute(pool)
                .await?;
            user.tg_user_id = Some(tg_user_id);
            if tg_username.is_some() {
                user.tg_username = tg_username.map(str::to_string);
            }
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            tg_user_id: Some(tg_user_id),
            full_name: full_name.to_string(),
            tg_username: tg_username.map(str::to_string),
            phone: None,
            is_admin: false,
            created_at: Local::now().naive_local(),
        };
        user.insert(pool).await?;
        Ok(user)
    }

    pub async fn set_admin(
        pool: &sqlx::SqlitePool,
        user_id: &str,
        is_admin: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Startup seed: makes sure the configured Telegram id exists and has the
    /// admin flag, without disturbing an existing record's name.
    pub async fn ensure_bootstrap_admin(
        pool: &sqlx::SqlitePool,
        tg_user_id: i64,
    ) -> Result<(), sqlx::Error> {
        if let Some(existing) = Self::find_by_tg_id(pool, tg_user_id).await? {
            if !existing.is_admin {
                Self::set_admin(pool, &existing.id, true).await?;
            }
            return Ok(());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            tg_user_id: Some(tg_user_id),
            full_name: "Administrator".to_string(),
            tg_username: None,
            phone: None,
            is_admin: true,
            created_at: Local::now().naive_local(),
        };
        user.insert(pool).await?;
        Ok(())
    }

    /// Bulk wipe that keeps admin accounts. Owned tasks go with their owners
    /// via the foreign-key cascade.
    pub async fn wipe_except_admins(pool: &sqlx::SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE is_admin = 0")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, tg_user_id, full_name, tg_username, phone, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(self.tg_user_id)
        .bind(&self.full_name)
        .bind(&self.tg_username)
        .bind(&self.phone)
        .bind(self.is_admin)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
