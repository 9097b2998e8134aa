use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        announcement::{Announcement, AnnouncementChanges, AnnouncementFields},
        teacher::Teacher,
    },
    store::{AnnouncementStore, TeacherStore},
};

/// PostgreSQL-backed store for announcements and teachers.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a teacher, or refresh its display name if it already exists.
    pub async fn upsert_teacher(
        &self,
        username: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<Teacher> {
        let teacher = sqlx::query_as::<_, Teacher>(
            r#"INSERT INTO teachers (username, display_name)
               VALUES ($1, $2)
               ON CONFLICT (username) DO UPDATE SET
                   display_name = EXCLUDED.display_name
               RETURNING username, display_name"#,
        )
        .bind(username)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(teacher)
    }

    /// Returns `false` when no teacher had that username.
    pub async fn remove_teacher(&self, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM teachers WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AnnouncementStore for PgStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, Announcement>(
            "SELECT id, title, message, start_date, expiration_date, created_by
             FROM announcements",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, fields: &AnnouncementFields) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO announcements (title, message, start_date, expiration_date, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&fields.title)
        .bind(&fields.message)
        .bind(&fields.start_date)
        .bind(&fields.expiration_date)
        .bind(&fields.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, id: Uuid, changes: &AnnouncementChanges) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE announcements
             SET title = COALESCE($1, title),
                 message = COALESCE($2, message),
                 expiration_date = COALESCE($3, expiration_date),
                 start_date = COALESCE($4, start_date)
             WHERE id = $5",
        )
        .bind(&changes.title)
        .bind(&changes.message)
        .bind(&changes.expiration_date)
        .bind(&changes.start_date)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_expiration(
        &self,
        id: Uuid,
        expiration_date: Option<&str>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM announcements
             WHERE id = $1 AND expiration_date IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(expiration_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TeacherStore for PgStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Teacher>> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT username, display_name FROM teachers WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(teacher)
    }
}
