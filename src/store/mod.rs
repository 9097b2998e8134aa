//! Storage seams for the announcement service.
//!
//! `db::PgStore` backs production; `MemoryStore` backs tests and local runs.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    announcement::{Announcement, AnnouncementChanges, AnnouncementFields},
    teacher::Teacher,
};

pub use memory::MemoryStore;

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    /// Every stored announcement, unfiltered.
    async fn find_all(&self) -> anyhow::Result<Vec<Announcement>>;

    /// Inserts a new record and returns the id the store assigned to it.
    async fn insert(&self, fields: &AnnouncementFields) -> anyhow::Result<Uuid>;

    /// Applies the non-`None` changes to the record with `id`.
    /// Returns `false` when no record matched.
    async fn update(&self, id: Uuid, changes: &AnnouncementChanges) -> anyhow::Result<bool>;

    /// Returns `false` when no record matched.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Deletes the record only if its stored `expiration_date` still equals
    /// `expiration_date`. Returns `false` when nothing was deleted.
    async fn delete_if_expiration(
        &self,
        id: Uuid,
        expiration_date: Option<&str>,
    ) -> anyhow::Result<bool>;

    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait TeacherStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Teacher>>;
}
