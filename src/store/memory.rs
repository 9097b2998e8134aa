//! In-memory announcement and teacher storage.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AnnouncementStore, TeacherStore};
use crate::models::{
    announcement::{Announcement, AnnouncementChanges, AnnouncementFields},
    teacher::Teacher,
};

/// Thread-safe map-backed store implementing both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    announcements: DashMap<Uuid, AnnouncementFields>,
    teachers: DashMap<String, Teacher>,
    /// Number of teacher lookups served; lets callers check that a request
    /// was rejected before touching storage.
    teacher_lookups: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_teacher(&self, username: &str) {
        self.teachers.insert(
            username.to_string(),
            Teacher {
                username: username.to_string(),
                display_name: None,
            },
        );
    }

    /// Stores a record as-is, bypassing service validation. Returns its id.
    pub fn seed(&self, fields: AnnouncementFields) -> Uuid {
        let id = Uuid::new_v4();
        self.announcements.insert(id, fields);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<AnnouncementFields> {
        self.announcements.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    pub fn teacher_lookups(&self) -> u64 {
        self.teacher_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnnouncementStore for MemoryStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Announcement>> {
        Ok(self
            .announcements
            .iter()
            .map(|entry| Announcement {
                id: *entry.key(),
                fields: entry.value().clone(),
            })
            .collect())
    }

    async fn insert(&self, fields: &AnnouncementFields) -> anyhow::Result<Uuid> {
        Ok(self.seed(fields.clone()))
    }

    async fn update(&self, id: Uuid, changes: &AnnouncementChanges) -> anyhow::Result<bool> {
        let Some(mut entry) = self.announcements.get_mut(&id) else {
            return Ok(false);
        };
        let fields = entry.value_mut();
        if let Some(title) = &changes.title {
            fields.title = title.clone();
        }
        if let Some(message) = &changes.message {
            fields.message = message.clone();
        }
        if let Some(expiration_date) = &changes.expiration_date {
            fields.expiration_date = Some(expiration_date.clone());
        }
        if let Some(start_date) = &changes.start_date {
            fields.start_date = Some(start_date.clone());
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.announcements.remove(&id).is_some())
    }

    async fn delete_if_expiration(
        &self,
        id: Uuid,
        expiration_date: Option<&str>,
    ) -> anyhow::Result<bool> {
        Ok(self
            .announcements
            .remove_if(&id, |_, fields| fields.expiration_date.as_deref() == expiration_date)
            .is_some())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TeacherStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Teacher>> {
        self.teacher_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.teachers.get(username).map(|entry| entry.value().clone()))
    }
}
