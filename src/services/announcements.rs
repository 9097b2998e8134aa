use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        announcement::{
            Announcement, AnnouncementChanges, AnnouncementFields, CreateAnnouncementParams,
            CreatedAnnouncement, DeletedAnnouncement, UpdatedAnnouncement,
        },
        teacher::Teacher,
    },
    services::metrics::AUTH_REJECTIONS_COUNTER,
    store::{AnnouncementStore, TeacherStore},
};

const NOT_FOUND: &str = "Announcement not found";

/// Announcement CRUD with teacher-gated writes.
#[derive(Clone)]
pub struct AnnouncementService {
    announcements: Arc<dyn AnnouncementStore>,
    teachers: Arc<dyn TeacherStore>,
}

impl AnnouncementService {
    pub fn new(announcements: Arc<dyn AnnouncementStore>, teachers: Arc<dyn TeacherStore>) -> Self {
        Self {
            announcements,
            teachers,
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.announcements.ping().await
    }

    /// All announcements that have not expired, keyed by id.
    pub async fn list(&self) -> AppResult<BTreeMap<String, AnnouncementFields>> {
        self.list_at(Utc::now()).await
    }

    pub async fn list_at(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<BTreeMap<String, AnnouncementFields>> {
        let rows = self.announcements.find_all().await?;
        Ok(rows
            .into_iter()
            .filter(|a| !a.fields.is_expired_at(now))
            .map(|a| (a.id.to_string(), a.fields))
            .collect())
    }

    pub async fn create(&self, params: CreateAnnouncementParams) -> AppResult<CreatedAnnouncement> {
        let teacher = self.require_teacher(params.created_by.as_deref()).await?;

        let fields = AnnouncementFields {
            title: required(params.title, "title")?,
            message: required(params.message, "message")?,
            start_date: params.start_date,
            expiration_date: Some(
                params
                    .expiration_date
                    .ok_or_else(|| AppError::BadRequest("expiration_date is required".into()))?,
            ),
            created_by: teacher.username,
        };

        let id = self.announcements.insert(&fields).await?;
        info!(%id, created_by = %fields.created_by, "announcement created");
        Ok(CreatedAnnouncement { id, fields })
    }

    pub async fn update(
        &self,
        announcement_id: &str,
        changes: AnnouncementChanges,
        modified_by: Option<&str>,
    ) -> AppResult<UpdatedAnnouncement> {
        let teacher = self.require_teacher(modified_by).await?;

        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }
        if changes.title.as_deref() == Some("") {
            return Err(AppError::BadRequest("title must not be empty".into()));
        }
        if changes.message.as_deref() == Some("") {
            return Err(AppError::BadRequest("message must not be empty".into()));
        }

        let id = parse_id(announcement_id)?;
        if !self.announcements.update(id, &changes).await? {
            return Err(AppError::NotFound(NOT_FOUND.into()));
        }

        info!(%id, modified_by = %teacher.username, "announcement updated");
        Ok(UpdatedAnnouncement { id, changes })
    }

    pub async fn delete(
        &self,
        announcement_id: &str,
        deleted_by: Option<&str>,
    ) -> AppResult<DeletedAnnouncement> {
        let teacher = self.require_teacher(deleted_by).await?;

        let id = parse_id(announcement_id)?;
        if !self.announcements.delete(id).await? {
            return Err(AppError::NotFound(NOT_FOUND.into()));
        }

        info!(%id, deleted_by = %teacher.username, "announcement deleted");
        Ok(DeletedAnnouncement { id, deleted: true })
    }

    /// Delete every announcement `list_at(now)` would hide. With `dry_run`,
    /// only report them. Returns the ids concerned.
    ///
    /// A record whose expiration date changed after it was read is skipped.
    pub async fn purge_expired(&self, now: DateTime<Utc>, dry_run: bool) -> anyhow::Result<Vec<Uuid>> {
        let expired: Vec<Announcement> = self
            .announcements
            .find_all()
            .await?
            .into_iter()
            .filter(|a| a.fields.is_expired_at(now))
            .collect();

        if dry_run {
            return Ok(expired.into_iter().map(|a| a.id).collect());
        }

        let mut purged = Vec::with_capacity(expired.len());
        for a in expired {
            let deleted = self
                .announcements
                .delete_if_expiration(a.id, a.fields.expiration_date.as_deref())
                .await?;
            if deleted {
                purged.push(a.id);
            } else {
                info!(id = %a.id, "skipped purge, record changed or gone");
            }
        }
        Ok(purged)
    }

    /// Stored and visible record counts at `now`.
    pub async fn counts_at(&self, now: DateTime<Utc>) -> anyhow::Result<(usize, usize)> {
        let rows = self.announcements.find_all().await?;
        let visible = rows.iter().filter(|a| !a.fields.is_expired_at(now)).count();
        Ok((rows.len(), visible))
    }

    /// Resolve `username` to a teacher or fail with 401.
    pub async fn require_teacher(&self, username: Option<&str>) -> AppResult<Teacher> {
        let Some(username) = username.filter(|u| !u.is_empty()) else {
            AUTH_REJECTIONS_COUNTER.with_label_values(&["missing"]).inc();
            return Err(AppError::Unauthorized("Authentication required".into()));
        };

        match self.teachers.find_by_username(username).await? {
            Some(teacher) => Ok(teacher),
            None => {
                warn!("rejected write by unknown teacher {username:?}");
                AUTH_REJECTIONS_COUNTER.with_label_values(&["unknown"]).inc();
                Err(AppError::Unauthorized("Invalid teacher credentials".into()))
            }
        }
    }
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(AppError::BadRequest(format!("{name} must not be empty"))),
        None => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

// An id that is not a UUID cannot match any stored record.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(NOT_FOUND.into()))
}
