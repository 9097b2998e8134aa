use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored announcement row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: AnnouncementFields,
}

/// Everything persisted for an announcement except its id.
/// This is also the value shape of `GET /announcements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AnnouncementFields {
    pub title: String,
    pub message: String,
    pub start_date: Option<String>,
    pub expiration_date: Option<String>,
    pub created_by: String,
}

impl AnnouncementFields {
    /// True only when `expiration_date` parses to an instant strictly before `now`.
    ///
    /// Unparseable values (including timestamps without a UTC offset) count as
    /// not expired, so a bad date keeps the announcement visible.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.expiration_date.as_deref() else {
            return false;
        };
        if raw.is_empty() {
            return false;
        }
        match parse_iso8601(raw) {
            Some(expires) => expires < now,
            None => {
                tracing::debug!("unparseable expiration_date {raw:?}, keeping visible");
                false
            }
        }
    }
}

/// ISO 8601 layouts accepted beyond RFC 3339. All of them carry an offset.
const ISO8601_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

/// Parse an offset-carrying ISO 8601 timestamp. A trailing `Z` means UTC.
fn parse_iso8601(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let normalized = raw.replace('Z', "+00:00");
    ISO8601_OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
}

/// Query params for POST /announcements.
///
/// Everything is optional at the extractor level so the teacher check runs
/// before field validation.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAnnouncementParams {
    pub title: Option<String>,
    pub message: Option<String>,
    /// ISO 8601 expiration date, e.g. "2099-01-01T00:00:00Z".
    pub expiration_date: Option<String>,
    pub start_date: Option<String>,
    /// Teacher username performing the action.
    pub created_by: Option<String>,
}

/// Query params for PUT /announcements/{id}.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnnouncementParams {
    pub title: Option<String>,
    pub message: Option<String>,
    pub expiration_date: Option<String>,
    pub start_date: Option<String>,
    pub modified_by: Option<String>,
}

impl UpdateAnnouncementParams {
    /// Splits the request into the field changes and the acting username.
    pub fn into_parts(self) -> (AnnouncementChanges, Option<String>) {
        let changes = AnnouncementChanges {
            title: self.title,
            message: self.message,
            expiration_date: self.expiration_date,
            start_date: self.start_date,
        };
        (changes, self.modified_by)
    }
}

/// Partial field set for an update. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

impl AnnouncementChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.message.is_none()
            && self.expiration_date.is_none()
            && self.start_date.is_none()
    }
}

/// Query params for DELETE /announcements/{id}.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteAnnouncementParams {
    pub deleted_by: Option<String>,
}

/// Response body for a successful create: the new id plus the submitted fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAnnouncement {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: AnnouncementFields,
}

/// Response body for a successful update: the id plus only the changed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedAnnouncement {
    pub id: Uuid,
    #[serde(flatten)]
    pub changes: AnnouncementChanges,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedAnnouncement {
    pub id: Uuid,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(expiration_date: Option<&str>) -> AnnouncementFields {
        AnnouncementFields {
            title: "Exam".into(),
            message: "Midterm Friday".into(),
            start_date: None,
            expiration_date: expiration_date.map(str::to_string),
            created_by: "t1".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_or_empty_expiration_never_expires() {
        assert!(!fields(None).is_expired_at(now()));
        assert!(!fields(Some("")).is_expired_at(now()));
    }

    #[test]
    fn past_and_future_expirations() {
        assert!(fields(Some("2000-01-01T00:00:00Z")).is_expired_at(now()));
        assert!(!fields(Some("2099-01-01T00:00:00Z")).is_expired_at(now()));
        assert!(fields(Some("2025-06-01T13:00:00+02:00")).is_expired_at(now()));
        assert!(!fields(Some("2025-06-01T12:30:00.250+00:00")).is_expired_at(now()));
    }

    #[test]
    fn iso8601_offset_forms_outside_rfc3339() {
        assert!(fields(Some("2000-01-01T00:00Z")).is_expired_at(now()));
        assert!(fields(Some("2000-01-01T00:00+00:00")).is_expired_at(now()));
        assert!(fields(Some("2000-01-01T00:00:00+0000")).is_expired_at(now()));
        assert!(fields(Some("2000-01-01 00:00+00:00")).is_expired_at(now()));
        assert!(fields(Some("2025-06-01T12:30+0100")).is_expired_at(now()));
        assert!(!fields(Some("2099-01-01T00:00Z")).is_expired_at(now()));
        assert!(!fields(Some("2099-01-01T00:00:00+0000")).is_expired_at(now()));
        // Still no offset, still visible.
        assert!(!fields(Some("2000-01-01T00:00")).is_expired_at(now()));
    }

    #[test]
    fn expiration_equal_to_now_is_still_visible() {
        assert!(!fields(Some("2025-06-01T12:00:00Z")).is_expired_at(now()));
    }

    #[test]
    fn unparseable_expiration_fails_open() {
        assert!(!fields(Some("next tuesday")).is_expired_at(now()));
        assert!(!fields(Some("2000-13-45T99:00:00Z")).is_expired_at(now()));
        // No offset: cannot be compared against an aware "now".
        assert!(!fields(Some("2000-01-01T00:00:00")).is_expired_at(now()));
        assert!(!fields(Some("2000-01-01")).is_expired_at(now()));
    }

    #[test]
    fn changes_skip_absent_fields_when_serialized() {
        let changes = AnnouncementChanges {
            title: Some("New".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(UpdatedAnnouncement {
            id: Uuid::nil(),
            changes,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "id": Uuid::nil(), "title": "New" })
        );
    }
}
