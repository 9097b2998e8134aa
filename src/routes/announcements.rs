use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::announcement::{
        AnnouncementFields, CreateAnnouncementParams, CreatedAnnouncement,
        DeleteAnnouncementParams, DeletedAnnouncement, UpdateAnnouncementParams,
        UpdatedAnnouncement,
    },
    services::metrics::record_request,
    AppState,
};

fn observe<T>(op: &str, ok_status: StatusCode, result: &AppResult<T>) {
    let status = match result {
        Ok(_) => ok_status,
        Err(e) => e.status(),
    };
    record_request(op, status);
}

/// GET /announcements — public, every non-expired announcement keyed by id.
pub async fn list_announcements(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, AnnouncementFields>>> {
    let result = state.announcements.list().await;
    observe("list", StatusCode::OK, &result);
    result.map(Json)
}

/// POST /announcements?title=..&message=..&expiration_date=..&created_by=..
pub async fn create_announcement(
    State(state): State<AppState>,
    Query(params): Query<CreateAnnouncementParams>,
) -> AppResult<(StatusCode, Json<CreatedAnnouncement>)> {
    let result = state.announcements.create(params).await;
    observe("create", StatusCode::CREATED, &result);
    result.map(|created| (StatusCode::CREATED, Json(created)))
}

/// PUT /announcements/{id}?modified_by=..&title=..
pub async fn update_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UpdateAnnouncementParams>,
) -> AppResult<Json<UpdatedAnnouncement>> {
    let (changes, modified_by) = params.into_parts();
    let result = state
        .announcements
        .update(&id, changes, modified_by.as_deref())
        .await;
    observe("update", StatusCode::OK, &result);
    result.map(Json)
}

/// DELETE /announcements/{id}?deleted_by=..
pub async fn delete_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteAnnouncementParams>,
) -> AppResult<Json<DeletedAnnouncement>> {
    let result = state
        .announcements
        .delete(&id, params.deleted_by.as_deref())
        .await;
    observe("delete", StatusCode::OK, &result);
    result.map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{routes::router, services::announcements::AnnouncementService, store::MemoryStore};

    fn test_app() -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        store.add_teacher("t1");
        let state = AppState {
            announcements: AnnouncementService::new(store.clone(), store.clone()),
        };
        (store, router(state))
    }

    fn record(expiration_date: &str) -> AnnouncementFields {
        AnnouncementFields {
            title: "Exam".into(),
            message: "Midterm Friday".into(),
            start_date: None,
            expiration_date: Some(expiration_date.into()),
            created_by: "t1".into(),
        }
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_returns_201_with_echo() {
        let (store, app) = test_app();

        let (status, body) = send(
            app,
            "POST",
            "/announcements?title=Exam&message=Midterm%20Friday&expiration_date=2099-01-01T00:00:00Z&created_by=t1",
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Exam");
        assert_eq!(body["message"], "Midterm Friday");
        assert_eq!(body["expiration_date"], "2099-01-01T00:00:00Z");
        assert_eq!(body["start_date"], Value::Null);
        assert_eq!(body["created_by"], "t1");
        let id: uuid::Uuid = body["id"].as_str().unwrap().parse().unwrap();
        assert!(store.get(id).is_some());
    }

    #[tokio::test]
    async fn create_with_unknown_teacher_is_401() {
        let (store, app) = test_app();

        let (status, body) = send(
            app,
            "POST",
            "/announcements?title=Exam&message=Hi&expiration_date=2099-01-01T00:00:00Z&created_by=ghost",
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid teacher credentials" }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_hides_expired_records() {
        let (store, app) = test_app();
        let expired = store.seed(record("2000-01-01T00:00:00Z"));
        let current = store.seed(record("2099-01-01T00:00:00Z"));

        let (status, body) = send(app, "GET", "/announcements").await;

        assert_eq!(status, StatusCode::OK);
        let map = body.as_object().unwrap();
        assert!(!map.contains_key(&expired.to_string()));
        assert_eq!(
            map[&current.to_string()],
            json!({
                "title": "Exam",
                "message": "Midterm Friday",
                "start_date": null,
                "expiration_date": "2099-01-01T00:00:00Z",
                "created_by": "t1"
            })
        );
    }

    #[tokio::test]
    async fn update_returns_only_changed_fields() {
        let (store, app) = test_app();
        let id = store.seed(record("2099-01-01T00:00:00Z"));

        let (status, body) = send(
            app,
            "PUT",
            &format!("/announcements/{id}?title=New&modified_by=t1"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": id.to_string(), "title": "New" }));
        assert_eq!(store.get(id).unwrap().title, "New");
    }

    #[tokio::test]
    async fn update_missing_record_is_404() {
        let (_, app) = test_app();

        let (status, body) = send(app, "PUT", "/announcements/x?title=New&modified_by=t1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Announcement not found" }));
    }

    #[tokio::test]
    async fn update_without_fields_is_400() {
        let (store, app) = test_app();
        let id = store.seed(record("2099-01-01T00:00:00Z"));

        let (status, body) = send(app, "PUT", &format!("/announcements/{id}?modified_by=t1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No fields to update" }));
    }

    #[tokio::test]
    async fn update_without_fields_or_username_is_401() {
        let (store, app) = test_app();
        let id = store.seed(record("2099-01-01T00:00:00Z"));

        let (status, body) = send(app, "PUT", &format!("/announcements/{id}")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Authentication required" }));
        assert_eq!(store.get(id).unwrap(), record("2099-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn delete_without_username_is_401_before_lookup() {
        let (store, app) = test_app();

        let (status, body) = send(app, "DELETE", "/announcements/x").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Authentication required" }));
        assert_eq!(store.teacher_lookups(), 0);
    }

    #[tokio::test]
    async fn delete_existing_record() {
        let (store, app) = test_app();
        let id = store.seed(record("2099-01-01T00:00:00Z"));

        let (status, body) = send(app, "DELETE", &format!("/announcements/{id}?deleted_by=t1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": id.to_string(), "deleted": true }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn health_reports_store_connected() {
        let (_, app) = test_app();

        let (status, body) = send(app, "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
