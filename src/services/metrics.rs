use std::time::Duration;

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, CounterVec, Gauge};
use tracing::{info, warn};

use crate::services::announcements::AnnouncementService;

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref REQUESTS_COUNTER: CounterVec = register_counter_vec!(
        "api_announcement_requests_total",
        "Announcement requests by operation and response status",
        &["op", "status"]
    ).unwrap();

    pub static ref AUTH_REJECTIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_teacher_auth_rejections_total",
        "Write attempts rejected by the teacher check, by reason",
        &["reason"]
    ).unwrap();

    // ── Store gauges (refreshed by the background collector) ────────────────
    pub static ref STORED_GAUGE: Gauge = register_gauge!(
        "announcements_stored_total",
        "Announcements currently stored, including expired ones"
    ).unwrap();

    pub static ref VISIBLE_GAUGE: Gauge = register_gauge!(
        "announcements_visible_total",
        "Announcements currently returned by the listing"
    ).unwrap();
}

/// Count one handled request.
pub fn record_request(op: &str, status: axum::http::StatusCode) {
    REQUESTS_COUNTER
        .with_label_values(&[op, status.as_str()])
        .inc();
}

/// Spawn the background gauge collector.
pub fn start(service: AnnouncementService, every: Duration) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = collect(&service).await {
                warn!("Metrics: collection failed: {}", e);
            }
            tokio::time::sleep(every).await;
        }
    });
}

async fn collect(service: &AnnouncementService) -> anyhow::Result<()> {
    let (stored, visible) = service.counts_at(Utc::now()).await?;

    STORED_GAUGE.set(stored as f64);
    VISIBLE_GAUGE.set(visible as f64);

    info!("Metrics: {} stored, {} visible", stored, visible);
    Ok(())
}
