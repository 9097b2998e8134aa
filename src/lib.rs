// Library exports for the API binary, the admin CLI and tests
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use services::announcements::AnnouncementService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub announcements: AnnouncementService,
}

/// CORS: allow the app base URL, its subdomains, and localhost.
pub fn cors_layer(base_url: String) -> CorsLayer {
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        origin_allowed(o, &base_url)
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]))
        .allow_origin(cors_origin)
}

fn origin_allowed(origin: &str, base: &str) -> bool {
    if origin.starts_with("http://localhost") || origin.starts_with("http://127.0.0.1") {
        return true;
    }
    if origin == base {
        return true;
    }
    // Subdomains of the base URL's host
    if let Some(idx) = base.find("://") {
        let after_scheme = &base[idx + 3..];
        let domain = after_scheme.split('/').next().unwrap_or(after_scheme);
        let domain = domain.split(':').next().unwrap_or(domain);
        if origin.ends_with(&format!(".{domain}")) {
            return true;
        }
    }
    false
}
