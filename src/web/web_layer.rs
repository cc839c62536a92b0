// HTTP surface of the appeal flow: the web form's JSON API.

pub mod api_error;
pub mod api_types;
pub mod handlers;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::core::appeals::AppealService;
use crate::core::sessions::SessionResolver;
use crate::infra::appeals::SqliteAppealStore;

pub struct WebState {
    pub appeals: Arc<AppealService<SqliteAppealStore>>,
    pub sessions: Arc<dyn SessionResolver>,
}

pub fn router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/me", get(handlers::me))
        .route("/api/my-appeals", get(handlers::my_appeals))
        .route("/api/submit-appeal", post(handlers::submit_appeal))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Handler: GET /health
async fn health_check() -> StatusCode {
    StatusCode::OK
}
