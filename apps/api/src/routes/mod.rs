pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::provisioning::handlers;
use crate::records::handlers::record_routes;
use crate::records::{CodingTest, Interview, RecordKind, Screening};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Account provisioning
        .route("/api/v1/auth/signup", post(handlers::handle_signup))
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .route("/api/v1/auth/logout", post(handlers::handle_logout))
        .route("/api/v1/me", get(handlers::handle_me))
        .route("/api/v1/me/profile", post(handlers::handle_complete_profile))
        // Shared records
        .route(Screening::PATH, record_routes::<Screening>())
        .route(CodingTest::PATH, record_routes::<CodingTest>())
        .route(Interview::PATH, record_routes::<Interview>())
        .with_state(state)
}
