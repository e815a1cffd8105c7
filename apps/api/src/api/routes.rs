use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::handlers::{admin, auth, feedback, matching, profile};
use crate::api::state::AppState;

/// Builds the full route table. Middleware layers are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/auth/request-password-reset", post(auth::request_password_reset))
        .route("/api/auth/reset-password", post(auth::reset_password))
        // Own profile
        .route("/api/user/profile", get(profile::get_profile))
        .route("/api/user/location", put(profile::update_location))
        .route("/api/user/salary", put(profile::update_salary))
        .route("/api/user/password", put(profile::change_password))
        .route("/api/user/account", delete(profile::delete_account))
        // Matching
        .route("/api/users/search", get(matching::search))
        .route("/api/users/:id/ratings", get(feedback::rating_summary))
        .route("/api/contacts/usage", get(matching::contact_usage))
        .route("/api/contacts/:id", post(matching::contact))
        // Feedback
        .route("/api/ratings", post(feedback::rate))
        .route("/api/reports", post(feedback::report))
        .route("/api/feedback", post(feedback::submit_feedback))
        // Admin routes
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id", get(admin::get_user))
        .route("/api/admin/users/:id/status", put(admin::set_status))
        .route("/api/admin/users/:id/ban", post(admin::ban))
        .route(
            "/api/admin/users/:id/premium",
            post(admin::promote).delete(admin::demote),
        )
        .route("/api/admin/users/:id/reset-token", post(admin::issue_reset_token))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/premium/sweep", post(admin::sweep_premium))
        .route("/api/admin/location-history", get(admin::location_history))
        .route("/api/admin/reports", get(admin::reports))
        .route("/api/admin/password-resets", get(admin::pending_resets))
        .with_state(state)
}
