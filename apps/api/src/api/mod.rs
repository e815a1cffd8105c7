// API layer module (adapters for controllers)
// Translates HTTP requests into application service calls

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use routes::router;
pub use state::AppState;
