// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory;
pub mod postgres_feedback_repository;
pub mod postgres_user_repository;

pub use memory::{InMemoryFeedbackRepository, InMemoryUserRepository};
pub use postgres_feedback_repository::PostgresFeedbackRepository;
pub use postgres_user_repository::PostgresUserRepository;
