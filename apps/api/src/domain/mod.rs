// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod clock;
pub mod errors;
pub mod feedback;
pub mod geography;
pub mod history;
pub mod policy;
pub mod repositories;
pub mod user;

pub use errors::{DomainError, DomainResult};
