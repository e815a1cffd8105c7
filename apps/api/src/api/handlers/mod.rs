// HTTP handlers, one module per route group

pub mod admin;
pub mod auth;
pub mod dto;
pub mod feedback;
pub mod matching;
pub mod profile;
