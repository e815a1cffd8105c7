//! Permuta API Library
//!
//! Governance core for a public-servant job-swap service: field-edit
//! policy, daily contact throttling, compatibility scoring, premium expiry
//! and admin-mediated password resets, plus the HTTP and storage adapters.

pub mod api;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
