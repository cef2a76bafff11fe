//! Module for core business logic services.
//!
//! Services validate input, apply authorization rules and orchestrate the
//! repositories. Each one borrows the shared connection pool.

pub mod messaging_service;
pub mod project_service;
pub mod user_service;
