//! Portal backend core.
//!
//! Two subsystems sit on a shared SQLite store: the session token manager in
//! [`auth`] (login, refresh rotation, logout and access verification) and the
//! messaging authorization engine in [`services::messaging_service`]. The
//! remaining modules hold the configuration, persistence and primitives they
//! are built from.

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_support;
