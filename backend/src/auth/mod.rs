//! Authentication module for managing sessions and access control.
//!
//! This module provides the session token manager: login, refresh-token
//! rotation, logout and access-token authentication.

pub mod models;
pub mod service;
