//! Collection of general utility functions shared by the services.
//!
//! Holds the signed-token primitive, the one-way hashing primitive and the
//! helpers for reporting input validation failures.

pub mod hashing;
pub mod jwt;
pub mod validation;
