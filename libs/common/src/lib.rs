//! Common library for the Bookring application
//!
//! This crate provides shared infrastructure used by the lending service:
//! PostgreSQL connection pooling, health checks, and the database error
//! taxonomy.

pub mod database;
pub mod error;
