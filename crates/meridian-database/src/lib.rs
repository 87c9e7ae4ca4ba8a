//! # meridian-database
//!
//! PostgreSQL persistence for the authentication subsystem: connection
//! pool management, the migration runner, and one repository per entity.
//! Repositories own all SQL; no other crate touches the pool.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
