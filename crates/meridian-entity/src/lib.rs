//! # meridian-entity
//!
//! Plain data records for the authentication subsystem: users, sessions,
//! groups, permissions, and their join rows. Entities carry pure behavioral
//! methods (`user.can_login()`, `session.is_live()`) that take and return
//! values rather than mutating shared state, so lifecycle transitions and
//! permission resolution are unit-testable without a database.

pub mod group;
pub mod permission;
pub mod session;
pub mod user;
