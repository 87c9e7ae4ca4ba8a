//! # meridian-auth
//!
//! Authentication, session, and permission resolution for the Meridian ERP
//! platform.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and policy enforcement
//! - `lockout` — brute-force lockout policy
//! - `jwt` — signed access/refresh token creation and stateless validation
//! - `session` — session lifecycle (create, touch, revoke, suspend, sweep)
//! - `access` — group-hierarchy permission resolution over an in-memory
//!   snapshot
//! - `service` — the login/refresh/logout/change-password orchestration

pub mod access;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod service;
pub mod session;

pub use access::{AccessDecision, AccessSnapshot, PermissionResolver, SnapshotLoader};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use lockout::LockoutPolicy;
pub use password::{PasswordHasher, PasswordPolicy};
pub use service::{AuthService, LoginResult};
pub use session::{SessionManager, SessionStore, SessionSweeper};
