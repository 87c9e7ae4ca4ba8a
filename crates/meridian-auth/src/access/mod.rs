//! Group-hierarchy permission resolution.
//!
//! Resolution runs over an [`AccessSnapshot`] — all groups, permissions,
//! grants, and memberships relevant to a tenant, loaded in one pass and
//! indexed by id. Walking parent chains by id lookup keeps the model free
//! of ownership cycles and makes [`PermissionResolver::resolve`] a pure,
//! deterministic function of its inputs.

pub mod loader;
pub mod resolver;
pub mod snapshot;

pub use loader::SnapshotLoader;
pub use resolver::{
    AccessDecision, AccessExplanation, GrantDisposition, GrantTrace, PermissionResolver,
};
pub use snapshot::AccessSnapshot;
