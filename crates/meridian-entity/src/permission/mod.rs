//! Permission domain entities: capabilities, grants, and memberships.

pub mod grant;
pub mod kind;
pub mod membership;
pub mod model;

pub use grant::{GrantEffect, PermissionGrant};
pub use kind::PermissionKind;
pub use membership::GroupMembership;
pub use model::Permission;
