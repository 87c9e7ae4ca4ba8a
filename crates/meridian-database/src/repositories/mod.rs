//! Database repositories, one per entity.

pub mod group;
pub mod permission;
pub mod session;
pub mod user;

pub use group::GroupRepository;
pub use permission::PermissionRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
