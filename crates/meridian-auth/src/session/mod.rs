//! Session lifecycle: persistence wrapper, manager, and expiry sweep.

pub mod manager;
pub mod store;
pub mod sweeper;

pub use manager::SessionManager;
pub use store::{SessionStore, hash_token};
pub use sweeper::SessionSweeper;
