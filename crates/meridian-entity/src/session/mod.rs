//! Session domain entities.

pub mod kind;
pub mod model;
pub mod status;

pub use kind::SessionKind;
pub use model::{DeviceMeta, Session, SessionSummary};
pub use status::SessionStatus;
