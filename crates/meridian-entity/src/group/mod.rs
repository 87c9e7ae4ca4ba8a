//! Group domain entities.

pub mod kind;
pub mod model;

pub use kind::GroupKind;
pub use model::Group;
