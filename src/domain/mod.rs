//! Domain layer - pure types and rules, no I/O.

pub mod catalog;
pub mod conversation;
pub mod foundation;
pub mod routing;
