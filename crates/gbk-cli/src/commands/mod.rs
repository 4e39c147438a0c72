//! Command implementations

pub mod convert;
pub mod verify;
