//! Shared logging setup and observability helpers for the EIR core.

pub mod helpers;
pub mod logger;
pub mod observability;

pub use helpers::*;
pub use logger::*;
pub use observability::*;
