//! Governance registration client seam.
//!
//! The real manager integration is a peripheral collaborator; this crate
//! pins the contract the top-level service holds: an explicit, long-lived
//! `GovernanceHandle` constructed at startup and torn down at shutdown,
//! never a process-wide global.

pub mod client;
pub mod error;
pub mod handle;

pub use client::{GovernanceClient, NoopGovernanceClient};
pub use error::{GovernanceError, GovernanceResult};
pub use handle::GovernanceHandle;
