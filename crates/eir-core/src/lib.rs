//! Decision engine: IMEI validation, repository lookup, default policy,
//! atomic counter increment, audit emission and Diameter status mapping.

pub mod engine;
pub mod error;
pub mod imei;

pub use engine::{
    CheckEquipmentRequest, CheckEquipmentResponse, CoreDecisionEngine, DefaultPolicy,
    EquipmentDecisionEngine,
};
pub use error::{EirError, EirResult};
pub use imei::Imei;
