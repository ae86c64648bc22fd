//! Diameter base protocol and 3GPP S13 (ME-Identity-Check) wire codec.
//!
//! Pure encode/decode over byte buffers; no I/O and no connection state.
//! The gateway crate owns sockets and message ordering, this crate only
//! knows how to turn bytes into `DiameterMessage`s and back.

pub mod avp;
pub mod constants;
pub mod error;
pub mod header;
pub mod message;
pub mod outcome;

pub use avp::Avp;
pub use error::{CodecError, CodecResult};
pub use header::DiameterHeader;
pub use message::{
    base_answer, build_cea, build_dwa, build_error_answer, build_mica, build_micr,
    DiameterMessage, MicrFields,
};
pub use outcome::{result_code_for_reason, ErrorReason};
