//! Error types for the Diameter codec

use thiserror::Error;

/// Errors raised while decoding or encoding Diameter wire data
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("message too short: need at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("invalid message length {0}: must be between 20 and 1048576 octets")]
    InvalidMessageLength(u32),

    #[error("invalid AVP length {0}")]
    InvalidAvpLength(u32),

    #[error("unsupported mandatory AVP: code {0}")]
    AvpUnsupported(u32),

    #[error("missing required AVP: {0}")]
    MissingAvp(&'static str),

    #[error("malformed AVP value for {avp}: {reason}")]
    MalformedAvpValue { avp: &'static str, reason: String },

    #[error("unsupported diameter version {0}")]
    UnsupportedVersion(u8),
}

pub type CodecResult<T> = Result<T, CodecError>;
