use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] eir_codec::CodecError),

    #[error("upstream Core unavailable: {0}")]
    UpstreamUnavailable(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
