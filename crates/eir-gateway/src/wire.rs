//! Full-header-then-full-body framing over an async byte stream, shared by
//! the DRA-facing accept loop and the Core-facing upstream connection.

use eir_codec::constants::{HEADER_LEN, MAX_MESSAGE_LEN, MIN_MESSAGE_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{GatewayError, GatewayResult};

/// Read one complete Diameter message (header + body) off `stream`.
pub async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> GatewayResult<Vec<u8>> {
    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).await?;

    let length = u32::from_be_bytes([0, header[1], header[2], header[3]]);
    if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&length) {
        return Err(GatewayError::Codec(eir_codec::CodecError::InvalidMessageLength(length)));
    }

    let mut frame = Vec::with_capacity(length as usize);
    frame.extend_from_slice(&header);
    let mut body = vec![0u8; length as usize - HEADER_LEN];
    stream.read_exact(&mut body).await?;
    frame.extend_from_slice(&body);

    Ok(frame)
}

pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, bytes: &[u8]) -> GatewayResult<()> {
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(())
}
