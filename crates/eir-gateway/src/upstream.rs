//! A single lazily-dialled, reused, health-probed connection to the EIR
//! Core's Diameter endpoint. Serialised behind a mutex: the gateway writes
//! a request then reads its answer before releasing the lock, matching
//! the shared-resource rule in the concurrency model (one outstanding
//! request per upstream leg at a time).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{GatewayError, GatewayResult};
use crate::wire::{read_frame, write_frame};

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_millis(10);

pub struct UpstreamConnection {
    addr: SocketAddr,
    inner: Mutex<Option<TcpStream>>,
}

impl UpstreamConnection {
    pub fn new(addr: SocketAddr) -> Arc<Self> {
        Arc::new(Self {
            addr,
            inner: Mutex::new(None),
        })
    }

    async fn dial(&self) -> GatewayResult<TcpStream> {
        TcpStream::connect(self.addr).await.map_err(|e| {
            GatewayError::UpstreamUnavailable(format!("dial {} failed: {}", self.addr, e))
        })
    }

    /// A zero-byte peek with a short deadline: `Ok(Some(0))`/`Err` means the
    /// peer has gone away and the connection must be re-dialled; `Ok(None)`
    /// (timeout, nothing to read) means it is still alive.
    async fn is_dead(stream: &TcpStream) -> bool {
        let mut probe = [0u8; 1];
        match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, stream.peek(&mut probe)).await {
            Ok(Ok(0)) => true,
            Ok(Err(_)) => true,
            _ => false,
        }
    }

    /// Write `request` and return the matching answer frame, dialling or
    /// re-dialling as needed. Any I/O failure drops the cached connection
    /// so the next call starts fresh.
    pub async fn send_recv(&self, request: &[u8]) -> GatewayResult<Vec<u8>> {
        let mut guard = self.inner.lock().await;

        let needs_dial = match guard.as_ref() {
            Some(stream) => Self::is_dead(stream).await,
            None => true,
        };
        if needs_dial {
            *guard = Some(self.dial().await?);
        }

        let stream = guard.as_mut().expect("just dialled or confirmed alive");
        if let Err(e) = write_frame(stream, request).await {
            *guard = None;
            return Err(e);
        }
        match read_frame(stream).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }
}
