//! Accept loop: one `tokio::spawn`ed task per DRA connection, all sharing
//! one lazily-dialled upstream connection to the Core.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::connection::handle_connection;
use crate::error::GatewayResult;
use crate::upstream::UpstreamConnection;

pub struct DiameterGateway {
    config: Arc<GatewayConfig>,
    upstream: Arc<UpstreamConnection>,
}

impl DiameterGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let upstream = UpstreamConnection::new(config.core_addr);
        Self {
            config: Arc::new(config),
            upstream,
        }
    }

    /// Bind the listen address and accept DRA connections until the process
    /// is shut down. Each accepted connection runs in its own task.
    pub async fn run(self) -> GatewayResult<()> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.run_with_listener(listener).await
    }

    /// Same accept loop as [`Self::run`], but over a listener the caller
    /// already bound. Lets the caller detect a bind failure synchronously
    /// before handing the listener off to a background task.
    pub async fn run_with_listener(self, listener: TcpListener) -> GatewayResult<()> {
        log::info!(
            "gateway: listening on {}",
            listener.local_addr().unwrap_or(self.config.listen_addr)
        );

        loop {
            let (stream, peer) = listener.accept().await?;
            let config = self.config.clone();
            let upstream = self.upstream.clone();
            tokio::spawn(async move {
                log::debug!("gateway: accepted DRA connection from {}", peer);
                handle_connection(stream, peer, config, upstream).await;
            });
        }
    }
}
