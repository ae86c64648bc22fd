//! Per-connection state machine and read loop for a single DRA.
//!
//! `ACCEPTED → CER_PENDING → ESTABLISHED → [forwarding …] → CLOSING → CLOSED`.
//! `Accepted` and `CerPending` are collapsed into one pre-handshake state
//! here: both mean "no CER answered yet", and the only transition out of
//! either is a successful CER/CEA exchange.

use std::net::SocketAddr;
use std::sync::Arc;

use eir_codec::constants::{command_codes, result_codes};
use eir_codec::{build_cea, build_dwa, build_error_answer, DiameterMessage};
use tokio::net::TcpStream;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::upstream::UpstreamConnection;
use crate::wire::{read_frame, write_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingCer,
    Established,
    Closing,
}

/// Consecutive forwarding failures before the DRA connection is dropped.
const MAX_CONSECUTIVE_FORWARD_FAILURES: u32 = 3;

pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    config: Arc<GatewayConfig>,
    upstream: Arc<UpstreamConnection>,
) {
    let mut state = ConnectionState::AwaitingCer;
    let mut consecutive_forward_failures = 0u32;

    loop {
        if state == ConnectionState::Closing {
            break;
        }

        let frame = match read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(GatewayError::Io(e)) if is_peer_closed(&e) => {
                log::debug!("gateway: DRA {} closed connection", peer);
                break;
            }
            Err(e) => {
                log::warn!("gateway: read error from DRA {}: {}", peer, e);
                break;
            }
        };

        let message = match DiameterMessage::decode(&frame) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("gateway: malformed message from DRA {}: {}", peer, e);
                continue;
            }
        };

        if !message.header.is_request() {
            log::debug!("gateway: dropping unsolicited answer from DRA {}", peer);
            continue;
        }

        match message.header.command_code {
            command_codes::CER_CEA => {
                let cea = build_cea(
                    &message,
                    &config.origin_host,
                    &config.origin_realm,
                    &config.host_ip_address,
                    config.vendor_id,
                    &config.product_name,
                    &config.auth_application_ids,
                );
                if send(&mut stream, &cea, peer).await.is_err() {
                    break;
                }
                state = ConnectionState::Established;
            }
            command_codes::DWR_DWA => {
                if state != ConnectionState::Established {
                    if reject_out_of_order(&mut stream, &message, &config, peer)
                        .await
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }
                let dwa = build_dwa(&message, &config.origin_host, &config.origin_realm);
                if send(&mut stream, &dwa, peer).await.is_err() {
                    break;
                }
            }
            command_codes::MICR_MICA => {
                if state != ConnectionState::Established {
                    if reject_out_of_order(&mut stream, &message, &config, peer)
                        .await
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }
                match upstream.send_recv(&frame).await {
                    Ok(answer_bytes) => {
                        consecutive_forward_failures = 0;
                        if write_frame(&mut stream, &answer_bytes).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        consecutive_forward_failures += 1;
                        log::warn!(
                            "gateway: failed to forward MICR to Core for DRA {} ({}/{}): {}",
                            peer,
                            consecutive_forward_failures,
                            MAX_CONSECUTIVE_FORWARD_FAILURES,
                            e
                        );
                        let mica = build_error_answer(
                            &message,
                            result_codes::DIAMETER_UNABLE_TO_DELIVER,
                            &config.origin_host,
                            &config.origin_realm,
                        );
                        if send(&mut stream, &mica, peer).await.is_err() {
                            break;
                        }
                        if consecutive_forward_failures >= MAX_CONSECUTIVE_FORWARD_FAILURES {
                            log::warn!(
                                "gateway: closing DRA {} after {} consecutive forwarding failures",
                                peer,
                                consecutive_forward_failures
                            );
                            state = ConnectionState::Closing;
                        }
                    }
                }
            }
            other => {
                log::debug!(
                    "gateway: unsupported command {} from DRA {} in state {:?}",
                    other,
                    peer,
                    state
                );
                if reject(&mut stream, &message, &config, peer).await.is_err() {
                    break;
                }
            }
        }
    }

    log::debug!("gateway: connection to DRA {} closed", peer);
}

async fn send(stream: &mut TcpStream, msg: &DiameterMessage, peer: SocketAddr) -> Result<(), ()> {
    let bytes = msg.encode();
    write_frame(stream, &bytes).await.map_err(|e| {
        log::warn!("gateway: write error to DRA {}: {}", peer, e);
    })
}

/// Any non-CER command arriving before the connection reaches
/// `Established` — the state-machine violation §4.B calls out
/// (`Result-Code=5011`), distinct from the generic `5012` below.
async fn reject_out_of_order(
    stream: &mut TcpStream,
    request: &DiameterMessage,
    config: &GatewayConfig,
    peer: SocketAddr,
) -> Result<(), ()> {
    let answer = build_error_answer(
        request,
        result_codes::DIAMETER_OUT_OF_ORDER,
        &config.origin_host,
        &config.origin_realm,
    );
    send(stream, &answer, peer).await
}

async fn reject(
    stream: &mut TcpStream,
    request: &DiameterMessage,
    config: &GatewayConfig,
    peer: SocketAddr,
) -> Result<(), ()> {
    let answer = build_error_answer(
        request,
        result_codes::DIAMETER_UNABLE_TO_COMPLY,
        &config.origin_host,
        &config.origin_realm,
    );
    send(stream, &answer, peer).await
}

fn is_peer_closed(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
    )
}
