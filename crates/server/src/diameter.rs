//! The Core's own Diameter endpoint: terminates the connection the
//! gateway forwards S13 traffic over, answers CER/DWR locally, and for
//! MICR decodes the message, calls the decision engine, and encodes the
//! MICA. Structured the same way as `eir_gateway::connection`'s
//! per-connection read loop, but this tier does the actual decode (A) +
//! decision (C) work instead of forwarding raw bytes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use eir_codec::constants::{command_codes, result_codes};
use eir_codec::{build_cea, build_dwa, build_error_answer, build_mica, DiameterMessage, MicrFields};
use eir_core::{CheckEquipmentRequest, EirError, EquipmentDecisionEngine};
use eir_gateway::GatewayError;
use eir_repository::RequestSource;
use tokio::net::{TcpListener, TcpStream};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    AwaitingCer,
    Established,
}

pub struct CoreDiameterConfig {
    pub origin_host: String,
    pub origin_realm: String,
    pub host_ip_address: String,
    pub vendor_id: u32,
    pub product_name: String,
    pub auth_application_ids: Vec<u32>,
}

/// Run the Core Diameter endpoint off an already-bound listener (bound by
/// the caller so the gateway can be pointed at its resolved ephemeral
/// address before either task starts accepting).
pub async fn run(listener: TcpListener, config: Arc<CoreDiameterConfig>, state: Arc<AppState>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("core diameter: accept failed: {}", e);
                continue;
            }
        };
        let config = config.clone();
        let state = state.clone();
        tokio::spawn(async move {
            state.metrics.active_diameter_connections.inc();
            handle_connection(stream, peer, config, state.clone()).await;
            state.metrics.active_diameter_connections.dec();
        });
    }
}

async fn write_message(stream: &mut TcpStream, msg: &DiameterMessage) -> Result<(), GatewayError> {
    eir_gateway::wire::write_frame(stream, &msg.encode()).await
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    config: Arc<CoreDiameterConfig>,
    state: Arc<AppState>,
) {
    let mut conn_state = ConnectionState::AwaitingCer;

    loop {
        let frame = match eir_gateway::wire::read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(e) if is_peer_closed(&e) => {
                log::debug!("core diameter: gateway {} closed connection", peer);
                break;
            }
            Err(e) => {
                log::warn!("core diameter: read error from {}: {}", peer, e);
                break;
            }
        };

        let message = match DiameterMessage::decode(&frame) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("core diameter: malformed message from {}: {}", peer, e);
                continue;
            }
        };

        if !message.header.is_request() {
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
                if write_message(&mut stream, &cea).await.is_err() {
                    break;
                }
                conn_state = ConnectionState::Established;
            }
            command_codes::DWR_DWA => {
                if conn_state != ConnectionState::Established {
                    if reject_out_of_order(&mut stream, &message, &config).await.is_err() {
                        break;
                    }
                    continue;
                }
                let dwa = build_dwa(&message, &config.origin_host, &config.origin_realm);
                if write_message(&mut stream, &dwa).await.is_err() {
                    break;
                }
            }
            command_codes::MICR_MICA => {
                if conn_state != ConnectionState::Established {
                    if reject_out_of_order(&mut stream, &message, &config).await.is_err() {
                        break;
                    }
                    continue;
                }
                let answer = handle_micr(&message, &config, &state).await;
                if write_message(&mut stream, &answer).await.is_err() {
                    break;
                }
            }
            other => {
                log::debug!(
                    "core diameter: unsupported command {} from {} in state {:?}",
                    other,
                    peer,
                    conn_state
                );
                if reject(&mut stream, &message, &config).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn handle_micr(
    request: &DiameterMessage,
    config: &CoreDiameterConfig,
    state: &AppState,
) -> DiameterMessage {
    let started = Instant::now();

    let fields = match MicrFields::from_message(request) {
        Ok(fields) => fields,
        Err(e) => {
            log::warn!("core diameter: malformed MICR: {}", e);
            return build_error_answer(
                request,
                result_codes::DIAMETER_MISSING_AVP,
                &config.origin_host,
                &config.origin_realm,
            );
        }
    };

    let check_request = CheckEquipmentRequest {
        imei: fields.imei.clone(),
        request_source: RequestSource::DiameterS13,
        supi: None,
        gpsi: None,
        session_id: Some(fields.session_id.clone()),
        origin_host: Some(fields.origin_host.clone()),
        origin_realm: Some(fields.origin_realm.clone()),
        transport: None,
    };

    let result = state.engine.check_equipment(check_request).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            state
                .metrics
                .equipment_check_total
                .with_label_values(&["DIAMETER_S13", &response.status.to_string()])
                .inc();
            state
                .metrics
                .equipment_check_duration
                .with_label_values(&["DIAMETER_S13", &response.status.to_string()])
                .observe(elapsed);

            build_mica(
                request,
                result_codes::DIAMETER_SUCCESS,
                &config.origin_host,
                &config.origin_realm,
                Some(response.status.to_diameter_value()),
            )
        }
        Err(e) => {
            state
                .metrics
                .equipment_check_total
                .with_label_values(&["DIAMETER_S13", "ERROR"])
                .inc();
            log::warn!("core diameter: equipment check failed for {}: {}", fields.imei, e);
            build_error_answer(
                request,
                result_code_for_error(&e),
                &config.origin_host,
                &config.origin_realm,
            )
        }
    }
}

/// The small `EirError` → wire `Result-Code` match this server crate owns;
/// `eir_codec::result_code_for_reason` holds the actual result-code table.
fn result_code_for_error(err: &EirError) -> u32 {
    let reason = match err {
        EirError::InvalidImei(_) => eir_codec::ErrorReason::InvalidAvpValue,
        EirError::MissingAvp(_) => eir_codec::ErrorReason::MissingAvp,
        EirError::RepositoryTransient(_) => eir_codec::ErrorReason::RepositoryBusy,
        EirError::RepositoryFatal(_) => eir_codec::ErrorReason::RepositoryFailure,
        EirError::UpstreamUnavailable(_) => eir_codec::ErrorReason::UpstreamUnavailable,
        EirError::Timeout => eir_codec::ErrorReason::Timeout,
        EirError::CancellationRequested | EirError::ProtocolError(_) => {
            eir_codec::ErrorReason::RepositoryFailure
        }
    };
    eir_codec::result_code_for_reason(reason)
}

/// Any non-CER command arriving before the connection reaches
/// `Established` — the state-machine violation §4.B calls out
/// (`Result-Code=5011`), distinct from the generic `5012` below.
async fn reject_out_of_order(
    stream: &mut TcpStream,
    request: &DiameterMessage,
    config: &CoreDiameterConfig,
) -> Result<(), GatewayError> {
    let answer = build_error_answer(
        request,
        result_codes::DIAMETER_OUT_OF_ORDER,
        &config.origin_host,
        &config.origin_realm,
    );
    write_message(stream, &answer).await
}

async fn reject(
    stream: &mut TcpStream,
    request: &DiameterMessage,
    config: &CoreDiameterConfig,
) -> Result<(), GatewayError> {
    let answer = build_error_answer(
        request,
        result_codes::DIAMETER_UNABLE_TO_COMPLY,
        &config.origin_host,
        &config.origin_realm,
    );
    write_message(stream, &answer).await
}

fn is_peer_closed(e: &GatewayError) -> bool {
    use std::io::ErrorKind;
    matches!(
        e,
        GatewayError::Io(io_err)
            if matches!(
                io_err.kind(),
                ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
            )
    )
}
