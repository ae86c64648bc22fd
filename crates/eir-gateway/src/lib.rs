//! Stateless Diameter gateway: terminates DRA connections, answers
//! CER/DWR locally, and transparently forwards S13 MICR/MICA to the EIR
//! Core's Diameter endpoint over a single reused upstream connection.

pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod upstream;
pub mod wire;

pub use config::GatewayConfig;
pub use connection::ConnectionState;
pub use error::{GatewayError, GatewayResult};
pub use listener::DiameterGateway;
pub use upstream::UpstreamConnection;

#[cfg(test)]
mod tests {
    use super::*;
    use eir_codec::constants::{application_ids, command_codes, result_codes};
    use eir_codec::{build_cea, build_micr, DiameterHeader, DiameterMessage, MicrFields};
    use tokio::net::TcpListener;

    async fn loopback_core(listener: TcpListener) {
        let (mut stream, _) = listener.accept().await.unwrap();
        let frame = crate::wire::read_frame(&mut stream).await.unwrap();
        let request = DiameterMessage::decode(&frame).unwrap();
        let answer = eir_codec::build_mica(
            &request,
            result_codes::DIAMETER_SUCCESS,
            "eir-core.example.com",
            "example.com",
            Some(eir_codec::constants::equipment_status::WHITELISTED),
        );
        crate::wire::write_frame(&mut stream, &answer.encode())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upstream_connection_round_trips_a_micr() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let core_addr = listener.local_addr().unwrap();
        tokio::spawn(loopback_core(listener));

        let upstream = UpstreamConnection::new(core_addr);
        let micr = build_micr(
            1,
            2,
            &MicrFields {
                session_id: "dra;1".to_string(),
                origin_host: "mme1.example.com".to_string(),
                origin_realm: "example.com".to_string(),
                destination_realm: "eir.example.com".to_string(),
                imei: "490154203237518".to_string(),
                software_version: None,
            },
        );

        let answer_bytes = upstream.send_recv(&micr.encode()).await.unwrap();
        let answer = DiameterMessage::decode(&answer_bytes).unwrap();
        assert_eq!(answer.header.hop_by_hop_id, 1);
        assert_eq!(answer.header.end_to_end_id, 2);
        assert_eq!(answer.result_code(), Some(result_codes::DIAMETER_SUCCESS));
    }

    #[tokio::test]
    async fn upstream_connection_reports_unavailable_when_core_is_down() {
        // Bind then immediately drop, freeing the port without a listener.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = UpstreamConnection::new(addr);
        let result = upstream.send_recv(&[0u8; 20]).await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[test]
    fn cer_cea_shape_is_diameter_success() {
        let cer = DiameterMessage::new(
            DiameterHeader::new_request(command_codes::CER_CEA, application_ids::BASE, 7, 8),
            vec![],
        );
        let cea = build_cea(
            &cer,
            "eir-gateway.example.com",
            "example.com",
            "127.0.0.1",
            10415,
            "eir-gateway",
            &[application_ids::S13],
        );
        assert_eq!(cea.result_code(), Some(result_codes::DIAMETER_SUCCESS));
        assert_eq!(cea.header.hop_by_hop_id, 7);
        assert_eq!(cea.header.end_to_end_id, 8);
    }
}
