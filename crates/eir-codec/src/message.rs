//! Typed Diameter messages: base protocol housekeeping plus S13 MICR/MICA.

use crate::avp::{self, avp_flags, Avp};
use crate::constants::{application_ids, avp_codes, command_codes, HEADER_LEN};
use crate::error::{CodecError, CodecResult};
use crate::header::DiameterHeader;
use bytes::BytesMut;

/// A fully decoded Diameter message: header plus flat AVP list.
#[derive(Debug, Clone)]
pub struct DiameterMessage {
    pub header: DiameterHeader,
    pub avps: Vec<Avp>,
}

impl DiameterMessage {
    pub fn new(header: DiameterHeader, avps: Vec<Avp>) -> Self {
        Self { header, avps }
    }

    /// Decode a complete message (header + body) from `buf`.
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        let header = DiameterHeader::decode(buf)?;
        let total_len = header.length as usize;
        if buf.len() < total_len {
            return Err(CodecError::Truncated {
                needed: total_len,
                have: buf.len(),
            });
        }
        let body = &buf[HEADER_LEN..total_len];
        let avps = avp::decode_avps(body)?;
        Ok(Self { header, avps })
    }

    /// Encode the message to a contiguous byte buffer, computing and filling
    /// in the header's `length` field.
    pub fn encode(&self) -> BytesMut {
        let mut body = BytesMut::new();
        for a in &self.avps {
            a.encode(&mut body);
        }

        let mut header = self.header;
        header.length = (HEADER_LEN + body.len()) as u32;

        let mut out = BytesMut::with_capacity(header.length as usize);
        header.encode(&mut out);
        out.extend_from_slice(&body);
        out
    }

    pub fn find(&self, code: u32) -> Option<&Avp> {
        avp::find(&self.avps, code)
    }

    pub fn session_id(&self) -> CodecResult<String> {
        self.find(avp_codes::SESSION_ID)
            .ok_or(CodecError::MissingAvp("Session-Id"))?
            .as_utf8()
    }

    pub fn origin_host(&self) -> CodecResult<String> {
        self.find(avp_codes::ORIGIN_HOST)
            .ok_or(CodecError::MissingAvp("Origin-Host"))?
            .as_utf8()
    }

    pub fn origin_realm(&self) -> CodecResult<String> {
        self.find(avp_codes::ORIGIN_REALM)
            .ok_or(CodecError::MissingAvp("Origin-Realm"))?
            .as_utf8()
    }

    pub fn result_code(&self) -> Option<u32> {
        self.find(avp_codes::RESULT_CODE).and_then(|a| a.as_u32().ok())
    }
}

/// Build a base-protocol answer (CEA/DWA/DPA/error-answer) preserving the
/// request's H2H/E2E identifiers and Session-Id (when present).
pub fn base_answer(
    request: &DiameterMessage,
    result_code: u32,
    origin_host: &str,
    origin_realm: &str,
    extra: Vec<Avp>,
) -> DiameterMessage {
    let header = DiameterHeader::answer_for(&request.header);
    let mut avps = Vec::with_capacity(4 + extra.len());

    if let Ok(session_id) = request.session_id() {
        avps.push(Avp::from_str(avp_codes::SESSION_ID, &session_id, true));
    }
    avps.push(Avp::from_u32(avp_codes::RESULT_CODE, result_code, true));
    avps.push(Avp::from_str(avp_codes::ORIGIN_HOST, origin_host, true));
    avps.push(Avp::from_str(avp_codes::ORIGIN_REALM, origin_realm, true));
    avps.extend(extra);

    DiameterMessage::new(header, avps)
}

/// Capabilities-Exchange-Answer in response to a CER, with `Result-Code`,
/// identity AVPs, and the peer's Auth-Application-Id list echoed back.
#[allow(clippy::too_many_arguments)]
pub fn build_cea(
    request: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    host_ip_address: &str,
    vendor_id: u32,
    product_name: &str,
    auth_application_ids: &[u32],
) -> DiameterMessage {
    let mut extra = vec![
        Avp::new(avp_codes::HOST_IP_ADDRESS, false, host_ip_address.as_bytes().to_vec()),
        Avp::from_u32(avp_codes::VENDOR_ID, vendor_id, true),
        Avp::from_str(avp_codes::PRODUCT_NAME, product_name, false),
    ];
    for app_id in auth_application_ids {
        extra.push(Avp::from_u32(avp_codes::AUTH_APPLICATION_ID, *app_id, true));
    }
    base_answer(
        request,
        crate::constants::result_codes::DIAMETER_SUCCESS,
        origin_host,
        origin_realm,
        extra,
    )
}

/// Device-Watchdog-Answer in response to a DWR.
pub fn build_dwa(request: &DiameterMessage, origin_host: &str, origin_realm: &str) -> DiameterMessage {
    base_answer(
        request,
        crate::constants::result_codes::DIAMETER_SUCCESS,
        origin_host,
        origin_realm,
        vec![],
    )
}

/// A generic base-protocol-housekeeping-shaped error answer, used when the
/// gateway must reject a message with a specific result code (e.g. 5012
/// UNABLE_TO_COMPLY for an out-of-order command, or 3002 UNABLE_TO_DELIVER
/// when the upstream Core is unreachable).
pub fn build_error_answer(
    request: &DiameterMessage,
    result_code: u32,
    origin_host: &str,
    origin_realm: &str,
) -> DiameterMessage {
    base_answer(request, result_code, origin_host, origin_realm, vec![])
}

/// ME-Identity-Check-Request (command 324, application 16777252).
pub struct MicrFields {
    pub session_id: String,
    pub origin_host: String,
    pub origin_realm: String,
    pub destination_realm: String,
    pub imei: String,
    pub software_version: Option<String>,
}

impl MicrFields {
    /// Extract the fields the decision engine needs from a decoded MICR.
    pub fn from_message(msg: &DiameterMessage) -> CodecResult<Self> {
        let terminal_info = msg
            .find(avp_codes::TERMINAL_INFORMATION)
            .ok_or(CodecError::MissingAvp("Terminal-Information"))?
            .as_grouped()?;

        let imei = avp::find(&terminal_info, avp_codes::IMEI)
            .ok_or(CodecError::MissingAvp("IMEI"))?
            .as_utf8()?;
        let software_version = avp::find(&terminal_info, avp_codes::SOFTWARE_VERSION)
            .map(|a| a.as_utf8())
            .transpose()?;

        Ok(Self {
            session_id: msg.session_id()?,
            origin_host: msg.origin_host()?,
            origin_realm: msg.origin_realm()?,
            destination_realm: msg
                .find(avp_codes::DESTINATION_REALM)
                .ok_or(CodecError::MissingAvp("Destination-Realm"))?
                .as_utf8()?,
            imei,
            software_version,
        })
    }
}

/// Build a MICR for the given fields (used by tests and by any Core-side
/// simulator, not by the gateway, which forwards raw bytes unmodified).
pub fn build_micr(
    hop_by_hop_id: u32,
    end_to_end_id: u32,
    fields: &MicrFields,
) -> DiameterMessage {
    let header = DiameterHeader::new_request(
        command_codes::MICR_MICA,
        application_ids::S13,
        hop_by_hop_id,
        end_to_end_id,
    );

    let mut terminal_info = vec![Avp::from_str(avp_codes::IMEI, &fields.imei, true)];
    if let Some(sw) = &fields.software_version {
        terminal_info.push(Avp::from_str(avp_codes::SOFTWARE_VERSION, sw, false));
    }

    let avps = vec![
        Avp::from_str(avp_codes::SESSION_ID, &fields.session_id, true),
        Avp::from_str(avp_codes::ORIGIN_HOST, &fields.origin_host, true),
        Avp::from_str(avp_codes::ORIGIN_REALM, &fields.origin_realm, true),
        Avp::from_str(avp_codes::DESTINATION_REALM, &fields.destination_realm, true),
        Avp::from_grouped(avp_codes::TERMINAL_INFORMATION, &terminal_info, true),
    ];

    DiameterMessage::new(header, avps)
}

/// Build a MICA carrying the resolved Equipment-Status for the request.
pub fn build_mica(
    request: &DiameterMessage,
    result_code: u32,
    origin_host: &str,
    origin_realm: &str,
    equipment_status: Option<u32>,
) -> DiameterMessage {
    let mut extra = Vec::new();
    if let Some(status) = equipment_status {
        extra.push(Avp::from_u32(avp_codes::EQUIPMENT_STATUS, status, true));
    }
    base_answer(request, result_code, origin_host, origin_realm, extra)
}

pub fn is_request(msg: &DiameterMessage) -> bool {
    msg.header.is_request()
}

pub fn is_mandatory_flag_set(avp: &Avp) -> bool {
    avp.flags & avp_flags::MANDATORY != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{equipment_status, result_codes};

    fn sample_micr() -> DiameterMessage {
        build_micr(
            0xDEADBEEF,
            0xCAFEBABE,
            &MicrFields {
                session_id: "mme1;1;2;3".to_string(),
                origin_host: "mme1.example.com".to_string(),
                origin_realm: "example.com".to_string(),
                destination_realm: "eir.example.com".to_string(),
                imei: "490154203237518".to_string(),
                software_version: Some("01".to_string()),
            },
        )
    }

    #[test]
    fn round_trips_micr_bytes() {
        let msg = sample_micr();
        let bytes = msg.encode();
        let decoded = DiameterMessage::decode(&bytes).unwrap();
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn extracts_imei_from_terminal_information() {
        let msg = sample_micr();
        let fields = MicrFields::from_message(&msg).unwrap();
        assert_eq!(fields.imei, "490154203237518");
        assert_eq!(fields.software_version.as_deref(), Some("01"));
    }

    #[test]
    fn mica_preserves_h2h_e2e_and_session_id() {
        let request = sample_micr();
        let answer = build_mica(
            &request,
            result_codes::DIAMETER_SUCCESS,
            "eir.example.com",
            "example.com",
            Some(equipment_status::WHITELISTED),
        );

        assert_eq!(answer.header.hop_by_hop_id, request.header.hop_by_hop_id);
        assert_eq!(answer.header.end_to_end_id, request.header.end_to_end_id);
        assert_eq!(answer.session_id().unwrap(), request.session_id().unwrap());
        assert!(!answer.header.is_request());
        assert_eq!(answer.result_code(), Some(result_codes::DIAMETER_SUCCESS));
    }

    #[test]
    fn cea_echoes_auth_application_ids() {
        let cer = DiameterMessage::new(
            DiameterHeader::new_request(command_codes::CER_CEA, application_ids::BASE, 1, 1),
            vec![Avp::from_str(avp_codes::ORIGIN_HOST, "dra1.example.com", true)],
        );
        let cea = build_cea(
            &cer,
            "eir.example.com",
            "example.com",
            "127.0.0.1",
            10415,
            "eir-core",
            &[application_ids::S13],
        );
        let ids: Vec<u32> = cea
            .avps
            .iter()
            .filter(|a| a.code == avp_codes::AUTH_APPLICATION_ID)
            .map(|a| a.as_u32().unwrap())
            .collect();
        assert_eq!(ids, vec![application_ids::S13]);
    }
}
