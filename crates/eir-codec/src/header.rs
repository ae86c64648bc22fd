//! 20-byte Diameter message header (RFC 6733 section 3)

use crate::constants::{flags, HEADER_LEN, MAX_MESSAGE_LEN, MIN_MESSAGE_LEN};
use crate::error::{CodecError, CodecResult};
use bytes::{Buf, BufMut, BytesMut};

/// Diameter version this codec speaks
pub const DIAMETER_VERSION: u8 = 1;

/// The fixed 20-byte Diameter message header.
///
/// `length` is the total message length in octets, including this header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiameterHeader {
    pub version: u8,
    pub length: u32,
    pub flags: u8,
    pub command_code: u32,
    pub application_id: u32,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
}

impl DiameterHeader {
    pub fn new_request(
        command_code: u32,
        application_id: u32,
        hop_by_hop_id: u32,
        end_to_end_id: u32,
    ) -> Self {
        Self {
            version: DIAMETER_VERSION,
            length: HEADER_LEN as u32,
            flags: flags::REQUEST,
            command_code,
            application_id,
            hop_by_hop_id,
            end_to_end_id,
        }
    }

    /// Build the answer header for a given request header, preserving the
    /// Hop-by-Hop and End-to-End identifiers and clearing the Request bit.
    pub fn answer_for(request: &DiameterHeader) -> Self {
        Self {
            version: DIAMETER_VERSION,
            length: HEADER_LEN as u32,
            flags: request.flags & !flags::REQUEST,
            command_code: request.command_code,
            application_id: request.application_id,
            hop_by_hop_id: request.hop_by_hop_id,
            end_to_end_id: request.end_to_end_id,
        }
    }

    pub fn is_request(&self) -> bool {
        self.flags & flags::REQUEST != 0
    }

    pub fn is_proxyable(&self) -> bool {
        self.flags & flags::PROXYABLE != 0
    }

    pub fn is_error(&self) -> bool {
        self.flags & flags::ERROR != 0
    }

    /// Decode a header from exactly `HEADER_LEN` bytes.
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        if buf.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                needed: HEADER_LEN,
                have: buf.len(),
            });
        }

        let mut cursor = buf;
        let version = cursor.get_u8();
        if version != DIAMETER_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        // Length is a 3-byte big-endian field that shares the leading
        // command-flags byte; read all four bytes as u32 then mask.
        let length = cursor.get_uint(3) as u32;
        if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&length) {
            return Err(CodecError::InvalidMessageLength(length));
        }

        let command_flags = cursor.get_u8();
        let command_code = cursor.get_uint(3) as u32;
        let application_id = cursor.get_u32();
        let hop_by_hop_id = cursor.get_u32();
        let end_to_end_id = cursor.get_u32();

        Ok(Self {
            version,
            length,
            flags: command_flags,
            command_code,
            application_id,
            hop_by_hop_id,
            end_to_end_id,
        })
    }

    /// Encode the header into `buf`, writing exactly `HEADER_LEN` bytes.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_uint(self.length as u64, 3);
        buf.put_u8(self.flags);
        buf.put_uint(self.command_code as u64, 3);
        buf.put_u32(self.application_id);
        buf.put_u32(self.hop_by_hop_id);
        buf.put_u32(self.end_to_end_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_request_header() {
        let header = DiameterHeader::new_request(324, 16777252, 0xDEADBEEF, 0xCAFEBABE);
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);

        let decoded = DiameterHeader::decode(&buf).unwrap();
        assert_eq!(decoded, header);
        assert!(decoded.is_request());
    }

    #[test]
    fn answer_preserves_h2h_and_e2e() {
        let request = DiameterHeader::new_request(324, 16777252, 0xDEADBEEF, 0xCAFEBABE);
        let answer = DiameterHeader::answer_for(&request);
        assert_eq!(answer.hop_by_hop_id, request.hop_by_hop_id);
        assert_eq!(answer.end_to_end_id, request.end_to_end_id);
        assert!(!answer.is_request());
    }

    #[test]
    fn rejects_length_below_minimum() {
        let mut buf = BytesMut::new();
        let bad = DiameterHeader {
            version: DIAMETER_VERSION,
            length: 4,
            flags: flags::REQUEST,
            command_code: 324,
            application_id: 16777252,
            hop_by_hop_id: 1,
            end_to_end_id: 1,
        };
        bad.encode(&mut buf);
        assert!(matches!(
            DiameterHeader::decode(&buf),
            Err(CodecError::InvalidMessageLength(4))
        ));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let buf = [0u8; 10];
        assert!(matches!(
            DiameterHeader::decode(&buf),
            Err(CodecError::Truncated { .. })
        ));
    }
}
