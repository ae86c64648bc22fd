//! Attribute-Value Pair (AVP) encoding/decoding (RFC 6733 section 4)

use crate::error::{CodecError, CodecResult};
use bytes::{Buf, BufMut, BytesMut};

/// AVP flag bits (byte 4 of the AVP header)
pub mod avp_flags {
    pub const VENDOR: u8 = 0x80;
    pub const MANDATORY: u8 = 0x40;
    pub const PROTECTED: u8 = 0x20;
}

const AVP_HEADER_LEN_NO_VENDOR: usize = 8;
const AVP_HEADER_LEN_VENDOR: usize = 12;

/// A decoded Attribute-Value Pair. `data` is the raw, unpadded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avp {
    pub code: u32,
    pub flags: u8,
    pub vendor_id: Option<u32>,
    pub data: Vec<u8>,
}

impl Avp {
    pub fn new(code: u32, mandatory: bool, data: Vec<u8>) -> Self {
        Self {
            code,
            flags: if mandatory { avp_flags::MANDATORY } else { 0 },
            vendor_id: None,
            data,
        }
    }

    pub fn new_vendor(code: u32, vendor_id: u32, mandatory: bool, data: Vec<u8>) -> Self {
        let mut flags = avp_flags::VENDOR;
        if mandatory {
            flags |= avp_flags::MANDATORY;
        }
        Self {
            code,
            flags,
            vendor_id: Some(vendor_id),
            data,
        }
    }

    pub fn from_u32(code: u32, value: u32, mandatory: bool) -> Self {
        Self::new(code, mandatory, value.to_be_bytes().to_vec())
    }

    pub fn from_str(code: u32, value: &str, mandatory: bool) -> Self {
        Self::new(code, mandatory, value.as_bytes().to_vec())
    }

    pub fn from_grouped(code: u32, members: &[Avp], mandatory: bool) -> Self {
        let mut buf = BytesMut::new();
        for avp in members {
            avp.encode(&mut buf);
        }
        Self::new(code, mandatory, buf.to_vec())
    }

    pub fn is_mandatory(&self) -> bool {
        self.flags & avp_flags::MANDATORY != 0
    }

    pub fn as_u32(&self) -> CodecResult<u32> {
        if self.data.len() != 4 {
            return Err(CodecError::MalformedAvpValue {
                avp: "Unsigned32/Enumerated",
                reason: format!("expected 4 bytes, got {}", self.data.len()),
            });
        }
        Ok(u32::from_be_bytes([
            self.data[0],
            self.data[1],
            self.data[2],
            self.data[3],
        ]))
    }

    pub fn as_utf8(&self) -> CodecResult<String> {
        String::from_utf8(self.data.clone()).map_err(|e| CodecError::MalformedAvpValue {
            avp: "UTF8String",
            reason: e.to_string(),
        })
    }

    /// Parse `data` as a sequence of grouped sub-AVPs.
    pub fn as_grouped(&self) -> CodecResult<Vec<Avp>> {
        decode_avps(&self.data)
    }

    fn header_len(&self) -> usize {
        if self.vendor_id.is_some() {
            AVP_HEADER_LEN_VENDOR
        } else {
            AVP_HEADER_LEN_NO_VENDOR
        }
    }

    fn padded_data_len(&self) -> usize {
        let len = self.data.len();
        (len + 3) & !3
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_uint(self.code as u64, 4);
        let total_len = (self.header_len() + self.data.len()) as u32;
        buf.put_u8(self.flags);
        buf.put_uint(total_len as u64, 3);
        if let Some(vendor_id) = self.vendor_id {
            buf.put_u32(vendor_id);
        }
        buf.put_slice(&self.data);
        let padding = self.padded_data_len() - self.data.len();
        for _ in 0..padding {
            buf.put_u8(0);
        }
    }
}

/// Decode a single AVP from the front of `buf`, returning the AVP and the
/// number of bytes consumed (header + padded value).
fn decode_one(buf: &[u8]) -> CodecResult<(Avp, usize)> {
    if buf.len() < AVP_HEADER_LEN_NO_VENDOR {
        return Err(CodecError::Truncated {
            needed: AVP_HEADER_LEN_NO_VENDOR,
            have: buf.len(),
        });
    }

    let mut cursor = buf;
    let code = cursor.get_u32();
    let avp_flags = cursor.get_u8();
    let avp_len = cursor.get_uint(3) as u32;

    if (avp_len as usize) < AVP_HEADER_LEN_NO_VENDOR {
        return Err(CodecError::InvalidAvpLength(avp_len));
    }

    let has_vendor = avp_flags & avp_flags::VENDOR != 0;
    let header_len = if has_vendor {
        AVP_HEADER_LEN_VENDOR
    } else {
        AVP_HEADER_LEN_NO_VENDOR
    };

    if (avp_len as usize) < header_len {
        return Err(CodecError::InvalidAvpLength(avp_len));
    }
    if buf.len() < avp_len as usize {
        return Err(CodecError::Truncated {
            needed: avp_len as usize,
            have: buf.len(),
        });
    }

    let vendor_id = if has_vendor {
        Some(cursor.get_u32())
    } else {
        None
    };

    let data_len = avp_len as usize - header_len;
    let data = buf[header_len..header_len + data_len].to_vec();

    let padded_len = (avp_len as usize + 3) & !3;
    let consumed = padded_len.min(buf.len());

    Ok((
        Avp {
            code,
            flags: avp_flags,
            vendor_id,
            data,
        },
        consumed,
    ))
}

/// Decode a contiguous run of AVPs filling `buf` exactly.
pub fn decode_avps(mut buf: &[u8]) -> CodecResult<Vec<Avp>> {
    let mut avps = Vec::new();
    while !buf.is_empty() {
        let (avp, consumed) = decode_one(buf)?;
        avps.push(avp);
        buf = &buf[consumed..];
    }
    Ok(avps)
}

/// Find the first AVP with the given code (no vendor-id).
pub fn find<'a>(avps: &'a [Avp], code: u32) -> Option<&'a Avp> {
    avps.iter().find(|a| a.code == code && a.vendor_id.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_utf8_avp() {
        let avp = Avp::from_str(263, "session;1;2;3", true);
        let mut buf = BytesMut::new();
        avp.encode(&mut buf);

        let decoded = decode_avps(&buf).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_utf8().unwrap(), "session;1;2;3");
    }

    #[test]
    fn round_trips_u32_avp_with_padding() {
        // 3-byte value forces padding to a 4-byte boundary.
        let avp = Avp::new(1402, true, vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        avp.encode(&mut buf);
        assert_eq!(buf.len() % 4, 0);

        let decoded = decode_avps(&buf).unwrap();
        assert_eq!(decoded[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn round_trips_grouped_avp() {
        let imei = Avp::from_str(1402, "490154203237518", true);
        let sw = Avp::from_str(1403, "01", false);
        let grouped = Avp::from_grouped(1401, &[imei.clone(), sw.clone()], true);

        let mut buf = BytesMut::new();
        grouped.encode(&mut buf);
        let decoded = decode_avps(&buf).unwrap();
        assert_eq!(decoded.len(), 1);

        let members = decoded[0].as_grouped().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].as_utf8().unwrap(), "490154203237518");
    }

    #[test]
    fn multiple_avps_decode_in_sequence() {
        let a = Avp::from_u32(268, 2001, true);
        let b = Avp::from_str(264, "eir.example.com", true);
        let mut buf = BytesMut::new();
        a.encode(&mut buf);
        b.encode(&mut buf);

        let decoded = decode_avps(&buf).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].as_u32().unwrap(), 2001);
        assert_eq!(decoded[1].as_utf8().unwrap(), "eir.example.com");
    }
}
