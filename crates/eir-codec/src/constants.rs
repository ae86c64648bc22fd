//! Diameter command codes, application IDs, AVP codes and result codes
//!
//! Scoped to base-protocol housekeeping (CER/CEA, DWR/DWA, DPR/DPA) and the
//! S13 ME-Identity-Check command this crate needs to dispatch.

/// Diameter application IDs
pub mod application_ids {
    /// Base protocol (CER/CEA, DWR/DWA, DPR/DPA)
    pub const BASE: u32 = 0;
    /// 3GPP S13 (ME-Identity-Check)
    pub const S13: u32 = 16777252;
}

/// Diameter command codes
pub mod command_codes {
    pub const CER_CEA: u32 = 257;
    pub const DWR_DWA: u32 = 280;
    pub const DPR_DPA: u32 = 282;
    /// ME-Identity-Check-Request / -Answer
    pub const MICR_MICA: u32 = 324;
}

/// Diameter AVP codes used by this codec
pub mod avp_codes {
    pub const SESSION_ID: u32 = 263;
    pub const ORIGIN_HOST: u32 = 264;
    pub const ORIGIN_REALM: u32 = 296;
    pub const DESTINATION_HOST: u32 = 293;
    pub const DESTINATION_REALM: u32 = 283;
    pub const RESULT_CODE: u32 = 268;
    pub const AUTH_APPLICATION_ID: u32 = 258;
    pub const VENDOR_ID: u32 = 266;
    pub const PRODUCT_NAME: u32 = 269;
    pub const HOST_IP_ADDRESS: u32 = 257;
    pub const ORIGIN_STATE_ID: u32 = 278;
    pub const DISCONNECT_CAUSE: u32 = 273;
    /// Terminal-Information (grouped: IMEI + Software-Version)
    pub const TERMINAL_INFORMATION: u32 = 1401;
    /// IMEI (3GPP, part of Terminal-Information)
    pub const IMEI: u32 = 1402;
    pub const SOFTWARE_VERSION: u32 = 1403;
    /// Equipment-Status (3GPP)
    pub const EQUIPMENT_STATUS: u32 = 1445;
}

/// Diameter result codes this pipeline emits
pub mod result_codes {
    pub const DIAMETER_SUCCESS: u32 = 2001;
    pub const DIAMETER_UNABLE_TO_DELIVER: u32 = 3002;
    pub const DIAMETER_TOO_BUSY: u32 = 3004;
    pub const DIAMETER_INVALID_AVP_VALUE: u32 = 5004;
    pub const DIAMETER_MISSING_AVP: u32 = 5005;
    pub const DIAMETER_UNABLE_TO_COMPLY: u32 = 5012;
    pub const DIAMETER_AVP_UNSUPPORTED: u32 = 5001;
    /// State-machine violation: any command other than CER received before
    /// a DRA connection reaches `ESTABLISHED`. Kept distinct from
    /// `DIAMETER_UNABLE_TO_COMPLY` (5012, used for repository-fatal
    /// decision-engine paths) even though both are glossed as "unable to
    /// comply" — see DESIGN.md for why the two codes stay separate.
    pub const DIAMETER_OUT_OF_ORDER: u32 = 5011;
}

/// `Equipment-Status` enumerated values (3GPP TS 29.272)
pub mod equipment_status {
    pub const WHITELISTED: u32 = 0;
    pub const BLACKLISTED: u32 = 1;
    pub const GREYLISTED: u32 = 2;
}

/// Wire framing limits (spec.md section 4.A)
pub const HEADER_LEN: usize = 20;
pub const MIN_MESSAGE_LEN: u32 = 20;
pub const MAX_MESSAGE_LEN: u32 = 1_048_576;

/// Command flag bits (byte 4 of the header)
pub mod flags {
    pub const REQUEST: u8 = 0x80;
    pub const PROXYABLE: u8 = 0x40;
    pub const ERROR: u8 = 0x20;
    pub const RETRANSMITTED: u8 = 0x10;
}
