//! Tuya local LAN protocol, version 3.3, plus what both supported versions
//! share. Version 3.5 framing lives in `session`.
//!
//! Frame layout (all integers big-endian):
//!
//! ```text
//! 0x000055AA | seq | cmd | len | [return code] payload | crc32 | 0x0000AA55
//! ```
//!
//! `len` counts everything after the 16-byte header. Frames sent by the
//! device carry a 4-byte return code in front of the payload.

use std::str::FromStr;

use aes::{
    Aes128,
    cipher::{BlockEncryptMut, KeyInit, block_padding::Pkcs7},
};
use serde_json::{Value, json};
use strum_macros::Display;

use crate::error::{ConfigError, IndicatorError};

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum ProtocolVersion {
    #[strum(serialize = "3.3")]
    V33,
    #[default]
    #[strum(serialize = "3.5")]
    V35,
}

impl FromStr for ProtocolVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3.3" => Ok(Self::V33),
            "3.5" => Ok(Self::V35),
            other => Err(ConfigError::UnsupportedProtocol(other.to_string())),
        }
    }
}

pub const PREFIX: u32 = 0x0000_55AA;
pub const SUFFIX: u32 = 0x0000_AA55;
pub const HEADER_LEN: usize = 16;
pub const TRAILER_LEN: usize = 8;
pub const MAX_FRAME_BODY: usize = 4096;

pub const CMD_CONTROL: u32 = 7;

/// "3.3" followed by 12 zero bytes, prepended to encrypted control payloads.
pub const VERSION_HEADER: [u8; 15] = *b"3.3\0\0\0\0\0\0\0\0\0\0\0\0";

pub const DPS_SWITCH: &str = "20";
pub const DPS_MODE: &str = "21";
pub const DPS_BRIGHTNESS: &str = "22";
pub const DPS_COLOUR_TEMP: &str = "23";
pub const DPS_COLOUR: &str = "24";

type Aes128EcbEnc = ecb::Encryptor<Aes128>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub seq: u32,
    pub cmd: u32,
    pub return_code: Option<u32>,
    pub payload: Vec<u8>,
}

pub fn encrypt(local_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, IndicatorError> {
    let cipher = Aes128EcbEnc::new_from_slice(local_key)
        .map_err(|e| IndicatorError::Encrypt(e.to_string()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

pub fn control_payload(device_id: &str, timestamp: i64, dps: Value) -> String {
    json!({
        "devId": device_id,
        "uid": device_id,
        "t": timestamp.to_string(),
        "dps": dps,
    })
    .to_string()
}

/// Builds an encrypted control frame ready to be written to the socket.
pub fn encode_control(
    seq: u32,
    local_key: &[u8],
    payload: &str,
) -> Result<Vec<u8>, IndicatorError> {
    let mut body = VERSION_HEADER.to_vec();
    body.extend(encrypt(local_key, payload.as_bytes())?);
    Ok(encode_frame(seq, CMD_CONTROL, &body))
}

pub fn encode_frame(seq: u32, cmd: u32, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + TRAILER_LEN) as u32;
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    frame.extend(PREFIX.to_be_bytes());
    frame.extend(seq.to_be_bytes());
    frame.extend(cmd.to_be_bytes());
    frame.extend(len.to_be_bytes());
    frame.extend(payload);
    let crc = crc32fast::hash(&frame);
    frame.extend(crc.to_be_bytes());
    frame.extend(SUFFIX.to_be_bytes());
    frame
}

/// Length of the body that follows a header, validated against the prefix.
pub fn body_len(header: &[u8; HEADER_LEN]) -> Result<usize, IndicatorError> {
    if read_u32(header, 0) != PREFIX {
        return Err(IndicatorError::Protocol("bad frame prefix".to_string()));
    }
    let len = read_u32(header, 12) as usize;
    if !(TRAILER_LEN..=MAX_FRAME_BODY).contains(&len) {
        return Err(IndicatorError::Protocol(format!("bad frame length {}", len)));
    }
    Ok(len)
}

/// Decodes a frame received from the device.
pub fn decode_reply(bytes: &[u8]) -> Result<Frame, IndicatorError> {
    let header: &[u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| IndicatorError::Protocol("frame too short".to_string()))?;
    let len = body_len(header)?;
    if bytes.len() != HEADER_LEN + len {
        return Err(IndicatorError::Protocol(format!(
            "frame length mismatch: header says {}, got {}",
            len,
            bytes.len() - HEADER_LEN
        )));
    }

    let crc_at = bytes.len() - TRAILER_LEN;
    if read_u32(bytes, crc_at + 4) != SUFFIX {
        return Err(IndicatorError::Protocol("bad frame suffix".to_string()));
    }
    if read_u32(bytes, crc_at) != crc32fast::hash(&bytes[..crc_at]) {
        return Err(IndicatorError::Protocol("frame CRC mismatch".to_string()));
    }

    let body = &bytes[HEADER_LEN..crc_at];
    let (return_code, payload) = if body.len() >= 4 {
        (Some(read_u32(body, 0)), body[4..].to_vec())
    } else {
        (None, body.to_vec())
    };

    Ok(Frame {
        seq: read_u32(bytes, 4),
        cmd: read_u32(bytes, 8),
        return_code,
        payload,
    })
}

/// RGB to the bulb's `HHHHSSSSVVVV` colour string (hue in degrees,
/// saturation and value scaled to 0..=1000).
pub fn colour_hex(r: u8, g: u8, b: u8) -> String {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    format!(
        "{:04x}{:04x}{:04x}",
        hue.round() as u16,
        (saturation * 1000.0).round() as u16,
        (max * 1000.0).round() as u16
    )
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
