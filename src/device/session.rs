//! Tuya local LAN protocol, version 3.5.
//!
//! Every frame is AES-128-GCM sealed (integers big-endian):
//!
//! ```text
//! 0x00006699 | 0x0000 | seq | cmd | len | iv(12) ciphertext tag(16) | 0x00009966
//! ```
//!
//! `len` counts iv, ciphertext and tag. The 14 header bytes after the prefix
//! are authenticated as associated data. Each connection first negotiates a
//! session key with the device's local key; control frames then use that key.

use aes_gcm::{
    Aes128Gcm, KeyInit, Nonce,
    aead::{Aead, Payload},
};
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;

use super::protocol::Frame;
use crate::error::IndicatorError;

pub const PREFIX: u32 = 0x0000_6699;
pub const SUFFIX: u32 = 0x0000_9966;
pub const HEADER_LEN: usize = 18;
pub const SUFFIX_LEN: usize = 4;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const NONCE_LEN: usize = 16;
pub const MAC_LEN: usize = 32;
pub const MAX_FRAME_BODY: usize = 4096;

pub const CMD_SESS_KEY_NEG_START: u32 = 3;
pub const CMD_SESS_KEY_NEG_RESP: u32 = 4;
pub const CMD_SESS_KEY_NEG_FINISH: u32 = 5;
pub const CMD_CONTROL_NEW: u32 = 13;

/// "3.5" followed by 12 zero bytes, prepended to control payloads.
pub const VERSION_HEADER: [u8; 15] = *b"3.5\0\0\0\0\0\0\0\0\0\0\0\0";

type HmacSha256 = Hmac<Sha256>;

fn cipher(key: &[u8]) -> Result<Aes128Gcm, IndicatorError> {
    Aes128Gcm::new_from_slice(key).map_err(|e| IndicatorError::Encrypt(e.to_string()))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; MAC_LEN], IndicatorError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| IndicatorError::Encrypt(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

pub fn control_payload(timestamp: i64, dps: Value) -> Vec<u8> {
    let body = json!({
        "protocol": 5,
        "t": timestamp,
        "data": { "dps": dps },
    });
    let mut payload = VERSION_HEADER.to_vec();
    payload.extend(body.to_string().into_bytes());
    payload
}

pub fn encode_frame(
    seq: u32,
    cmd: u32,
    key: &[u8],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, IndicatorError> {
    let len = (IV_LEN + plaintext.len() + TAG_LEN) as u32;
    let mut frame = Vec::with_capacity(HEADER_LEN + len as usize + SUFFIX_LEN);
    frame.extend(PREFIX.to_be_bytes());
    frame.extend(0u16.to_be_bytes());
    frame.extend(seq.to_be_bytes());
    frame.extend(cmd.to_be_bytes());
    frame.extend(len.to_be_bytes());

    let sealed = cipher(key)?
        .encrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: plaintext,
                aad: &frame[4..HEADER_LEN],
            },
        )
        .map_err(|_| IndicatorError::Encrypt("AES-GCM sealing failed".to_string()))?;

    frame.extend(iv);
    frame.extend(sealed);
    frame.extend(SUFFIX.to_be_bytes());
    Ok(frame)
}

/// Bytes still to read after a header: the sealed body plus the suffix.
pub fn remaining_len(header: &[u8; HEADER_LEN]) -> Result<usize, IndicatorError> {
    if read_u32(header, 0) != PREFIX {
        return Err(IndicatorError::Protocol("bad frame prefix".to_string()));
    }
    let len = read_u32(header, 14) as usize;
    if !(IV_LEN + TAG_LEN..=MAX_FRAME_BODY).contains(&len) {
        return Err(IndicatorError::Protocol(format!("bad frame length {}", len)));
    }
    Ok(len + SUFFIX_LEN)
}

/// Opens a frame with `key`. The payload is returned as decrypted; see
/// [`split_return_code`] for frames sent by the device.
pub fn decode_frame(bytes: &[u8], key: &[u8]) -> Result<Frame, IndicatorError> {
    let header: &[u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| IndicatorError::Protocol("frame too short".to_string()))?;
    let expected = HEADER_LEN + remaining_len(header)?;
    if bytes.len() != expected {
        return Err(IndicatorError::Protocol(format!(
            "frame length mismatch: expected {}, got {}",
            expected,
            bytes.len()
        )));
    }

    let suffix_at = bytes.len() - SUFFIX_LEN;
    if read_u32(bytes, suffix_at) != SUFFIX {
        return Err(IndicatorError::Protocol("bad frame suffix".to_string()));
    }

    let iv = &bytes[HEADER_LEN..HEADER_LEN + IV_LEN];
    let payload = cipher(key)?
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: &bytes[HEADER_LEN + IV_LEN..suffix_at],
                aad: &bytes[4..HEADER_LEN],
            },
        )
        .map_err(|_| IndicatorError::Protocol("frame failed authentication".to_string()))?;

    Ok(Frame {
        seq: read_u32(bytes, 6),
        cmd: read_u32(bytes, 10),
        return_code: None,
        payload,
    })
}

/// Device replies lead with a 4-byte return code unless the payload is
/// already JSON or starts with the version header.
pub fn split_return_code(mut frame: Frame) -> Frame {
    let payload = &frame.payload;
    if payload.len() >= 4 && !payload.starts_with(b"{") && !payload.starts_with(b"3.") {
        frame.return_code = Some(read_u32(payload, 0));
        frame.payload.drain(..4);
    }
    frame
}

/// Checks the device's answer to our nonce and returns its nonce. The answer
/// is `remote nonce | HMAC(local key, local nonce)`, optionally behind a
/// return code.
pub fn read_negotiation_response(
    local_key: &[u8],
    local_nonce: &[u8; NONCE_LEN],
    payload: &[u8],
) -> Result<[u8; NONCE_LEN], IndicatorError> {
    let body = if payload.len() >= 4 + NONCE_LEN + MAC_LEN {
        &payload[4..]
    } else {
        payload
    };
    if body.len() < NONCE_LEN + MAC_LEN {
        return Err(IndicatorError::Protocol(format!(
            "session key response too short ({} bytes)",
            payload.len()
        )));
    }

    let expected = hmac_sha256(local_key, local_nonce)?;
    if body[NONCE_LEN..NONCE_LEN + MAC_LEN] != expected {
        return Err(IndicatorError::Protocol(
            "session key response failed HMAC check".to_string(),
        ));
    }

    let mut remote_nonce = [0u8; NONCE_LEN];
    remote_nonce.copy_from_slice(&body[..NONCE_LEN]);
    Ok(remote_nonce)
}

/// Session key: both nonces XORed, then sealed with the local key using the
/// first 12 bytes of our nonce as IV. The tag is discarded.
pub fn session_key(
    local_key: &[u8],
    local_nonce: &[u8; NONCE_LEN],
    remote_nonce: &[u8; NONCE_LEN],
) -> Result<[u8; NONCE_LEN], IndicatorError> {
    let mixed: Vec<u8> = local_nonce
        .iter()
        .zip(remote_nonce)
        .map(|(a, b)| a ^ b)
        .collect();
    let sealed = cipher(local_key)?
        .encrypt(Nonce::from_slice(&local_nonce[..IV_LEN]), mixed.as_slice())
        .map_err(|_| IndicatorError::Encrypt("session key derivation failed".to_string()))?;

    let mut key = [0u8; NONCE_LEN];
    key.copy_from_slice(&sealed[..NONCE_LEN]);
    Ok(key)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
