use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

use super::{
    Indicator,
    protocol::{
        self, DPS_BRIGHTNESS, DPS_COLOUR, DPS_COLOUR_TEMP, DPS_MODE, DPS_SWITCH, Frame,
        ProtocolVersion, colour_hex,
    },
    session::{
        self, CMD_CONTROL_NEW, CMD_SESS_KEY_NEG_FINISH, CMD_SESS_KEY_NEG_RESP,
        CMD_SESS_KEY_NEG_START, IV_LEN, NONCE_LEN,
    },
};
use crate::{config::DeviceCredentials, error::IndicatorError};

pub const DEFAULT_PORT: u16 = 6668;

const WHITE_BRIGHTNESS: u32 = 1000;
const WHITE_TEMPERATURE: u32 = 500;

/// Tuya bulb reachable on the local network. Every command opens its own
/// connection; with protocol 3.5 that includes a fresh session key.
pub struct TuyaBulb {
    credentials: DeviceCredentials,
    version: ProtocolVersion,
    port: u16,
    timeout: Duration,
    seq: AtomicU32,
}

impl TuyaBulb {
    pub fn new(
        credentials: DeviceCredentials,
        version: ProtocolVersion,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            version,
            port: DEFAULT_PORT,
            timeout,
            seq: AtomicU32::new(1),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    async fn send_dps(&self, dps: Value) -> Result<(), IndicatorError> {
        let reply = timeout(self.timeout, async {
            let mut stream = self.connect().await?;
            match self.version {
                ProtocolVersion::V33 => self.control_v33(&mut stream, dps).await,
                ProtocolVersion::V35 => self.control_v35(&mut stream, dps).await,
            }
        })
        .await
        .map_err(|_| IndicatorError::Timeout(self.timeout))??;

        match reply.return_code {
            Some(0) | None => {
                debug!(seq = reply.seq, cmd = reply.cmd, "Device acknowledged command");
                Ok(())
            }
            Some(code) => Err(IndicatorError::Protocol(format!(
                "device returned code {}: {}",
                code,
                String::from_utf8_lossy(&reply.payload)
            ))),
        }
    }

    async fn connect(&self) -> Result<TcpStream, IndicatorError> {
        let addr = format!("{}:{}", self.credentials.device_ip(), self.port);
        TcpStream::connect(&addr)
            .await
            .map_err(|source| IndicatorError::Connect { addr, source })
    }

    async fn control_v33(
        &self,
        stream: &mut TcpStream,
        dps: Value,
    ) -> Result<Frame, IndicatorError> {
        let payload = protocol::control_payload(
            self.credentials.device_id(),
            Utc::now().timestamp(),
            dps,
        );
        let frame = protocol::encode_control(
            self.next_seq(),
            self.credentials.local_key().as_bytes(),
            &payload,
        )?;
        write_frame(stream, &frame).await?;

        let mut header = [0u8; protocol::HEADER_LEN];
        stream.read_exact(&mut header).await?;
        let len = protocol::body_len(&header)?;

        let mut reply = header.to_vec();
        reply.resize(protocol::HEADER_LEN + len, 0);
        stream.read_exact(&mut reply[protocol::HEADER_LEN..]).await?;

        protocol::decode_reply(&reply)
    }

    async fn control_v35(
        &self,
        stream: &mut TcpStream,
        dps: Value,
    ) -> Result<Frame, IndicatorError> {
        let key = self.negotiate_session(stream).await?;

        let payload = session::control_payload(Utc::now().timestamp(), dps);
        let seq = self.next_seq();
        let frame = session::encode_frame(seq, CMD_CONTROL_NEW, &key, &random_iv(), &payload)?;
        write_frame(stream, &frame).await?;

        loop {
            let reply = read_session_frame(stream, &key).await?;
            if reply.cmd == CMD_CONTROL_NEW {
                return Ok(session::split_return_code(reply));
            }
            debug!(cmd = reply.cmd, "Skipping unsolicited device frame");
        }
    }

    async fn negotiate_session(
        &self,
        stream: &mut TcpStream,
    ) -> Result<[u8; NONCE_LEN], IndicatorError> {
        let local_key = self.credentials.local_key().as_bytes();
        let local_nonce: [u8; NONCE_LEN] = rand::random();

        let start = session::encode_frame(
            self.next_seq(),
            CMD_SESS_KEY_NEG_START,
            local_key,
            &random_iv(),
            &local_nonce,
        )?;
        write_frame(stream, &start).await?;

        let reply = read_session_frame(stream, local_key).await?;
        if reply.cmd != CMD_SESS_KEY_NEG_RESP {
            return Err(IndicatorError::Protocol(format!(
                "expected session key response, got command {}",
                reply.cmd
            )));
        }
        let remote_nonce =
            session::read_negotiation_response(local_key, &local_nonce, &reply.payload)?;

        let finish = session::encode_frame(
            self.next_seq(),
            CMD_SESS_KEY_NEG_FINISH,
            local_key,
            &random_iv(),
            &session::hmac_sha256(local_key, &remote_nonce)?,
        )?;
        write_frame(stream, &finish).await?;

        debug!("Negotiated session key");
        session::session_key(local_key, &local_nonce, &remote_nonce)
    }
}

fn random_iv() -> [u8; IV_LEN] {
    rand::random()
}

async fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> Result<(), IndicatorError> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_session_frame(stream: &mut TcpStream, key: &[u8]) -> Result<Frame, IndicatorError> {
    let mut header = [0u8; session::HEADER_LEN];
    stream.read_exact(&mut header).await?;
    let remaining = session::remaining_len(&header)?;

    let mut frame = header.to_vec();
    frame.resize(session::HEADER_LEN + remaining, 0);
    stream.read_exact(&mut frame[session::HEADER_LEN..]).await?;

    session::decode_frame(&frame, key)
}

#[async_trait]
impl Indicator for TuyaBulb {
    async fn power_on(&self) -> Result<(), IndicatorError> {
        self.send_dps(json!({ DPS_SWITCH: true })).await
    }

    async fn power_off(&self) -> Result<(), IndicatorError> {
        self.send_dps(json!({ DPS_SWITCH: false })).await
    }

    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), IndicatorError> {
        self.send_dps(json!({
            DPS_MODE: "colour",
            DPS_COLOUR: colour_hex(r, g, b),
        }))
        .await
    }

    async fn set_neutral(&self) -> Result<(), IndicatorError> {
        self.send_dps(json!({
            DPS_MODE: "white",
            DPS_BRIGHTNESS: WHITE_BRIGHTNESS,
            DPS_COLOUR_TEMP: WHITE_TEMPERATURE,
        }))
        .await
    }
}
