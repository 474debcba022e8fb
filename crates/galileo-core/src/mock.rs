//! Scripted transport for testing.
//!
//! [`MockTransport`] answers the logger's commands with canned responses
//! so the full download path can run without a serial port.
//!
//! # Features
//!
//! - **Header script**: a valid header for any base time, or raw bytes
//! - **Block script**: per-index sample lists; missing blocks read empty
//! - **Failure injection**: drop the connection at a chosen block
//! - **Command log**: every write is recorded for assertions
//!
//! ```
//! use galileo_core::{Datalogger, DownloadOptions, MockTransportBuilder, Timing};
//! use time::macros::datetime;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = MockTransportBuilder::new()
//!     .header(datetime!(2024-01-01 0:00), 15)
//!     .block(0, &[(50, 600), (51, 610)])
//!     .build();
//!
//! let mut logger = Datalogger::with_transport(transport, Timing::immediate());
//! let download = logger.download(&DownloadOptions::default()).await.unwrap();
//! assert_eq!(download.samples.len(), 2);
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use time::PrimitiveDateTime;
use time::macros::datetime;

use crate::commands::{BLOCK_REQUEST_PREFIX, BLOCK_RESPONSE_LEN, HEADER_MAGIC, HEADER_REQUEST, WAKE};
use crate::error::TransportError;
use crate::header::HEADER_LEN;
use crate::transport::Transport;

const SAMPLES_PER_BLOCK: usize = BLOCK_RESPONSE_LEN / 4;

/// Encode a value 0..=99 as one packed-decimal byte.
pub const fn int_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Build a 28-byte header window for `base` and `interval_minutes`.
pub fn encode_header(base: PrimitiveDateTime, interval_minutes: u8) -> [u8; HEADER_LEN] {
    let mut h = [0u8; HEADER_LEN];
    h[..HEADER_MAGIC.len()].copy_from_slice(&HEADER_MAGIC);
    let year = u8::try_from((base.year() - 2000).clamp(0, 99)).unwrap_or(0);
    h[14] = int_to_bcd(year);
    h[15] = int_to_bcd(u8::from(base.month()));
    h[16] = int_to_bcd(base.day());
    h[17] = int_to_bcd(base.hour());
    h[18] = int_to_bcd(base.minute());
    h[19] = int_to_bcd(base.second());
    h[20] = interval_minutes;
    h
}

/// Build a 128-byte memory block holding `samples` as raw words.
///
/// Fewer than 32 samples are followed by `FF` fill, which reads as a
/// terminator.
pub fn encode_block(samples: &[(u16, u16)]) -> Vec<u8> {
    let mut block = Vec::with_capacity(BLOCK_RESPONSE_LEN);
    for (t, h) in samples.iter().take(SAMPLES_PER_BLOCK) {
        block.extend_from_slice(&t.to_be_bytes());
        block.extend_from_slice(&h.to_be_bytes());
    }
    block.resize(BLOCK_RESPONSE_LEN, 0xFF);
    block
}

/// A scripted datalogger on the other end of a byte channel.
#[derive(Debug, Clone)]
pub struct MockTransport {
    ack: Vec<u8>,
    header: Vec<u8>,
    blocks: BTreeMap<u8, Vec<u8>>,
    disconnect_at: Option<u8>,
    pending: Option<Vec<u8>>,
    written: Vec<Vec<u8>>,
    open: bool,
}

impl MockTransport {
    /// Every command written so far, in order.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Indices of every block requested so far, in order.
    pub fn block_requests(&self) -> Vec<u8> {
        self.written
            .iter()
            .filter(|w| w.len() == 5 && w[..2] == BLOCK_REQUEST_PREFIX)
            .map(|w| w[2])
            .collect()
    }

    fn respond_to(&mut self, command: &[u8]) -> Result<(), TransportError> {
        let response = if command == WAKE {
            self.ack.clone()
        } else if command == HEADER_REQUEST {
            self.header.clone()
        } else if command.len() == 5 && command[..2] == BLOCK_REQUEST_PREFIX {
            let index = command[2];
            if self.disconnect_at == Some(index) {
                self.open = false;
                return Err(TransportError::Closed);
            }
            self.blocks.get(&index).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        self.pending = Some(response);
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.written.push(bytes.to_vec());
        self.respond_to(bytes)
    }

    async fn read(&mut self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        let mut data = self.pending.take().unwrap_or_default();
        data.truncate(max_len);
        Ok(data)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Builder for [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportBuilder {
    ack: Vec<u8>,
    noise: Vec<u8>,
    header: Option<Vec<u8>>,
    base: PrimitiveDateTime,
    interval_minutes: u8,
    blocks: BTreeMap<u8, Vec<u8>>,
    disconnect_at: Option<u8>,
}

impl Default for MockTransportBuilder {
    fn default() -> Self {
        Self {
            ack: vec![0x5C; 16],
            noise: Vec::new(),
            header: None,
            base: datetime!(2024-01-01 0:00),
            interval_minutes: 15,
            blocks: BTreeMap::new(),
            disconnect_at: None,
        }
    }
}

impl MockTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the header request with a valid header.
    #[must_use]
    pub fn header(mut self, base: PrimitiveDateTime, interval_minutes: u8) -> Self {
        self.base = base;
        self.interval_minutes = interval_minutes;
        self.header = None;
        self
    }

    /// Answer the header request with exactly these bytes.
    #[must_use]
    pub fn raw_header(mut self, bytes: Vec<u8>) -> Self {
        self.header = Some(bytes);
        self
    }

    /// Prepend line noise to the header response.
    #[must_use]
    pub fn noise(mut self, bytes: &[u8]) -> Self {
        self.noise = bytes.to_vec();
        self
    }

    /// Answer the wake command with these bytes.
    #[must_use]
    pub fn ack(mut self, bytes: Vec<u8>) -> Self {
        self.ack = bytes;
        self
    }

    /// Store `samples` (raw temperature and humidity words) in block `index`.
    #[must_use]
    pub fn block(mut self, index: u8, samples: &[(u16, u16)]) -> Self {
        self.blocks.insert(index, encode_block(samples));
        self
    }

    /// Store raw bytes in block `index`.
    #[must_use]
    pub fn raw_block(mut self, index: u8, bytes: Vec<u8>) -> Self {
        self.blocks.insert(index, bytes);
        self
    }

    /// Fill blocks `0..count` with full blocks of `sample`.
    #[must_use]
    pub fn full_blocks(mut self, count: u8, sample: (u16, u16)) -> Self {
        for i in 0..count {
            self.blocks.insert(i, encode_block(&[sample; SAMPLES_PER_BLOCK]));
        }
        self
    }

    /// Drop the connection when block `index` is requested.
    #[must_use]
    pub fn disconnect_at_block(mut self, index: u8) -> Self {
        self.disconnect_at = Some(index);
        self
    }

    pub fn build(self) -> MockTransport {
        let header = match self.header {
            Some(raw) => raw,
            None => {
                let mut h = self.noise;
                h.extend_from_slice(&encode_header(self.base, self.interval_minutes));
                h.resize(h.len().max(64), 0x00);
                h
            }
        };

        MockTransport {
            ack: self.ack,
            header,
            blocks: self.blocks,
            disconnect_at: self.disconnect_at,
            pending: None,
            written: Vec::new(),
            open: true,
        }
    }
}
