//! Byte-channel abstraction and the serial-port implementation.
//!
//! The [`Transport`] trait covers exactly what the logger protocol needs:
//! write a command, read up to `n` bytes with a timeout, close. It lets the
//! protocol code run against real hardware ([`SerialTransport`]) or the
//! scripted [`MockTransport`](crate::MockTransport) in tests.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity, SerialPort, SerialPortType, StopBits};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::TransportError;

/// Default per-read timeout, matching the logger's one-second response window.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Exclusive handle to a byte channel connected to one datalogger.
///
/// Reads may return fewer bytes than requested, or none at all, when the
/// timeout elapses first. That is not an error.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `bytes` and flush.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read up to `max_len` bytes, waiting at most `timeout`.
    async fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Close the channel. Further calls fail with [`TransportError::Closed`].
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the channel is still open.
    fn is_open(&self) -> bool;
}

/// A serial port with DTR/RTS asserted to power the logger.
///
/// Blocking port I/O runs on tokio's blocking pool so a full memory scan
/// never stalls the async executor.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    /// Open `port` at `baud` 8N1, assert DTR and RTS, then wait
    /// `power_settle` for the logger to power up.
    pub async fn open(
        port: &str,
        baud: u32,
        power_settle: Duration,
    ) -> Result<Self, TransportError> {
        let name = port.to_string();
        let opened = {
            let name = name.clone();
            tokio::task::spawn_blocking(move || open_blocking(&name, baud))
                .await
                .map_err(|e| TransportError::Io(io::Error::other(e)))??
        };

        info!("Opened {} at {} baud", name, baud);
        sleep(power_settle).await;

        Ok(Self {
            name,
            port: Some(opened),
        })
    }

    /// Port name this transport was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a blocking operation on the port without holding up the runtime.
    async fn with_port<R, F>(&mut self, op: F) -> Result<R, TransportError>
    where
        F: FnOnce(&mut dyn SerialPort) -> Result<R, TransportError> + Send + 'static,
        R: Send + 'static,
    {
        let mut port = self.port.take().ok_or(TransportError::Closed)?;
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = op(port.as_mut());
            (port, result)
        })
        .await
        .map_err(|e| TransportError::Io(io::Error::other(e)))?;
        self.port = Some(port);
        result
    }
}

fn open_blocking(name: &str, baud: u32) -> Result<Box<dyn SerialPort>, TransportError> {
    let mut port = serialport::new(name, baud)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .timeout(DEFAULT_READ_TIMEOUT)
        .open()
        .map_err(|source| TransportError::Open {
            port: name.to_string(),
            source,
        })?;

    port.write_data_terminal_ready(true)?;
    port.write_request_to_send(true)?;
    Ok(port)
}

fn read_blocking(
    port: &mut dyn SerialPort,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; max_len];
    let mut filled = 0;

    // Each read waits at most until the shared deadline.
    while filled < max_len {
        let Some(left) = remaining(deadline, Instant::now()) else {
            break;
        };
        port.set_timeout(left)?;
        match port.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}

/// Time left until `deadline`, or `None` once it has passed.
fn remaining(deadline: Instant, now: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(now);
    (!left.is_zero()).then_some(left)
}

#[async_trait]
impl Transport for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let data = bytes.to_vec();
        self.with_port(move |port| {
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await
    }

    async fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let data = self
            .with_port(move |port| read_blocking(port, max_len, timeout))
            .await?;
        debug!("{}: read {}/{} bytes", self.name, data.len(), max_len);
        Ok(data)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            info!("Closed {}", self.name);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

/// A serial port visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Device path or COM name.
    pub name: String,
    /// Human-readable description, when the OS provides one.
    pub description: String,
}

/// List serial ports available on this machine.
pub fn available_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(usb) => usb
                    .product
                    .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::Unknown => "Unknown".to_string(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}
