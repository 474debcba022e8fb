//! Datalogger session: handshake, header, block scan.
//!
//! [`Datalogger`] drives the whole download over any [`Transport`]. The
//! wake and header steps are fatal when they fail; the block scan is
//! best-effort and always produces a (possibly partial) [`Download`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use galileo_types::{SampleRecord, Session, SessionMetadata};

use crate::blocks::{BlockRead, BlockReader, StopReason};
use crate::commands::{HEADER_REQUEST, HEADER_RESPONSE_LEN, MAX_BLOCKS, WAKE, WAKE_RESPONSE_LEN};
use crate::error::{Error, Result};
use crate::header::decode_header;
use crate::timeline::Timeline;
use crate::transport::{SerialTransport, Transport};

/// Settle delays and read timeout used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after asserting DTR/RTS before the first command.
    pub power_settle: Duration,
    /// Wait between the wake command and reading its acknowledgement.
    pub wake_settle: Duration,
    /// Wait between the header request and reading the header.
    pub header_settle: Duration,
    /// Wait between a block request and reading the block.
    pub block_settle: Duration,
    /// Upper bound on any single read.
    pub read_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            power_settle: Duration::from_millis(200),
            wake_settle: Duration::from_millis(100),
            header_settle: Duration::from_millis(300),
            block_settle: Duration::from_millis(300),
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl Timing {
    /// Timing with no settle delays, for loopback and mock transports.
    pub fn immediate() -> Self {
        Self {
            power_settle: Duration::ZERO,
            wake_settle: Duration::ZERO,
            header_settle: Duration::ZERO,
            block_settle: Duration::ZERO,
            read_timeout: Duration::from_millis(10),
        }
    }
}

/// Progress of a running block scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Blocks decoded so far.
    pub blocks_read: u16,
    /// Upper bound on the number of blocks in this scan.
    pub max_blocks: u16,
    /// Samples decoded so far.
    pub samples: usize,
}

impl DownloadProgress {
    /// Fraction of the addressable memory scanned, 0.0 to 1.0.
    pub fn fraction(&self) -> f32 {
        if self.max_blocks == 0 {
            return 1.0;
        }
        (f32::from(self.blocks_read) / f32::from(self.max_blocks)).min(1.0)
    }
}

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Options for [`Datalogger::download`].
#[derive(Clone)]
pub struct DownloadOptions {
    /// Maximum number of blocks to scan (clamped to 255).
    pub max_blocks: u16,
    /// Called after every decoded block.
    pub progress_callback: Option<ProgressCallback>,
    /// Cancels the block scan; samples read so far are kept.
    pub cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("max_blocks", &self.max_blocks)
            .field("progress_callback", &self.progress_callback.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_blocks: MAX_BLOCKS,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl DownloadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the scan to the first `max` blocks.
    #[must_use]
    pub fn max_blocks(mut self, max: u16) -> Self {
        self.max_blocks = max.min(MAX_BLOCKS);
        self
    }

    /// Set a progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(DownloadProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Stop the scan when `token` is cancelled.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn report_progress(&self, progress: DownloadProgress) {
        if let Some(cb) = &self.progress_callback {
            cb(progress);
        }
    }
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Download {
    /// Decoded session header.
    pub metadata: SessionMetadata,
    /// Samples in device order.
    pub samples: Vec<SampleRecord>,
    /// Number of blocks that contributed samples.
    pub blocks_read: u16,
    /// Why the block scan ended.
    pub stop_reason: StopReason,
}

impl Download {
    /// Whether the scan ended before the device ran out of data.
    pub fn is_partial(&self) -> bool {
        !self.stop_reason.is_end_of_data()
    }

    /// Attach labels and turn the download into a [`Session`].
    pub fn into_session(self, equipment: impl Into<String>, tag: Option<&str>) -> Session {
        let session = Session::new(equipment, self.samples);
        match tag {
            Some(tag) => session.with_tag(tag),
            None => session,
        }
    }
}

/// A connected Galileo datalogger.
pub struct Datalogger<T: Transport = SerialTransport> {
    transport: T,
    timing: Timing,
}

impl<T: Transport> std::fmt::Debug for Datalogger<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datalogger")
            .field("open", &self.transport.is_open())
            .field("timing", &self.timing)
            .finish()
    }
}

impl Datalogger<SerialTransport> {
    /// Open a serial port and power the logger.
    ///
    /// Fails with [`Error::InvalidConfig`] for a blank port name or a zero
    /// baud rate, and with a transport error when the port cannot be opened.
    pub async fn open(port: &str, baud: u32, timing: Timing) -> Result<Self> {
        let port = port.trim();
        if port.is_empty() {
            return Err(Error::invalid_config("serial port name is empty"));
        }
        if baud == 0 {
            return Err(Error::invalid_config("baud rate must be positive"));
        }

        let transport = SerialTransport::open(port, baud, timing.power_settle).await?;
        Ok(Self::with_transport(transport, timing))
    }
}

impl<T: Transport> Datalogger<T> {
    /// Wrap an already-open transport.
    pub fn with_transport(transport: T, timing: Timing) -> Self {
        Self { transport, timing }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send the wake command and discard the acknowledgement.
    pub async fn wake(&mut self) -> Result<()> {
        self.transport.write(&WAKE).await?;
        sleep(self.timing.wake_settle).await;
        let ack = self
            .transport
            .read(WAKE_RESPONSE_LEN, self.timing.read_timeout)
            .await?;
        debug!("Wake acknowledged with {} bytes", ack.len());
        Ok(())
    }

    /// Request and decode the session header.
    pub async fn read_header(&mut self) -> Result<SessionMetadata> {
        self.transport.write(&HEADER_REQUEST).await?;
        sleep(self.timing.header_settle).await;
        let response = self
            .transport
            .read(HEADER_RESPONSE_LEN, self.timing.read_timeout)
            .await?;

        let metadata = decode_header(&response)?;
        info!("Session header: {}", metadata);
        Ok(metadata)
    }

    /// Block reader positioned at block 0.
    pub fn blocks(&mut self) -> BlockReader<'_, T> {
        BlockReader::new(&mut self.transport, self.timing)
    }

    /// Run the full download: wake, header, then every block until the
    /// device runs out of data, the transport fails, or `options.cancel`
    /// fires.
    pub async fn download(&mut self, options: &DownloadOptions) -> Result<Download> {
        self.wake().await?;
        let metadata = self.read_header().await?;

        let mut timeline = Timeline::new(metadata);
        let mut samples = Vec::new();
        let mut reader = BlockReader::new(&mut self.transport, self.timing)
            .max_blocks(options.max_blocks);

        let stop_reason = loop {
            let position = reader.position();
            let next = match &options.cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => BlockRead::Stopped(StopReason::Cancelled { block: position }),
                    read = reader.next_block() => read,
                },
                None => reader.next_block().await,
            };

            match next {
                BlockRead::Block(block) => {
                    let before = samples.len();
                    samples.extend(
                        block
                            .samples()
                            .zip(timeline.by_ref())
                            .map(|(raw, ts)| SampleRecord::from_raw(ts, raw)),
                    );
                    debug!(
                        "Block {} added {} samples",
                        block.index,
                        samples.len() - before
                    );
                    options.report_progress(DownloadProgress {
                        blocks_read: reader.position(),
                        max_blocks: options.max_blocks,
                        samples: samples.len(),
                    });
                }
                BlockRead::Stopped(reason) => break reason,
            }
        };
        let blocks_read = reader.position();

        if stop_reason.is_end_of_data() {
            info!(
                "Downloaded {} samples from {} blocks ({})",
                samples.len(),
                blocks_read,
                stop_reason
            );
        } else {
            warn!(
                "Download ended early after {} blocks: {}",
                blocks_read, stop_reason
            );
        }

        Ok(Download {
            metadata,
            samples,
            blocks_read,
            stop_reason,
        })
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await?;
        Ok(())
    }
}

/// Open `port`, download the session and close the port again, whether
/// or not the download succeeded.
pub async fn download_from_port(
    port: &str,
    baud: u32,
    timing: Timing,
    options: &DownloadOptions,
) -> Result<Download> {
    let mut logger = Datalogger::open(port, baud, timing).await?;
    let result = logger.download(options).await;
    if let Err(e) = logger.close().await {
        warn!("Failed to close {}: {}", port, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::block_request;
    use crate::error::{ProtocolError, TransportError};
    use crate::mock::MockTransportBuilder;
    use time::macros::datetime;

    fn logger(builder: MockTransportBuilder) -> Datalogger<crate::mock::MockTransport> {
        Datalogger::with_transport(builder.build(), Timing::default())
    }

    #[test]
    fn test_timing_defaults() {
        let t = Timing::default();
        assert_eq!(t.power_settle, Duration::from_millis(200));
        assert_eq!(t.wake_settle, Duration::from_millis(100));
        assert_eq!(t.header_settle, Duration::from_millis(300));
        assert_eq!(t.block_settle, Duration::from_millis(300));
        assert_eq!(t.read_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_download_options_builder() {
        let opts = DownloadOptions::new().max_blocks(10).with_progress(|_| {});
        assert_eq!(opts.max_blocks, 10);
        assert!(opts.progress_callback.is_some());
        assert_eq!(DownloadOptions::new().max_blocks(999).max_blocks, MAX_BLOCKS);

        let debug = format!("{:?}", opts);
        assert!(debug.contains("progress_callback: true"));
    }

    #[test]
    fn test_progress_fraction() {
        let p = DownloadProgress {
            blocks_read: 51,
            max_blocks: 255,
            samples: 0,
        };
        assert!((p.fraction() - 0.2).abs() < 1e-6);
        let empty = DownloadProgress {
            blocks_read: 0,
            max_blocks: 0,
            samples: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_sequence() {
        let mut dl = logger(
            MockTransportBuilder::new()
                .header(datetime!(2024-03-15 14:30:00), 15)
                .block(0, &[(50, 600)]),
        );
        dl.download(&DownloadOptions::default()).await.unwrap();

        let written = dl.transport().written();
        assert_eq!(written[0], WAKE.to_vec());
        assert_eq!(written[1], HEADER_REQUEST.to_vec());
        assert_eq!(written[2], block_request(0).to_vec());
        assert_eq!(written[3], block_request(1).to_vec());
        assert_eq!(written.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_continue_across_blocks() {
        let mut dl = logger(
            MockTransportBuilder::new()
                .header(datetime!(2024-01-01 0:00), 15)
                .block(0, &[(50, 600); 32])
                .block(1, &[(60, 700); 2]),
        );
        let download = dl.download(&DownloadOptions::default()).await.unwrap();

        assert_eq!(download.samples.len(), 34);
        assert_eq!(download.blocks_read, 2);
        assert_eq!(download.samples[4].timestamp, datetime!(2024-01-01 1:00));
        assert_eq!(download.samples[32].timestamp, datetime!(2024-01-01 8:00));
        assert_eq!(download.samples[33].temperature, 6.0);
        assert_eq!(download.samples[33].humidity, 70.0);
        assert_eq!(download.stop_reason, StopReason::EmptyRead { block: 2 });
        assert!(!download.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_block_stepping() {
        let mut dl = logger(
            MockTransportBuilder::new()
                .header(datetime!(2024-03-15 14:30:00), 15)
                .block(0, &[(50, 600); 32])
                .block(1, &[(60, 700); 3]),
        );
        dl.wake().await.unwrap();
        let metadata = dl.read_header().await.unwrap();
        assert_eq!(metadata.base, datetime!(2024-03-15 14:30:00));

        let mut reader = dl.blocks().max_blocks(1);
        assert!(matches!(reader.next_block().await, BlockRead::Block(b) if b.index == 0));
        assert!(matches!(
            reader.next_block().await,
            BlockRead::Stopped(StopReason::BlockLimit { .. })
        ));

        let transport = dl.into_transport();
        assert_eq!(transport.block_requests(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_wake_ack_is_tolerated() {
        let mut dl = logger(
            MockTransportBuilder::new()
                .ack(vec![0x5C; 3])
                .block(0, &[(50, 600)]),
        );
        let download = dl.download(&DownloadOptions::default()).await.unwrap();
        assert_eq!(download.samples.len(), 1);

        let mut dl = logger(MockTransportBuilder::new().ack(Vec::new()));
        let download = dl.download(&DownloadOptions::default()).await.unwrap();
        assert!(download.samples.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_header_is_fatal() {
        let mut dl = logger(MockTransportBuilder::new().raw_header(vec![0xAA; 64]));
        let err = dl.download(&DownloadOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::HeaderNotFound { .. })
        ));
        // Nothing past the header request was sent.
        assert_eq!(dl.transport().written().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_transport_before_handshake_is_fatal() {
        let mut transport = MockTransportBuilder::new().build();
        transport.close().await.unwrap();
        let mut dl = Datalogger::with_transport(transport, Timing::default());
        let err = dl.download(&DownloadOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reported_per_block() {
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let opts = DownloadOptions::new().with_progress(move |p| sink.lock().unwrap().push(p));

        let mut dl = logger(
            MockTransportBuilder::new()
                .block(0, &[(50, 600); 32])
                .block(1, &[(50, 600); 5]),
        );
        dl.download(&opts).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].samples, 32);
        assert_eq!(seen[1].blocks_read, 2);
        assert_eq!(seen[1].samples, 37);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_scan_keeps_header() {
        let token = CancellationToken::new();
        token.cancel();
        let mut dl = logger(MockTransportBuilder::new().block(0, &[(50, 600)]));

        let download = dl
            .download(&DownloadOptions::new().cancel_token(token))
            .await
            .unwrap();
        assert!(download.samples.is_empty());
        assert_eq!(download.stop_reason, StopReason::Cancelled { block: 0 });
        assert!(download.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_into_session_applies_labels() {
        let mut dl = logger(MockTransportBuilder::new().block(0, &[(50, 600)]));
        let download = dl.download(&DownloadOptions::default()).await.unwrap();

        let session = download.clone().into_session("FREEZER", Some("  "));
        assert_eq!(session.equipment(), "FREEZER");
        assert_eq!(session.tag(), None);

        let session = download.into_session("HELADERA", Some("LAB1"));
        assert_eq!(session.tag(), Some("LAB1"));
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_blank_port() {
        let err = Datalogger::open("  ", 9600, Timing::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        let err = Datalogger::open("/dev/ttyUSB0", 0, Timing::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
