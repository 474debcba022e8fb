//! Memory block iteration.
//!
//! Blocks are requested one at a time, index `0` upwards, never past
//! index 254. The scan ends (successfully) at the first empty read, the
//! first block without samples, or the first transport failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::commands::{BLOCK_RESPONSE_LEN, MAX_BLOCKS, block_request};
use crate::device::Timing;
use crate::samples::{Samples, decode_samples};
use crate::transport::Transport;

/// Why a block scan ended.
///
/// None of these are errors: every variant yields a valid, possibly
/// partial, session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum StopReason {
    /// The device returned no bytes for this block.
    EmptyRead { block: u8 },
    /// The block decoded to zero samples (leading terminator).
    EmptyBlock { block: u8 },
    /// Every addressable block was read.
    BlockLimit { blocks: u16 },
    /// The caller cancelled the scan before this block completed.
    Cancelled { block: u16 },
    /// The transport failed or was closed while fetching this block.
    TransportClosed { block: u8, reason: String },
}

impl StopReason {
    /// Whether the scan ended because the device ran out of data.
    pub fn is_end_of_data(&self) -> bool {
        matches!(
            self,
            Self::EmptyRead { .. } | Self::EmptyBlock { .. } | Self::BlockLimit { .. }
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRead { block } => write!(f, "no response for block {}", block),
            Self::EmptyBlock { block } => write!(f, "block {} holds no samples", block),
            Self::BlockLimit { blocks } => write!(f, "all {} blocks read", blocks),
            Self::Cancelled { block } => write!(f, "cancelled at block {}", block),
            Self::TransportClosed { block, reason } => {
                write!(f, "transport lost at block {}: {}", block, reason)
            }
        }
    }
}

/// One memory block as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: u8,
    pub data: Vec<u8>,
}

impl Block {
    /// Samples stored in this block.
    pub fn samples(&self) -> Samples<'_> {
        decode_samples(&self.data, 0)
    }
}

/// Outcome of one block fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRead {
    Block(Block),
    Stopped(StopReason),
}

/// Sequential reader over the logger's memory blocks.
///
/// Once stopped, the reader keeps returning the same [`StopReason`] and
/// sends nothing further to the device.
pub struct BlockReader<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    timing: Timing,
    next_index: u16,
    max_blocks: u16,
    stopped: Option<StopReason>,
}

impl<'t, T: Transport + ?Sized> BlockReader<'t, T> {
    pub fn new(transport: &'t mut T, timing: Timing) -> Self {
        Self {
            transport,
            timing,
            next_index: 0,
            max_blocks: MAX_BLOCKS,
            stopped: None,
        }
    }

    /// Read at most `max` blocks. Values above the device limit are clamped.
    #[must_use]
    pub fn max_blocks(mut self, max: u16) -> Self {
        self.max_blocks = max.min(MAX_BLOCKS);
        self
    }

    /// Index of the next block to request (equals blocks read so far).
    pub fn position(&self) -> u16 {
        self.next_index
    }

    /// Why the scan ended, once it has.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stopped.as_ref()
    }

    /// Fetch the next block.
    pub async fn next_block(&mut self) -> BlockRead {
        if let Some(reason) = &self.stopped {
            return BlockRead::Stopped(reason.clone());
        }

        let read = self.fetch().await;
        if let BlockRead::Stopped(reason) = &read {
            debug!("Block scan stopped: {}", reason);
            self.stopped = Some(reason.clone());
        }
        read
    }

    async fn fetch(&mut self) -> BlockRead {
        if self.next_index >= self.max_blocks {
            return BlockRead::Stopped(StopReason::BlockLimit {
                blocks: self.next_index,
            });
        }
        let Ok(index) = u8::try_from(self.next_index) else {
            return BlockRead::Stopped(StopReason::BlockLimit {
                blocks: self.next_index,
            });
        };

        if let Err(e) = self.transport.write(&block_request(index)).await {
            warn!("Write for block {} failed: {}", index, e);
            return BlockRead::Stopped(StopReason::TransportClosed {
                block: index,
                reason: e.to_string(),
            });
        }

        sleep(self.timing.block_settle).await;

        let data = match self
            .transport
            .read(BLOCK_RESPONSE_LEN, self.timing.read_timeout)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!("Read for block {} failed: {}", index, e);
                return BlockRead::Stopped(StopReason::TransportClosed {
                    block: index,
                    reason: e.to_string(),
                });
            }
        };

        if data.is_empty() {
            return BlockRead::Stopped(StopReason::EmptyRead { block: index });
        }

        let block = Block { index, data };
        if block.samples().next().is_none() {
            return BlockRead::Stopped(StopReason::EmptyBlock { block: index });
        }

        debug!("Block {}: {} bytes", index, block.data.len());
        self.next_index += 1;
        BlockRead::Block(block)
    }
}
