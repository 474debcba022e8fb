//! Serial command constants for Galileo dataloggers.
//!
//! All commands are raw bytes; multi-byte fields are big-endian.
//!
//! | Step | Bytes sent | Response size |
//! |------|------------|---------------|
//! | Wake | `5C` | 16 |
//! | Header request | `AD DA` | 64 |
//! | Block request | `D3 DA <idx> 00 00` | 128 |

/// Wake-up command. The 16-byte acknowledgement is read and discarded.
pub const WAKE: [u8; 1] = [0x5C];

/// Session header request.
pub const HEADER_REQUEST: [u8; 2] = [0xAD, 0xDA];

/// First two bytes of a block request.
/// Format: `[0xD3, 0xDA, index, 0x00, 0x00]`
pub const BLOCK_REQUEST_PREFIX: [u8; 2] = [0xD3, 0xDA];

/// Magic prefix of the session header.
pub const HEADER_MAGIC: [u8; 2] = [0xD1, 0x1C];

/// Bytes requested after [`WAKE`].
pub const WAKE_RESPONSE_LEN: usize = 16;

/// Bytes requested after [`HEADER_REQUEST`].
pub const HEADER_RESPONSE_LEN: usize = 64;

/// Bytes requested per memory block.
pub const BLOCK_RESPONSE_LEN: usize = 128;

/// Number of addressable memory blocks (indices `0..=254`).
pub const MAX_BLOCKS: u16 = 255;

/// Build the request for memory block `index`.
#[must_use]
pub const fn block_request(index: u8) -> [u8; 5] {
    [
        BLOCK_REQUEST_PREFIX[0],
        BLOCK_REQUEST_PREFIX[1],
        index,
        0x00,
        0x00,
    ]
}
