//! Sample decoding for memory blocks.
//!
//! A block is a run of 4-byte strides, each holding a big-endian
//! temperature word and a big-endian humidity word. Decoding stops at the
//! first terminator stride (see [`RawSample::is_terminator`]) or when fewer
//! than four bytes remain; a trailing partial stride is discarded.

use galileo_types::RawSample;

/// Iterator over the samples of one buffer.
///
/// The iterator is cheap to clone; a clone decodes the same strides again
/// from the current position.
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

/// Decode samples from `buf`, starting at byte `offset`.
///
/// ```
/// use galileo_core::samples::decode_samples;
///
/// let block = [0x00, 0x32, 0x02, 0x58, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x33, 0x02, 0x58];
/// let temps: Vec<f64> = decode_samples(&block, 0).map(|s| s.temperature()).collect();
/// assert_eq!(temps, vec![5.0]);
/// ```
#[must_use]
pub fn decode_samples(buf: &[u8], offset: usize) -> Samples<'_> {
    Samples {
        buf,
        pos: offset,
        done: false,
    }
}

impl<'a> Samples<'a> {
    /// Byte offset of the next stride to decode.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode the remaining samples into `(temperature, humidity)` pairs.
    pub fn into_pairs(self) -> Vec<(f64, f64)> {
        self.map(|s| (s.temperature(), s.humidity())).collect()
    }
}

impl Iterator for Samples<'_> {
    type Item = RawSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let stride = self
            .buf
            .get(self.pos..self.pos.saturating_add(RawSample::SIZE))
            .and_then(|bytes| RawSample::from_bytes(bytes).ok());

        match stride {
            Some(sample) if !sample.is_terminator() => {
                self.pos += RawSample::SIZE;
                Some(sample)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.buf.len().saturating_sub(self.pos) / RawSample::SIZE;
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for Samples<'_> {}
