/*
    Fluxgate
    https://github.com/fluxgate/fluxgate

    Copyright 2025 the fluxgate contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/bitstream/mod.rs

    A cursor over a raw MFM cell stream with a rolling sync window and a
    speed-weighted latency accumulator.
*/

//! The `bitstream` module presents a raw track - MFM bit cells plus
//! per-cell speed - as a forward cursor for the track handlers.
//!
//! The cursor maintains a 32-bit sliding [`word`](TrackBitStream::word) of
//! the most recently consumed cells; its low 16 bits form the sync window
//! that handlers compare against their format's sync constants. Alongside
//! it, [`index_offset_bc`](TrackBitStream::index_offset_bc) records how far
//! into the track the cursor is (in bit cells since the index pulse), and
//! [`latency`](TrackBitStream::latency) accumulates the speed-weighted
//! duration of the consumed cells so handlers can measure how long a region
//! of the physical track takes to pass under the head.

use crate::{track_buffer::TrackBuffer, CELL_TIME_NS, SPEED_AVG};
use bit_vec::BitVec;

/// A forward cursor over one revolution of raw track cells.
pub struct TrackBitStream {
    bits: BitVec,
    speeds: Vec<u16>,
    pos: usize,
    word: u32,
    index_offset_bc: u32,
    latency: u32,
}

impl TrackBitStream {
    /// Create a stream over a cell vector recorded entirely at average
    /// speed.
    pub fn new(bits: BitVec) -> TrackBitStream {
        let speeds = vec![SPEED_AVG; bits.len()];
        TrackBitStream::with_speeds(bits, speeds)
    }

    /// Create a stream over a cell vector with one speed entry per cell,
    /// in permille of the average cell time.
    pub fn with_speeds(bits: BitVec, speeds: Vec<u16>) -> TrackBitStream {
        assert_eq!(bits.len(), speeds.len(), "one speed entry per bit cell");
        TrackBitStream {
            bits,
            speeds,
            pos: 0,
            word: 0,
            index_offset_bc: 0,
            latency: 0,
        }
    }

    /// The 32-bit sliding window of the most recently consumed cells. The
    /// low 16 bits are the sync window.
    #[inline]
    pub fn word(&self) -> u32 {
        self.word
    }

    /// Bit count of the most recently consumed cell, relative to the index
    /// pulse.
    #[inline]
    pub fn index_offset_bc(&self) -> u32 {
        self.index_offset_bc
    }

    /// Accumulated duration of the consumed cells in nanoseconds, weighted
    /// by each cell's local speed. Callers zero this with
    /// [`reset_latency`](Self::reset_latency) to measure a region.
    #[inline]
    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Zero the latency accumulator.
    #[inline]
    pub fn reset_latency(&mut self) {
        self.latency = 0;
    }

    /// Total number of cells in the underlying track.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Advance one cell. Returns the cell value, or `None` once the
    /// physical track is exhausted.
    pub fn next_bit(&mut self) -> Option<bool> {
        if self.pos >= self.bits.len() {
            return None;
        }
        let bit = self.bits[self.pos];
        self.word = (self.word << 1) | bit as u32;
        self.index_offset_bc = self.pos as u32;
        self.latency += CELL_TIME_NS * self.speeds[self.pos] as u32 / SPEED_AVG as u32;
        self.pos += 1;
        Some(bit)
    }

    /// Advance `n` cells (n ≤ 32) and return them right-aligned. Returns
    /// `None` if the track is exhausted before all `n` cells are read.
    pub fn next_bits(&mut self, n: usize) -> Option<u32> {
        debug_assert!(n <= 32);
        let mut bits = 0;
        for _ in 0..n {
            bits = (bits << 1) | self.next_bit()? as u32;
        }
        Some(bits)
    }

    /// Fill `buf` with raw cells, eight per byte, MSB-first, without any
    /// decoding. Returns `None` if the track is exhausted first.
    pub fn next_bytes(&mut self, buf: &mut [u8]) -> Option<()> {
        for byte in buf.iter_mut() {
            *byte = self.next_bits(8)? as u8;
        }
        Some(())
    }

    /// Restart the cursor at the start of the track. The latency
    /// accumulator is preserved.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.word = 0;
        self.index_offset_bc = 0;
    }
}

/// Re-ingest an encoded track: the writer's cells and speed map become a
/// readable stream, which is how round trips and re-captures are modelled.
impl From<TrackBuffer> for TrackBitStream {
    fn from(tbuf: TrackBuffer) -> TrackBitStream {
        let (bits, speeds) = tbuf.into_parts();
        TrackBitStream::with_speeds(bits, speeds)
    }
}
