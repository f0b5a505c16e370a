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

    src/track_buffer.rs

    The encoding half of the raw-track model: a writer that appends coded
    bit cells at a per-region speed.
*/

//! The `track_buffer` module provides [`TrackBuffer`], the writer that
//! track handlers emit encoded output into. Each request names a
//! [`CellCoding`] and a local speed; the buffer performs MFM clock
//! insertion itself, threading the previous data bit across requests so
//! clocking stays correct over coding boundaries (a raw sync word followed
//! by coded payload, odd/even blocks back to back, and so on).

use crate::codec::CellCoding;
use bit_vec::BitVec;

/// An append-only buffer of raw track cells with a parallel speed map.
pub struct TrackBuffer {
    bits: BitVec,
    speeds: Vec<u16>,
    prev_data_bit: bool,
    auto_sector_split: bool,
}

impl TrackBuffer {
    pub fn new() -> TrackBuffer {
        TrackBuffer {
            bits: BitVec::new(),
            speeds: Vec::new(),
            prev_data_bit: false,
            auto_sector_split: true,
        }
    }

    #[inline]
    fn cell(&mut self, speed: u16, bit: bool) {
        self.bits.push(bit);
        self.speeds.push(speed);
    }

    /// Emit one MFM data bit as a clock/data cell pair. The clock cell is
    /// set only between two zero data bits.
    #[inline]
    fn mfm_data_bit(&mut self, speed: u16, bit: bool) {
        let clock = !self.prev_data_bit && !bit;
        self.cell(speed, clock);
        self.cell(speed, bit);
        self.prev_data_bit = bit;
    }

    /// Append `nbits` of `value` (nbits ≤ 32, right-aligned, MSB emitted
    /// first) under the given coding at the given local speed.
    pub fn bits(&mut self, speed: u16, coding: CellCoding, nbits: usize, value: u32) {
        debug_assert!(nbits <= 32);
        match coding {
            CellCoding::Raw => {
                for i in (0..nbits).rev() {
                    self.cell(speed, (value >> i) & 1 != 0);
                }
                // The final raw cell is taken to be a data cell for clock
                // continuity, which holds for the sync words and
                // deliberately illegal headers that use this coding.
                self.prev_data_bit = value & 1 != 0;
            }
            CellCoding::Mfm => {
                for i in (0..nbits).rev() {
                    self.mfm_data_bit(speed, (value >> i) & 1 != 0);
                }
            }
            CellCoding::MfmOddEven => {
                debug_assert!(nbits % 2 == 0);
                for i in (0..nbits).rev().filter(|i| i % 2 == 1) {
                    self.mfm_data_bit(speed, (value >> i) & 1 != 0);
                }
                for i in (0..nbits).rev().filter(|i| i % 2 == 0) {
                    self.mfm_data_bit(speed, (value >> i) & 1 != 0);
                }
            }
        }
    }

    /// Append a whole byte block under the given coding. For
    /// [`CellCoding::MfmOddEven`] the odd/even interleave spans the entire
    /// block, as the Amiga sector data and label areas require.
    pub fn bytes(&mut self, speed: u16, coding: CellCoding, data: &[u8]) {
        match coding {
            CellCoding::Raw | CellCoding::Mfm => {
                for &byte in data {
                    self.bits(speed, coding, 8, byte as u32);
                }
            }
            CellCoding::MfmOddEven => {
                let bit_at = |j: usize| (data[j / 8] >> (7 - (j % 8))) & 1 != 0;
                for j in (0..data.len() * 8).step_by(2) {
                    self.mfm_data_bit(speed, bit_at(j));
                }
                for j in (0..data.len() * 8).skip(1).step_by(2) {
                    self.mfm_data_bit(speed, bit_at(j));
                }
            }
        }
    }

    /// Append `nbits` of MFM-legal gap fill (zero data bits) at the given
    /// local speed.
    pub fn gap(&mut self, speed: u16, nbits: usize) {
        for _ in 0..nbits {
            self.mfm_data_bit(speed, false);
        }
    }

    /// Suppress container-level sector segmentation for this track, so the
    /// handler's output is kept monolithic. Formats whose sectors share an
    /// unbroken generator stream or per-sector speeds require this.
    pub fn disable_auto_sector_split(&mut self) {
        self.auto_sector_split = false;
    }

    /// Whether the container layer may split this track at sector
    /// boundaries.
    pub fn auto_sector_split(&self) -> bool {
        self.auto_sector_split
    }

    /// Number of cells written so far.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits_ref(&self) -> &BitVec {
        &self.bits
    }

    pub fn speeds(&self) -> &[u16] {
        &self.speeds
    }

    /// Consume the buffer, yielding the cell vector and its speed map.
    pub fn into_parts(self) -> (BitVec, Vec<u16>) {
        (self.bits, self.speeds)
    }
}

impl Default for TrackBuffer {
    fn default() -> Self {
        TrackBuffer::new()
    }
}
