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

    src/track.rs

    The per-track mutable record a disk owns for each of its tracks.
*/

//! The `track` module defines [`TrackInfo`], the decoded-form record of a
//! single track: its format tag, decoded payload, sector-validity bitmap
//! and the physical-timing metadata (`data_bitoff`, `total_bits`) that
//! protection schemes depend on.

use crate::format::TrackFormat;
use bitflags::bitflags;

bitflags! {
    /// Status flags recorded against a track during decode.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct TrackFlags: u32 {
        #[doc = "Track was rebuilt from partial data rather than read in full"]
        const RECONSTRUCTED  = 0b0000_0001;
        #[doc = "Per-sector timing fell outside the format's tolerances"]
        const TIMING_ANOMALY = 0b0000_0010;
    }
}

/// Per-track mutable state. Created empty by the owning [`Disk`], populated
/// by a decode or loaded from a container, and consumed by an encode.
///
/// [`Disk`]: crate::Disk
#[derive(Debug, Default, Clone)]
pub struct TrackInfo {
    /// Format tag. [`TrackFormat::Unformatted`] until a decode succeeds.
    pub format: TrackFormat,
    /// Decoded payload bytes. The length is format-specific: the full
    /// sector data for most formats, a 4-byte generator seed for CopyLock.
    pub data: Vec<u8>,
    /// Mirrored from the format's handler at initialization.
    pub nr_sectors: u8,
    /// Mirrored from the format's handler at initialization.
    pub bytes_per_sector: usize,
    /// Bit offset within the raw track at which the decoded region begins.
    pub data_bitoff: u32,
    /// Total raw bit length of the track. Zero means the container default;
    /// protection schemes set explicit per-track values.
    pub total_bits: u32,
    pub flags: TrackFlags,
    pub(crate) valid_sectors: u32,
}

impl TrackInfo {
    /// Length of the decoded payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_sector_valid(&self, sector: u8) -> bool {
        sector < self.nr_sectors && self.valid_sectors & (1 << sector) != 0
    }

    pub fn set_sector_valid(&mut self, sector: u8) {
        debug_assert!(sector < self.nr_sectors);
        self.valid_sectors |= 1 << sector;
    }

    pub fn set_all_sectors_valid(&mut self) {
        self.valid_sectors = if self.nr_sectors == 32 {
            u32::MAX
        }
        else {
            (1u32 << self.nr_sectors) - 1
        };
    }

    pub fn clear_valid_sectors(&mut self) {
        self.valid_sectors = 0;
    }

    pub fn valid_sector_count(&self) -> u32 {
        self.valid_sectors.count_ones()
    }

    /// Lowest valid sector index, if any sector is valid.
    pub fn first_valid_sector(&self) -> Option<u8> {
        (self.valid_sectors != 0).then(|| self.valid_sectors.trailing_zeros() as u8)
    }
}
