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
*/

//! # fluxgate
//!
//! fluxgate is a Rust library for decoding and re-encoding raw magnetic-flux
//! track images from Commodore Amiga 3½" floppy disks, with a focus on the
//! custom, copy-protected track formats that raw sector images cannot
//! represent.
//!
//! The library converts between two representations of a track:
//!
//! * **Raw form** - a stream of MFM bit cells plus per-cell speed
//!   information, as captured from physical media. Raw tracks are read
//!   through a [`TrackBitStream`] cursor and produced through a
//!   [`TrackBuffer`] writer.
//! * **Decoded form** - the logical payload of the track together with its
//!   metadata (sector validity, data bit-offset, total bit length), held in
//!   a [`TrackInfo`] record owned by a [`Disk`].
//!
//! Each supported format is identified by a [`TrackFormat`] tag which
//! resolves, through a static registry, to a handler implementing the
//! format's decode (`write_raw`) and encode (`read_raw`) operations.
//! Formats that share state across tracks (such as protection tables read
//! from a boot track) communicate through the disk's tag store rather than
//! through globals, so independent disks may be processed in parallel.
//!
//! The main interface is the [`Disk`] object:
//!
//! ```rust
//! use fluxgate::{Disk, TrackBitStream, TrackBuffer, TrackFormat};
//!
//! # fn main() -> Result<(), fluxgate::DiskError> {
//! let mut disk = Disk::new(160);
//! disk.load_track(2, TrackFormat::Copylock, 0x0012_3456u32.to_be_bytes().to_vec())?;
//!
//! // Encode the track into a raw cell stream, then decode it back.
//! let mut tbuf = TrackBuffer::new();
//! disk.encode_track(2, &mut tbuf)?;
//!
//! let mut stream = TrackBitStream::from(tbuf);
//! disk.decode_track(2, TrackFormat::Copylock, &mut stream)?;
//! assert_eq!(disk.track(2).unwrap().valid_sector_count(), 11);
//! # Ok(())
//! # }
//! ```

pub mod bitstream;
pub mod codec;
pub mod disk;
pub mod format;
pub mod track;
pub mod track_buffer;

use thiserror::Error;

/// The average bit-cell speed, in permille of the nominal cell time.
/// Regions of a track recorded faster or slower than average carry
/// proportionally smaller or larger values (95% = 950, 105% = 1050).
pub const SPEED_AVG: u16 = 1000;

/// Nominal duration of one MFM bit cell at average speed, in nanoseconds.
/// Double-density media is written at 2µs per cell.
pub const CELL_TIME_NS: u32 = 2000;

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("No handler is registered for the requested track format")]
    UnknownFormat,
    #[error("The requested track number is out of range for the disk")]
    SeekError,
    #[error("The raw bitstream was exhausted before a valid track was decoded")]
    StreamExhausted,
    #[error("The track payload is missing or malformed for the requested operation")]
    PayloadError,
}

pub use crate::{
    bitstream::TrackBitStream,
    codec::CellCoding,
    disk::{Disk, DiskTagId, DiskTags},
    format::{ExtraData, TrackFormat, TrackHandler},
    track::{TrackFlags, TrackInfo},
    track_buffer::TrackBuffer,
};
