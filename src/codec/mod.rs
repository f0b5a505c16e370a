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

    src/codec/mod.rs

    Bit-cell codings used by the track handlers, and byte-granular decoding
    of raw cell buffers.
*/

//! The `codec` module defines the bit-cell codings a track region may use
//! and provides the decoding half of the MFM codec. The encoding half is
//! bit-granular and lives in [`TrackBuffer`](crate::TrackBuffer), which owns
//! the running previous-data-bit that MFM clock insertion depends on.

pub mod mfm;

use std::fmt::{self, Display, Formatter};

/// The coding applied to a run of bit cells within a raw track.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellCoding {
    /// Cells are emitted or consumed verbatim. The caller has already
    /// computed the clock/data interleave (sync words, deliberately illegal
    /// patterns).
    Raw,
    /// In-place MFM: each payload byte becomes 16 cells, MSB-first, with
    /// standard clock-bit insertion between consecutive zero data bits.
    Mfm,
    /// MFM with the Amiga odd/even interleave: for an N-byte block, the
    /// odd-position data bits of the whole block are encoded first,
    /// followed by the even-position bits.
    MfmOddEven,
}

impl CellCoding {
    /// Return the number of raw cells that `data_bits` data bits occupy
    /// under this coding.
    pub fn cell_len(&self, data_bits: usize) -> usize {
        match self {
            CellCoding::Raw => data_bits,
            CellCoding::Mfm | CellCoding::MfmOddEven => data_bits * 2,
        }
    }
}

impl Display for CellCoding {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CellCoding::Raw => write!(f, "raw"),
            CellCoding::Mfm => write!(f, "MFM"),
            CellCoding::MfmOddEven => write!(f, "MFM odd/even"),
        }
    }
}

/// Decode a buffer of raw cells into payload bytes under the given coding.
/// The raw buffer must hold an even number of bytes for the MFM codings;
/// the result is half its length. Clock bits are stripped and the original
/// byte stream is reassembled losslessly.
pub fn decode_bytes(coding: CellCoding, raw: &[u8]) -> Vec<u8> {
    match coding {
        CellCoding::Raw => raw.to_vec(),
        CellCoding::Mfm => mfm::decode_mfm(raw),
        CellCoding::MfmOddEven => mfm::decode_odd_even(raw),
    }
}
