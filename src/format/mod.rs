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

    src/format/mod.rs

    The track-format registry: format tags and the static handler
    descriptors they resolve to.
*/

//! The `format` module defines the [`TrackFormat`] tag enum and the
//! registry mapping each tag to its immutable [`TrackHandler`] descriptor:
//! per-sector geometry, the decode (`write_raw`) and encode (`read_raw`)
//! entry points, and a per-format constant blob.
//!
//! Handlers may compose over one another through the same registry - the
//! Za Zelazna Brama boot handler initializes its track as AmigaDOS and
//! invokes that format's decode through [`TrackFormat::handler`] before
//! post-processing the payload.

pub mod amigados;
pub mod copylock;
pub mod ego;

use crate::{bitstream::TrackBitStream, disk::Disk, track_buffer::TrackBuffer, DiskError};
use std::fmt::{self, Display, Formatter};
use strum::{EnumIter, IntoStaticStr};

/// Decode operation: raw stream in, validated payload out. The handler
/// updates the track record's metadata (offsets, validity) as a side
/// effect; the caller installs the returned payload.
pub type WriteRawFn = fn(&mut Disk, usize, &mut TrackBitStream) -> Result<Vec<u8>, DiskError>;

/// Encode operation: track payload in, coded cells out.
pub type ReadRawFn = fn(&Disk, usize, &mut TrackBuffer) -> Result<(), DiskError>;

/// Identifies one of the known track formats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum TrackFormat {
    #[default]
    Unformatted,
    AmigaDos,
    BehindTheIronGate,
    ZaZelaznaBrama,
    ZaZelaznaBramaBoot,
    AbcChemiiA,
    AbcChemiiB,
    AbcChemiiTimsoftA,
    AbcChemiiTimsoftB,
    Inferior,
    Copylock,
    CopylockOld,
}

impl Display for TrackFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TrackFormat::Unformatted => write!(f, "Unformatted"),
            TrackFormat::AmigaDos => write!(f, "AmigaDOS"),
            TrackFormat::BehindTheIronGate => write!(f, "Behind the Iron Gate"),
            TrackFormat::ZaZelaznaBrama => write!(f, "Za Zelazna Brama"),
            TrackFormat::ZaZelaznaBramaBoot => write!(f, "Za Zelazna Brama (boot)"),
            TrackFormat::AbcChemiiA => write!(f, "ABC Chemii (A)"),
            TrackFormat::AbcChemiiB => write!(f, "ABC Chemii (B)"),
            TrackFormat::AbcChemiiTimsoftA => write!(f, "ABC Chemii Timsoft (A)"),
            TrackFormat::AbcChemiiTimsoftB => write!(f, "ABC Chemii Timsoft (B)"),
            TrackFormat::Inferior => write!(f, "Inferior"),
            TrackFormat::Copylock => write!(f, "CopyLock"),
            TrackFormat::CopylockOld => write!(f, "CopyLock (old)"),
        }
    }
}

/// Per-format constant data carried by a handler descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtraData {
    None,
    /// The 16-bit sync word the format's decode scans for.
    Sync(u16),
}

impl ExtraData {
    pub fn sync(&self) -> Option<u16> {
        match self {
            ExtraData::Sync(sync) => Some(*sync),
            ExtraData::None => None,
        }
    }
}

/// An immutable, statically defined track-format descriptor.
pub struct TrackHandler {
    pub bytes_per_sector: usize,
    pub nr_sectors: u8,
    pub write_raw: WriteRawFn,
    pub read_raw: ReadRawFn,
    pub extra: ExtraData,
}

static AMIGADOS: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    write_raw: amigados::write_raw,
    read_raw: amigados::read_raw,
    extra: ExtraData::None,
};

static BEHIND_THE_IRON_GATE: TrackHandler = TrackHandler {
    bytes_per_sector: 6144,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x8951),
};

static ZA_ZELAZNA_BRAMA: TrackHandler = TrackHandler {
    bytes_per_sector: 6144,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x8951),
};

// The boot track is AmigaDOS-shaped; only its decode differs, extracting
// the protection table before handing the block back unchanged.
static ZA_ZELAZNA_BRAMA_BOOT: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    write_raw: ego::boot_write_raw,
    read_raw: amigados::read_raw,
    extra: ExtraData::None,
};

static ABC_CHEMII_A: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x8951),
};

static ABC_CHEMII_B: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x4489),
};

static ABC_CHEMII_TIMSOFT_A: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x8951),
};

static ABC_CHEMII_TIMSOFT_B: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x4489),
};

static INFERIOR: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    write_raw: ego::write_raw,
    read_raw: ego::read_raw,
    extra: ExtraData::Sync(0x8951),
};

static COPYLOCK: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    write_raw: copylock::write_raw,
    read_raw: copylock::read_raw,
    extra: ExtraData::None,
};

static COPYLOCK_OLD: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    write_raw: copylock::write_raw,
    read_raw: copylock::read_raw,
    extra: ExtraData::None,
};

impl TrackFormat {
    /// Look up the format's handler descriptor. `Unformatted` has none.
    pub fn handler(&self) -> Option<&'static TrackHandler> {
        match self {
            TrackFormat::Unformatted => None,
            TrackFormat::AmigaDos => Some(&AMIGADOS),
            TrackFormat::BehindTheIronGate => Some(&BEHIND_THE_IRON_GATE),
            TrackFormat::ZaZelaznaBrama => Some(&ZA_ZELAZNA_BRAMA),
            TrackFormat::ZaZelaznaBramaBoot => Some(&ZA_ZELAZNA_BRAMA_BOOT),
            TrackFormat::AbcChemiiA => Some(&ABC_CHEMII_A),
            TrackFormat::AbcChemiiB => Some(&ABC_CHEMII_B),
            TrackFormat::AbcChemiiTimsoftA => Some(&ABC_CHEMII_TIMSOFT_A),
            TrackFormat::AbcChemiiTimsoftB => Some(&ABC_CHEMII_TIMSOFT_B),
            TrackFormat::Inferior => Some(&INFERIOR),
            TrackFormat::Copylock => Some(&COPYLOCK),
            TrackFormat::CopylockOld => Some(&COPYLOCK_OLD),
        }
    }
}
