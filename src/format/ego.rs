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

    src/format/ego.rs

    The "ego" family of single-sector custom formats, as used by Behind the
    Iron Gate, Za Zelazna Brama, ABC Chemii II and Inferior, plus the
    Za Zelazna Brama boot track that publishes the protection table the
    brama variant consumes.
*/

//! The ego family: seven variants of one single-sector custom format.
//!
//! Raw track layout:
//!
//! ```text
//!  u16 sync             :: 0x8951, or 0x4489 for the two "B" variants
//!  u32 dat[len/4]       :: MFM odd/even, big-endian
//!  u32 checksum         :: MFM odd/even; EOR.L then ROR.L #1 over dat
//! ```
//!
//! Most variants use per-track total bit lengths as a protection scheme.
//! Za Zelazna Brama takes its per-track offsets from a table on its boot
//! track (disk 2, track 0.0), published through the disk tag store; the
//! ABC Chemii and Inferior variants carry fixed offset tables.

use crate::{
    bitstream::TrackBitStream,
    codec::{self, CellCoding},
    disk::{Disk, DiskTagId},
    format::TrackFormat,
    track_buffer::TrackBuffer,
    DiskError,
    SPEED_AVG,
};
use binrw::BinRead;
use std::io::Cursor;

/// Rotate-xor checksum step: `EOR.L D1,D0` then `ROR.L #1,D0`.
fn ego_sum(w: u32, s: u32) -> u32 {
    (s ^ w).rotate_right(1)
}

/// The per-track bit-length offset table embedded in a boot-track payload
/// (and published as [`DiskTagId::ZaZelaznaBramaProtection`]): 152
/// big-endian 16-bit entries, indexed by track number.
#[derive(BinRead, Debug)]
#[br(big)]
pub struct ProtectionTable {
    #[br(count = 152)]
    pub offsets: Vec<u16>,
}

impl ProtectionTable {
    pub fn parse(bytes: &[u8]) -> Option<ProtectionTable> {
        ProtectionTable::read(&mut Cursor::new(bytes)).ok()
    }
}

/// Decode one ego-family track.
pub(crate) fn write_raw(
    disk: &mut Disk,
    tracknr: usize,
    s: &mut TrackBitStream,
) -> Result<Vec<u8>, DiskError> {
    let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
    let format = ti.format;
    let len = ti.bytes_per_sector * ti.nr_sectors as usize;
    let sync = format
        .handler()
        .and_then(|h| h.extra.sync())
        .ok_or(DiskError::UnknownFormat)?;

    while s.next_bit().is_some() {
        if s.word() as u16 != sync {
            continue;
        }
        let data_bitoff = s.index_offset_bc().wrapping_sub(15);

        let mut dat = Vec::with_capacity(len);
        let mut sum = 0u32;
        let mut raw = [0u8; 8];
        for _ in 0..len / 4 {
            s.next_bytes(&mut raw).ok_or(DiskError::StreamExhausted)?;
            let word = codec::decode_bytes(CellCoding::MfmOddEven, &raw);
            sum = ego_sum(u32::from_be_bytes(word[..].try_into().unwrap()), sum);
            dat.extend_from_slice(&word);
        }

        s.next_bytes(&mut raw).ok_or(DiskError::StreamExhausted)?;
        let csum = codec::decode_bytes(CellCoding::MfmOddEven, &raw);
        if sum != u32::from_be_bytes(csum[..].try_into().unwrap()) {
            log::debug!("write_raw(): T{}: checksum mismatch at sync, rescanning", tracknr);
            continue;
        }

        // Variant-specific protection: per-track total bit lengths, from
        // the boot-track tag for Za Zelazna Brama and from fixed tables
        // for the others.
        let mut total_bits = None;
        let mut bitoff_override = None;
        match format {
            TrackFormat::ZaZelaznaBrama => {
                let table = disk
                    .tags()
                    .get(DiskTagId::ZaZelaznaBramaProtection)
                    .and_then(ProtectionTable::parse);
                if let Some(off) = table.and_then(|t| t.offsets.get(tracknr).copied()) {
                    total_bits =
                        Some(100_900u32.wrapping_add((off as u32).wrapping_sub(0x720)).wrapping_add(46));
                }
            }
            TrackFormat::AbcChemiiA | TrackFormat::AbcChemiiB => {
                if let Some(&off) = ABC_CHEM_PROTECTION.get(tracknr) {
                    total_bits = Some(100_900u32.wrapping_add((off as u32).wrapping_sub(0xA15)));
                }
                // The protection check randomly fails unless the decoded
                // region is pinned to this offset.
                bitoff_override = Some(100_900);
            }
            TrackFormat::AbcChemiiTimsoftA | TrackFormat::AbcChemiiTimsoftB => {
                if let Some(&off) = ABC_CHEM_TIMSOFT_PROTECTION.get(tracknr) {
                    total_bits = Some(100_900u32.wrapping_add((off as u32).wrapping_sub(0xA15)));
                }
                bitoff_override = Some(100_900);
            }
            TrackFormat::Inferior => {
                if let Some(&off) = INFERIOR_PROTECTION.get(tracknr) {
                    total_bits = Some(100_900u32.wrapping_add((off as u32).wrapping_sub(0xA15)));
                }
                bitoff_override = Some(100_900);
            }
            _ => {}
        }

        let ti = disk.track_mut(tracknr).unwrap();
        ti.data_bitoff = bitoff_override.unwrap_or(data_bitoff);
        if let Some(total_bits) = total_bits {
            ti.total_bits = total_bits;
        }
        ti.set_all_sectors_valid();
        return Ok(dat);
    }

    Err(DiskError::StreamExhausted)
}

/// Encode one ego-family track.
pub(crate) fn read_raw(disk: &Disk, tracknr: usize, tbuf: &mut TrackBuffer) -> Result<(), DiskError> {
    let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
    let sync = ti
        .format
        .handler()
        .and_then(|h| h.extra.sync())
        .ok_or(DiskError::UnknownFormat)?;
    if ti.len() != ti.bytes_per_sector * ti.nr_sectors as usize {
        return Err(DiskError::PayloadError);
    }

    tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, sync as u32);

    let mut sum = 0u32;
    for word in ti.data.chunks_exact(4) {
        let w = u32::from_be_bytes(word.try_into().unwrap());
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, w);
        sum = ego_sum(w, sum);
    }
    tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, sum);

    Ok(())
}

/// Decode the Za Zelazna Brama boot track: a plain AmigaDOS track whose
/// first sector carries the per-track protection offsets for the rest of
/// the disk. The AmigaDOS handler does the real work; this wrapper lifts
/// the table out of the payload and publishes it for the brama decodes
/// that follow, then returns the AmigaDOS block unchanged.
pub(crate) fn boot_write_raw(
    disk: &mut Disk,
    tracknr: usize,
    s: &mut TrackBitStream,
) -> Result<Vec<u8>, DiskError> {
    disk.init_track(tracknr, TrackFormat::AmigaDos);
    let handler = TrackFormat::AmigaDos.handler().ok_or(DiskError::UnknownFormat)?;
    let ablk = (handler.write_raw)(disk, tracknr, s)?;
    if disk.track(tracknr).unwrap().format != TrackFormat::AmigaDos {
        return Err(DiskError::StreamExhausted);
    }

    // Leave the cursor where a fresh handler would expect it.
    s.reset();

    if disk.tags().get(DiskTagId::ZaZelaznaBramaProtection).is_none() {
        let table = &ablk[4..308];
        debug_assert!(ProtectionTable::parse(table).is_some());
        log::debug!("boot_write_raw(): T{}: publishing protection table", tracknr);
        disk.tags_mut()
            .set(DiskTagId::ZaZelaznaBramaProtection, table.to_vec());
    }

    Ok(ablk)
}

static ABC_CHEM_PROTECTION: [u16; 160] = [
    0x2001, 0x7401, 0x0A57, 0x0A58, 0x0A56, 0x0A59, 0x0A58, 0x0A58,
    0x0A57, 0x0A59, 0x0A57, 0x0A58, 0x0A57, 0x0A57, 0x0A58, 0x0A58,
    0x0A57, 0x0A57, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A57, 0x0A58,
    0x0A56, 0x0A58, 0x0A57, 0x0A58, 0x0A55, 0x0A58, 0x0A57, 0x0A59,
    0x0A55, 0x0A58, 0x0A56, 0x0A58, 0x0A56, 0x0A58, 0x0A56, 0x0A59,
    0x0A57, 0x0A58, 0x0A58, 0x0A59, 0x0A57, 0x0A58, 0x0A58, 0x0A59,
    0x0A57, 0x0A58, 0x0A57, 0x0A58, 0x0A56, 0x0A57, 0x0A56, 0x0A59,
    0x0A57, 0x0A56, 0x0A57, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A58,
    0x0A58, 0x0A58, 0x0A57, 0x0A57, 0x0A59, 0x0A58, 0x0A57, 0x0A58,
    0x0A58, 0x0A58, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A55, 0x0A57,
    0x0A57, 0x0A58, 0x0A56, 0x0A57, 0x0A57, 0x0A58, 0x0A57, 0x0A58,
    0x0A57, 0x0A59, 0x0A58, 0x0A58, 0x0A57, 0x0A59, 0x0A57, 0x0A59,
    0x0A56, 0x0A59, 0x0A57, 0x0A59, 0x0A58, 0x0A58, 0x0A58, 0x0A58,
    0x0A58, 0x0A58, 0x0A59, 0x0A58, 0x0A58, 0x0A58, 0x0A59, 0x0A57,
    0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A57, 0x0A58, 0x0A59, 0x0A57,
    0x0A55, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A57,
    0x0A55, 0x0A56, 0x0A55, 0x0A55, 0x0A55, 0x0A55, 0x0A56, 0x0A55,
    0x0A56, 0x0A56, 0x0A56, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A56,
    0x0A54, 0x0A56, 0x0A55, 0x0A56, 0x0A56, 0x0A56, 0x0A56, 0x0A56,
    0x0A55, 0x0A56, 0x0A57, 0x0A56, 0x0A57, 0x0A56, 0x0A57, 0x0A56,
];

static ABC_CHEM_TIMSOFT_PROTECTION: [u16; 160] = [
    0x0200, 0xFFFF, 0x0BB3, 0x0B98, 0x0BC8, 0x0B9A, 0x0BBA, 0x0B9B,
    0x0BC7, 0x0BA8, 0x0BBE, 0x0BA0, 0x0BA8, 0x0BA1, 0x0BB1, 0x0BA6,
    0x0BC1, 0x0B9D, 0x0BBE, 0x0BB3, 0x0BAF, 0x0BA8, 0x0BA1, 0x0B9D,
    0x0BAF, 0x0B95, 0x0BAD, 0x0BA8, 0x0BBF, 0x0BB0, 0x0B9F, 0x0BA7,
    0x0BC0, 0x0B9C, 0x0BB1, 0x0B9A, 0x0BB7, 0x0B98, 0x0BAB, 0x0B9E,
    0x0BB7, 0x0BA6, 0x0BB8, 0x0B9B, 0x0BB3, 0x0BA4, 0x0BA5, 0x0B95,
    0x0BB7, 0x0BA5, 0x0BB2, 0x0BA3, 0x0BA8, 0x0BA0, 0x0B9F, 0x0BA8,
    0x0BAA, 0x0BA8, 0x0BB9, 0x0BA3, 0x0BA6, 0x0B9C, 0x0BA9, 0x0BA7,
    0x0BA3, 0x0B9A, 0x0BBD, 0x0B9D, 0x0BB0, 0x0B97, 0x0BAE, 0x0BA1,
    0x0B9E, 0x0BA5, 0x0BA1, 0x0BA2, 0x0B9C, 0x0B9B, 0x0BA8, 0x0BB4,
    0x0BAF, 0x0B9A, 0x0BA1, 0x0B9A, 0x0BA4, 0x0B9F, 0x0BAF, 0x0BAC,
    0x0BA3, 0x0BA1, 0x0BA4, 0x0BA2, 0x0BAF, 0x0BA6, 0x0BA0, 0x0BAE,
    0x0BB7, 0x0BA7, 0x0BA4, 0x0BAA, 0x0BA1, 0x0B9E, 0x0BAD, 0x0BA1,
    0x0BA7, 0x0BAC, 0x0BB2, 0x0BA7, 0x0BB7, 0x0BA5, 0x0BB3, 0x0BAA,
    0x0BAA, 0x0BA4, 0x0BA3, 0x0B9D, 0x0BB0, 0x0BA7, 0x0BA6, 0x0BA3,
    0x0BB6, 0x0BAB, 0x0BAE, 0x0BA9, 0x0BA0, 0x0BAE, 0x0BA8, 0x0BA1,
    0x0BAD, 0x0BA6, 0x0B87, 0x0B8B, 0x0BA8, 0x0B9B, 0x0BA3, 0x0BAD,
    0x0BBB, 0x0B9C, 0x0BAB, 0x0BA8, 0x0BBC, 0x0B9C, 0x0BA4, 0x0BAA,
    0x0BB0, 0x0B9F, 0x0B9C, 0x0BA0, 0x0BB0, 0x0BA7, 0x0BA3, 0x0B9A,
    0x0BB2, 0x0BAC, 0x0B8D, 0x0BA8, 0x0BB5, 0x0BA2, 0x0BAE, 0x0BA7,
];

static INFERIOR_PROTECTION: [u16; 160] = [
    0x0A32, 0x0A34, 0x0A30, 0x0A31, 0x0A2E, 0x0A36, 0x0A2D, 0x0A33,
    0x0A25, 0x0A34, 0x0A2D, 0x0A33, 0x0A2F, 0x0A32, 0x0A32, 0x0A32,
    0x0A35, 0x0A32, 0x0A31, 0x0A32, 0x0A2F, 0x0A34, 0x0A2D, 0x0A30,
    0x0A2E, 0x0A33, 0x0A2B, 0x0A31, 0x0A2F, 0x0A33, 0x0A2E, 0x0A33,
    0x0A2F, 0x0A33, 0x0A2E, 0x0A32, 0x0A2E, 0x0A31, 0x0A2E, 0x0A32,
    0x0A2D, 0x0A33, 0x0A2E, 0x0A34, 0x0A2D, 0x0A34, 0x0A2D, 0x0A31,
    0x0A2F, 0x0A31, 0x0A2F, 0x0A30, 0x0A2F, 0x0A32, 0x0A30, 0x0A31,
    0x0A2D, 0x0A34, 0x0A30, 0x0A31, 0x0A2E, 0x0A32, 0x0A2B, 0x0A30,
    0x0A2E, 0x0A32, 0x0A2E, 0x0A31, 0x0A30, 0x0A33, 0x0A2D, 0x0A32,
    0x0A2E, 0x0A32, 0x0A2E, 0x0A32, 0x0A2C, 0x0A33, 0x0A2F, 0x0A31,
    0x0A2E, 0x0A34, 0x0A2D, 0x0A33, 0x0A2E, 0x0A32, 0x0A2D, 0x0A31,
    0x0A31, 0x0A31, 0x0A30, 0x0A32, 0x0A2F, 0x0A31, 0x0A31, 0x0A32,
    0x0A2F, 0x0A32, 0x0A34, 0x0A2E, 0x0A30, 0x0A32, 0x0A2E, 0x0A31,
    0x0A2F, 0x0A33, 0x0A2F, 0x0A33, 0x0A30, 0x0A33, 0x0A2D, 0x0A34,
    0x0A2F, 0x0A31, 0x0A2E, 0x0A32, 0x0A31, 0x0A32, 0x0A2F, 0x0A32,
    0x0A30, 0x0A34, 0x0A2D, 0x0A31, 0x0A2E, 0x0A32, 0x0A2E, 0x0A30,
    0x0A2F, 0x0A30, 0x0A30, 0x0A31, 0x0A2D, 0x0A30, 0x0A32, 0x0A31,
    0x0A2D, 0x0A32, 0x0A2E, 0x0A32, 0x0A2B, 0x0A33, 0x0A2C, 0x0A33,
    0x0A2B, 0x0A34, 0x0A2A, 0x0A34, 0x0A2E, 0x0A31, 0x0A2C, 0x0A31,
    0x0A28, 0x0A33, 0x0A2A, 0x0A32, 0x0A26, 0x0A35, 0x0A29, 0x0000,
];
