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

    src/format/amigados.rs

    The stock AmigaDOS trackdisk format: eleven 512-byte sectors per track.
*/

//! The standard AmigaDOS track layout, as written by trackdisk.device.
//!
//! Decoded sector layout (544 bytes, sectors back to back with no
//! inter-sector gap):
//!
//! ```text
//!  u8  0, 0              :: lead-in
//!  u16 0x4489, 0x4489    :: sync marker pair
//!  u8  info[4]           :: 0xFF, track, sector, sectors until gap
//!  u8  label[16]
//!  u32 header_checksum   :: over info and label
//!  u32 data_checksum     :: over data
//!  u8  data[512]
//! ```
//!
//! Everything after the sync pair is MFM odd/even encoded: the info,
//! checksum and data fields each interleave as a whole block. Checksums
//! fold the XOR of the decoded big-endian longwords over the data-bit mask.
//!
//! Good documentation on the format can be found at:
//! http://lclevy.free.fr/adflib/adf_info.html

use crate::{
    bitstream::TrackBitStream,
    codec::{self, CellCoding},
    disk::Disk,
    track_buffer::TrackBuffer,
    DiskError,
    SPEED_AVG,
};

pub const SYNC_WORD: u16 = 0x4489;

/// The 32-bit scan window: two consecutive sync words.
const SYNC_PAIR: u32 = 0x4489_4489;

/// Decoded bytes from one sector's lead-in to the next.
const SECTOR_SPAN: u32 = 544;

/// Fold the XOR of the decoded big-endian longwords down onto the data
/// bits. Equivalent to XOR-ing the raw MFM longwords under the `0x5555`
/// data-bit mask, which is what the original trackdisk.device computes.
pub fn amigados_checksum(data: &[u8]) -> u32 {
    let mut csum = 0u32;
    for word in data.chunks_exact(4) {
        csum ^= u32::from_be_bytes(word.try_into().unwrap());
    }
    csum ^= csum >> 1;
    csum & 0x5555_5555
}

/// Decode an AmigaDOS track. Collects sectors until all are valid or the
/// stream runs out; at least one valid sector yields a payload, with
/// missing sectors left zero-filled and invalid.
pub(crate) fn write_raw(
    disk: &mut Disk,
    tracknr: usize,
    s: &mut TrackBitStream,
) -> Result<Vec<u8>, DiskError> {
    let (nr_sectors, bytes_per_sector) = {
        let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
        (ti.nr_sectors, ti.bytes_per_sector)
    };
    let mut block = vec![0u8; nr_sectors as usize * bytes_per_sector];
    let mut least_sector = u8::MAX;

    while disk.track(tracknr).unwrap().valid_sector_count() < nr_sectors as u32 {
        if s.next_bit().is_none() {
            break;
        }
        if s.word() != SYNC_PAIR {
            continue;
        }
        let idx_off = s.index_offset_bc().wrapping_sub(31);

        let mut raw_info = [0u8; 8];
        let mut raw_label = [0u8; 32];
        let mut raw_csum = [0u8; 8];
        let mut raw_dsum = [0u8; 8];
        let mut raw_dat = [0u8; 1024];
        if s.next_bytes(&mut raw_info).is_none()
            || s.next_bytes(&mut raw_label).is_none()
            || s.next_bytes(&mut raw_csum).is_none()
            || s.next_bytes(&mut raw_dsum).is_none()
            || s.next_bytes(&mut raw_dat).is_none()
        {
            break;
        }

        let info = codec::decode_bytes(CellCoding::MfmOddEven, &raw_info);
        let label = codec::decode_bytes(CellCoding::MfmOddEven, &raw_label);
        let csum = codec::decode_bytes(CellCoding::MfmOddEven, &raw_csum);
        let dsum = codec::decode_bytes(CellCoding::MfmOddEven, &raw_dsum);
        let dat = codec::decode_bytes(CellCoding::MfmOddEven, &raw_dat);

        // info = { format, track, sector, sectors to gap }
        if info[0] != 0xFF || info[1] != tracknr as u8 {
            log::trace!(
                "write_raw(): T{}: skipping sector header for format {:02X} track {}",
                tracknr,
                info[0],
                info[1]
            );
            continue;
        }
        let sec = info[2];
        if sec >= nr_sectors || disk.track(tracknr).unwrap().is_sector_valid(sec) {
            continue;
        }

        let mut header = info;
        header.extend_from_slice(&label);
        if amigados_checksum(&header) != u32::from_be_bytes(csum[..].try_into().unwrap()) {
            log::debug!("write_raw(): T{}.{}: bad header checksum", tracknr, sec);
            continue;
        }
        if amigados_checksum(&dat) != u32::from_be_bytes(dsum[..].try_into().unwrap()) {
            log::debug!("write_raw(): T{}.{}: bad data checksum", tracknr, sec);
            continue;
        }

        block[sec as usize * bytes_per_sector..][..bytes_per_sector].copy_from_slice(&dat);
        let ti = disk.track_mut(tracknr).unwrap();
        ti.set_sector_valid(sec);
        if least_sector > sec {
            ti.data_bitoff = idx_off;
            least_sector = sec;
        }
    }

    let ti = disk.track_mut(tracknr).unwrap();
    let nr_valid = ti.valid_sector_count();
    if nr_valid == 0 {
        return Err(DiskError::StreamExhausted);
    }
    if nr_valid < nr_sectors as u32 {
        log::warn!("write_raw(): T{}: only {}/{} sectors valid", tracknr, nr_valid, nr_sectors);
    }

    // Anchor the offset to sector 0: back off over any missing initial
    // sectors, then over the zero lead-in preceding the sync pair.
    ti.data_bitoff = ti
        .data_bitoff
        .wrapping_sub(least_sector as u32 * SECTOR_SPAN * 16)
        .wrapping_sub(2 * 8 * 2);

    Ok(block)
}

/// Encode an AmigaDOS track from its 11-sector payload.
pub(crate) fn read_raw(disk: &Disk, tracknr: usize, tbuf: &mut TrackBuffer) -> Result<(), DiskError> {
    let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
    if ti.len() != ti.nr_sectors as usize * ti.bytes_per_sector {
        return Err(DiskError::PayloadError);
    }

    for sec in 0..ti.nr_sectors {
        // Lead-in and sync marker pair.
        tbuf.bits(SPEED_AVG, CellCoding::Mfm, 16, 0);
        tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, SYNC_WORD as u32);
        tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, SYNC_WORD as u32);

        let info = [0xFF, tracknr as u8, sec, ti.nr_sectors - sec];
        let label = [0u8; 16];
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, u32::from_be_bytes(info));
        tbuf.bytes(SPEED_AVG, CellCoding::MfmOddEven, &label);

        let mut header = info.to_vec();
        header.extend_from_slice(&label);
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, amigados_checksum(&header));

        let dat = &ti.data[sec as usize * ti.bytes_per_sector..][..ti.bytes_per_sector];
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, amigados_checksum(dat));
        tbuf.bytes(SPEED_AVG, CellCoding::MfmOddEven, dat);
    }

    Ok(())
}
