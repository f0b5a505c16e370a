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

    src/format/copylock.rs

    Rob Northen CopyLock protection track (Amiga), new and old style.
*/

//! The CopyLock protection track: eleven 512-byte sectors whose payloads
//! are a single continuous stream from a 23-bit LFSR.
//!
//! Decoded sector layout (518 bytes, 44 zero bytes of gap between
//! sectors):
//!
//! ```text
//!  u8  0xA0+index, 0, 0  :: the marker bytes are MFM-illegal encodings of
//!                           0xA0+index / 0xB0+index in the old variant
//!  u16 sync              :: per-sector marker from SYNC_LIST
//!  u8  index
//!  u8  data[512]
//!  u8  0
//! ```
//!
//! Everything is MFM coded in place (no odd/even split). Each data byte is
//! an 8-bit window on the LFSR state, and the stream carries across sector
//! boundaries, so a single valid sector determines the whole track: decode
//! stores only the 4-byte big-endian seed. Sector 6 opens with the ASCII
//! signature `Rob Northen Comp`; the new variant's LFSR skips those 16
//! byte positions while the old variant's stream is interrupted by them.
//!
//! Sector 4 is written 5% fast and sector 6 5% slow, with each change
//! starting at the preceding sector's gap so a drive's PLL can lock before
//! the data arrives. The short sector balances the long one, keeping the
//! total track length stock - the timing fingerprint is the protection.

use crate::{
    bitstream::TrackBitStream,
    codec::{self, mfm, CellCoding},
    disk::Disk,
    format::TrackFormat,
    track::TrackFlags,
    track_buffer::TrackBuffer,
    DiskError,
    SPEED_AVG,
};
use binrw::BinReaderExt;
use std::io::Cursor;

/// Per-sector sync markers, indexed by sector.
pub const SYNC_LIST: [u16; 11] = [
    0x8A91, 0x8A44, 0x8A45, 0x8A51, 0x8912, 0x8911, 0x8914, 0x8915, 0x8944, 0x8945, 0x8951,
];

const SEC6_SIG: [u8; 16] = *b"Rob Northen Comp";

const SECTOR_LEN: usize = 512;

/// 23-bit LFSR with taps at positions 1 and 23.
pub fn lfsr_next_state(x: u32) -> u32 {
    ((x << 1) & ((1u32 << 23) - 1)) | (((x >> 22) ^ x) & 1)
}

pub fn lfsr_prev_state(x: u32) -> u32 {
    (x >> 1) | ((((x >> 1) ^ x) & 1) << 22)
}

/// The exposed data byte: an 8-bit window on the state.
pub fn lfsr_state_byte(x: u32) -> u8 {
    (x >> 15) as u8
}

/// Take the LFSR state from the start of one sector's data to another's,
/// in either direction. A sector advances the state by its 512 data bytes,
/// except that sector 6's signature takes 16 bytes out of the stream - off
/// sector 6 itself in the new variant, and off sector 5's flow in the old
/// variant.
pub fn lfsr_seek(format: TrackFormat, mut x: u32, mut from: u8, to: u8) -> u32 {
    while from != to {
        if from > to {
            from -= 1;
        }
        let mut sz = SECTOR_LEN;
        if from == 6 {
            sz -= SEC6_SIG.len();
        }
        if format == TrackFormat::CopylockOld && from == 5 {
            sz += SEC6_SIG.len();
        }
        for _ in 0..sz {
            x = if from < to { lfsr_next_state(x) } else { lfsr_prev_state(x) };
        }
        if from < to {
            from += 1;
        }
    }
    x
}

/// Decode a CopyLock track down to its LFSR seed.
pub(crate) fn write_raw(
    disk: &mut Disk,
    tracknr: usize,
    s: &mut TrackBitStream,
) -> Result<Vec<u8>, DiskError> {
    let (format, nr_sectors) = {
        let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
        (ti.format, ti.nr_sectors)
    };
    let mut lfsr_seed = 0u32;
    let mut latency = [0u32; 11];
    let mut least_sector = u8::MAX;

    while disk.track(tracknr).unwrap().valid_sector_count() < nr_sectors as u32 {
        if s.next_bit().is_none() {
            break;
        }
        let idx_off = s.index_offset_bc().wrapping_sub(15);

        // Are we at the start of a sector we have not yet analysed?
        let sec = if format == TrackFormat::Copylock {
            match SYNC_LIST.iter().position(|&sync| s.word() as u16 == sync) {
                Some(sec) => sec as u8,
                None => continue,
            }
        }
        else {
            if s.word() as u16 & 0xFF00 != 0x6500 {
                continue;
            }
            let sec = (mfm::decode_word(s.word()) & 0xF) as u8;
            if s.word() != (mfm::encode_word(0xB0 + sec as u16) | (1 << 13)) {
                continue;
            }
            sec
        };
        if sec >= nr_sectors || disk.track(tracknr).unwrap().is_sector_valid(sec) {
            continue;
        }

        // The sector index field must agree with the sync marker.
        let Some(hdr) = s.next_bits(16) else { break };
        if mfm::decode_byte(hdr as u16) != sec {
            continue;
        }

        // Read and decode the sector data, timing it as it goes by.
        s.reset_latency();
        let mut raw = [0u8; 2 * SECTOR_LEN];
        if s.next_bytes(&mut raw).is_none() {
            break;
        }
        let dat = codec::decode_bytes(CellCoding::Mfm, &raw);

        let mut cursor = 0usize;
        if sec == 6 {
            if dat[..SEC6_SIG.len()] != SEC6_SIG {
                continue;
            }
            cursor = SEC6_SIG.len();
        }

        // The LFSR state at the cursor: derived from the track seed when we
        // know it, otherwise recovered from the data itself. Three exposed
        // bytes are overlapping windows that pin down all 23 state bits.
        let lfsr_sec = if lfsr_seed != 0 {
            lfsr_seek(format, lfsr_seed, 0, sec)
        }
        else {
            ((dat[cursor] as u32) << 15) | ((dat[cursor + 8] as u32) << 7) | ((dat[cursor + 16] as u32) >> 1)
        };

        // Every remaining byte must match the generated stream.
        let mut lfsr = lfsr_sec;
        let matched = dat[cursor..].iter().all(|&byte| {
            let hit = byte == lfsr_state_byte(lfsr);
            lfsr = lfsr_next_state(lfsr);
            hit
        });
        if !matched {
            log::debug!("write_raw(): T{}.{}: data disagrees with LFSR stream", tracknr, sec);
            continue;
        }

        // Stash the track seed if this was the first good sector.
        if lfsr_seed == 0 {
            lfsr_seed = lfsr_seek(format, lfsr_sec, sec, 0);
            // The all-zero stream matches trivially; reject it.
            if lfsr_seed == 0 {
                continue;
            }
        }

        latency[sec as usize] = s.latency();
        let ti = disk.track_mut(tracknr).unwrap();
        ti.set_sector_valid(sec);
        if least_sector > sec {
            ti.data_bitoff = idx_off;
            least_sector = sec;
        }
    }

    let nr_valid = disk.track(tracknr).unwrap().valid_sector_count();
    if nr_valid == 0 {
        return Err(DiskError::StreamExhausted);
    }

    // Check validity of the non-uniform track timings against sector 5.
    let ti = disk.track_mut(tracknr).unwrap();
    if !ti.is_sector_valid(5) {
        latency[5] = 514 * 8 * 2 * 2000;
    }
    let mut anomaly = false;
    for sec in 0..nr_sectors {
        if !ti.is_sector_valid(sec) {
            continue;
        }
        let d = 100.0 * (latency[sec as usize] as f64 - latency[5] as f64) / latency[5] as f64;
        match sec {
            4 => {
                if d > -4.0 {
                    log::warn!("T{}: short sector is only {:.2}% different", tracknr, d);
                    anomaly = true;
                }
            }
            6 => {
                if d < 4.0 {
                    log::warn!("T{}: long sector is only {:.2}% different", tracknr, d);
                    anomaly = true;
                }
            }
            _ => {
                if !(-2.0..=2.0).contains(&d) {
                    log::warn!("T{}: normal sector is {:.2}% different", tracknr, d);
                    anomaly = true;
                }
            }
        }
    }
    if anomaly {
        ti.flags |= TrackFlags::TIMING_ANOMALY;
    }

    // Anchor the offset to sector 0's header, backing off over any missing
    // initial sectors and the sync-mark offset.
    let first = ti.first_valid_sector().unwrap() as u32;
    ti.data_bitoff = ti
        .data_bitoff
        .wrapping_sub(first * (514 + 48) * 8 * 2)
        .wrapping_sub(3 * 8 * 2);

    // A partial read still determines the whole track.
    if nr_valid != nr_sectors as u32 {
        log::warn!(
            "write_raw(): T{}: reconstructed damaged track ({} sectors read)",
            tracknr,
            nr_valid
        );
        ti.flags |= TrackFlags::RECONSTRUCTED;
        ti.set_all_sectors_valid();
    }

    Ok(lfsr_seed.to_be_bytes().to_vec())
}

/// Encode a CopyLock track from its seed.
pub(crate) fn read_raw(disk: &Disk, tracknr: usize, tbuf: &mut TrackBuffer) -> Result<(), DiskError> {
    let ti = disk.track(tracknr).ok_or(DiskError::SeekError)?;
    let format = ti.format;
    let lfsr_seed: u32 = Cursor::new(&ti.data)
        .read_be()
        .map_err(|_| DiskError::PayloadError)?;

    // The sectors share one generator stream and their speeds straddle the
    // gaps; the track must stay monolithic.
    tbuf.disable_auto_sector_split();

    let mut speed = SPEED_AVG;
    for sec in 0..ti.nr_sectors {
        // Header
        if format == TrackFormat::Copylock {
            tbuf.bits(speed, CellCoding::Mfm, 8, 0xA0 + sec as u32);
            tbuf.bits(speed, CellCoding::Mfm, 16, 0);
            tbuf.bits(speed, CellCoding::Raw, 16, SYNC_LIST[sec as usize] as u32);
        }
        else {
            tbuf.bits(speed, CellCoding::Raw, 16, mfm::encode_word(0xA0 + sec as u16) | (1 << 13));
            tbuf.bits(speed, CellCoding::Mfm, 16, 0);
            tbuf.bits(speed, CellCoding::Raw, 16, mfm::encode_word(0xB0 + sec as u16) | (1 << 13));
        }
        tbuf.bits(speed, CellCoding::Mfm, 8, sec as u32);

        // Data
        let mut lfsr = lfsr_seek(format, lfsr_seed, 0, sec);
        let mut i = 0;
        if sec == 6 {
            for &byte in SEC6_SIG.iter() {
                tbuf.bits(speed, CellCoding::Mfm, 8, byte as u32);
            }
            i = SEC6_SIG.len();
        }
        while i < SECTOR_LEN {
            tbuf.bits(speed, CellCoding::Mfm, 8, lfsr_state_byte(lfsr) as u32);
            lfsr = lfsr_next_state(lfsr);
            i += 1;
        }

        // Footer
        tbuf.bits(speed, CellCoding::Mfm, 8, 0);

        // Move to the next sector's speed before its gap.
        speed = match sec + 1 {
            4 => (SPEED_AVG as u32 * 95 / 100) as u16,
            6 => (SPEED_AVG as u32 * 105 / 100) as u16,
            _ => SPEED_AVG,
        };
        tbuf.gap(speed, 44 * 8);
    }

    Ok(())
}
