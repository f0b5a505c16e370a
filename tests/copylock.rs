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

    tests/copylock.rs

    End-to-end coverage of the CopyLock protection track.
*/

mod common;

use common::*;
use fluxgate::{
    codec,
    format::copylock::{lfsr_seek, lfsr_state_byte},
    CellCoding,
    Disk,
    DiskError,
    TrackBitStream,
    TrackBuffer,
    TrackFlags,
    TrackFormat,
    SPEED_AVG,
};

const SEED: u32 = 0x0012_3456;

/// Raw cells from one sector's header to the next, including the gap.
const SECTOR_CELLS: usize = (514 + 48) * 8 * 2;

fn seed_payload() -> Vec<u8> {
    SEED.to_be_bytes().to_vec()
}

#[test]
fn round_trip_preserves_the_seed() {
    init();
    for format in [TrackFormat::Copylock, TrackFormat::CopylockOld] {
        let mut disk = Disk::new(160);
        disk.load_track(2, format, seed_payload()).unwrap();

        let mut stream = encode_to_stream(&disk, 2);
        disk.decode_track(2, format, &mut stream).unwrap();

        let ti = disk.track(2).unwrap();
        assert_eq!(ti.data, seed_payload(), "{format}");
        assert_eq!(ti.valid_sector_count(), 11);
        assert_eq!(ti.data_bitoff, 0);
        assert!(!ti.flags.contains(TrackFlags::RECONSTRUCTED));
        assert!(!ti.flags.contains(TrackFlags::TIMING_ANOMALY));
    }
}

#[test]
fn track_length_and_speed_fingerprint() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, seed_payload()).unwrap();

    let (bits, speeds) = encode_to_parts(&disk, 2);
    assert_eq!(bits.len(), 11 * SECTOR_CELLS);

    // Sector 4 runs 5% fast and sector 6 5% slow, with each change taking
    // effect at the start of the preceding sector's gap.
    let data_cell_of = |sec: usize| sec * SECTOR_CELLS + 100;
    assert_eq!(speeds[data_cell_of(3)], SPEED_AVG);
    assert_eq!(speeds[data_cell_of(4)], 950);
    assert_eq!(speeds[data_cell_of(5)], SPEED_AVG);
    assert_eq!(speeds[data_cell_of(6)], 1050);
    assert_eq!(speeds[data_cell_of(7)], SPEED_AVG);

    let gap_cell_of = |sec: usize| (sec + 1) * SECTOR_CELLS - 10;
    assert_eq!(speeds[gap_cell_of(3)], 950);
    assert_eq!(speeds[gap_cell_of(5)], 1050);

    // The short sector balances the long one.
    let total: u64 = speeds.iter().map(|&s| s as u64).sum();
    assert_eq!(total, 11 * SECTOR_CELLS as u64 * SPEED_AVG as u64);
}

#[test]
fn reconstructs_the_track_from_a_single_sector() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, seed_payload()).unwrap();
    let (bits, speeds) = encode_to_parts(&disk, 2);

    // Erase sectors 0-9, leaving only sector 10 intact.
    let mut stream = stream_over_range(&bits, &speeds, 10 * SECTOR_CELLS..11 * SECTOR_CELLS);
    disk.decode_track(2, TrackFormat::Copylock, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    assert_eq!(ti.data, seed_payload());
    assert_eq!(ti.valid_sector_count(), 11);
    assert!(ti.flags.contains(TrackFlags::RECONSTRUCTED));

    // Re-encoding the reconstructed track yields the original stream.
    let (rebuilt_bits, rebuilt_speeds) = encode_to_parts(&disk, 2);
    assert_eq!(rebuilt_bits, bits);
    assert_eq!(rebuilt_speeds, speeds);
}

#[test]
fn every_single_sector_determines_the_track() {
    init();
    for format in [TrackFormat::Copylock, TrackFormat::CopylockOld] {
        let mut disk = Disk::new(160);
        disk.load_track(2, format, seed_payload()).unwrap();
        let (bits, speeds) = encode_to_parts(&disk, 2);

        for sec in 0..11 {
            let mut stream =
                stream_over_range(&bits, &speeds, sec * SECTOR_CELLS..(sec + 1) * SECTOR_CELLS);
            disk.decode_track(2, format, &mut stream).unwrap();
            let ti = disk.track(2).unwrap();
            assert_eq!(ti.data, seed_payload(), "{format} sector {sec}");
            assert_eq!(ti.valid_sector_count(), 11);
        }
    }
}

#[test]
fn sector_six_carries_the_signature() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, seed_payload()).unwrap();
    let (bits, _) = encode_to_parts(&disk, 2);

    // Sector 6's data area: 80 cells of header and index, then 512 coded
    // bytes.
    let data_start = 6 * SECTOR_CELLS + 80;
    assert_eq!(data_start % 8, 0);
    let raw = &bits.to_bytes()[data_start / 8..data_start / 8 + 1024];
    let dat = codec::decode_bytes(CellCoding::Mfm, raw);

    assert_eq!(&dat[..16], b"Rob Northen Comp");
    assert_eq!(dat[0], 0x52);
    assert_eq!(dat[15], 0x70);
    // The generator stream resumes right where the seek lands it.
    assert_eq!(dat[16], lfsr_state_byte(lfsr_seek(TrackFormat::Copylock, SEED, 0, 6)));
}

#[test]
fn corrupt_signature_rejects_sector_six() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, seed_payload()).unwrap();
    let (mut bits, speeds) = encode_to_parts(&disk, 2);

    // Flip the first data cell of the signature ('R' -> 0xD2).
    let sig_cell = 6 * SECTOR_CELLS + 80 + 1;
    bits.set(sig_cell, !bits[sig_cell]);

    // Alone, the damaged sector must not decode.
    let mut stream = stream_over_range(&bits, &speeds, 6 * SECTOR_CELLS..7 * SECTOR_CELLS);
    assert!(matches!(
        disk.decode_track(2, TrackFormat::Copylock, &mut stream),
        Err(DiskError::StreamExhausted)
    ));

    // Within the full track the other ten sectors carry the decode, and
    // sector 6 is reconstructed.
    let mut stream = TrackBitStream::with_speeds(bits, speeds);
    disk.decode_track(2, TrackFormat::Copylock, &mut stream).unwrap();
    let ti = disk.track(2).unwrap();
    assert_eq!(ti.data, seed_payload());
    assert!(ti.flags.contains(TrackFlags::RECONSTRUCTED));
}

#[test]
fn uniform_timing_raises_an_anomaly() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, seed_payload()).unwrap();
    let (bits, _) = encode_to_parts(&disk, 2);

    // A capture with no speed variation decodes fine, but the timing
    // fingerprint is gone and the track says so.
    let mut stream = TrackBitStream::new(bits);
    disk.decode_track(2, TrackFormat::Copylock, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    assert_eq!(ti.valid_sector_count(), 11);
    assert!(ti.flags.contains(TrackFlags::TIMING_ANOMALY));
}

#[test]
fn all_zero_stream_is_rejected_as_degenerate() {
    init();
    // A sector whose payload is all zero matches the zero LFSR stream;
    // the recovered seed is degenerate and must be refused.
    let mut tbuf = TrackBuffer::new();
    tbuf.bits(SPEED_AVG, CellCoding::Mfm, 8, 0xA0);
    tbuf.bits(SPEED_AVG, CellCoding::Mfm, 16, 0);
    tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, 0x8A91);
    tbuf.bits(SPEED_AVG, CellCoding::Mfm, 8, 0);
    for _ in 0..512 {
        tbuf.bits(SPEED_AVG, CellCoding::Mfm, 8, 0);
    }
    tbuf.bits(SPEED_AVG, CellCoding::Mfm, 8, 0);
    tbuf.gap(SPEED_AVG, 44 * 8);

    let mut disk = Disk::new(160);
    let mut stream = TrackBitStream::from(tbuf);
    assert!(matches!(
        disk.decode_track(2, TrackFormat::Copylock, &mut stream),
        Err(DiskError::StreamExhausted)
    ));
}

#[test]
fn encode_requires_a_seed_payload() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::Copylock, vec![]).unwrap();
    let mut tbuf = TrackBuffer::new();
    assert!(matches!(
        disk.encode_track(2, &mut tbuf),
        Err(DiskError::PayloadError)
    ));
}
