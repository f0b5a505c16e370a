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

    tests/ego.rs

    End-to-end coverage of the ego single-sector formats and the
    Za Zelazna Brama boot-track protection chain.
*/

mod common;

use common::*;
use fluxgate::{
    CellCoding,
    Disk,
    DiskError,
    DiskTagId,
    TrackBitStream,
    TrackBuffer,
    TrackFormat,
    SPEED_AVG,
};

#[test]
fn zero_payload_round_trip() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::BehindTheIronGate, vec![0u8; 6144]).unwrap();

    let (bits, speeds) = encode_to_parts(&disk, 2);
    // Sync, then 1536 zero words and a zero checksum: pure clock runs, with
    // the first clock suppressed by the sync word's trailing one bit.
    assert_eq!(bits.len(), 16 + 1537 * 64);
    let bytes = bits.to_bytes();
    assert_eq!(bytes[..3], [0x89, 0x51, 0x2A]);
    assert!(bytes[3..].iter().all(|&b| b == 0xAA));

    let mut stream = TrackBitStream::with_speeds(bits, speeds);
    disk.decode_track(2, TrackFormat::BehindTheIronGate, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    assert_eq!(ti.format, TrackFormat::BehindTheIronGate);
    assert_eq!(ti.data, vec![0u8; 6144]);
    assert_eq!(ti.valid_sector_count(), 1);
    assert_eq!(ti.data_bitoff, 0);
    // Iron Gate applies no total-bits protection.
    assert_eq!(ti.total_bits, 0);
}

#[test]
fn all_variants_round_trip() {
    init();
    let formats = [
        TrackFormat::BehindTheIronGate,
        TrackFormat::ZaZelaznaBrama,
        TrackFormat::AbcChemiiA,
        TrackFormat::AbcChemiiB,
        TrackFormat::AbcChemiiTimsoftA,
        TrackFormat::AbcChemiiTimsoftB,
        TrackFormat::Inferior,
    ];

    for (i, format) in formats.into_iter().enumerate() {
        let mut disk = Disk::new(160);
        let len = format.handler().unwrap().bytes_per_sector;
        let payload = random_payload(len, 0x42 + i as u64);
        disk.load_track(3, format, payload.clone()).unwrap();

        let mut stream = encode_to_stream(&disk, 3);
        disk.decode_track(3, format, &mut stream).unwrap();
        assert_eq!(disk.track(3).unwrap().data, payload, "{format}");
    }
}

#[test]
fn b_variants_use_the_standard_sync() {
    init();
    let mut disk = Disk::new(160);
    disk.load_track(3, TrackFormat::AbcChemiiB, random_payload(5632, 7)).unwrap();

    let (bits, _) = encode_to_parts(&disk, 3);
    assert_eq!(bits.to_bytes()[..2], [0x44, 0x89]);
}

#[test]
fn corrupt_word_fails_the_checksum_gate() {
    init();
    // A hand-built track whose stored checksum does not cover the data:
    // 1536 words of which one is 0xDEADBEEF, with a checksum for all-zero.
    let mut tbuf = TrackBuffer::new();
    tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, 0x8951);
    for word in 0..1536 {
        let value = if word == 100 { 0xDEAD_BEEF } else { 0 };
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, value);
    }
    tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, 0);

    let mut disk = Disk::new(160);
    let mut stream = TrackBitStream::from(tbuf);
    assert!(matches!(
        disk.decode_track(2, TrackFormat::BehindTheIronGate, &mut stream),
        Err(DiskError::StreamExhausted)
    ));
    assert_eq!(disk.track(2).unwrap().format, TrackFormat::Unformatted);
}

#[test]
fn decode_rescans_for_a_later_sync() {
    init();
    // The same corrupt block, followed by an intact one. The decoder must
    // reject the first sync candidate and validate at the second.
    let mut tbuf = TrackBuffer::new();
    tbuf.bits(SPEED_AVG, CellCoding::Raw, 16, 0x8951);
    for word in 0..1536 {
        let value = if word == 100 { 0xDEAD_BEEF } else { 0 };
        tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, value);
    }
    tbuf.bits(SPEED_AVG, CellCoding::MfmOddEven, 32, 0);

    let mut disk = Disk::new(160);
    disk.load_track(2, TrackFormat::BehindTheIronGate, vec![0u8; 6144]).unwrap();
    disk.encode_track(2, &mut tbuf).unwrap();

    let mut stream = TrackBitStream::from(tbuf);
    disk.decode_track(2, TrackFormat::BehindTheIronGate, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    assert_eq!(ti.data, vec![0u8; 6144]);
    // The decoded region is the second block.
    assert_eq!(ti.data_bitoff, 16 + 1537 * 64);
}

#[test]
fn boot_track_publishes_the_protection_table() {
    init();
    let mut disk = Disk::new(160);

    // An AmigaDOS-shaped boot payload carrying the 152-entry table at
    // byte offsets 4..308; entry 10 is 0x720 + 100.
    let mut payload = vec![0u8; 5632];
    for t in 0..152usize {
        let off: u16 = if t == 10 { 0x0720 + 100 } else { 0x0720 };
        payload[4 + 2 * t..4 + 2 * t + 2].copy_from_slice(&off.to_be_bytes());
    }

    disk.load_track(0, TrackFormat::AmigaDos, payload.clone()).unwrap();
    let mut stream = encode_to_stream(&disk, 0);
    disk.decode_track(0, TrackFormat::ZaZelaznaBramaBoot, &mut stream).unwrap();

    // The record ends up typed as the delegate decoded it, with the
    // payload passed through unchanged.
    let ti = disk.track(0).unwrap();
    assert_eq!(ti.format, TrackFormat::AmigaDos);
    assert_eq!(ti.data, payload);

    let tag = disk.tags().get(DiskTagId::ZaZelaznaBramaProtection).unwrap();
    assert_eq!(tag.len(), 304);
    assert_eq!(tag[20..22], (0x0720u16 + 100).to_be_bytes());

    // A brama track at index 10 picks its total bit length off the tag.
    disk.load_track(10, TrackFormat::ZaZelaznaBrama, vec![0u8; 6144]).unwrap();
    let mut stream = encode_to_stream(&disk, 10);
    disk.decode_track(10, TrackFormat::ZaZelaznaBrama, &mut stream).unwrap();

    let ti = disk.track(10).unwrap();
    assert_eq!(ti.total_bits, 100_900 + 100 + 46);
    assert_eq!(ti.valid_sector_count(), 1);
}

#[test]
fn brama_without_the_tag_still_decodes() {
    init();
    let mut disk = Disk::new(160);
    let payload = random_payload(6144, 11);
    disk.load_track(10, TrackFormat::ZaZelaznaBrama, payload.clone()).unwrap();

    let mut stream = encode_to_stream(&disk, 10);
    disk.decode_track(10, TrackFormat::ZaZelaznaBrama, &mut stream).unwrap();

    let ti = disk.track(10).unwrap();
    assert_eq!(ti.data, payload);
    // No protection tag published, so no total-bits adjustment.
    assert_eq!(ti.total_bits, 0);
}

#[test]
fn boot_track_fails_with_its_delegate() {
    init();
    let mut disk = Disk::new(160);
    let mut stream = TrackBitStream::new(bit_vec::BitVec::from_elem(4096, false));
    assert!(disk.decode_track(0, TrackFormat::ZaZelaznaBramaBoot, &mut stream).is_err());
    assert_eq!(disk.track(0).unwrap().format, TrackFormat::Unformatted);
    assert!(disk.tags().get(DiskTagId::ZaZelaznaBramaProtection).is_none());
}

#[test]
fn abc_chemii_pins_offset_and_length() {
    init();
    let mut disk = Disk::new(160);
    let payload = random_payload(5632, 3);
    disk.load_track(2, TrackFormat::AbcChemiiA, payload.clone()).unwrap();

    let mut stream = encode_to_stream(&disk, 2);
    disk.decode_track(2, TrackFormat::AbcChemiiA, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    assert_eq!(ti.data, payload);
    // Table entry for track 2 is 0x0A57: 100900 + (0x0A57 - 0x0A15).
    assert_eq!(ti.total_bits, 100_966);
    // The decoded region is pinned regardless of where the sync was found.
    assert_eq!(ti.data_bitoff, 100_900);
}

#[test]
fn timsoft_uses_its_own_table() {
    init();
    let mut disk = Disk::new(160);
    let payload = random_payload(5632, 4);
    disk.load_track(2, TrackFormat::AbcChemiiTimsoftA, payload.clone()).unwrap();

    let mut stream = encode_to_stream(&disk, 2);
    disk.decode_track(2, TrackFormat::AbcChemiiTimsoftA, &mut stream).unwrap();

    let ti = disk.track(2).unwrap();
    // Table entry for track 2 is 0x0BB3.
    assert_eq!(ti.total_bits, 100_900 + (0x0BB3 - 0x0A15));
    assert_eq!(ti.data_bitoff, 100_900);
}
