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

    tests/common/mod.rs

    Common support routines for tests
*/

use bit_vec::BitVec;
use fluxgate::{Disk, TrackBitStream, TrackBuffer};
use rand::{rngs::SmallRng, RngCore, SeedableRng};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode a track and hand its cells back as a readable stream, as if the
/// written track had been captured again.
#[allow(dead_code)]
pub fn encode_to_stream(disk: &Disk, tracknr: usize) -> TrackBitStream {
    let mut tbuf = TrackBuffer::new();
    disk.encode_track(tracknr, &mut tbuf).expect("track should encode");
    TrackBitStream::from(tbuf)
}

/// Encode a track and return the raw cells and speed map.
#[allow(dead_code)]
pub fn encode_to_parts(disk: &Disk, tracknr: usize) -> (BitVec, Vec<u16>) {
    let mut tbuf = TrackBuffer::new();
    disk.encode_track(tracknr, &mut tbuf).expect("track should encode");
    tbuf.into_parts()
}

/// A stream over a sub-range of a track's cells, as left by a damaged or
/// partial read.
#[allow(dead_code)]
pub fn stream_over_range(bits: &BitVec, speeds: &[u16], range: std::ops::Range<usize>) -> TrackBitStream {
    let sliced: BitVec = bits.iter().skip(range.start).take(range.len()).collect();
    TrackBitStream::with_speeds(sliced, speeds[range].to_vec())
}

#[allow(dead_code)]
pub fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}
