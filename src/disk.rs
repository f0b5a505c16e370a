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

    src/disk.rs

    The disk container: track records, the per-disk tag store, and the
    decode/encode entry points that dispatch to format handlers.
*/

//! The `disk` module defines [`Disk`], which owns one [`TrackInfo`] record
//! per track plus a keyed [`DiskTags`] store for state shared between
//! tracks of the same disk (protection tables published by a boot track and
//! consumed by later decodes). Scoping that state to the disk keeps
//! independent disks free of shared mutable state, so they may be processed
//! in parallel.

use crate::{
    bitstream::TrackBitStream,
    format::TrackFormat,
    track::TrackInfo,
    track_buffer::TrackBuffer,
    DiskError,
};
use std::collections::HashMap;

/// Identifiers for the per-disk tag blobs formats may publish.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiskTagId {
    /// 304 bytes: 152 big-endian u16 per-track bit-length offsets,
    /// published by the Za Zelazna Brama boot track.
    ZaZelaznaBramaProtection,
}

/// A keyed, per-disk store of opaque byte blobs. Blobs live for the disk's
/// lifetime and are immutable once published.
#[derive(Debug, Default)]
pub struct DiskTags {
    map: HashMap<DiskTagId, Vec<u8>>,
}

impl DiskTags {
    pub fn get(&self, id: DiskTagId) -> Option<&[u8]> {
        self.map.get(&id).map(Vec::as_slice)
    }

    /// Publish a tag. Publication is idempotent: the first writer wins and
    /// later calls leave the stored blob untouched. Returns the stored
    /// bytes.
    pub fn set(&mut self, id: DiskTagId, bytes: Vec<u8>) -> &[u8] {
        self.map.entry(id).or_insert(bytes).as_slice()
    }
}

/// A disk under decode or encode: a run of track records plus the tag
/// store they share.
pub struct Disk {
    tracks: Vec<TrackInfo>,
    tags: DiskTags,
}

impl Disk {
    /// Create a disk with `nr_tracks` unformatted track records.
    pub fn new(nr_tracks: usize) -> Disk {
        Disk {
            tracks: vec![TrackInfo::default(); nr_tracks],
            tags: DiskTags::default(),
        }
    }

    pub fn nr_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, tracknr: usize) -> Option<&TrackInfo> {
        self.tracks.get(tracknr)
    }

    pub fn track_mut(&mut self, tracknr: usize) -> Option<&mut TrackInfo> {
        self.tracks.get_mut(tracknr)
    }

    pub fn tags(&self) -> &DiskTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut DiskTags {
        &mut self.tags
    }

    /// Reset a track record to an empty record of the given format,
    /// mirroring the handler's geometry.
    pub(crate) fn init_track(&mut self, tracknr: usize, format: TrackFormat) {
        let (nr_sectors, bytes_per_sector) = match format.handler() {
            Some(h) => (h.nr_sectors, h.bytes_per_sector),
            None => (0, 0),
        };
        self.tracks[tracknr] = TrackInfo {
            format,
            nr_sectors,
            bytes_per_sector,
            ..Default::default()
        };
    }

    /// Decode one track from a raw cell stream using the given format's
    /// handler. On success the track record holds the validated payload;
    /// on failure it reverts to unformatted and nothing persists.
    pub fn decode_track(
        &mut self,
        tracknr: usize,
        format: TrackFormat,
        stream: &mut TrackBitStream,
    ) -> Result<(), DiskError> {
        if tracknr >= self.tracks.len() {
            return Err(DiskError::SeekError);
        }
        let handler = format.handler().ok_or(DiskError::UnknownFormat)?;

        self.init_track(tracknr, format);
        match (handler.write_raw)(self, tracknr, stream) {
            Ok(payload) => {
                log::debug!(
                    "decode_track(): T{}: decoded as {} ({} bytes)",
                    tracknr,
                    self.tracks[tracknr].format,
                    payload.len()
                );
                self.tracks[tracknr].data = payload;
                Ok(())
            }
            Err(e) => {
                self.init_track(tracknr, TrackFormat::Unformatted);
                Err(e)
            }
        }
    }

    /// Encode one track's decoded payload into a track buffer using the
    /// handler of the format it was decoded (or loaded) as.
    pub fn encode_track(&self, tracknr: usize, tbuf: &mut TrackBuffer) -> Result<(), DiskError> {
        let ti = self.tracks.get(tracknr).ok_or(DiskError::SeekError)?;
        let handler = ti.format.handler().ok_or(DiskError::UnknownFormat)?;
        (handler.read_raw)(self, tracknr, tbuf)
    }

    /// Install a track payload directly, as a container reader would. All
    /// sectors are taken to be valid.
    pub fn load_track(
        &mut self,
        tracknr: usize,
        format: TrackFormat,
        payload: Vec<u8>,
    ) -> Result<(), DiskError> {
        if tracknr >= self.tracks.len() {
            return Err(DiskError::SeekError);
        }
        format.handler().ok_or(DiskError::UnknownFormat)?;

        self.init_track(tracknr, format);
        let ti = &mut self.tracks[tracknr];
        ti.data = payload;
        ti.set_all_sectors_valid();
        Ok(())
    }
}
