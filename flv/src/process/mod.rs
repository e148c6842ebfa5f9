use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::structs::tag::TagKind;

/// Tag loop over the container.
///
/// Provides the [`TagReader`](demux::TagReader) for validating the file header
/// and walking [`Tag`](crate::structs::tag::Tag) records, and the
/// [`Demuxer`](demux::Demuxer) that forwards audio tags to an extractor.
pub mod demux;

/// Codec specific audio writers.
///
/// Provides the [`AudioExtractor`](extract::AudioExtractor) variants for MP3
/// and AAC and the [`OutputFile`](extract::OutputFile) guard they write into.
pub mod extract;

/// Read-only stream inspection.
///
/// Provides [`probe`](probe::probe) which summarizes a file without writing
/// any output.
pub mod probe;

/// A small FLV file: one AAC sequence header, a script tag, a video tag and
/// two raw AAC access units.
pub const EXAMPLE_DATA: &[u8] = &[
    0x46, 0x4C, 0x56, 0x01, 0x05, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00,
    0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xAF, 0x00, 0x12, 0x10, 0x00, 0x00, 0x00, 0x0F,
    0x12, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x0E, 0x09, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x17, 0x00, 0x00,
    0x00, 0x00, 0x0D, 0x08, 0x00, 0x00, 0x06, 0x00, 0x00, 0x17, 0x00, 0x00, 0x00, 0x00, 0xAF, 0x01,
    0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x11, 0x08, 0x00, 0x00, 0x04, 0x00, 0x00, 0x2E, 0x00,
    0x00, 0x00, 0x00, 0xAF, 0x01, 0x21, 0x10, 0x00, 0x00, 0x00, 0x0F,
];

/// Cancellation flag shared with other threads.
///
/// Cancelling makes the running extraction fail with
/// [`DemuxError::Cancelled`](crate::utils::errors::DemuxError::Cancelled)
/// before the next tag, which discards the partial output.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagCounts {
    pub audio: u64,
    pub video: u64,
    pub meta: u64,
    pub unknown: u64,
}

impl TagCounts {
    pub fn record(&mut self, kind: TagKind) {
        match kind {
            TagKind::Audio => self.audio += 1,
            TagKind::Video => self.video += 1,
            TagKind::Meta => self.meta += 1,
            TagKind::Unknown(_) => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.audio + self.video + self.meta + self.unknown
    }
}


#[test]
fn example_data_layout() {
    let data = fixture::flv_file(&[
        (0x08, 0, &[0xAF, 0x00, 0x12, 0x10]),
        (0x12, 0, &[0x02, 0x00, 0x00]),
        (0x09, 0, &[0x17, 0x00]),
        (0x08, 23, &[0xAF, 0x01, 0xDE, 0xAD, 0xBE, 0xEF]),
        (0x08, 46, &[0xAF, 0x01, 0x21, 0x10]),
    ]);
    assert_eq!(data, EXAMPLE_DATA);

    let mut counts = TagCounts::default();
    for kind in [TagKind::Audio, TagKind::Audio, TagKind::Video, TagKind::Unknown(3)] {
        counts.record(kind);
    }
    assert_eq!(counts.audio, 2);
    assert_eq!(counts.total(), 4);
}
