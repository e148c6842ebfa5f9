use crate::process::TagCounts;
use crate::process::demux::{DemuxState, TagReader};
use crate::process::extract::{AudioCodec, CodecDetail};
use crate::structs::aac::{AacPacketType, AudioSpecificConfig};
use crate::structs::mpeg::MpegStreamInfo;
use crate::structs::tag::{AudioFormatInfo, FlvHeader, TagKind};
use crate::utils::errors::DemuxError;
use log::warn;
use std::io::{Read, Seek};

/// What a full pass over the tags found, without writing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub header: FlvHeader,
    pub file_size: u64,
    pub tags: TagCounts,
    /// Format of the first audio tag.
    pub audio_format: Option<AudioFormatInfo>,
    /// `None` when there is no audio or its format cannot be extracted.
    pub codec: Option<AudioCodec>,
    pub detail: Option<CodecDetail>,
    pub first_audio_timestamp: Option<u32>,
    pub last_audio_timestamp: Option<u32>,
    /// Audio payload bytes excluding the media info byte.
    pub audio_bytes: u64,
    pub truncated: bool,
}

impl StreamSummary {
    pub fn audio_duration_ms(&self) -> Option<u32> {
        match (self.first_audio_timestamp, self.last_audio_timestamp) {
            (Some(first), Some(last)) => Some(last.saturating_sub(first)),
            _ => None,
        }
    }
}

enum Detail {
    Mp3(MpegStreamInfo),
    Aac(Option<AudioSpecificConfig>),
}

impl Detail {
    fn observe(&mut self, body: &[u8], timestamp: u32) {
        match self {
            Detail::Mp3(stream) => stream.observe(body, timestamp),
            Detail::Aac(config) => {
                let Some((&packet_type, payload)) = body.split_first() else {
                    return;
                };
                if AacPacketType::from(packet_type) != AacPacketType::SequenceHeader {
                    return;
                }
                match AudioSpecificConfig::parse(payload) {
                    Ok(parsed) => *config = Some(parsed),
                    Err(e) => warn!("{e} at {timestamp} ms"),
                }
            }
        }
    }

    fn into_codec_detail(self) -> CodecDetail {
        match self {
            Detail::Mp3(stream) => CodecDetail::Mp3(stream),
            Detail::Aac(config) => CodecDetail::Aac { config },
        }
    }
}

/// Walks every tag and summarizes the audio track.
///
/// Unsupported audio formats are reported rather than rejected.
pub fn probe<R, F>(mut tags: TagReader<R>, mut on_progress: F) -> Result<StreamSummary, DemuxError>
where
    R: Read + Seek,
    F: FnMut(f64),
{
    let header = tags.read_header()?;

    let mut counts = TagCounts::default();
    let mut audio_format = None;
    let mut codec = None;
    let mut detail = None;
    let mut first_audio_timestamp = None;
    let mut last_audio_timestamp = None;
    let mut audio_bytes = 0u64;

    while let Some(tag) = tags.next_tag()? {
        counts.record(tag.kind);

        if tag.kind == TagKind::Audio {
            if let Some(format) = tag.audio_format() {
                if audio_format.is_none() {
                    codec = AudioCodec::from_sound_format(format.sound_format);
                    detail = match codec {
                        Some(AudioCodec::Mp3) => Some(Detail::Mp3(MpegStreamInfo::default())),
                        Some(AudioCodec::Aac) => Some(Detail::Aac(None)),
                        None => None,
                    };
                    audio_format = Some(format);
                }

                if let Some(detail) = detail.as_mut() {
                    detail.observe(&tag.body, tag.timestamp);
                }
                first_audio_timestamp.get_or_insert(tag.timestamp);
                last_audio_timestamp = Some(tag.timestamp);
                audio_bytes += tag.body.len() as u64;
            }
        }

        if tags.state() != DemuxState::Done {
            on_progress(tags.progress());
        }
    }

    Ok(StreamSummary {
        header,
        file_size: tags.file_len(),
        tags: counts,
        audio_format,
        codec,
        detail: detail.map(Detail::into_codec_detail),
        first_audio_timestamp,
        last_audio_timestamp,
        audio_bytes,
        truncated: tags.is_truncated(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;
    use crate::process::fixture::flv_file;
    use crate::structs::tag::SoundFormat;
    use std::io::Cursor;

    #[test]
    fn probe_example() -> anyhow::Result<()> {
        let mut calls = 0;
        let summary = probe(TagReader::new(Cursor::new(EXAMPLE_DATA))?, |_| calls += 1)?;

        assert_eq!(calls, 5);
        assert_eq!(summary.file_size, EXAMPLE_DATA.len() as u64);
        assert_eq!(summary.tags.total(), 5);
        assert_eq!(summary.codec, Some(AudioCodec::Aac));
        assert_eq!(
            summary.detail,
            Some(CodecDetail::Aac {
                config: Some(AudioSpecificConfig::parse(&[0x12, 0x10])?)
            })
        );
        assert_eq!(summary.audio_duration_ms(), Some(46));
        assert_eq!(summary.audio_bytes, 3 + 5 + 3);
        assert!(!summary.truncated);
        Ok(())
    }

    #[test]
    fn probe_reports_unsupported_audio() -> anyhow::Result<()> {
        let data = flv_file(&[(0x08, 0, &[0x6E, 0x01, 0x02]), (0x08, 64, &[0x6E, 0x03])]);
        let summary = probe(TagReader::new(Cursor::new(data))?, |_| {})?;

        assert_eq!(
            summary.audio_format.map(|f| f.sound_format),
            Some(SoundFormat::Nellymoser)
        );
        assert_eq!(summary.codec, None);
        assert_eq!(summary.detail, None);
        assert_eq!(summary.audio_bytes, 3);
        Ok(())
    }

    #[test]
    fn probe_tolerates_bad_aac_config() -> anyhow::Result<()> {
        let data = flv_file(&[(0x08, 0, &[0xAF, 0x00, 0x2A, 0x10])]);
        let summary = probe(TagReader::new(Cursor::new(data))?, |_| {})?;
        assert_eq!(summary.detail, Some(CodecDetail::Aac { config: None }));
        Ok(())
    }

    #[test]
    fn probe_without_audio() -> anyhow::Result<()> {
        let data = flv_file(&[(0x09, 0, &[0x17, 0x00]), (0x09, 40, &[0x27, 0x00])]);
        let summary = probe(TagReader::new(Cursor::new(data))?, |_| {})?;
        assert_eq!(summary.tags.video, 2);
        assert_eq!(summary.audio_format, None);
        assert_eq!(summary.audio_duration_ms(), None);
        Ok(())
    }
}
