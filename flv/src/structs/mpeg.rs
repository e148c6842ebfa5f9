//! MPEG audio frame headers
//!
//! MP3 payloads in FLV are already frame aligned, so the header of the
//! first frame in each chunk is only decoded for reporting.

use std::fmt::{Display, Formatter};
use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::utils::errors::MpegHeaderError;

pub const MPEG_HEADER_LEN: usize = 4;

const BITRATES_V1: [[u16; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

const BITRATES_V2: [[u16; 15]; 2] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegLayer {
    Layer1,
    Layer2,
    Layer3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegAudioHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub protected: bool,
    /// kbit/s, 0 for free format
    pub bitrate: u16,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

impl MpegAudioHeader {
    pub fn parse(data: &[u8]) -> Result<Self, MpegHeaderError> {
        let short = |_: io::Error| MpegHeaderError::MissingSync(0);
        if data.len() < MPEG_HEADER_LEN {
            return Err(MpegHeaderError::MissingSync(0));
        }

        let mut bs = BitReader::endian(io::Cursor::new(data), BigEndian);

        let sync: u16 = bs.read_var(11).map_err(short)?;
        if sync != 0x7FF {
            return Err(MpegHeaderError::MissingSync(sync));
        }

        let version = match bs.read_var::<u8>(2).map_err(short)? {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return Err(MpegHeaderError::ReservedVersion),
        };
        let layer = match bs.read_var::<u8>(2).map_err(short)? {
            1 => MpegLayer::Layer3,
            2 => MpegLayer::Layer2,
            3 => MpegLayer::Layer1,
            _ => return Err(MpegHeaderError::ReservedLayer),
        };
        let protected = !bs.read_bit().map_err(short)?;

        let bitrate_index: u8 = bs.read_var(4).map_err(short)?;
        if bitrate_index == 0xF {
            return Err(MpegHeaderError::InvalidBitrateIndex(bitrate_index));
        }
        let bitrate = match (version, layer) {
            (MpegVersion::Mpeg1, MpegLayer::Layer1) => BITRATES_V1[0][bitrate_index as usize],
            (MpegVersion::Mpeg1, MpegLayer::Layer2) => BITRATES_V1[1][bitrate_index as usize],
            (MpegVersion::Mpeg1, MpegLayer::Layer3) => BITRATES_V1[2][bitrate_index as usize],
            (_, MpegLayer::Layer1) => BITRATES_V2[0][bitrate_index as usize],
            (_, _) => BITRATES_V2[1][bitrate_index as usize],
        };

        let rate_index: u8 = bs.read_var(2).map_err(short)?;
        let base_rate = match rate_index {
            0 => 44100,
            1 => 48000,
            2 => 32000,
            _ => return Err(MpegHeaderError::ReservedSampleRate),
        };
        let sample_rate = match version {
            MpegVersion::Mpeg1 => base_rate,
            MpegVersion::Mpeg2 => base_rate / 2,
            MpegVersion::Mpeg25 => base_rate / 4,
        };

        let padding = bs.read_bit().map_err(short)?;
        bs.skip(1).map_err(short)?; // private
        let channel_mode = match bs.read_var::<u8>(2).map_err(short)? {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Ok(Self {
            version,
            layer,
            protected,
            bitrate,
            sample_rate,
            padding,
            channel_mode,
        })
    }

    /// Frame size in bytes including the header, `None` for free format.
    pub fn frame_len(&self) -> Option<usize> {
        if self.bitrate == 0 {
            return None;
        }

        let bitrate = self.bitrate as usize * 1000;
        let sample_rate = self.sample_rate as usize;
        let padding = self.padding as usize;

        Some(match (self.layer, self.version) {
            (MpegLayer::Layer1, _) => (12 * bitrate / sample_rate + padding) * 4,
            (MpegLayer::Layer3, MpegVersion::Mpeg2 | MpegVersion::Mpeg25) => {
                72 * bitrate / sample_rate + padding
            }
            _ => 144 * bitrate / sample_rate + padding,
        })
    }

    pub fn channels(&self) -> u8 {
        if self.channel_mode == ChannelMode::Mono {
            1
        } else {
            2
        }
    }
}

/// Tracks the first frame header of an MP3 track and whether the bitrate
/// ever changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MpegStreamInfo {
    pub first_header: Option<MpegAudioHeader>,
    pub vbr: bool,
}

impl MpegStreamInfo {
    pub fn observe(&mut self, chunk: &[u8], timestamp: u32) {
        let header = match MpegAudioHeader::parse(chunk) {
            Ok(header) => header,
            Err(e) => {
                log::trace!("No MPEG audio header at {timestamp} ms: {e}");
                return;
            }
        };

        match self.first_header {
            None => {
                log::debug!("First MP3 frame: {header}");
                self.first_header = Some(header);
            }
            Some(first) if !self.vbr && first.bitrate != header.bitrate => {
                log::debug!(
                    "Bitrate changed from {} to {} kbit/s at {timestamp} ms",
                    first.bitrate,
                    header.bitrate
                );
                self.vbr = true;
            }
            Some(_) => {}
        }
    }
}

impl Display for MpegAudioHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let version = match self.version {
            MpegVersion::Mpeg1 => "MPEG-1",
            MpegVersion::Mpeg2 => "MPEG-2",
            MpegVersion::Mpeg25 => "MPEG-2.5",
        };
        let layer = match self.layer {
            MpegLayer::Layer1 => "I",
            MpegLayer::Layer2 => "II",
            MpegLayer::Layer3 => "III",
        };
        write!(
            f,
            "{version} Layer {layer} {} kbit/s {} Hz, {} channel(s)",
            self.bitrate,
            self.sample_rate,
            self.channels()
        )
    }
}

#[test]
fn test_mpeg1_layer3_header() {
    // MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, joint stereo, no CRC
    let header = MpegAudioHeader::parse(&[0xFF, 0xFB, 0x90, 0x64]).unwrap();
    assert_eq!(header.version, MpegVersion::Mpeg1);
    assert_eq!(header.layer, MpegLayer::Layer3);
    assert!(!header.protected);
    assert_eq!(header.bitrate, 128);
    assert_eq!(header.sample_rate, 44100);
    assert!(!header.padding);
    assert_eq!(header.channel_mode, ChannelMode::JointStereo);
    assert_eq!(header.frame_len(), Some(417));
}

#[test]
fn test_mpeg2_layer3_header() {
    // MPEG-2 Layer III, 64 kbit/s, 22.05 kHz, mono, padded
    let header = MpegAudioHeader::parse(&[0xFF, 0xF3, 0x82, 0xC0]).unwrap();
    assert_eq!(header.version, MpegVersion::Mpeg2);
    assert_eq!(header.bitrate, 64);
    assert_eq!(header.sample_rate, 22050);
    assert!(header.padding);
    assert_eq!(header.channels(), 1);
    assert_eq!(header.frame_len(), Some(209));
}

#[test]
fn test_invalid_mpeg_headers() {
    assert_eq!(
        MpegAudioHeader::parse(&[0x00, 0x00, 0x00, 0x00]),
        Err(MpegHeaderError::MissingSync(0))
    );
    assert_eq!(
        MpegAudioHeader::parse(&[0xFF, 0xEB, 0x90, 0x64]),
        Err(MpegHeaderError::ReservedVersion)
    );
    assert_eq!(
        MpegAudioHeader::parse(&[0xFF, 0xFB, 0xF0, 0x64]),
        Err(MpegHeaderError::InvalidBitrateIndex(15))
    );
    assert_eq!(
        MpegAudioHeader::parse(&[0xFF, 0xFB]),
        Err(MpegHeaderError::MissingSync(0))
    );
}

#[test]
fn test_vbr_detection() {
    let mut info = MpegStreamInfo::default();
    info.observe(&[0xFF, 0xFB, 0x90, 0x64], 0);
    info.observe(&[0x00, 0x01], 26);
    info.observe(&[0xFF, 0xFB, 0x90, 0x64], 52);
    assert!(!info.vbr);
    assert_eq!(info.first_header.map(|h| h.bitrate), Some(128));

    // 160 kbit/s
    info.observe(&[0xFF, 0xFB, 0xA0, 0x64], 78);
    assert!(info.vbr);
    assert_eq!(info.first_header.map(|h| h.bitrate), Some(128));
}
