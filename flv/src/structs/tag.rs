//! Container header and tag records
//!
//! Layout of the FLV file header, the 11-byte tag header and the audio
//! format descriptor carried by the first payload byte of every audio tag.

use std::fmt::{Display, Formatter};

/// "FLV" followed by version 1.
pub const FLV_SIGNATURE: u32 = 0x464C5601;
pub const FLV_HEADER_LEN: u64 = 9;
pub const TAG_HEADER_LEN: u64 = 11;
pub const PREVIOUS_TAG_SIZE_LEN: u64 = 4;

/// Decoded 9-byte file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    pub version: u8,
    pub has_audio: bool,
    pub has_video: bool,
    pub data_offset: u32,
}

impl FlvHeader {
    pub fn new(signature: u32, flags: u8, data_offset: u32) -> Self {
        Self {
            version: (signature & 0xFF) as u8,
            has_audio: flags & 0x04 != 0,
            has_video: flags & 0x01 != 0,
            data_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Audio,
    Video,
    Meta,
    Unknown(u8),
}

impl From<u8> for TagKind {
    fn from(tag_type: u8) -> Self {
        match tag_type {
            0x08 => TagKind::Audio,
            0x09 => TagKind::Video,
            0x12 => TagKind::Meta,
            other => TagKind::Unknown(other),
        }
    }
}

impl Display for TagKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagKind::Audio => write!(f, "audio"),
            TagKind::Video => write!(f, "video"),
            TagKind::Meta => write!(f, "script data"),
            TagKind::Unknown(t) => write!(f, "unknown ({t:#04X})"),
        }
    }
}

/// One record of the tag loop.
///
/// `media_info` and `body` are empty for tags whose declared size is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub data_size: u32,
    pub timestamp: u32,
    pub media_info: Option<u8>,
    pub body: Vec<u8>,
}

impl Tag {
    pub fn audio_format(&self) -> Option<AudioFormatInfo> {
        match (self.kind, self.media_info) {
            (TagKind::Audio, Some(info)) => Some(AudioFormatInfo::from(info)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundFormat {
    LinearPcmPlatform,
    Adpcm,
    Mp3,
    LinearPcmLe,
    Nellymoser16kMono,
    Nellymoser8kMono,
    Nellymoser,
    G711ALaw,
    G711MuLaw,
    Aac,
    Speex,
    Mp3_8k,
    DeviceSpecific,
    Reserved(u8),
}

impl SoundFormat {
    pub fn id(&self) -> u8 {
        match self {
            SoundFormat::LinearPcmPlatform => 0,
            SoundFormat::Adpcm => 1,
            SoundFormat::Mp3 => 2,
            SoundFormat::LinearPcmLe => 3,
            SoundFormat::Nellymoser16kMono => 4,
            SoundFormat::Nellymoser8kMono => 5,
            SoundFormat::Nellymoser => 6,
            SoundFormat::G711ALaw => 7,
            SoundFormat::G711MuLaw => 8,
            SoundFormat::Aac => 10,
            SoundFormat::Speex => 11,
            SoundFormat::Mp3_8k => 14,
            SoundFormat::DeviceSpecific => 15,
            SoundFormat::Reserved(id) => *id,
        }
    }
}

impl From<u8> for SoundFormat {
    fn from(id: u8) -> Self {
        match id & 0x0F {
            0 => SoundFormat::LinearPcmPlatform,
            1 => SoundFormat::Adpcm,
            2 => SoundFormat::Mp3,
            3 => SoundFormat::LinearPcmLe,
            4 => SoundFormat::Nellymoser16kMono,
            5 => SoundFormat::Nellymoser8kMono,
            6 => SoundFormat::Nellymoser,
            7 => SoundFormat::G711ALaw,
            8 => SoundFormat::G711MuLaw,
            10 => SoundFormat::Aac,
            11 => SoundFormat::Speex,
            14 => SoundFormat::Mp3_8k,
            15 => SoundFormat::DeviceSpecific,
            other => SoundFormat::Reserved(other),
        }
    }
}

impl Display for SoundFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundFormat::Adpcm => write!(f, "ADPCM"),
            SoundFormat::Nellymoser16kMono
            | SoundFormat::Nellymoser8kMono
            | SoundFormat::Nellymoser => write!(f, "Nellymoser"),
            SoundFormat::Mp3 | SoundFormat::Mp3_8k => write!(f, "MP3"),
            SoundFormat::Aac => write!(f, "AAC"),
            other => write!(f, "format={}", other.id()),
        }
    }
}

/// First payload byte of an audio tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatInfo {
    pub sound_format: SoundFormat,
    pub sound_rate: u32,
    pub sample_bits: u8,
    pub stereo: bool,
}

impl From<u8> for AudioFormatInfo {
    fn from(media_info: u8) -> Self {
        let sound_rate = match (media_info >> 2) & 0x03 {
            0 => 5512,
            1 => 11025,
            2 => 22050,
            _ => 44100,
        };

        Self {
            sound_format: SoundFormat::from(media_info >> 4),
            sound_rate,
            sample_bits: if media_info & 0x02 != 0 { 16 } else { 8 },
            stereo: media_info & 0x01 != 0,
        }
    }
}

impl Display for AudioFormatInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} Hz {}-bit {}",
            self.sound_format,
            self.sound_rate,
            self.sample_bits,
            if self.stereo { "stereo" } else { "mono" }
        )
    }
}

#[test]
fn test_audio_format_info() {
    // AAC, 44 kHz, 16-bit, stereo
    let info = AudioFormatInfo::from(0xAF);
    assert_eq!(info.sound_format, SoundFormat::Aac);
    assert_eq!(info.sound_rate, 44100);
    assert_eq!(info.sample_bits, 16);
    assert!(info.stereo);

    // MP3, 22 kHz, 8-bit, mono
    let info = AudioFormatInfo::from(0x28);
    assert_eq!(info.sound_format, SoundFormat::Mp3);
    assert_eq!(info.sound_rate, 22050);
    assert_eq!(info.sample_bits, 8);
    assert!(!info.stereo);
}

#[test]
fn test_sound_format_names() {
    assert_eq!(SoundFormat::from(1).to_string(), "ADPCM");
    assert_eq!(SoundFormat::from(4).to_string(), "Nellymoser");
    assert_eq!(SoundFormat::from(5).to_string(), "Nellymoser");
    assert_eq!(SoundFormat::from(6).to_string(), "Nellymoser");
    assert_eq!(SoundFormat::from(11).to_string(), "format=11");
    assert_eq!(SoundFormat::from(13).to_string(), "format=13");
    assert_eq!(SoundFormat::from(14), SoundFormat::Mp3_8k);
    assert_eq!(SoundFormat::from(14).id(), 14);
}

#[test]
fn test_header_flags() {
    let header = FlvHeader::new(FLV_SIGNATURE, 0x05, 9);
    assert_eq!(header.version, 1);
    assert!(header.has_audio);
    assert!(header.has_video);

    let header = FlvHeader::new(FLV_SIGNATURE, 0x04, 13);
    assert!(!header.has_video);
    assert_eq!(header.data_offset, 13);
}
