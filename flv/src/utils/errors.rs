use std::io;

use crate::structs::tag::SoundFormat;

#[macro_export]
macro_rules! log_or_err {
    ($fail_level:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum DemuxError {
    #[error("Invalid input file, impossible to extract audio track: {0}")]
    InvalidContainer(String),

    #[error("Unable to extract audio ({0} is unsupported)")]
    UnsupportedAudioFormat(SoundFormat),

    #[error(transparent)]
    InvalidAacConfig(#[from] AacConfigError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error("Truncated {what} at offset {offset}: need {needed} bytes, {remaining} remain")]
    Truncated {
        what: &'static str,
        offset: u64,
        needed: u64,
        remaining: u64,
    },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DemuxError {
    /// Whether this error stopped extraction before any tag was read.
    pub fn is_invalid_container(&self) -> bool {
        matches!(self, DemuxError::InvalidContainer(_))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AacConfigError {
    #[error("AudioSpecificConfig is too short: {0} bytes")]
    TooShort(usize),

    #[error("Unsupported AAC profile (audio object type {0})")]
    UnsupportedProfile(u8),

    #[error("Invalid AAC sample rate index: {0}")]
    InvalidSampleRateIndex(u8),

    #[error("Invalid AAC channel configuration: {0}")]
    InvalidChannelConfig(u8),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Empty audio chunk at {0} ms")]
    Empty(u32),

    #[error("AAC access unit at {0} ms precedes the AudioSpecificConfig")]
    MissingAacConfig(u32),

    #[error("Unknown AAC packet type {packet_type} at {timestamp} ms")]
    UnknownAacPacketType { packet_type: u8, timestamp: u32 },

    #[error("AAC access unit of {0} bytes does not fit in an ADTS frame")]
    AdtsFrameTooLong(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MpegHeaderError {
    #[error("Missing MPEG audio frame sync, read {0:#06X}")]
    MissingSync(u16),

    #[error("Reserved MPEG audio version")]
    ReservedVersion,

    #[error("Reserved MPEG audio layer")]
    ReservedLayer,

    #[error("Invalid bitrate index {0}")]
    InvalidBitrateIndex(u8),

    #[error("Reserved sample rate index")]
    ReservedSampleRate,
}
