//! AAC configuration and ADTS framing
//!
//! FLV carries AAC as raw access units preceded by a single
//! AudioSpecificConfig sequence header. Standalone `.aac` files need every
//! access unit wrapped in an ADTS header instead, which is rebuilt here from
//! the cached configuration.

use std::fmt::{Display, Formatter};
use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::utils::errors::{AacConfigError, ChunkError};

pub const ADTS_HEADER_LEN: usize = 7;
pub const ADTS_MAX_FRAME_LEN: usize = 0x1FFF;
pub const ADTS_SYNC_WORD: u16 = 0xFFF;

const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    SequenceHeader,
    Raw,
    Unknown(u8),
}

impl From<u8> for AacPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AacPacketType::SequenceHeader,
            1 => AacPacketType::Raw,
            other => AacPacketType::Unknown(other),
        }
    }
}

/// The fields of an MPEG-4 AudioSpecificConfig that ADTS can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    pub object_type: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
}

impl AudioSpecificConfig {
    pub fn parse(data: &[u8]) -> Result<Self, AacConfigError> {
        if data.len() < 2 {
            return Err(AacConfigError::TooShort(data.len()));
        }

        let too_short = |_: io::Error| AacConfigError::TooShort(data.len());
        let mut bs = BitReader::endian(io::Cursor::new(data), BigEndian);

        let mut object_type: u8 = bs.read_var(5).map_err(too_short)?;
        if object_type == 31 {
            let extension: u8 = bs.read_var(6).map_err(too_short)?;
            object_type = 32 + extension;
        }
        let sampling_index: u8 = bs.read_var(4).map_err(too_short)?;
        if sampling_index == 0xF {
            // explicit 24-bit frequency, not representable in ADTS
            return Err(AacConfigError::InvalidSampleRateIndex(sampling_index));
        }
        let channel_config: u8 = bs.read_var(4).map_err(too_short)?;

        let config = Self {
            object_type,
            sampling_index,
            channel_config,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AacConfigError> {
        if !(1..=4).contains(&self.object_type) {
            return Err(AacConfigError::UnsupportedProfile(self.object_type));
        }
        if self.sampling_index > 12 {
            return Err(AacConfigError::InvalidSampleRateIndex(self.sampling_index));
        }
        if self.channel_config > 6 {
            return Err(AacConfigError::InvalidChannelConfig(self.channel_config));
        }
        Ok(())
    }

    /// ADTS profile, the object type minus one.
    pub fn profile(&self) -> u8 {
        self.object_type.saturating_sub(1)
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLING_FREQUENCIES[self.sampling_index as usize]
    }
}

impl Display for AudioSpecificConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let profile = match self.object_type {
            1 => "Main",
            2 => "LC",
            3 => "SSR",
            _ => "LTP",
        };
        write!(
            f,
            "AAC {profile} {} Hz, channel configuration {}",
            self.sample_rate(),
            self.channel_config
        )
    }
}

/// Fixed plus variable ADTS header without CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub profile: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
    pub frame_length: u16,
}

impl AdtsHeader {
    pub fn for_payload(config: &AudioSpecificConfig, payload_len: usize) -> Result<Self, ChunkError> {
        let frame_length = payload_len + ADTS_HEADER_LEN;
        if frame_length > ADTS_MAX_FRAME_LEN {
            return Err(ChunkError::AdtsFrameTooLong(payload_len));
        }

        Ok(Self {
            profile: config.profile(),
            sampling_index: config.sampling_index,
            channel_config: config.channel_config,
            frame_length: frame_length as u16,
        })
    }

    pub fn write<W: io::Write>(&self, writer: W) -> io::Result<()> {
        let mut bw = BitWriter::endian(writer, BigEndian);

        bw.write_var(12, ADTS_SYNC_WORD)?;
        bw.write_bit(false)?; // MPEG-4
        bw.write_var(2, 0u8)?; // layer
        bw.write_bit(true)?; // protection absent
        bw.write_var(2, self.profile)?;
        bw.write_var(4, self.sampling_index)?;
        bw.write_bit(false)?; // private
        bw.write_var(3, self.channel_config)?;
        bw.write_bit(false)?; // original/copy
        bw.write_bit(false)?; // home
        bw.write_bit(false)?; // copyright id bit
        bw.write_bit(false)?; // copyright id start
        bw.write_var(13, self.frame_length)?;
        bw.write_var(11, 0x7FFu16)?; // buffer fullness, VBR
        bw.write_var(2, 0u8)?; // one raw data block

        Ok(())
    }

    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut bs = BitReader::endian(io::Cursor::new(data), BigEndian);

        let sync: u16 = bs.read_var(12)?;
        if sync != ADTS_SYNC_WORD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid ADTS sync word {sync:#05X}"),
            ));
        }
        bs.skip(4)?; // id, layer, protection absent
        let profile: u8 = bs.read_var(2)?;
        let sampling_index: u8 = bs.read_var(4)?;
        bs.skip(1)?;
        let channel_config: u8 = bs.read_var(3)?;
        bs.skip(4)?;
        let frame_length: u16 = bs.read_var(13)?;

        Ok(Self {
            profile,
            sampling_index,
            channel_config,
            frame_length,
        })
    }
}
