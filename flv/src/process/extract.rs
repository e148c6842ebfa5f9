use crate::log_or_err;
use crate::structs::aac::{AacPacketType, AdtsHeader, AudioSpecificConfig};
use crate::structs::mpeg::MpegStreamInfo;
use crate::structs::tag::SoundFormat;
use crate::utils::errors::{AacConfigError, ChunkError, DemuxError};
use log::{Level, debug};
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const OUTPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Appends `.{extension}` to the file name of `stem`.
///
/// Unlike [`Path::with_extension`] this never replaces an existing dotted
/// suffix, so a stem such as `Artist - Song.live` keeps its full name.
pub fn path_with_extension(stem: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Output file that is removed again unless explicitly committed.
///
/// Created together with an extractor; dropping it on any path other than
/// [`OutputFile::commit`] deletes the partially written file.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl OutputFile {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        let file = File::create(&path)?;
        debug!("Created output file {}", path.display());

        Ok(Self {
            path,
            writer: Some(BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, file)),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes and closes the file, keeping it on disk.
    pub fn commit(mut self) -> io::Result<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.committed = true;
        Ok(self.path.clone())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::other("output file already closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        // close the handle before unlinking
        drop(self.writer.take());
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Discarded incomplete output {}", self.path.display()),
            Err(e) => debug!("Failed to discard {}: {e}", self.path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    Aac,
}

impl AudioCodec {
    /// Codec chosen for an FLV sound format, `None` when unsupported.
    pub fn from_sound_format(format: SoundFormat) -> Option<Self> {
        match format {
            SoundFormat::Mp3 | SoundFormat::Mp3_8k => Some(AudioCodec::Mp3),
            SoundFormat::Aac => Some(AudioCodec::Aac),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "aac",
        }
    }
}

impl Display for AudioCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioCodec::Mp3 => write!(f, "MP3"),
            AudioCodec::Aac => write!(f, "AAC"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub bytes_written: u64,
    pub frames_written: u64,
    pub last_timestamp: u32,
}

impl ExtractStats {
    fn record(&mut self, bytes: usize, timestamp: u32) {
        self.bytes_written += bytes as u64;
        self.frames_written += 1;
        self.last_timestamp = timestamp;
    }
}

/// Codec parameters observed while extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecDetail {
    Mp3(MpegStreamInfo),
    Aac {
        config: Option<AudioSpecificConfig>,
    },
}

impl Display for CodecDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecDetail::Mp3(MpegStreamInfo {
                first_header: Some(header),
                vbr,
            }) => write!(f, "{header}{}", if *vbr { " (VBR)" } else { "" }),
            CodecDetail::Mp3(_) => write!(f, "MP3 (no frame header found)"),
            CodecDetail::Aac {
                config: Some(config),
            } => write!(f, "{config}"),
            CodecDetail::Aac { config: None } => write!(f, "AAC (no AudioSpecificConfig)"),
        }
    }
}

/// Writes MP3 frames verbatim.
#[derive(Debug)]
pub struct Mp3Extractor {
    output: OutputFile,
    stats: ExtractStats,
    stream: MpegStreamInfo,
}

impl Mp3Extractor {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        Ok(Self {
            output: OutputFile::create(path)?,
            stats: ExtractStats::default(),
            stream: MpegStreamInfo::default(),
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8], timestamp: u32) -> Result<(), DemuxError> {
        self.stream.observe(chunk, timestamp);
        self.output.write_all(chunk)?;
        self.stats.record(chunk.len(), timestamp);
        Ok(())
    }

    fn detail(&self) -> CodecDetail {
        CodecDetail::Mp3(self.stream)
    }
}

/// Rewraps raw AAC access units into ADTS frames.
#[derive(Debug)]
pub struct AacExtractor {
    output: OutputFile,
    stats: ExtractStats,
    config: Option<AudioSpecificConfig>,
    fail_level: Level,
}

impl AacExtractor {
    pub fn create(path: PathBuf, fail_level: Level) -> io::Result<Self> {
        Ok(Self {
            output: OutputFile::create(path)?,
            stats: ExtractStats::default(),
            config: None,
            fail_level,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8], timestamp: u32) -> Result<(), DemuxError> {
        let Some((&packet_type, payload)) = chunk.split_first() else {
            log_or_err!(self.fail_level, Level::Warn, ChunkError::Empty(timestamp));
            return Ok(());
        };

        match AacPacketType::from(packet_type) {
            AacPacketType::SequenceHeader => {
                let config = match AudioSpecificConfig::parse(payload) {
                    Ok(config) => config,
                    Err(e @ AacConfigError::TooShort(_)) => {
                        log_or_err!(self.fail_level, Level::Warn, e);
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                };
                match self.config {
                    Some(previous) if previous != config => {
                        log::warn!("AudioSpecificConfig changed at {timestamp} ms: {config}")
                    }
                    Some(_) => {}
                    None => debug!("{config}"),
                }
                self.config = Some(config);
            }
            AacPacketType::Raw => {
                let Some(config) = self.config else {
                    log_or_err!(
                        self.fail_level,
                        Level::Warn,
                        ChunkError::MissingAacConfig(timestamp)
                    );
                    return Ok(());
                };

                let header = match AdtsHeader::for_payload(&config, payload.len()) {
                    Ok(header) => header,
                    Err(e) => {
                        log_or_err!(self.fail_level, Level::Warn, e);
                        return Ok(());
                    }
                };

                header.write(&mut self.output)?;
                self.output.write_all(payload)?;
                self.stats.record(header.frame_length as usize, timestamp);
            }
            AacPacketType::Unknown(packet_type) => {
                log_or_err!(
                    self.fail_level,
                    Level::Warn,
                    ChunkError::UnknownAacPacketType {
                        packet_type,
                        timestamp
                    }
                );
            }
        }

        Ok(())
    }

    fn detail(&self) -> CodecDetail {
        CodecDetail::Aac {
            config: self.config,
        }
    }
}

/// Result of a committed extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAudio {
    pub codec: AudioCodec,
    pub path: PathBuf,
    pub stats: ExtractStats,
    pub detail: CodecDetail,
}

/// Codec specific writer for the audio track of one file.
///
/// Chosen once from the first audio tag; the output file is created
/// together with the extractor and only survives [`AudioExtractor::finish`].
#[derive(Debug)]
pub enum AudioExtractor {
    Mp3(Mp3Extractor),
    Aac(AacExtractor),
}

impl AudioExtractor {
    pub fn for_format(
        format: SoundFormat,
        output_stem: &Path,
        fail_level: Level,
    ) -> Result<Self, DemuxError> {
        let Some(codec) = AudioCodec::from_sound_format(format) else {
            return Err(DemuxError::UnsupportedAudioFormat(format));
        };

        let path = path_with_extension(output_stem, codec.extension());
        let extractor = match codec {
            AudioCodec::Mp3 => AudioExtractor::Mp3(Mp3Extractor::create(path)?),
            AudioCodec::Aac => AudioExtractor::Aac(AacExtractor::create(path, fail_level)?),
        };

        Ok(extractor)
    }

    pub fn codec(&self) -> AudioCodec {
        match self {
            AudioExtractor::Mp3(_) => AudioCodec::Mp3,
            AudioExtractor::Aac(_) => AudioCodec::Aac,
        }
    }

    pub fn write_chunk(&mut self, chunk: &[u8], timestamp: u32) -> Result<(), DemuxError> {
        match self {
            AudioExtractor::Mp3(extractor) => extractor.write_chunk(chunk, timestamp),
            AudioExtractor::Aac(extractor) => extractor.write_chunk(chunk, timestamp),
        }
    }

    pub fn output_path(&self) -> &Path {
        match self {
            AudioExtractor::Mp3(extractor) => extractor.output.path(),
            AudioExtractor::Aac(extractor) => extractor.output.path(),
        }
    }

    pub fn stats(&self) -> &ExtractStats {
        match self {
            AudioExtractor::Mp3(extractor) => &extractor.stats,
            AudioExtractor::Aac(extractor) => &extractor.stats,
        }
    }

    pub fn detail(&self) -> CodecDetail {
        match self {
            AudioExtractor::Mp3(extractor) => extractor.detail(),
            AudioExtractor::Aac(extractor) => extractor.detail(),
        }
    }

    /// Flushes the output and keeps it on disk.
    pub fn finish(self) -> Result<ExtractedAudio, DemuxError> {
        let codec = self.codec();
        let detail = self.detail();
        let (output, stats) = match self {
            AudioExtractor::Mp3(extractor) => (extractor.output, extractor.stats),
            AudioExtractor::Aac(extractor) => (extractor.output, extractor.stats),
        };

        let path = output.commit()?;
        Ok(ExtractedAudio {
            codec,
            path,
            stats,
            detail,
        })
    }

    /// Drops the extractor and removes its output file.
    pub fn discard(self) {
        debug!(
            "Discarding {} output {} after {} frames",
            self.codec(),
            self.output_path().display(),
            self.stats().frames_written
        );
    }
}
