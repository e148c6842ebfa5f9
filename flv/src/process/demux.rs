use crate::log_or_err;
use crate::process::extract::{AudioExtractor, ExtractedAudio};
use crate::process::{CancelToken, TagCounts};
use crate::structs::tag::{
    AudioFormatInfo, FLV_HEADER_LEN, FLV_SIGNATURE, FlvHeader, PREVIOUS_TAG_SIZE_LEN,
    TAG_HEADER_LEN, Tag, TagKind,
};
use crate::utils::errors::DemuxError;
use crate::utils::reader::FlvReader;
use log::{Level, debug, info, trace};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

const INPUT_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    Start,
    HeaderValidated,
    TagLoop,
    Done,
    Fatal,
}

/// Walks the tag records of an FLV file.
///
/// Running out of bytes in the middle of a tag is not an error: the loop
/// ends, [`TagReader::is_truncated`] reports it, and everything read before
/// stays usable. Only with a fail level of [`Level::Warn`] (strict mode) is
/// truncation returned as [`DemuxError::Truncated`].
#[derive(Debug)]
pub struct TagReader<R: Read + Seek> {
    reader: FlvReader<R>,
    state: DemuxState,
    header: Option<FlvHeader>,
    truncated: bool,
    fail_level: Level,
}

impl<R> TagReader<R>
where
    R: Read + Seek,
{
    pub fn new(source: R) -> io::Result<Self> {
        Ok(Self::from_reader(FlvReader::new(source)?))
    }

    pub fn from_reader(reader: FlvReader<R>) -> Self {
        Self {
            reader,
            state: DemuxState::Start,
            header: None,
            truncated: false,
            fail_level: Level::Error,
        }
    }

    pub fn set_fail_level(&mut self, fail_level: Level) {
        self.fail_level = fail_level;
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    pub fn header(&self) -> Option<&FlvHeader> {
        self.header.as_ref()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    pub fn file_len(&self) -> u64 {
        self.reader.len()
    }

    /// Percentage of the file consumed so far.
    pub fn progress(&self) -> f64 {
        if self.reader.is_empty() {
            return 0.0;
        }
        self.reader.offset() as f64 / self.reader.len() as f64 * 100.0
    }

    /// Validates the file header and positions the reader on the first tag.
    pub fn read_header(&mut self) -> Result<FlvHeader, DemuxError> {
        if let Some(header) = self.header {
            return Ok(header);
        }

        match self.validate_header() {
            Ok(header) => Ok(header),
            Err(e) => {
                self.state = DemuxState::Fatal;
                Err(e)
            }
        }
    }

    fn validate_header(&mut self) -> Result<FlvHeader, DemuxError> {
        if self.reader.len() < FLV_HEADER_LEN {
            return Err(DemuxError::InvalidContainer(format!(
                "file is only {} bytes long",
                self.reader.len()
            )));
        }

        self.reader.seek(0)?;
        let signature = self.reader.read_u32()?;
        if signature != FLV_SIGNATURE {
            return Err(DemuxError::InvalidContainer(format!(
                "signature {signature:#010X}, expected {FLV_SIGNATURE:#010X}"
            )));
        }

        let flags = self.reader.read_u8()?;
        let data_offset = self.reader.read_u32()?;
        let header = FlvHeader::new(signature, flags, data_offset);
        debug!(
            "FLV header: version {}, audio {}, video {}, data offset {}",
            header.version, header.has_audio, header.has_video, header.data_offset
        );

        self.reader.seek(data_offset as u64)?;
        self.header = Some(header);
        self.state = DemuxState::HeaderValidated;

        if self.reader.remaining() < PREVIOUS_TAG_SIZE_LEN {
            self.end_truncated("first previous tag size", PREVIOUS_TAG_SIZE_LEN)?;
        } else {
            self.reader.read_u32()?;
        }

        Ok(header)
    }

    /// Reads the next tag, `None` once the usable data is exhausted.
    pub fn next_tag(&mut self) -> Result<Option<Tag>, DemuxError> {
        match self.state {
            DemuxState::Start => {
                self.read_header()?;
            }
            DemuxState::Done | DemuxState::Fatal => return Ok(None),
            DemuxState::HeaderValidated | DemuxState::TagLoop => {}
        }
        if self.state == DemuxState::Done {
            return Ok(None);
        }
        self.state = DemuxState::TagLoop;

        if self.reader.remaining() == 0 {
            self.state = DemuxState::Done;
            return Ok(None);
        }
        if self.reader.remaining() < TAG_HEADER_LEN {
            self.end_truncated("tag header", TAG_HEADER_LEN)?;
            return Ok(None);
        }

        let kind = TagKind::from(self.reader.read_u8()?);
        let data_size = self.reader.read_u24()?;
        let timestamp = self.reader.read_u24()? | ((self.reader.read_u8()? as u32) << 24);
        self.reader.read_u24()?; // stream id

        let mut tag = Tag {
            kind,
            data_size,
            timestamp,
            media_info: None,
            body: Vec::new(),
        };

        if data_size > 0 {
            if self.reader.remaining() < data_size as u64 {
                self.end_truncated("tag payload", data_size as u64)?;
                return Ok(None);
            }

            tag.media_info = Some(self.reader.read_u8()?);
            tag.body = self.reader.read_bytes(data_size as usize - 1)?;
        }

        trace!(
            "{kind} tag: {data_size} bytes at {timestamp} ms, offset {}",
            self.reader.offset()
        );

        if self.reader.remaining() < PREVIOUS_TAG_SIZE_LEN {
            self.end_truncated("previous tag size", PREVIOUS_TAG_SIZE_LEN)?;
        } else {
            self.reader.read_u32()?;
        }

        Ok(Some(tag))
    }

    fn end_truncated(&mut self, what: &'static str, needed: u64) -> Result<(), DemuxError> {
        self.state = DemuxState::Done;
        self.truncated = true;

        log_or_err!(
            self.fail_level,
            Level::Warn,
            DemuxError::Truncated {
                what,
                offset: self.reader.offset(),
                needed,
                remaining: self.reader.remaining(),
            }
        );

        Ok(())
    }
}

impl<R> Iterator for TagReader<R>
where
    R: Read + Seek,
{
    type Item = Result<Tag, DemuxError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_tag() {
            Ok(Some(tag)) => Some(Ok(tag)),
            Ok(None) => None,
            Err(e) => {
                self.state = DemuxState::Fatal;
                Some(Err(e))
            }
        }
    }
}

/// Outcome of a completed extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOutcome {
    pub header: FlvHeader,
    pub audio: Option<ExtractedAudio>,
    pub audio_format: Option<AudioFormatInfo>,
    pub tags: TagCounts,
    /// The file ended inside a tag; the audio written so far was kept.
    pub truncated: bool,
}

impl ExtractOutcome {
    pub fn extracted_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.audio.as_ref().map(|audio| audio.path.as_path())
    }
}

/// Extracts the audio track of one FLV file.
///
/// The extractor for the track is created on the first audio tag and keeps
/// its output only if [`Demuxer::extract_streams`] completes. Dropping the
/// demuxer earlier, failing, or cancelling through a [`CancelToken`] removes
/// the partially written file.
///
/// # Example
///
/// ```rust,no_run
/// use flv::process::demux::Demuxer;
///
/// let demuxer = Demuxer::open("video.flv", "video")?;
/// let outcome = demuxer.extract_streams(|percent| println!("{percent:.1}%"))?;
///
/// if let Some(path) = outcome.output_path() {
///     println!("Audio written to {}", path.display());
/// }
/// # Ok::<(), flv::utils::errors::DemuxError>(())
/// ```
#[derive(Debug)]
pub struct Demuxer<R: Read + Seek> {
    tags: TagReader<R>,
    output_stem: PathBuf,
    extractor: Option<AudioExtractor>,
    audio_format: Option<AudioFormatInfo>,
    counts: TagCounts,
    fail_level: Level,
    cancel: CancelToken,
}

impl Demuxer<BufReader<File>> {
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        input_path: P,
        output_stem: Q,
    ) -> Result<Self, DemuxError> {
        let file = File::open(input_path.as_ref())?;
        Self::new(
            BufReader::with_capacity(INPUT_BUFFER_SIZE, file),
            output_stem,
        )
    }
}

impl<R> Demuxer<R>
where
    R: Read + Seek,
{
    /// Binds a source to an output path without extension; the extension is
    /// picked by the extractor.
    pub fn new<Q: AsRef<Path>>(source: R, output_stem: Q) -> Result<Self, DemuxError> {
        Ok(Self {
            tags: TagReader::new(source)?,
            output_stem: output_stem.as_ref().to_path_buf(),
            extractor: None,
            audio_format: None,
            counts: TagCounts::default(),
            fail_level: Level::Error,
            cancel: CancelToken::default(),
        })
    }

    /// Conditions logged at a level at or above `fail_level` become errors.
    pub fn set_fail_level(&mut self, fail_level: Level) {
        self.fail_level = fail_level;
        self.tags.set_fail_level(fail_level);
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the tag loop to the end of the usable data.
    ///
    /// `on_progress` receives the consumed percentage of the file after every
    /// fully read tag.
    pub fn extract_streams<F>(mut self, mut on_progress: F) -> Result<ExtractOutcome, DemuxError>
    where
        F: FnMut(f64),
    {
        let header = self.tags.read_header()?;
        info!(
            "Extracting audio from {} bytes of FLV data",
            self.tags.file_len()
        );

        loop {
            if self.cancel.is_cancelled() {
                return Err(DemuxError::Cancelled);
            }

            let Some(tag) = self.tags.next_tag()? else {
                break;
            };
            self.process_tag(&tag)?;

            // the last tag of a file without a trailing size field reports no progress
            if self.tags.state() != DemuxState::Done {
                on_progress(self.tags.progress());
            }
        }

        let audio = match self.extractor.take() {
            Some(extractor) => Some(extractor.finish()?),
            None => None,
        };

        match &audio {
            Some(audio) => info!(
                "Extracted {} {} frames ({} bytes) to {}",
                audio.stats.frames_written,
                audio.codec,
                audio.stats.bytes_written,
                audio.path.display()
            ),
            None => info!("No audio track found"),
        }

        Ok(ExtractOutcome {
            header,
            audio,
            audio_format: self.audio_format,
            tags: self.counts,
            truncated: self.tags.is_truncated(),
        })
    }

    fn process_tag(&mut self, tag: &Tag) -> Result<(), DemuxError> {
        self.counts.record(tag.kind);

        if tag.kind != TagKind::Audio {
            return Ok(());
        }
        let Some(format) = tag.audio_format() else {
            trace!("Empty audio tag at {} ms", tag.timestamp);
            return Ok(());
        };

        if self.extractor.is_none() {
            info!("Audio track: {format}");
            let extractor =
                AudioExtractor::for_format(format.sound_format, &self.output_stem, self.fail_level)?;
            self.audio_format = Some(format);
            self.extractor = Some(extractor);
        }

        if let Some(extractor) = self.extractor.as_mut() {
            extractor.write_chunk(&tag.body, tag.timestamp)?;
        }

        Ok(())
    }
}

impl<R: Read + Seek> Drop for Demuxer<R> {
    fn drop(&mut self) {
        if let Some(extractor) = self.extractor.take() {
            extractor.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;
    use crate::process::extract::AudioCodec;
    use crate::process::fixture::flv_file;
    use crate::structs::aac::AdtsHeader;
    use crate::structs::tag::SoundFormat;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    const MP3_FRAME: [u8; 8] = [0xFF, 0xFB, 0x90, 0x64, 0x01, 0x02, 0x03, 0x04];

    fn demuxer(data: &[u8], stem: &Path) -> Demuxer<Cursor<Vec<u8>>> {
        Demuxer::new(Cursor::new(data.to_vec()), stem).unwrap()
    }

    #[test]
    fn header_seeks_to_data_offset() -> anyhow::Result<()> {
        let mut data = vec![0x46, 0x4C, 0x56, 0x01, 0x04, 0x00, 0x00, 0x00, 0x0D];
        data.extend_from_slice(&[0xAA; 4]); // extended header bytes
        data.extend_from_slice(&[0x00; 4]);

        let mut tags = TagReader::new(Cursor::new(data))?;
        let header = tags.read_header()?;
        assert_eq!(header.data_offset, 13);
        assert!(header.has_audio);
        assert!(!header.has_video);
        assert_eq!(tags.state(), DemuxState::HeaderValidated);
        assert_eq!(tags.offset(), 17);
        assert!(tags.next_tag()?.is_none());
        assert!(!tags.is_truncated());
        Ok(())
    }

    #[test]
    fn invalid_signature() {
        let mut data = EXAMPLE_DATA.to_vec();
        data[3] = 0x02;

        let mut tags = TagReader::new(Cursor::new(data)).unwrap();
        let err = tags.next_tag().unwrap_err();
        assert!(err.is_invalid_container());
        assert_eq!(tags.state(), DemuxState::Fatal);
        assert!(tags.next().is_none());
    }

    #[test]
    fn too_short_for_header() {
        let mut tags = TagReader::new(Cursor::new(vec![0x46, 0x4C])).unwrap();
        assert!(tags.read_header().unwrap_err().is_invalid_container());
    }

    #[test]
    fn valid_signature_without_full_header() -> anyhow::Result<()> {
        let data = vec![0x46, 0x4C, 0x56, 0x01, 0x05, 0x00];

        let mut tags = TagReader::new(Cursor::new(data.clone()))?;
        let err = tags.read_header().unwrap_err();
        assert!(matches!(err, DemuxError::InvalidContainer(_)));
        assert_eq!(tags.state(), DemuxState::Fatal);
        assert!(tags.header().is_none());

        let dir = TempDir::new()?;
        let err = demuxer(&data, &dir.path().join("short"))
            .extract_streams(|_| {})
            .unwrap_err();
        assert!(err.is_invalid_container());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn iterates_example_tags() -> anyhow::Result<()> {
        let tags = TagReader::new(Cursor::new(EXAMPLE_DATA))?.collect::<Result<Vec<_>, _>>()?;
        let kinds: Vec<_> = tags.iter().map(|tag| tag.kind).collect();
        assert_eq!(
            kinds,
            [
                TagKind::Audio,
                TagKind::Meta,
                TagKind::Video,
                TagKind::Audio,
                TagKind::Audio
            ]
        );
        assert_eq!(tags[3].timestamp, 23);
        assert_eq!(tags[3].media_info, Some(0xAF));
        assert_eq!(tags[3].body, vec![0x01, 0xDE, 0xAD, 0xBE, 0xEF]);
        Ok(())
    }

    #[test]
    fn extended_timestamp() -> anyhow::Result<()> {
        let data = flv_file(&[(0x08, 0x0100_0001, &[0x2F, 0xFF])]);
        let tag = TagReader::new(Cursor::new(data))?.next().unwrap()?;
        assert_eq!(tag.timestamp, 0x0100_0001);
        Ok(())
    }

    #[test]
    fn extracts_example_aac() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("example");

        let mut progress = Vec::new();
        let outcome = demuxer(EXAMPLE_DATA, &stem).extract_streams(|p| progress.push(p))?;

        assert!(outcome.extracted_audio());
        assert!(!outcome.truncated);
        assert_eq!(outcome.tags.audio, 3);
        assert_eq!(outcome.tags.video, 1);
        assert_eq!(outcome.tags.meta, 1);
        assert_eq!(
            outcome.audio_format.map(|f| f.sound_format),
            Some(SoundFormat::Aac)
        );

        let audio = outcome.audio.as_ref().unwrap();
        assert_eq!(audio.codec, AudioCodec::Aac);
        assert_eq!(audio.path, dir.path().join("example.aac"));

        let data = fs::read(&audio.path)?;
        assert_eq!(data.len(), 20);
        assert_eq!(AdtsHeader::parse(&data)?.frame_length, 11);
        assert_eq!(&data[7..11], &[0xDE, 0xAD, 0xBE, 0xEF]);

        assert_eq!(progress.len(), 5);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last().copied(), Some(100.0));
        Ok(())
    }

    #[test]
    fn short_aac_config_is_skipped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let data = flv_file(&[
            (0x08, 0, &[0xAF, 0x00, 0x12]),
            (0x08, 0, &[0xAF, 0x00, 0x12, 0x10]),
            (0x08, 23, &[0xAF, 0x01, 0xDE, 0xAD]),
        ]);

        let outcome = demuxer(&data, &stem).extract_streams(|_| {})?;
        let audio = outcome.audio.unwrap();
        assert_eq!(audio.codec, AudioCodec::Aac);
        assert_eq!(audio.stats.frames_written, 1);

        let written = fs::read(&audio.path)?;
        assert_eq!(written.len(), 9);
        assert_eq!(AdtsHeader::parse(&written)?.frame_length, 9);
        assert_eq!(&written[7..], &[0xDE, 0xAD]);

        let mut strict = demuxer(&data, &dir.path().join("strict"));
        strict.set_fail_level(Level::Warn);
        assert!(matches!(
            strict.extract_streams(|_| {}),
            Err(DemuxError::InvalidAacConfig(_))
        ));
        assert!(!dir.path().join("strict.aac").exists());
        assert!(audio.path.exists());
        Ok(())
    }

    #[test]
    fn mp3_output_is_concatenation() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let payloads: Vec<Vec<u8>> = (0..4u8)
            .map(|i| {
                let mut payload = vec![0x2F];
                payload.extend_from_slice(&MP3_FRAME);
                payload.push(i);
                payload
            })
            .collect();
        let records: Vec<(u8, u32, &[u8])> = payloads
            .iter()
            .enumerate()
            .map(|(i, p)| (0x08, i as u32 * 26, p.as_slice()))
            .collect();
        let data = flv_file(&records);

        let outcome = demuxer(&data, &stem).extract_streams(|_| {})?;
        let path = outcome.output_path().unwrap();
        assert_eq!(path, dir.path().join("song.mp3"));

        let expected: Vec<u8> = payloads.iter().flat_map(|p| p[1..].to_vec()).collect();
        assert_eq!(fs::read(path)?, expected);
        Ok(())
    }

    #[test]
    fn extractor_chosen_once() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        // later tags claim a different format; the first choice sticks
        let mut mp3_8k = vec![0xE2];
        mp3_8k.extend_from_slice(&MP3_FRAME);
        let mut aac_flagged = vec![0xAF];
        aac_flagged.extend_from_slice(&MP3_FRAME);
        let data = flv_file(&[(0x08, 0, &mp3_8k), (0x08, 26, &aac_flagged)]);

        let outcome = demuxer(&data, &stem).extract_streams(|_| {})?;
        let audio = outcome.audio.unwrap();
        assert_eq!(audio.codec, AudioCodec::Mp3);
        assert_eq!(audio.stats.frames_written, 2);
        assert_eq!(fs::read(&audio.path)?, [MP3_FRAME, MP3_FRAME].concat());
        Ok(())
    }

    #[test]
    fn unsupported_format_leaves_no_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        for media_info in [0x1F, 0x4F, 0x6F, 0xBF] {
            let data = flv_file(&[(0x08, 0, &[media_info, 0x00, 0x00])]);
            let err = demuxer(&data, &stem).extract_streams(|_| {}).unwrap_err();
            match err {
                DemuxError::UnsupportedAudioFormat(format) => {
                    assert_eq!(format.id(), media_info >> 4)
                }
                other => panic!("unexpected error {other}"),
            }
        }

        let data = flv_file(&[(0x08, 0, &[0x1F, 0x00])]);
        let err = demuxer(&data, &stem).extract_streams(|_| {}).unwrap_err();
        assert_eq!(err.to_string(), "Unable to extract audio (ADPCM is unsupported)");
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn unsupported_format_after_video_discards_nothing_else() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let data = flv_file(&[(0x09, 0, &[0x17, 0x00]), (0x08, 0, &[0x5F, 0x00])]);
        let err = demuxer(&data, &stem).extract_streams(|_| {}).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::UnsupportedAudioFormat(SoundFormat::Nellymoser8kMono)
        ));
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn truncated_tag_header_keeps_audio() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let mut payload = vec![0x2F];
        payload.extend_from_slice(&MP3_FRAME);
        let mut data = flv_file(&[(0x08, 0, &payload), (0x08, 26, &payload)]);
        // cut into the second tag header
        let cut = data.len() - (payload.len() + 4) - 5;
        data.truncate(cut);

        let outcome = demuxer(&data, &stem).extract_streams(|_| {})?;
        assert!(outcome.truncated);
        assert_eq!(outcome.tags.audio, 1);
        assert_eq!(fs::read(outcome.output_path().unwrap())?, MP3_FRAME);
        Ok(())
    }

    #[test]
    fn truncated_payload_keeps_audio() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let mut payload = vec![0x2F];
        payload.extend_from_slice(&MP3_FRAME);
        let mut data = flv_file(&[(0x08, 0, &payload), (0x08, 26, &payload)]);
        data.truncate(data.len() - 6);

        let mut progress = Vec::new();
        let outcome = demuxer(&data, &stem).extract_streams(|p| progress.push(p))?;
        assert!(outcome.truncated);
        assert_eq!(outcome.tags.audio, 1);
        assert_eq!(progress.len(), 1);
        assert!(progress[0] < 100.0);
        Ok(())
    }

    #[test]
    fn missing_trailing_size_still_forwards_tag() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let mut payload = vec![0x2F];
        payload.extend_from_slice(&MP3_FRAME);
        let mut data = flv_file(&[(0x08, 0, &payload)]);
        data.truncate(data.len() - 2);

        let mut progress = Vec::new();
        let outcome = demuxer(&data, &stem).extract_streams(|p| progress.push(p))?;
        assert!(outcome.truncated);
        assert!(progress.is_empty());
        assert_eq!(fs::read(outcome.output_path().unwrap())?, MP3_FRAME);
        Ok(())
    }

    #[test]
    fn strict_mode_fails_on_truncation() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let mut payload = vec![0x2F];
        payload.extend_from_slice(&MP3_FRAME);
        let mut data = flv_file(&[(0x08, 0, &payload), (0x08, 26, &payload)]);
        data.truncate(data.len() - 6);

        let mut demuxer = demuxer(&data, &stem);
        demuxer.set_fail_level(Level::Warn);
        let err = demuxer.extract_streams(|_| {}).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::Truncated {
                what: "tag payload",
                ..
            }
        ));
        assert!(!dir.path().join("song.mp3").exists());
        Ok(())
    }

    #[test]
    fn zero_size_tags_are_skipped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let data = flv_file(&[(0x08, 0, &[]), (0x12, 0, &[])]);
        let mut progress = Vec::new();
        let outcome = demuxer(&data, &stem).extract_streams(|p| progress.push(p))?;
        assert!(!outcome.extracted_audio());
        assert_eq!(outcome.tags.audio, 1);
        assert_eq!(outcome.tags.meta, 1);
        assert_eq!(progress.len(), 2);
        Ok(())
    }

    #[test]
    fn no_tags_after_header() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("empty");

        let data = flv_file(&[]);
        let mut progress = Vec::new();
        let outcome = demuxer(&data, &stem).extract_streams(|p| progress.push(p))?;
        assert!(!outcome.extracted_audio());
        assert!(!outcome.truncated);
        assert!(progress.is_empty());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn cancel_removes_partial_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let mut payload = vec![0x2F];
        payload.extend_from_slice(&MP3_FRAME);
        let data = flv_file(&[(0x08, 0, &payload), (0x08, 26, &payload), (0x08, 52, &payload)]);

        let demuxer = demuxer(&data, &stem);
        let cancel = demuxer.cancel_token();
        let err = demuxer
            .extract_streams(|_| {
                assert!(dir.path().join("song.mp3").exists());
                cancel.cancel();
            })
            .unwrap_err();

        assert!(matches!(err, DemuxError::Cancelled));
        assert!(!dir.path().join("song.mp3").exists());
        Ok(())
    }

    #[test]
    fn cancel_from_other_thread() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let stem = dir.path().join("song");

        let demuxer = demuxer(EXAMPLE_DATA, &stem);
        let cancel = demuxer.cancel_token();
        std::thread::spawn(move || cancel.cancel()).join().unwrap();

        let err = demuxer.extract_streams(|_| {}).unwrap_err();
        assert!(matches!(err, DemuxError::Cancelled));
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
