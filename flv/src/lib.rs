//! Audio track extraction from Flash Video (FLV) files.
//!
//! ## Technical Overview
//!
//! An FLV file is a 9-byte header followed by a sequence of tags, each
//! trailed by the size of the tag it closes. Audio tags carry one media info
//! byte describing the sound format and then the codec payload.
//!
//! ### Supported Audio
//!
//! - MP3 (sound formats 2 and 14): frames are written out unchanged
//! - AAC (sound format 10): the AudioSpecificConfig sequence header is cached
//!   and every raw access unit is wrapped in a 7-byte ADTS header
//!
//! Any other sound format stops extraction before an output file is created.
//!
//! ### Truncated Files
//!
//! A file ending inside a tag still yields the audio read up to that point.
//! The outcome is flagged as truncated; a fail level of
//! [`log::Level::Warn`] turns truncation into an error instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flv::process::{demux::Demuxer, EXAMPLE_DATA};
//! use std::io::Cursor;
//!
//! let demuxer = Demuxer::new(Cursor::new(EXAMPLE_DATA), "example")?;
//! let outcome = demuxer.extract_streams(|percent| eprintln!("{percent:.0}%"))?;
//!
//! match outcome.audio {
//!     Some(audio) => println!("{} written to {}", audio.codec, audio.path.display()),
//!     None => println!("no audio track"),
//! }
//! # Ok::<(), flv::utils::errors::DemuxError>(())
//! ```

/// Tag loop, audio extractors and stream probing.
///
/// 1. **Demuxing** ([`process::demux`]): Validates the header and walks tags.
///
/// 2. **Extraction** ([`process::extract`]): Writes MP3 or ADTS framed AAC.
///
/// 3. **Probing** ([`process::probe`]): Summarizes a file without output.
pub mod process;

/// Data structures of the container and the carried codecs.
///
/// - **Tags** ([`structs::tag`]): File header, tag records, audio format byte
/// - **AAC** ([`structs::aac`]): AudioSpecificConfig and ADTS headers
/// - **MPEG audio** ([`structs::mpeg`]): MP3 frame headers
pub mod structs;

/// Big-endian reader and error types.
pub mod utils;
