//! Utility functions and supporting infrastructure.
//!
//! Provides the big-endian byte reader and the error types shared by the
//! demuxer and the audio extractors.

pub mod errors;
pub mod reader;
