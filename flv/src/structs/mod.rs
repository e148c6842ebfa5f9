//! Data structures representing FLV container and audio codec components.

pub mod aac;
pub mod mpeg;
pub mod tag;
