use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, InfoArgs, InfoFormat};
use crate::timestamp::time_str;
use flv::process::demux::TagReader;
use flv::process::extract::CodecDetail;
use flv::process::probe::{StreamSummary, probe};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing FLV file: {}", args.input.display());

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let mut tags = TagReader::new(BufReader::with_capacity(64 * 1024, file))?;
    tags.set_fail_level(cli.fail_level());

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Analyzing tags...");
            Some(pb)
        }
        None => None,
    };

    let result = probe(tags, |percent| {
        if let Some(ref pb) = pb {
            pb.set_message(format!("Analyzing tags...         {percent:.0}%"));
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let summary = match result {
        Ok(summary) => summary,
        Err(e) if e.is_invalid_container() => {
            println!("This doesn't appear to be a valid FLV file.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let report = InfoReport::from(&summary);
    match args.format {
        InfoFormat::Plain => display_report(&report),
        InfoFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct InfoReport {
    container: ContainerInfo,
    tags: TagInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<AudioInfo>,
}

#[derive(Debug, Serialize)]
struct ContainerInfo {
    version: u8,
    has_audio: bool,
    has_video: bool,
    data_offset: u32,
    file_size: u64,
    truncated: bool,
}

#[derive(Debug, Serialize)]
struct TagInfo {
    audio: u64,
    video: u64,
    script_data: u64,
    unknown: u64,
}

#[derive(Debug, Serialize)]
struct AudioInfo {
    format: String,
    sound_rate: u32,
    sample_bits: u8,
    stereo: bool,
    extractable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vbr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    payload_bytes: u64,
}

impl From<&StreamSummary> for InfoReport {
    fn from(summary: &StreamSummary) -> Self {
        let audio = summary.audio_format.map(|format| AudioInfo {
            format: format.sound_format.to_string(),
            sound_rate: format.sound_rate,
            sample_bits: format.sample_bits,
            stereo: format.stereo,
            extractable: summary.codec.is_some(),
            codec: summary.detail.map(|detail| match detail {
                CodecDetail::Mp3(stream) => match stream.first_header {
                    Some(header) => header.to_string(),
                    None => "MP3".to_string(),
                },
                other => other.to_string(),
            }),
            vbr: match summary.detail {
                Some(CodecDetail::Mp3(stream)) => Some(stream.vbr),
                _ => None,
            },
            frame_size: match summary.detail {
                Some(CodecDetail::Mp3(stream)) => stream.first_header.and_then(|h| h.frame_len()),
                _ => None,
            },
            duration: summary.audio_duration_ms().map(|ms| time_str(ms as u64)),
            payload_bytes: summary.audio_bytes,
        });

        Self {
            container: ContainerInfo {
                version: summary.header.version,
                has_audio: summary.header.has_audio,
                has_video: summary.header.has_video,
                data_offset: summary.header.data_offset,
                file_size: summary.file_size,
                truncated: summary.truncated,
            },
            tags: TagInfo {
                audio: summary.tags.audio,
                video: summary.tags.video,
                script_data: summary.tags.meta,
                unknown: summary.tags.unknown,
            },
            audio,
        }
    }
}

fn display_report(report: &InfoReport) {
    let container = &report.container;
    println!();
    println!("FLV File Information");
    println!("====================");
    println!();
    println!("Container");
    println!("  Version                   {}", container.version);
    println!("  Audio flag                {}", container.has_audio);
    println!("  Video flag                {}", container.has_video);
    println!("  Data offset               {}", container.data_offset);
    let size_mb = container.file_size as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        container.file_size
    );
    if container.truncated {
        println!("  Truncated                 true");
    }
    println!();

    let tags = &report.tags;
    println!("Tags");
    println!("  Audio                     {}", tags.audio);
    println!("  Video                     {}", tags.video);
    println!("  Script data               {}", tags.script_data);
    if tags.unknown > 0 {
        println!("  Unknown                   {}", tags.unknown);
    }
    println!();

    let Some(audio) = &report.audio else {
        println!("No audio tags found in the file.");
        return;
    };

    println!("Audio");
    println!("  Sound format              {}", audio.format);
    println!("  Sound rate                {} Hz", audio.sound_rate);
    println!("  Sample size               {}-bit", audio.sample_bits);
    println!(
        "  Channels                  {}",
        if audio.stereo { "stereo" } else { "mono" }
    );
    if let Some(codec) = &audio.codec {
        println!("  Codec                     {codec}");
    }
    if let Some(vbr) = audio.vbr {
        println!("  Variable bitrate          {vbr}");
    }
    if let Some(frame_size) = audio.frame_size {
        println!("  First frame size          {frame_size} bytes");
    }
    if let Some(duration) = &audio.duration {
        println!("  Duration                  {duration}");
    }
    println!("  Payload                   {} bytes", audio.payload_bytes);
    if !audio.extractable {
        println!("  Extraction                unsupported");
    }
    println!();
}
