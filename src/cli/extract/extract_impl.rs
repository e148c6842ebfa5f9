use super::extract_thread::spawn_extract_thread;
use super::progress::{create_progress_bar, percent_to_position};
use crate::cli::command::{Cli, ExtractArgs};
use crate::timestamp::time_str;
use anyhow::{Context, Result};
use flv::process::demux::{Demuxer, ExtractOutcome};
use indicatif::MultiProgress;
use std::sync::mpsc;

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let output_stem = args.output_stem();

    log::info!(
        "Extracting audio: {} (strict mode: {})",
        args.input.display(),
        cli.strict
    );
    log::debug!("Output stem: {}", output_stem.display());

    let mut demuxer = Demuxer::open(&args.input, &output_stem)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    demuxer.set_fail_level(cli.fail_level());

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi)?),
        None => None,
    };

    let (tx, rx) = mpsc::channel();
    let start_time = std::time::Instant::now();
    let extract_thread = spawn_extract_thread(demuxer, tx);

    while let Ok(percent) = rx.recv() {
        if let Some(ref pb) = pb {
            pb.set_position(percent_to_position(percent));
        }
    }

    let outcome = match extract_thread.join() {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            if let Some(pb) = pb {
                pb.finish_with_message("extraction failed");
            }
            return Err(e);
        }
        Err(_) => {
            if let Some(pb) = pb {
                pb.finish_with_message("extraction thread panicked");
            }
            return Err(anyhow::anyhow!("Extraction thread panicked"));
        }
    };

    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "elapsed: {:.2}s | {}",
            start_time.elapsed().as_secs_f64(),
            summary_line(&outcome)
        ));
    }

    report(&outcome);
    Ok(())
}

fn summary_line(outcome: &ExtractOutcome) -> String {
    match &outcome.audio {
        Some(audio) => format!(
            "{} frames, timestamp: {}",
            audio.stats.frames_written,
            time_str(audio.stats.last_timestamp as u64)
        ),
        None => "no audio".to_string(),
    }
}

fn report(outcome: &ExtractOutcome) {
    if outcome.truncated {
        log::warn!("Input ended inside a tag; audio up to that point was kept");
    }

    match &outcome.audio {
        Some(audio) => {
            println!("Audio track                 {}", audio.detail);
            println!("Frames written              {}", audio.stats.frames_written);
            println!("Bytes written               {}", audio.stats.bytes_written);
            println!(
                "Last timestamp              {}",
                time_str(audio.stats.last_timestamp as u64)
            );
            println!("Output                      {}", audio.path.display());
        }
        None => {
            println!("No audio track found ({} tags read).", outcome.tags.total());
        }
    }
}
