use anyhow::Result;
use flv::process::demux::{Demuxer, ExtractOutcome};
use std::io::{Read, Seek};
use std::sync::mpsc;
use std::thread;

/// Percentage of the input consumed, sent after every tag.
pub type ProgressSender = mpsc::Sender<f64>;

/// Runs the demuxer on its own thread.
///
/// If the receiving side goes away the extraction is cancelled, which
/// removes the partial output.
pub fn spawn_extract_thread<R>(
    demuxer: Demuxer<R>,
    tx: ProgressSender,
) -> thread::JoinHandle<Result<ExtractOutcome>>
where
    R: Read + Seek + Send + 'static,
{
    thread::spawn(move || -> Result<ExtractOutcome> {
        let cancel = demuxer.cancel_token();

        let outcome = demuxer.extract_streams(|percent| {
            if tx.send(percent).is_err() {
                cancel.cancel();
            }
        })?;

        Ok(outcome)
    })
}
