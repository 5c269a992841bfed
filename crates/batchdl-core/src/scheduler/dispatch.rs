//! Job dispatcher: fills the job queue and closes it.

use crossbeam_channel::Receiver;

use crate::downloader::DownloadEntry;

/// Pushes every entry onto a queue sized to hold all of them, then closes it.
/// No filtering or reordering; sends never block.
pub fn dispatch(entries: Vec<DownloadEntry>) -> Receiver<DownloadEntry> {
    let (tx, rx) = crossbeam_channel::bounded(entries.len().max(1));
    for entry in entries {
        if tx.send(entry).is_err() {
            break;
        }
    }
    // Dropping the only sender closes the queue once it is drained.
    rx
}
