use tokio::sync::mpsc::UnboundedSender;

use crate::models::DownloadReport;
use crate::traits::EventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Progress and log events produced while a run executes
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    Log { level: Level, message: String },
    PageDone {
        page: u32,
        max_pages: u32,
        images_found: usize,
    },
    Finished { report: DownloadReport },
}

/// Forwards events over a channel so the foreground stays responsive while
/// the run executes on a worker task.
pub struct ChannelSink {
    tx: UnboundedSender<HarvestEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: HarvestEvent) {
        // A closed receiver means the foreground went away; nothing useful
        // to do with the event in that case.
        let _ = self.tx.send(event);
    }
}
