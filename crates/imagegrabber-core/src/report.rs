//! Run events and counters, with the console text the CLI prints for them.

use std::fmt;

/// Per-run counters. Each image decision bumps exactly one of them, except
/// invalid links which are only reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub downloaded: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed.",
            self.downloaded, self.skipped, self.failed
        )
    }
}

/// Something the run decided, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Another instance holds the gate; this one blocks until it is released.
    Waiting,
    Retrieving { url: String },
    InvalidLink { link: String },
    SkippingExisting { filename: String },
    Downloading { link: String },
    /// Attempt `attempt` (1-based) of the current image failed.
    Retry { attempt: u32 },
    Failed,
    Summary(RunStats),
    Done,
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Waiting => write!(f, "Waiting for previous instance to complete..."),
            RunEvent::Retrieving { url } => write!(f, "Retrieving URL \"{}\"...", url),
            RunEvent::InvalidLink { link } => write!(f, "Invalid URL:  {}", link),
            RunEvent::SkippingExisting { filename } => {
                write!(f, "Skipping existing image {}", filename)
            }
            RunEvent::Downloading { link } => write!(f, "Downloading image:  {}", link),
            RunEvent::Retry { attempt } => {
                write!(f, "   Error downloading, retrying ({})", attempt)
            }
            RunEvent::Failed => write!(f, "   Failed."),
            RunEvent::Summary(stats) => write!(f, "{}", stats),
            RunEvent::Done => write!(f, "Done."),
        }
    }
}
