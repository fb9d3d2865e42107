//! Run controller: one pass over the page URLs under the instance gate.
//!
//! Pages and images are handled strictly one after another. A page that
//! cannot be fetched ends the run; a single image never does, unless writing
//! it to disk fails.

use anyhow::{Context, Result};
use crate::config::GrabberConfig;
use crate::download::{DownloadOutcome, Downloader};
use crate::extract::extract_links;
use crate::fetch::HttpClient;
use crate::gate;
use crate::report::{RunEvent, RunStats};
use crate::url_model::resolve;
use std::path::Path;

impl RunStats {
    /// Counts one image decision.
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { .. } => self.downloaded += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Downloads every image linked from `urls` into `dir`.
///
/// Blocks first until this process holds the instance gate (emitting
/// `RunEvent::Waiting` if it has to wait), then reports every decision through
/// `on_event`, ending with the summary and `Done`. The gate is released after
/// the summary.
pub fn run<E>(config: &GrabberConfig, dir: &Path, urls: &[String], mut on_event: E) -> Result<RunStats>
where
    E: FnMut(&RunEvent),
{
    let lock_path = config.lock_path();
    let guard = gate::acquire(&lock_path, || on_event(&RunEvent::Waiting))
        .context("failed to acquire the instance gate")?;

    let downloader = Downloader::new(
        HttpClient::new(config.http.clone()),
        config.retry_policy(),
        dir,
    );
    let policy = config.filename_policy();
    let mut stats = RunStats::default();

    for url in urls {
        tracing::info!(url = %url, "retrieving page");
        on_event(&RunEvent::Retrieving { url: url.clone() });
        let html = downloader
            .client()
            .fetch_text(url)
            .with_context(|| format!("failed to retrieve {}", url))?;

        for link in extract_links(&html) {
            let filename = match resolve(&link, policy) {
                Ok(name) => name,
                Err(reason) => {
                    tracing::warn!(link = %link.url, "invalid image link: {}", reason);
                    on_event(&RunEvent::InvalidLink {
                        link: link.url.clone(),
                    });
                    continue;
                }
            };
            let outcome = downloader.download_image(&link, &filename, &mut on_event)?;
            stats.record(outcome);
        }
    }

    tracing::info!(
        downloaded = stats.downloaded,
        skipped = stats.skipped,
        failed = stats.failed,
        "run finished"
    );
    on_event(&RunEvent::Summary(stats));
    on_event(&RunEvent::Done);

    guard.release()?;
    Ok(stats)
}
