//! Skip-aware, retrying download of a single image.
//!
//! An image whose filename already exists in the download directory is skipped
//! without touching the network. Otherwise the GET is attempted up to
//! `RetryPolicy::max_attempts` times; transport failures are reported and
//! retried, local storage failures abort the run.

use anyhow::{Context, Result};
use crate::extract::ImageLink;
use crate::fetch::HttpClient;
use crate::report::RunEvent;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::url_model::ResolvedFilename;
use std::path::PathBuf;

/// What happened to one image link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    Skipped,
    Failed { attempts: u32 },
}

/// Downloads images into one directory with a fixed retry policy.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    policy: RetryPolicy,
    dir: PathBuf,
}

impl Downloader {
    pub fn new(client: HttpClient, policy: RetryPolicy, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            policy,
            dir: dir.into(),
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Downloads `link` to `filename` inside the download directory.
    ///
    /// Emits `SkippingExisting`, or `Downloading` followed by one `Retry` per
    /// failed attempt and a trailing `Failed` when all attempts are used up.
    /// Returns `Err` only for storage failures, which end the run.
    pub fn download_image<E>(
        &self,
        link: &ImageLink,
        filename: &ResolvedFilename,
        on_event: &mut E,
    ) -> Result<DownloadOutcome>
    where
        E: FnMut(&RunEvent),
    {
        let target = self.dir.join(filename);
        if target.is_file() {
            tracing::debug!(file = %target.display(), "image exists, skipping");
            on_event(&RunEvent::SkippingExisting {
                filename: filename.to_string(),
            });
            return Ok(DownloadOutcome::Skipped);
        }

        tracing::debug!(url = %link.url, file = %target.display(), "downloading image");
        on_event(&RunEvent::Downloading {
            link: link.url.clone(),
        });

        let mut attempts = 0u32;
        let res = run_with_retry(
            &self.policy,
            |attempt, err| {
                tracing::warn!(url = %link.url, attempt, "image download failed: {}", err);
                on_event(&RunEvent::Retry { attempt });
            },
            |attempt| {
                attempts = attempt;
                self.client.fetch_to_file(&link.url, &target)
            },
        );

        match res {
            Ok(bytes) => {
                tracing::info!(url = %link.url, file = %target.display(), bytes, "image downloaded");
                Ok(DownloadOutcome::Downloaded { bytes })
            }
            Err(FetchError::Storage(e)) => Err(e)
                .with_context(|| format!("failed to write {}", target.display())),
            Err(e) => {
                tracing::warn!(url = %link.url, attempts, "giving up on image: {}", e);
                on_event(&RunEvent::Failed);
                Ok(DownloadOutcome::Failed { attempts })
            }
        }
    }
}
