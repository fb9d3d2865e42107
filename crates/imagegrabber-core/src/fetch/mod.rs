//! Blocking HTTP GETs for pages and images.
//!
//! Uses the curl crate (libcurl) on the calling thread. Pages are read into
//! memory and decoded as text; images are streamed into a temp file in the
//! download directory and moved into place once the transfer succeeded.

use crate::config::HttpConfig;
use crate::retry::FetchError;
use crate::storage::PartFile;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Thin wrapper that builds one curl handle per request from shared settings.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// GETs `url` and returns the body decoded as text (invalid UTF-8 is replaced).
    /// A single attempt; no retry.
    pub fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut body = Vec::new();
        self.get(url, |data| {
            body.extend_from_slice(data);
            Ok(())
        })?;
        tracing::debug!(url, bytes = body.len(), "page fetched");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// GETs `url` into `final_path`, replacing any file already there.
    /// Returns the number of bytes written. On failure the temp file is removed
    /// and `final_path` is left untouched.
    pub fn fetch_to_file(&self, url: &str, final_path: &Path) -> Result<u64, FetchError> {
        let mut part = PartFile::create(final_path).map_err(FetchError::Storage)?;
        match self.get(url, |data| part.write_chunk(data)) {
            Ok(()) => part.finalize(final_path).map_err(FetchError::Storage),
            Err(e) => {
                part.discard();
                Err(e)
            }
        }
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(self.config.follow_redirects)?;
        easy.fail_on_error(true)?;
        easy.connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))?;
        if self.config.timeout_secs > 0 {
            easy.timeout(Duration::from_secs(self.config.timeout_secs))?;
        }
        Ok(easy)
    }

    /// Performs the GET, handing body chunks to `sink`. A sink error aborts the
    /// transfer and is reported as `FetchError::Storage`.
    fn get<S>(&self, url: &str, mut sink: S) -> Result<(), FetchError>
    where
        S: FnMut(&[u8]) -> io::Result<()>,
    {
        let mut easy = self.easy(url)?;
        let mut sink_error: Option<io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        if let Some(e) = sink_error {
            return Err(FetchError::Storage(e));
        }
        if let Err(e) = performed {
            if e.is_http_returned_error() {
                return Err(FetchError::Http(easy.response_code()?));
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(())
    }
}
