//! Local filename derivation for image links.
//!
//! `Verbatim` keeps everything after the last `/` of the link exactly as
//! written. `Sanitized` additionally strips query strings and characters that
//! are unsafe in a filename, and rejects `.`/`..`.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;

use crate::extract::ImageLink;
use std::fmt;
use std::path::Path;

/// How a link's final path segment becomes a local filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenamePolicy {
    #[default]
    Verbatim,
    Sanitized,
}

/// A filename relative to the download directory. Never contains `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFilename(String);

impl ResolvedFilename {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for ResolvedFilename {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ResolvedFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a link could not be turned into a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidLink {
    /// No `/` in the link (e.g. a page-relative `pic.jpg`).
    NoPathSeparator,
    /// Nothing usable was left after the last `/` or after sanitizing.
    EmptyName,
}

impl fmt::Display for InvalidLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidLink::NoPathSeparator => write!(f, "no path separator"),
            InvalidLink::EmptyName => write!(f, "no usable filename"),
        }
    }
}

impl std::error::Error for InvalidLink {}

/// Resolves the local filename for `link` under `policy`.
pub fn resolve(link: &ImageLink, policy: FilenamePolicy) -> Result<ResolvedFilename, InvalidLink> {
    resolve_url(&link.url, policy)
}

/// Like [`resolve`] but works on a bare URL string.
pub fn resolve_url(url: &str, policy: FilenamePolicy) -> Result<ResolvedFilename, InvalidLink> {
    let last_slash = url.rfind('/').ok_or(InvalidLink::NoPathSeparator)?;
    let raw = &url[last_slash + 1..];

    let name = match policy {
        FilenamePolicy::Verbatim => raw.to_string(),
        FilenamePolicy::Sanitized => {
            let candidate = filename_from_url_path(url).unwrap_or_else(|| raw.to_string());
            let sanitized = sanitize_filename(&candidate);
            if sanitized == "." || sanitized == ".." {
                return Err(InvalidLink::EmptyName);
            }
            sanitized
        }
    };

    if name.is_empty() {
        return Err(InvalidLink::EmptyName);
    }
    debug_assert!(!name.contains('/'));
    Ok(ResolvedFilename(name))
}
