//! Image link extraction from page HTML.
//!
//! A line-oriented pattern scan, not an HTML parser. The pattern is anchored by
//! a greedy `.*` that cannot cross a newline, so each physical line yields at
//! most one link: the last `a href="...<ext>` on that line. Repeated links are
//! not deduplicated.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static IMAGE_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i).*a href="([^"]*.(jpg|png|gif))"#).expect("image link regex is valid")
});

/// Image extensions recognised by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Jpg,
    Png,
    Gif,
}

impl ImageExtension {
    /// Parses a matched extension, ignoring case.
    pub fn parse(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL-like string pulled from an anchor, plus its lowercase extension.
/// The URL is kept exactly as written in the page (absolute or relative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLink {
    pub url: String,
    pub extension: ImageExtension,
}

/// Lazy iterator over the image links of one HTML document.
/// Call [`extract_links`] again to restart the scan.
pub struct ImageLinks<'h> {
    matches: regex::CaptureMatches<'static, 'h>,
}

impl Iterator for ImageLinks<'_> {
    type Item = ImageLink;

    fn next(&mut self) -> Option<ImageLink> {
        for caps in self.matches.by_ref() {
            let (Some(url), Some(ext)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Some(extension) = ImageExtension::parse(ext.as_str()) {
                return Some(ImageLink {
                    url: url.as_str().to_string(),
                    extension,
                });
            }
        }
        None
    }
}

/// Scans `html` for anchors whose href ends in `.jpg`, `.png` or `.gif`.
pub fn extract_links(html: &str) -> ImageLinks<'_> {
    ImageLinks {
        matches: IMAGE_LINK_PATTERN.captures_iter(html),
    }
}
