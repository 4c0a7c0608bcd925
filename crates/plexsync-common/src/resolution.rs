//! Resolution labels and SD/HD classification.
//!
//! Plex reports a `videoResolution` label per media version (`"720"`, `"sd"`,
//! `"4k"`...). When no explicit height is present we derive one from the label.

/// Known resolution labels and their nominal heights.
const LABEL_HEIGHTS: &[(&str, u32)] = &[
    ("4k", 2160),
    ("uhd", 2160),
    ("2160", 2160),
    ("2160p", 2160),
    ("1080", 1080),
    ("1080p", 1080),
    ("fhd", 1080),
    ("720", 720),
    ("720p", 720),
    ("hd", 720),
    ("576", 576),
    ("576p", 576),
    ("480", 480),
    ("480p", 480),
    ("sd", 480),
];

/// Default height threshold: anything strictly below is SD.
pub const DEFAULT_HD_THRESHOLD: u32 = 720;

/// Convert a resolution label to a pixel height.
///
/// Unknown labels fall back to parsing the label as a plain integer.
///
/// # Examples
///
/// ```
/// use plexsync_common::resolution::height_from_label;
///
/// assert_eq!(height_from_label("720p"), Some(720));
/// assert_eq!(height_from_label("4K"), Some(2160));
/// assert_eq!(height_from_label("368"), Some(368));
/// assert_eq!(height_from_label("weird"), None);
/// ```
pub fn height_from_label(label: &str) -> Option<u32> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    LABEL_HEIGHTS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, height)| *height)
        .or_else(|| label.parse().ok())
}

/// SD/HD classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    Sd,
    Hd,
}

/// Classify a height against a threshold. Equal to the threshold is HD.
pub fn classify(height: u32, threshold: u32) -> Definition {
    if height < threshold {
        Definition::Sd
    } else {
        Definition::Hd
    }
}
