use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name format: the suggested filename of a candidate, e.g. `hqdefault.jpg`
pub const DEFAULT_NAME_FORMAT: &str = "{quality}.{ext}";

const PLACEHOLDERS: [&str; 4] = ["id", "quality", "title", "ext"];

/// Errors that can occur while planning output filenames
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Invalid format string: {0}")]
    InvalidFormat(String),
}

/// Sanitizes a string for use in filenames by replacing problematic characters
///
/// Replaces characters that are invalid or problematic in filenames across platforms:
/// - Path separators: / \
/// - Reserved characters: : * ? " < > |
/// - Control characters
/// - Trim leading/trailing whitespace and dots
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    // Trim whitespace and dots from start/end
    sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Checks that a format string only uses known placeholders
///
/// Supported placeholders are `{id}`, `{quality}`, `{title}` and `{ext}`.
pub fn validate_format(format: &str) -> Result<(), NamingError> {
    let mut rest = format;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            return Err(NamingError::InvalidFormat(format!(
                "unclosed placeholder in {:?}",
                format
            )));
        };

        let name = &rest[start + 1..start + len];
        if !PLACEHOLDERS.contains(&name) {
            return Err(NamingError::InvalidFormat(format!(
                "unknown placeholder {{{}}}, expected one of: {}",
                name,
                PLACEHOLDERS.join(", ")
            )));
        }

        rest = &rest[start + len + 1..];
    }

    if sanitize_filename(&format.replace('{', "").replace('}', "")).is_empty() {
        return Err(NamingError::InvalidFormat(
            "format produces an empty filename".to_string(),
        ));
    }

    Ok(())
}

/// Formats an output filename from a format string
///
/// Placeholders:
/// - `{id}` - Video identifier
/// - `{quality}` - Variant suffix, e.g. `maxresdefault`
/// - `{title}` - Video title (sanitized)
/// - `{ext}` - File extension (without dot)
///
/// The result is sanitized as a whole so a format can never escape the
/// output directory.
///
/// # Examples
///
/// ```
/// use thumb_grabber::format_filename;
///
/// let name = format_filename("{id}-{quality}.{ext}", "dQw4w9WgXcQ", "hqdefault", "Title", "jpg");
/// assert_eq!(name, "dQw4w9WgXcQ-hqdefault.jpg");
/// ```
pub fn format_filename(
    format: &str,
    id: &str,
    quality: &str,
    title: &str,
    extension: &str,
) -> String {
    let result = format
        .replace("{id}", id)
        .replace("{quality}", quality)
        .replace("{title}", &sanitize_filename(title))
        .replace("{ext}", extension);

    sanitize_filename(&result)
}

/// Picks a destination in `dir` that does not overwrite an existing file
///
/// For existing names, adds numeric suffix starting from 2:
/// - First occurrence: `name.ext`
/// - Second occurrence: `name (2).ext`
/// - Third occurrence: `name (3).ext`
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let extension = path.extension().and_then(|e| e.to_str());

    (2..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
