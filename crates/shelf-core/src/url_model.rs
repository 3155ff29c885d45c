//! Local file names derived from download URLs.
//!
//! Used when the caller supplies a directory instead of a full destination path.

/// Name used when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.pdf";

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

/// Derives a safe file name from the last non-empty path segment of `url`.
///
/// - `derive_filename("https://example.com/books/dune.epub")` → `"dune.epub"`
/// - `derive_filename("https://example.com/")` → `"download.pdf"`
pub fn derive_filename(url: &str) -> String {
    last_path_segment(url)
        .map(|s| sanitize_filename(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Last non-empty path segment, percent-decoded (raw if it is not valid UTF-8).
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment).unwrap_or_else(|e| {
        tracing::debug!(segment, error = %e, "percent-decoding failed, using raw segment");
        segment.into()
    });
    Some(decoded.into_owned())
}

/// Replaces path separators, NUL, control characters and whitespace with `_`
/// (runs collapse to one), trims leading/trailing dots and underscores, and
/// caps the result at NAME_MAX bytes.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        if unsafe_char {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
