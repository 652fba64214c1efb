//! Pure helpers shared by the pipeline and the chat front end.

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn an arbitrary title into a filename safe on all supported platforms.
///
/// Path-hostile characters are stripped, runs of whitespace and dots in the
/// stem collapse to a single `_`, and the final extension segment (if any)
/// is preserved as-is. Idempotent: sanitizing twice is a no-op.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();

    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (cleaned.as_str(), None),
    };

    let mut collapsed = String::with_capacity(stem.len());
    let mut in_run = false;
    for c in stem.chars() {
        if c.is_whitespace() || c == '.' {
            if !in_run {
                collapsed.push('_');
                in_run = true;
            }
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    match ext {
        Some(ext) => format!("{collapsed}.{ext}"),
        None => collapsed,
    }
}

/// Render a byte count as a human-readable size, e.g. `1.00 MB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut magnitude = 0;
    let mut scale: u64 = 1;
    while magnitude + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        magnitude += 1;
    }

    let value = bytes as f64 / scale as f64;
    format!("{value:.2} {}", UNITS[magnitude])
}
