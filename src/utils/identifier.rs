/// Collection prefix carried by current-generation note names (`memos/<token>`)
pub const NOTE_NAME_PREFIX: &str = "memos/";

/// Strip surrounding whitespace and a single leading `memos/` prefix.
///
/// Only one prefix is removed, together with any slashes right after it, so
/// `memos/abc` and `abc` both become `abc`.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix(NOTE_NAME_PREFIX) {
        Some(rest) => rest.trim_start_matches('/').to_string(),
        None => trimmed.to_string(),
    }
}

/// Normalized identifier, percent-encoded for use as one URL path segment
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(&normalize_identifier(raw)).into_owned()
}

/// CEL filter expression matching notes whose content contains `query`
pub fn content_filter(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
    format!("content.contains(\"{}\")", escaped)
}
