/// Normalizes an extension for allowlist comparison: trims whitespace,
/// strips leading dots and lower-cases it.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// Parses a comma separated extension list such as `"xml, .SSRF,uddf"`.
/// Empty entries are skipped and duplicates are dropped.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for ext in raw.split(',').map(normalize_extension) {
        if !ext.is_empty() && !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

/// Case-insensitive allowlist check. Returns the normalized extension when
/// it is accepted.
pub fn accepted_extension(extension: Option<&str>, allowed: &[String]) -> Option<String> {
    let normalized = normalize_extension(extension?);
    if normalized.is_empty() {
        return None;
    }

    allowed
        .iter()
        .any(|allowed| allowed == &normalized)
        .then_some(normalized)
}
