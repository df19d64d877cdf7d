//! File classification by extension: which files are renderable content, and which
//! `Content-Type` an upload is sent with.

/// Extensions (lower-case, no dot) of markdown-class content files.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Sent for any extension missing from [`CONTENT_TYPES`].
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension to `Content-Type` lookup table. Extend by adding rows.
pub const CONTENT_TYPES: &[(&str, &str)] = &[
    ("md", "text/markdown; charset=utf-8"),
    ("mdx", "text/markdown; charset=utf-8"),
    ("markdown", "text/markdown; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("csv", "text/csv"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("zip", "application/zip"),
];

/// Returns the `Content-Type` for an extension, case-insensitively.
pub fn content_type_for(extension: &str) -> &'static str {
    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

pub fn is_markdown_extension(extension: &str) -> bool {
    MARKDOWN_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

/// True when the final segment of `path` carries a markdown-class extension.
pub fn is_content_path(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => is_markdown_extension(ext),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_to_their_type() {
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("MD"), "text/markdown; charset=utf-8");
    }

    #[test]
    fn unknown_extension_falls_back_to_binary() {
        assert_eq!(content_type_for("xyz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(""), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn content_paths_are_markdown_family_only() {
        assert!(is_content_path("README.md"));
        assert!(is_content_path("docs/guide.MDX"));
        assert!(is_content_path("notes/a.markdown"));
        assert!(!is_content_path("img/logo.png"));
        assert!(!is_content_path("md"));
        assert!(!is_content_path(".md"));
    }
}
