//! Maps a site-relative markdown path to the URL path it is served under.

use regex::Regex;
use std::sync::OnceLock;

fn markdown_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r"(?i)\.(md|mdx|markdown)$").expect("static regex"))
}

/// Resolve a site-relative content path to its canonical URL path.
///
/// - the markdown extension is stripped (case-insensitive);
/// - a root `README` becomes `/`;
/// - a trailing `index` segment is dropped once, leaving its parent (or `/`);
/// - anything else is returned as-is, without a leading slash.
///
/// ```
/// use pagedrop_core::path_resolver::resolve;
///
/// assert_eq!(resolve("README.md"), "/");
/// assert_eq!(resolve("docs/index.mdx"), "docs");
/// assert_eq!(resolve("a/b.md"), "a/b");
/// ```
pub fn resolve(relative_content_path: &str) -> String {
    let stripped = markdown_suffix().replace(relative_content_path, "");
    let stem: &str = &stripped;

    if stem.eq_ignore_ascii_case("readme") {
        return "/".to_string();
    }

    let (parent, last) = match stem.rsplit_once('/') {
        Some((parent, last)) => (parent, last),
        None => ("", stem),
    };
    if last.eq_ignore_ascii_case("index") {
        if parent.is_empty() {
            return "/".to_string();
        }
        return parent.to_string();
    }

    stem.to_string()
}
