use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Filesystem-safe identifier for an entity name.
///
/// Transliterates to ASCII, lowercases, collapses every run of other
/// characters into a single `-` and trims hyphens from both ends. Different
/// names may collide.
pub fn slugify(name: &str) -> String {
    let lower = deunicode::deunicode(name).to_ascii_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}
