//! Stored filename derivation.
//!
//! A custom display name wins when it survives sanitization; otherwise the
//! upload is auto-named from a timestamp, a random draw and the original
//! filename. Neither path checks the directory for an existing file, so two
//! uploads with the same custom name and extension overwrite each other.

use crate::models::SourceKind;
use chrono::Utc;
use rand::Rng;

/// Longest sanitized custom name kept, in characters (all ASCII after sanitizing).
pub const MAX_CUSTOM_NAME_LEN: usize = 128;

/// Upper bound (inclusive) of the random component of [`unique_suffix`].
const RANDOM_UPPER_BOUND: u32 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub filename: String,
    pub source_kind: SourceKind,
}

// Unicode whitespace plus the zero-width no-break space (U+FEFF).
fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// Maps arbitrary user text to a token made of `[A-Za-z0-9_-]`.
///
/// Whitespace runs collapse to a single `_` before disallowed characters are
/// dropped, so `"a \t b"` becomes `"a_b"` while `"a _ b"` becomes `"a___b"`.
/// An empty result means the name must be treated as absent.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;

    for c in raw.trim_matches(is_space).chars() {
        if is_space(c) {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;

        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        }
    }

    out.truncate(MAX_CUSTOM_NAME_LEN);
    out
}

/// `<epoch millis>-<random 0..=1e9>`. Collision resistant, not collision proof.
pub fn unique_suffix() -> String {
    let random = rand::thread_rng().gen_range(0..=RANDOM_UPPER_BOUND);
    format!("{}-{}", Utc::now().timestamp_millis(), random)
}

/// Final path component of a client-supplied filename. Both `/` and `\` count
/// as separators because browsers on Windows may send full paths.
pub fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Extension of `filename` including the leading dot, taken after the last dot
/// of the base name. Dotfiles such as `.env` have no extension.
pub fn extension(filename: &str) -> &str {
    let base = base_name(filename);
    match base.rfind('.') {
        None | Some(0) => "",
        Some(idx) => &base[idx..],
    }
}

/// Decides the stored filename for an upload.
pub fn resolve(custom_name: Option<&str>, original_filename: &str) -> ResolvedName {
    resolve_with(custom_name, original_filename, unique_suffix)
}

/// [`resolve`] with an injectable suffix source.
pub fn resolve_with<F>(custom_name: Option<&str>, original_filename: &str, suffix: F) -> ResolvedName
where
    F: FnOnce() -> String,
{
    let ext = extension(original_filename);

    if let Some(raw) = custom_name {
        let clean = sanitize(raw);
        if !clean.is_empty() {
            return ResolvedName {
                filename: format!("{}{}", clean, ext),
                source_kind: SourceKind::CustomNamed,
            };
        }
    }

    // Original name is kept as sent; only directory components are dropped.
    ResolvedName {
        filename: format!("{}-{}", suffix(), base_name(original_filename)),
        source_kind: SourceKind::AutoNamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_digits(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_strips_symbols() {
        assert_eq!(sanitize("My Report!!"), "My_Report");
        assert_eq!(sanitize("  Invoice   2024 \t"), "Invoice_2024");
        assert_eq!(sanitize("a\n\n\tb"), "a_b");
        assert_eq!(sanitize("keep-these_chars"), "keep-these_chars");
    }

    #[test]
    fn test_sanitize_collapse_is_whitespace_only() {
        assert_eq!(sanitize("a _ b"), "a___b");
        assert_eq!(sanitize("a - b"), "a_-_b");
        // A dropped character splits the whitespace run.
        assert_eq!(sanitize("a é b"), "a__b");
    }

    #[test]
    fn test_sanitize_treats_byte_order_mark_as_space() {
        assert_eq!(sanitize("a\u{FEFF}b"), "a_b");
        assert_eq!(sanitize("\u{FEFF}name\u{FEFF}"), "name");
        assert_eq!(sanitize("a \u{FEFF} b"), "a_b");
    }

    #[test]
    fn test_sanitize_only_disallowed_is_empty() {
        assert_eq!(sanitize("!!!"), "");
        assert_eq!(sanitize("   "), "");
        assert_eq!(sanitize("ñáé@#$%"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_output_charset() {
        let inputs = [
            "../../etc/passwd",
            "C:\\Windows\\system32",
            "emoji 🎉 name",
            "tab\tand\nnewline",
            "quotes \"'` and <tags>",
        ];
        for input in inputs {
            let out = sanitize(input);
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "unexpected character in {:?}",
                out
            );
            assert!(!out.chars().any(char::is_whitespace));
        }
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "x".repeat(MAX_CUSTOM_NAME_LEN * 2);
        assert_eq!(sanitize(&long).len(), MAX_CUSTOM_NAME_LEN);
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("photo.JPG"), ".JPG");
        assert_eq!(extension("a.b.tar.gz"), ".gz");
        assert_eq!(extension("README"), "");
        assert_eq!(extension(".env"), "");
        assert_eq!(extension("dir.d/file"), "");
        assert_eq!(extension("C:\\Users\\me\\scan.pdf"), ".pdf");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("scan.pdf"), "scan.pdf");
        assert_eq!(base_name("../../scan.pdf"), "scan.pdf");
        assert_eq!(base_name("C:\\Users\\me\\scan.pdf"), "scan.pdf");
    }

    #[test]
    fn test_unique_suffix_shape() {
        let suffix = unique_suffix();
        let (millis, random) = suffix.split_once('-').unwrap();
        assert!(is_digits(millis));
        assert!(is_digits(random));
        assert!(random.parse::<u64>().unwrap() <= RANDOM_UPPER_BOUND as u64);
    }

    #[test]
    fn test_resolve_custom_name() {
        let resolved = resolve(Some("My Report!!"), "doc.pdf");
        assert_eq!(resolved.filename, "My_Report.pdf");
        assert_eq!(resolved.source_kind, SourceKind::CustomNamed);
    }

    #[test]
    fn test_resolve_custom_name_keeps_last_extension_only() {
        let resolved = resolve(Some("backup"), "a.b.tar.gz");
        assert_eq!(resolved.filename, "backup.gz");
    }

    #[test]
    fn test_resolve_auto_name_preserves_original() {
        let resolved = resolve(None, "photo.JPG");
        assert_eq!(resolved.source_kind, SourceKind::AutoNamed);

        let prefix = resolved.filename.strip_suffix("-photo.JPG").unwrap();
        let (millis, random) = prefix.split_once('-').unwrap();
        assert!(is_digits(millis));
        assert!(is_digits(random));
    }

    #[test]
    fn test_resolve_empty_or_unusable_custom_name_falls_back() {
        let fixed = || "1-2".to_string();
        assert_eq!(
            resolve_with(Some(""), "x.png", fixed),
            resolve_with(None, "x.png", fixed)
        );
        assert_eq!(
            resolve_with(Some("   "), "x.png", fixed).filename,
            "1-2-x.png"
        );
        assert_eq!(
            resolve_with(Some("¡¿?!"), "x.png", fixed).source_kind,
            SourceKind::AutoNamed
        );
    }

    #[test]
    fn test_resolve_auto_name_drops_directories() {
        let resolved = resolve_with(None, "../../evil name.png", || "1-2".to_string());
        assert_eq!(resolved.filename, "1-2-evil name.png");
    }

    #[test]
    fn test_resolve_same_custom_name_collides() {
        let first = resolve(Some("Invoice 2024"), "scan.pdf");
        let second = resolve(Some("Invoice 2024"), "other.pdf");
        assert_eq!(first.filename, second.filename);
    }
}
