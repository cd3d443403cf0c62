//! Text cleanup for filenames and correlation keys.
//!
//! Slide and module titles end up in artifact filenames, so they are folded
//! to ASCII and stripped of anything a filesystem may reject.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Regex matching characters dropped from titles used in file names.
static NON_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

/// Regex to collapse whitespace runs.
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Regex matching the `Module N:` prefix of a module slide title.
static MODULE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*module\s+\d+\s*:?\s*").unwrap());

/// Longest stem produced by [`safe_file_stem`].
const MAX_STEM_CHARS: usize = 60;

/// Fold accented letters to their ASCII base (`é` → `e`).
fn fold_to_ascii(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Build a filename stem from a slide title.
///
/// Every character that is not an ASCII letter or digit becomes `_`.
pub fn safe_file_stem(title: &str) -> String {
    let stem: String = fold_to_ascii(title)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        "slide".to_string()
    } else {
        stem
    }
}

/// Clean a title for quiz and exam filenames: punctuation removed,
/// whitespace runs replaced by a single `_`.
pub fn clean_title(title: &str) -> String {
    let folded = fold_to_ascii(title);
    let stripped = NON_WORD_REGEX.replace_all(&folded, "");
    WHITESPACE_REGEX.replace_all(stripped.trim(), "_").to_string()
}

/// Extract the bare module name from a module slide title
/// (`"Module 3: Foo"` → `"Foo"`).
pub fn module_name_from_title(title: &str) -> String {
    let name = MODULE_PREFIX_REGEX.replace(title, "");
    let name = name.trim();
    if name.is_empty() {
        title.trim().to_string()
    } else {
        name.to_string()
    }
}

/// Drop a trailing " Fundamentals" from a course name.
pub fn strip_fundamentals(name: &str) -> Option<&str> {
    name.strip_suffix(" Fundamentals")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Module 1: Security"), "Module_1__Security");
        assert_eq!(safe_file_stem("1.2: Zero-Trust"), "1_2__Zero_Trust");
        assert_eq!(safe_file_stem("Café résumé"), "Cafe_resume");
        assert_eq!(safe_file_stem(""), "slide");
    }

    #[test]
    fn test_safe_file_stem_is_bounded() {
        let long = "x".repeat(200);
        assert_eq!(safe_file_stem(&long).len(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("AI Security: The Basics!"), "AI_Security_The_Basics");
        assert_eq!(clean_title("  Zero-Trust   Networks "), "Zero-Trust_Networks");
        assert_eq!(clean_title("Déjà vu"), "Deja_vu");
    }

    #[test]
    fn test_module_name_from_title() {
        assert_eq!(module_name_from_title("Module 3: Foo"), "Foo");
        assert_eq!(module_name_from_title("Module 12:  Bar Baz"), "Bar Baz");
        assert_eq!(module_name_from_title("Foo"), "Foo");
        assert_eq!(module_name_from_title("Module"), "Module");
    }

    #[test]
    fn test_strip_fundamentals() {
        assert_eq!(strip_fundamentals("AI Defense Fundamentals"), Some("AI Defense"));
        assert_eq!(strip_fundamentals("AI Defense"), None);
    }
}
