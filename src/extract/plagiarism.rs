//! Exact-match plagiarism detection
//!
//! A submission is flagged as copied when its normalized form exactly
//! equals the normalized form of a prior submission. Normalization strips
//! comments, whitespace, and case so trivial edits do not hide a copy.
//! Fuzzy similarity is deliberately out of scope.

/// Normalize code for comparison: drop `//` line comments, `/* */` block
/// comments, all whitespace, and case.
pub fn normalize(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            c if c.is_whitespace() => {}
            c => out.extend(c.to_lowercase()),
        }
    }

    out
}

/// Check whether `new_code` duplicates any of the existing submissions.
///
/// An empty candidate or an empty comparison set never flags.
pub fn is_copied(new_code: &str, existing: &[String]) -> bool {
    if existing.is_empty() {
        return false;
    }

    let normalized = normalize(new_code);
    if normalized.is_empty() {
        return false;
    }

    existing.iter().any(|code| normalize(code) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_comments_and_whitespace() {
        let a = "// solution\nfunction Add(a, b) {\n  return a + b; /* sum */\n}";
        let b = "function add(a,b){return a+b;}";
        assert_eq!(normalize(a), normalize(b));
    }

    #[test]
    fn test_empty_existing_never_flags() {
        assert!(!is_copied("let x = 1;", &[]));
    }

    #[test]
    fn test_empty_submission_never_flags() {
        let existing = vec!["let x = 1;".to_string()];
        assert!(!is_copied("", &existing));
        assert!(!is_copied("// only a comment", &existing));
    }

    #[test]
    fn test_whitespace_and_case_variants_flagged() {
        let existing = vec!["function solve(n) { return n * 2; }".to_string()];
        assert!(is_copied(
            "FUNCTION SOLVE(N)\n{\n    RETURN N * 2;\n}",
            &existing
        ));
    }

    #[test]
    fn test_different_code_not_flagged() {
        let existing = vec!["function solve(n) { return n * 2; }".to_string()];
        assert!(!is_copied("function solve(n) { return n + 2; }", &existing));
    }

    #[test]
    fn test_unterminated_block_comment() {
        // A dangling /* swallows the rest, the same as the naive strip
        assert_eq!(normalize("let x = 1; /* oops"), "letx=1;");
    }
}
