//! Submission code extraction module
//!
//! This module handles pulling reviewable code out of raw message text:
//! - Fenced code blocks (triple backticks, optional language tag)
//! - Inline code spans (single backticks) as a fallback
//! - Plagiarism normalization and duplicate detection

pub mod message;
pub mod plagiarism;

pub use message::{extract_code, language_from_tag, ExtractedCode};
pub use plagiarism::{is_copied, normalize};

use sha2::{Digest, Sha256};

/// Compute a stable hash for content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash of a submission's code after plagiarism normalization.
///
/// Stored on the submission row so exact duplicates can be found without
/// re-normalizing every prior submission.
pub fn code_fingerprint(code: &str) -> String {
    content_hash(&normalize(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let a = "let x = 1; // counter";
        let b = "LET X=1;";
        assert_eq!(code_fingerprint(a), code_fingerprint(b));
    }
}
