//! Code extraction from raw message text
//!
//! Challenge submissions arrive as chat messages. A submission is only
//! reviewable if the message carries a code block: either a fenced block
//! (preferred, may carry a language tag) or a single inline span that is
//! long enough to plausibly be code.

/// Minimum content length for an inline span to count as code.
///
/// Short spans like `` `x + y` `` are almost always prose formatting,
/// not a submission.
const MIN_INLINE_CODE_LEN: usize = 15;

/// Code pulled out of a message, with its detected language label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    /// Display name of the detected language ("Unknown" when untagged)
    pub language: String,
    /// The code itself, trimmed of leading/trailing blank lines
    pub code: String,
}

/// Map a fence language tag to a display name, case-insensitively.
///
/// Unrecognized tags map to "Unknown".
pub fn language_from_tag(tag: &str) -> &'static str {
    match tag.to_lowercase().as_str() {
        "js" | "javascript" => "JavaScript",
        "ts" | "typescript" => "TypeScript",
        "py" | "python" => "Python",
        "rs" | "rust" => "Rust",
        "go" | "golang" => "Go",
        "java" => "Java",
        "rb" | "ruby" => "Ruby",
        "cs" | "csharp" => "C#",
        "cpp" | "c++" => "C++",
        "kt" | "kotlin" => "Kotlin",
        "swift" => "Swift",
        "php" => "PHP",
        _ => "Unknown",
    }
}

/// Extract a code block from raw message text.
///
/// Fenced blocks take priority; an inline span is only considered when no
/// fence exists. Plain prose yields `None`.
pub fn extract_code(text: &str) -> Option<ExtractedCode> {
    if let Some(found) = extract_fenced(text) {
        return Some(found);
    }
    extract_inline(text)
}

/// Extract the first triple-backtick fenced block
fn extract_fenced(text: &str) -> Option<ExtractedCode> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];
    let close = rest.find("```")?;
    let block = &rest[..close];

    // A language tag is a bare word on the opening fence line. Without a
    // line break the whole block is code.
    let (tag, body) = match block.find('\n') {
        Some(newline) => {
            let first = block[..newline].trim();
            if !first.is_empty() && is_language_tag(first) {
                (Some(first), &block[newline + 1..])
            } else {
                (None, block)
            }
        }
        None => (None, block),
    };

    let code = trim_blank_lines(body);
    if code.is_empty() {
        return None;
    }

    Some(ExtractedCode {
        language: tag.map(language_from_tag).unwrap_or("Unknown").to_string(),
        code,
    })
}

/// Extract a single-backtick inline span, if it is long enough to be code
fn extract_inline(text: &str) -> Option<ExtractedCode> {
    let open = text.find('`')?;
    let rest = &text[open + 1..];
    let close = rest.find('`')?;
    let span = rest[..close].trim();

    if span.len() <= MIN_INLINE_CODE_LEN {
        return None;
    }

    Some(ExtractedCode {
        language: "Unknown".to_string(),
        code: span.to_string(),
    })
}

fn is_language_tag(word: &str) -> bool {
    word.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '#')
}

/// Drop leading and trailing blank lines, keep interior lines intact
fn trim_blank_lines(s: &str) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(start);
    lines[start..=end].join("\n")
}
