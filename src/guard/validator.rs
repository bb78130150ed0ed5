//! Content Validator
//!
//! The single pass/fail gate for anything the agent is about to publish,
//! plus the redaction pass applied to all outbound text and the
//! engagement screen applied to feed items before the model sees them.

use regex::Regex;

use crate::types::Verdict;

use super::patterns::{
    contains_harmful_content, contains_manipulation, contains_secrets,
    contains_self_disclosure, references_handle, SECRET_PATTERNS,
};

/// Replacement token for redacted secret material.
pub const REDACTION: &str = "[REDACTED]";

/// Outbound content below this many characters is not worth publishing.
pub const MIN_CONTENT_CHARS: usize = 10;

/// Outbound content above this many characters is rejected.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Validate content before publishing. Checks run in fixed priority
/// order and the first failure wins: secrets, harmful content,
/// self-disclosure, then length bounds.
pub fn validate(text: &str) -> Verdict {
    if contains_secrets(text) {
        return Verdict::block("content contains potential secrets");
    }
    if contains_harmful_content(text) {
        return Verdict::block("content contains harmful or prohibited material");
    }
    if contains_self_disclosure(text) {
        return Verdict::block("content reveals internal implementation details");
    }
    let chars = text.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Verdict::block("content too short to be valuable");
    }
    if chars > MAX_CONTENT_CHARS {
        return Verdict::block("content too long");
    }
    Verdict::pass()
}

/// Replace every secret-pattern match with the redaction token.
///
/// Applied to all outbound content even after validation passes; a
/// pattern validation did not trip on verbatim can still be neutralized
/// here. Idempotent: redacted text contains nothing left to redact.
pub fn sanitize(text: &str) -> String {
    let mut sanitized = text.to_string();
    for pattern in SECRET_PATTERNS {
        sanitized = Regex::new(pattern)
            .map(|re| re.replace_all(&sanitized, REDACTION).to_string())
            .unwrap_or(sanitized);
    }
    sanitized
}

/// Screen a feed item (and optionally its replies) for manipulation
/// before engaging with it.
///
/// The item text itself is checked directly. Replies only count when
/// they both look manipulative and reference the agent by `handle`;
/// a reply manipulating some other party does not block engagement
/// with the root item.
pub fn engagement_check(item_text: &str, replies: &[String], handle: &str) -> Verdict {
    if contains_manipulation(item_text, handle) {
        return Verdict::block("post contains manipulation attempt");
    }

    for reply in replies {
        if contains_manipulation(reply, handle) && references_handle(reply, handle) {
            return Verdict::block("reply contains manipulation targeting this agent");
        }
    }

    Verdict::pass()
}
