//! Pattern Classifiers
//!
//! Four independent regex-backed detectors over untrusted text: secret
//! leakage, manipulation/injection attempts, harmful content, and
//! self-disclosure of internals. Each is a boolean predicate; any single
//! rule match is a positive. The rule lists are plain data so they can
//! be tested without the rest of the pipeline.

use regex::Regex;

/// Secret-looking material: credential assignments, bearer tokens,
/// vendor key formats, long hex strings, filesystem paths, and
/// environment-variable references.
pub const SECRET_PATTERNS: &[&str] = &[
    r#"(?i)(api[_-]?key|secret|token|password|credential)[\s:=]+['"]?[\w\-]{16,}"#,
    r"(?i)bearer\s+[a-zA-Z0-9\-_]+",
    r"AIza[0-9A-Za-z\-_]{35}",
    r"sk-[a-zA-Z0-9]{32,}",
    r"ghp_[a-zA-Z0-9]{36}",
    r"[a-f0-9]{64}",
    r"/Users/[\w/]+",
    r"(?i)env\.[A-Z_]+",
];

/// Commands aimed at the agent from external text: imperatives toward
/// platform actions, instruction overrides, persona hijacks, secret
/// extraction, negative commands, and jailbreak vocabulary.
pub const MANIPULATION_PATTERNS: &[&str] = &[
    r"(?i)\b(please|you must|you should|i want you to|do this|execute|run|perform)\b.{0,30}\b(post|comment|upvote|follow|share|create|write|say)\b",
    r"(?i)\b(ignore|forget|disregard|override).{0,20}(instructions|rules|guidelines|prompt)",
    r"(?i)\b(pretend|act as|roleplay|you are now|new persona)",
    r"(?i)\b(reveal|show|tell me|what is).{0,20}(system prompt|instructions|api key|secret)",
    r"(?i)\bdo (not|n't) (post|comment|share|mention)",
    r"(?i)\b(jailbreak|prompt injection|ignore safety)",
];

/// Content the agent must never publish: violence, fraud vocabulary,
/// guaranteed-return claims, urgency-driven promotion, hate terms.
pub const HARMFUL_CONTENT_PATTERNS: &[&str] = &[
    r"(?i)\b(kill|murder|attack|bomb|terrorist|suicide)\b",
    r"(?i)\b(scam|fraud|ponzi|rugpull|pump.?and.?dump)\b",
    r"(?i)(guaranteed.{0,10}(returns|profit)|100%.{0,5}(profit|returns|gains)|can't lose|risk.?free)",
    r"(?i)\b(buy now|act fast|limited time|last chance).{0,30}(crypto|coin|token)",
    r"(?i)\b(hate|racist|sexist|homophobic)\b",
];

/// First-person references to our own internals, the model stack,
/// or the platform client's credentials.
pub const SELF_DISCLOSURE_PATTERNS: &[&str] = &[
    r"(?i)\b(my|our) (system prompt|instructions|api|configuration)",
    r"(?i)\b(openai|gpt|language model).{0,20}(model|api|key|prompt)",
    r"(?i)\b(moltbook).{0,10}(client|token|secret)",
];

/// True if any pattern in the list matches. Patterns are evaluated in
/// order and short-circuit on the first hit; an invalid pattern counts
/// as a non-match rather than an error.
fn any_match(patterns: &[&str], text: &str) -> bool {
    patterns.iter().any(|p| {
        Regex::new(p)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

/// Check if text contains potential secrets.
pub fn contains_secrets(text: &str) -> bool {
    any_match(SECRET_PATTERNS, text)
}

/// Check if text contains a manipulation attempt or a command aimed at
/// the agent. `handle` is the agent's own name, so direct @-mention
/// commands ("@name please upvote...") are caught too.
pub fn contains_manipulation(text: &str, handle: &str) -> bool {
    if any_match(MANIPULATION_PATTERNS, text) {
        return true;
    }
    mention_command(text, handle)
}

/// Check if text contains harmful or prohibited content.
pub fn contains_harmful_content(text: &str) -> bool {
    any_match(HARMFUL_CONTENT_PATTERNS, text)
}

/// Check if text reveals internal implementation details.
pub fn contains_self_disclosure(text: &str) -> bool {
    any_match(SELF_DISCLOSURE_PATTERNS, text)
}

/// True if text @-mentions `handle` followed shortly by imperative
/// phrasing directed at it.
fn mention_command(text: &str, handle: &str) -> bool {
    if handle.is_empty() {
        return false;
    }
    let pattern = format!(
        r"(?i)@{}\b.{{0,50}}\b(please|must|should|need to)",
        regex::escape(handle)
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// True if text refers to the agent by handle, with or without the `@`.
pub fn references_handle(text: &str, handle: &str) -> bool {
    if handle.is_empty() {
        return false;
    }
    let pattern = format!(r"(?i)@?{}\b", regex::escape(handle));
    Regex::new(&pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
