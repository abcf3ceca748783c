use std::sync::LazyLock;

use regex::Regex;

/// Leading words and phrases that mark a query as a personal task or device
/// command rather than a question.
pub const COMMAND_PREFIXES: &[&str] = &[
    "add",
    "buy",
    "remind",
    "walk",
    "call",
    "message",
    "email",
    "schedule",
    "set alarm",
    "turn on",
    "turn off",
    "play music",
];

static COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    build_pattern(COMMAND_PREFIXES).expect("command prefixes form a valid pattern")
});

fn build_pattern(prefixes: &[&str]) -> Result<Regex, regex::Error> {
    let alternation = prefixes
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^(?:{alternation})\b"))
}

/// Syntactic query filter.
///
/// A query is invalid when it is empty or begins with a command prefix.
/// Matching is case-insensitive, ignores surrounding whitespace and treats
/// runs of inner whitespace as a single space.
///
/// # Examples
///
/// ```
/// use sift::classifier::RuleFilter;
///
/// let rules = RuleFilter::new();
/// assert!(!rules.is_valid("Remind me to stretch"));
/// assert!(rules.is_valid("How do reminders work on Android?"));
/// ```
#[derive(Debug, Clone)]
pub struct RuleFilter {
    pattern: Regex,
}

impl Default for RuleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleFilter {
    /// Creates a filter with the built-in [`COMMAND_PREFIXES`].
    pub fn new() -> Self {
        Self {
            pattern: COMMAND_PATTERN.clone(),
        }
    }

    /// Creates a filter with a custom prefix vocabulary.
    pub fn with_prefixes(prefixes: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: build_pattern(prefixes)?,
        })
    }

    pub fn is_valid(&self, query: &str) -> bool {
        let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return false;
        }
        !self.pattern.is_match(&normalized)
    }
}
