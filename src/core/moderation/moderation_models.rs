// Moderation domain models - data structures for the content gate.
//
// These are pure domain types with no HTTP or database dependencies.
// The web layer turns a rejected decision into a 400 response.

use std::time::Duration;

/// Where a moderation decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// Served from the in-process result cache
    Cache,
    /// Fresh verdict from the remote classifier
    Classifier,
    /// Local keyword list, used when the classifier is unavailable
    Fallback,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionSource::Cache => write!(f, "cache"),
            DecisionSource::Classifier => write!(f, "classifier"),
            DecisionSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of running a piece of text through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationDecision {
    /// Whether the text may be published
    pub safe: bool,
    /// Which tier produced the answer
    pub source: DecisionSource,
}

impl ModerationDecision {
    pub fn new(safe: bool, source: DecisionSource) -> Self {
        Self { safe, source }
    }
}

/// Verdict returned by a remote classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierVerdict {
    /// True when the text violates the classifier's content policy
    pub flagged: bool,
    /// Names of the categories that triggered, if the provider reports them
    pub categories: Vec<String>,
}

impl ClassifierVerdict {
    pub fn clean() -> Self {
        Self {
            flagged: false,
            categories: Vec::new(),
        }
    }

    pub fn flagged(categories: Vec<String>) -> Self {
        Self {
            flagged: true,
            categories,
        }
    }
}

/// Tunables for the moderation gate.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Maximum number of distinct texts remembered by the result cache
    pub cache_capacity: usize,
    /// Upper bound on a single classifier round trip
    pub classifier_timeout: Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 5_000,
            classifier_timeout: Duration::from_secs(5),
        }
    }
}
