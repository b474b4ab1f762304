//! Classifier result types and presentation mapping.

use serde::{Deserialize, Serialize};

/// One label with its confidence, as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub label: String,
    /// In `[0, 1]`; confidences across labels need not sum to 1.
    pub confidence: f64,
}

/// A normalized classifier response: the verdict plus the ranked breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The top-ranked label; the classifier's verdict.
    pub label: String,
    /// Full ranked list, in the order the classifier returned it.
    pub confidences: Vec<Confidence>,
}

/// Emoji shown next to a label in the confidence breakdown and in the
/// mind-change prompt.
pub fn label_emoji(label: &str) -> &'static str {
    match label {
        "modern conceptual art" => "\u{1F3A8}",
        "junk" => "\u{1F6AE}",
        _ => "\u{2753}",
    }
}

/// Emoji for a stored boolean verdict.
pub fn verdict_emoji(is_art: bool) -> &'static str {
    if is_art {
        label_emoji("modern conceptual art")
    } else {
        label_emoji("junk")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_map_to_emoji() {
        assert_eq!(label_emoji("modern conceptual art"), "🎨");
        assert_eq!(label_emoji("junk"), "🚮");
        assert_eq!(label_emoji("watercolor"), "❓");
    }

    #[test]
    fn test_verdict_emoji_matches_labels() {
        assert_eq!(verdict_emoji(true), "🎨");
        assert_eq!(verdict_emoji(false), "🚮");
    }
}
