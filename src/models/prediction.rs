//! Top-1 prediction: argmax over raw scores plus label lookup

use std::path::Path;
use tracing::error;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Ordered class names, index `i` maps to output position `i`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parse one label per line
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
        )
    }

    /// Read the table from disk. A missing or unreadable file yields an empty table.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Labels file not found");
                Self::default()
            }
        }
    }

    /// Label for a class index, `"Unknown"` when out of range
    pub fn label(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Top-1 result for one score vector
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub score: f32,
    /// Probability of the predicted class, in `[0, 1]`
    pub confidence: f32,
}

/// Index and value of the largest score; the first occurrence wins ties and NaN never wins
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if s <= b => best,
            _ => Some((i, s)),
        })
}

fn is_distribution(scores: &[f32]) -> bool {
    let in_range = scores.iter().all(|&s| (0.0..=1.0).contains(&s));
    let sum: f32 = scores.iter().sum();
    in_range && (sum - 1.0).abs() <= 1e-3
}

/// Probability of `index`: the score itself when the output already is a
/// distribution, softmax otherwise
pub fn confidence(scores: &[f32], index: usize) -> f32 {
    let Some(&score) = scores.get(index) else {
        return 0.0;
    };
    if is_distribution(scores) {
        return score;
    }

    // Infinite logits take all of the mass, shared equally
    let infinite = scores.iter().filter(|&&s| s == f32::INFINITY).count();
    if infinite > 0 {
        return if score == f32::INFINITY {
            1.0 / infinite as f32
        } else {
            0.0
        };
    }

    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() || !score.is_finite() {
        return 0.0;
    }
    let denom: f32 = scores
        .iter()
        .filter(|s| s.is_finite())
        .map(|&s| (s - max).exp())
        .sum();
    ((score - max).exp() / denom).clamp(0.0, 1.0)
}

/// Resolve the top-1 prediction against a label table
pub fn resolve_prediction(scores: &[f32], labels: &LabelTable) -> Option<Prediction> {
    let (index, score) = argmax(scores)?;
    Some(Prediction {
        index,
        label: labels.label(index).to_string(),
        score,
        confidence: confidence(scores, index),
    })
}
