//! Multi-model classification report

use serde::{Deserialize, Serialize};
use std::fmt;

/// One model's top-1 prediction for an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub model_name: String,
    pub predicted_label: String,
    /// Probability in `[0, 1]`
    pub confidence: f32,
}

/// Entries in model-list order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub entries: Vec<ClassificationEntry>,
}

impl ClassificationReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label predicted by the most models; ties go to the earliest entry
    pub fn consensus(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for entry in &self.entries {
            let votes = self
                .entries
                .iter()
                .filter(|e| e.predicted_label == entry.predicted_label)
                .count();
            if best.map_or(true, |(_, b)| votes > b) {
                best = Some((entry.predicted_label.as_str(), votes));
            }
        }
        best.map(|(label, _)| label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top Predictions:")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{}: {} (Confidence: {:.2}%)",
                entry.model_name,
                entry.predicted_label,
                entry.confidence * 100.0
            )?;
        }
        Ok(())
    }
}
