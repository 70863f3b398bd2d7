//! Emotion scoring: turns a per-utterance emotion-probability vector into
//! the scalars the rest of the system reacts to.
//!
//! Two scoring paths exist:
//! - [`compute_discount`]: storefront path, [0,25] percent off driven by the
//!   single strongest stress-indicating label.
//! - [`compute_stress`]: productivity path, [0,100] Weighted Emotional Index
//!   combining distress, anxiety, and cognitive-overload groups.
//!
//! Both are pure, deterministic, and total: an empty vector scores 0, and
//! out-of-range probabilities are clamped instead of propagated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stress-indicating labels that drive the storefront discount.
const DISCOUNT_LABELS: [&str; 4] = ["distress", "frustration", "anxiety", "sadness"];

/// Distress group for the Weighted Emotional Index (weight 0.5).
const DISTRESS_LABELS: [&str; 4] = ["distress", "sadness", "frustration", "disappointment"];

/// Anxiety group for the Weighted Emotional Index (weight 0.3).
const ANXIETY_LABELS: [&str; 4] = ["anxiety", "fear", "nervousness", "worry"];

/// Cognitive-overload group for the Weighted Emotional Index (weight 0.2).
const OVERLOAD_LABELS: [&str; 3] = ["tiredness", "boredom", "confusion"];

/// A per-utterance mapping of emotion label to confidence probability.
///
/// Labels are canonicalized to lowercase on construction so upstream casing
/// differences never affect lookups. Values are independent per-label
/// confidences and need not sum to 1. Each new vector fully replaces the
/// prior one; there is no merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionVector(HashMap<String, f64>);

impl EmotionVector {
    /// Create an empty vector (scores 0 everywhere).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a label's probability; missing labels read as 0.
    pub fn score(&self, label: &str) -> f64 {
        self.0.get(&label.to_lowercase()).copied().unwrap_or(0.0)
    }

    /// True if no labels were reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The highest-confidence label, if any. Used for audit trails
    /// ("frustration (82%)"), not for scoring.
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.0
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, score)| (label.as_str(), *score))
    }

    /// Maximum clamped probability over a label subset; missing labels
    /// contribute 0, never error.
    fn group_max(&self, labels: &[&str]) -> f64 {
        labels
            .iter()
            .map(|label| self.score(label).clamp(0.0, 1.0))
            .fold(0.0, f64::max)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EmotionVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(label, score)| (label.into().to_lowercase(), score))
                .collect(),
        )
    }
}

impl From<HashMap<String, f64>> for EmotionVector {
    fn from(map: HashMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

/// Breakdown of the Weighted Emotional Index components, exposed for
/// logging and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressComponents {
    /// Max over the distress group, weight 0.5.
    pub distress: f64,
    /// Max over the anxiety group, weight 0.3.
    pub anxiety: f64,
    /// Max over the overload group, weight 0.2.
    pub overload: f64,
}

impl StressComponents {
    /// The weighted total in [0,1].
    pub fn total(&self) -> f64 {
        0.5 * self.distress + 0.3 * self.anxiety + 0.2 * self.overload
    }
}

/// Compute the storefront discount percentage in [0,25].
///
/// Linear in the maximum stress-label probability: a single highly-confident
/// negative emotion dominates, averages do not dilute it.
pub fn compute_discount(vector: &EmotionVector) -> u8 {
    let max_stress = vector.group_max(&DISCOUNT_LABELS);
    ((max_stress * 25.0).round() as i64).clamp(0, 25) as u8
}

/// Component maxima for the Weighted Emotional Index.
pub fn stress_components(vector: &EmotionVector) -> StressComponents {
    StressComponents {
        distress: vector.group_max(&DISTRESS_LABELS),
        anxiety: vector.group_max(&ANXIETY_LABELS),
        overload: vector.group_max(&OVERLOAD_LABELS),
    }
}

/// Compute the Weighted Emotional Index stress score in [0,100].
///
/// `0.5 * distress_max + 0.3 * anxiety_max + 0.2 * overload_max`, scaled to
/// 100. The weights are fixed constants: distress is the dominant burnout
/// signal, anxiety secondary, cognitive overload a smaller modulating
/// factor. They must not drift, downstream history is numerically
/// comparable across sessions.
pub fn compute_stress(vector: &EmotionVector) -> u8 {
    let total = stress_components(vector).total();
    ((total * 100.0).round() as i64).clamp(0, 100) as u8
}

/// Scale the global discount by a product's emotion boost.
///
/// The boost lets each product dampen or amplify the shared emotional
/// discount; it is clamped to [0,1] before use.
pub fn compute_product_discount(global_discount: u8, emotion_boost: f64) -> u8 {
    let boost = emotion_boost.clamp(0.0, 1.0);
    ((f64::from(global_discount) * boost).round() as i64).clamp(0, 25) as u8
}
