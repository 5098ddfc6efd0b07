//! Scoring service module
//!
//! Per-candidate factor scores (availability, rating, distance), the
//! weighted combine with the rotation boost, and the deterministic
//! rationale string. Ranking order and tie-breakers live with the
//! recommendation pipeline; this service owns the arithmetic.

use serde::{Deserialize, Serialize};

use crate::application::config::ScoringConfig;
use crate::domain::entities::{RotationConfig, WeightsConfig};

/// Per-factor scores for one candidate, each in `[0, 100]` except the
/// additive rotation boost
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FactorBreakdown {
    pub availability: f64,
    pub rating: f64,
    pub distance: f64,
    /// Additive, not weighted
    pub rotation_boost: f64,
}

/// Computes factor scores and the final weighted score
pub struct ScoringService {
    config: ScoringConfig,
}

impl ScoringService {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// `min(100, min(100, count·10) + min(50, minutes/480·50))`
    pub fn availability_score(&self, slot_count: usize, total_available_minutes: i64) -> f64 {
        let count_part = (slot_count as f64 / 5.0 * 50.0).min(100.0);
        let minutes_part = (total_available_minutes as f64 / (8.0 * 60.0) * 50.0).min(50.0);
        (count_part + minutes_part).min(100.0)
    }

    /// 100 at the job site, exponential decay to 0 beyond the cutoff
    pub fn distance_score(&self, meters: f64) -> f64 {
        if meters <= 0.0 {
            100.0
        } else if meters > self.config.distance_cutoff_meters {
            0.0
        } else {
            100.0 * (-meters / self.config.distance_decay_meters).exp()
        }
    }

    /// Linearly decaying boost for under-utilized contractors; zero at or
    /// above the threshold
    pub fn rotation_boost(&self, utilization: f64, rotation: &RotationConfig) -> f64 {
        if !rotation.enabled {
            return 0.0;
        }
        let utilization = utilization.clamp(0.0, 1.0);
        if utilization < rotation.under_utilization_threshold {
            rotation.boost * (1.0 - utilization / rotation.under_utilization_threshold)
        } else {
            0.0
        }
    }

    /// Weighted sum of the factors plus the candidate's rotation boost,
    /// clamped to `[0, 100]`. The boost is added exactly once here; the
    /// raw config constant is never added again at pipeline level.
    pub fn final_score(&self, breakdown: &FactorBreakdown, weights: &WeightsConfig) -> f64 {
        let weighted = breakdown.availability * weights.availability_weight
            + breakdown.rating * weights.rating_weight
            + breakdown.distance * weights.distance_weight;
        (weighted + breakdown.rotation_boost).clamp(0.0, 100.0)
    }

    /// Deterministic rationale naming the dominant factor by weighted
    /// contribution. Identical inputs always produce the identical
    /// string; the length never exceeds the configured cap.
    pub fn rationale(&self, breakdown: &FactorBreakdown, weights: &WeightsConfig) -> String {
        let contributions = [
            ("availability", breakdown.availability * weights.availability_weight),
            ("rating", breakdown.rating * weights.rating_weight),
            ("distance", breakdown.distance * weights.distance_weight),
        ];
        // ties resolve to the first factor in the fixed order above
        let top = contributions
            .iter()
            .fold(contributions[0], |best, item| {
                if item.1 > best.1 {
                    *item
                } else {
                    best
                }
            });

        let mut rationale = format!(
            "{} leads with {:.1} weighted; availability={:.1} rating={:.1} distance={:.1}",
            top.0, top.1, breakdown.availability, breakdown.rating, breakdown.distance
        );
        if breakdown.rotation_boost > 0.0 {
            rationale.push_str(&format!("; rotation boost +{:.1}", breakdown.rotation_boost));
        }
        truncate_chars(&mut rationale, self.config.rationale_max_chars);
        rationale
    }
}

impl Default for ScoringService {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// A final score rounded to two decimals, as an integer usable as an
/// ordering key; candidates tying on this key fall to the tie-breakers
pub fn rounded_2dp(score: f64) -> i64 {
    (score * 100.0).round() as i64
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        *text = cut;
    }
}
