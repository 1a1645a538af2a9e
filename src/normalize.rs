//! Raw model outputs to bounded, client-facing results.
//!
//! Ordering is deterministic: scores rank descending, exact ties go to the
//! lower index, and NaN ranks below every real score.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmartfoodError};
use crate::labels::display_label;

pub const TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrediction {
    /// Raw class id, underscores kept.
    pub class: String,
    /// Display form of `class`.
    pub label: String,
    pub confidence: f32,
    pub top_5: Vec<ScoredLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaloriePrediction {
    pub calories: f64,
    /// Index into `food_categories`.
    pub category: usize,
    pub category_confidence: f32,
    pub category_name: String,
}

/// Linear min-max scaling coefficients; index 0 is the calorie feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl ScalerParams {
    /// `(min, max)` of the calorie feature.
    pub fn calorie_bounds(&self) -> Result<(f64, f64)> {
        match (self.min.first(), self.max.first()) {
            (Some(min), Some(max)) => Ok((*min, *max)),
            _ => Err(SmartfoodError::Configuration(
                "scaler params have no calorie bounds".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub food_categories: Vec<String>,
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

fn by_rank(scores: &[f32], a: usize, b: usize) -> Ordering {
    rank_key(scores[b])
        .total_cmp(&rank_key(scores[a]))
        .then(a.cmp(&b))
}

/// Indices of the `k` highest scores, best first. Returns `min(k, len)` entries.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| by_rank(scores, a, b));
    indices.truncate(k);
    indices
}

/// Index of the highest score, lowest index on ties.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    (0..scores.len()).min_by(|&a, &b| by_rank(scores, a, b))
}

/// Inverse min-max scaling. `max == min` collapses every input to `min`.
pub fn denormalize(normalized: f64, min: f64, max: f64) -> f64 {
    normalized * (max - min) + min
}

/// Turn classifier scores into a labelled top-5 prediction.
pub fn classify(scores: &[f32], labels: &[&str]) -> Result<ImagePrediction> {
    let ranked = top_k(scores, TOP_K);
    if ranked.is_empty() {
        return Err(SmartfoodError::InternalInconsistency(
            "model produced no class scores".to_string(),
        ));
    }

    let top_5 = ranked
        .iter()
        .map(|&idx| {
            let label = labels.get(idx).ok_or_else(|| {
                SmartfoodError::InternalInconsistency(format!(
                    "class index {idx} outside label table of {}",
                    labels.len()
                ))
            })?;
            Ok(ScoredLabel {
                label: label.to_string(),
                score: scores[idx],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let best = &top_5[0];
    Ok(ImagePrediction {
        class: best.label.clone(),
        label: display_label(&best.label),
        confidence: best.score,
        top_5,
    })
}

/// Combine the calorie head and the category head of the eating-pattern model.
pub fn calorie_prediction(
    outputs: &[Vec<f32>],
    scaler: &ScalerParams,
    config: &ModelConfig,
) -> Result<CaloriePrediction> {
    let [calorie_out, category_out, ..] = outputs else {
        return Err(SmartfoodError::InternalInconsistency(format!(
            "expected calorie and category outputs, got {} output(s)",
            outputs.len()
        )));
    };
    let normalized = calorie_out.first().copied().ok_or_else(|| {
        SmartfoodError::InternalInconsistency("calorie output is empty".to_string())
    })?;

    let (min, max) = scaler.calorie_bounds()?;
    let calories = denormalize(normalized as f64, min, max);

    let category = argmax(category_out).ok_or_else(|| {
        SmartfoodError::InternalInconsistency("category output is empty".to_string())
    })?;
    let category_name = config.food_categories.get(category).ok_or_else(|| {
        SmartfoodError::InternalInconsistency(format!(
            "category index {category} outside food_categories of {}",
            config.food_categories.len()
        ))
    })?;

    Ok(CaloriePrediction {
        calories,
        category,
        category_confidence: category_out[category],
        category_name: category_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{FOOD_CLASSES, NUM_CLASSES};

    fn softmax_like(seed: u32) -> Vec<f32> {
        // deterministic pseudo-random positive scores normalized to sum 1
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        let raw: Vec<f32> = (0..NUM_CLASSES)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % 10_000) as f32 + 1.0
            })
            .collect();
        let total: f32 = raw.iter().sum();
        raw.into_iter().map(|x| x / total).collect()
    }

    fn model_config(names: &[&str]) -> ModelConfig {
        ModelConfig {
            food_categories: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn top_5_is_full_and_non_increasing() {
        for seed in 1..50 {
            let scores = softmax_like(seed);
            let pred = classify(&scores, &FOOD_CLASSES).unwrap();
            assert_eq!(pred.top_5.len(), 5);
            for pair in pred.top_5.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
            assert_eq!(pred.confidence, pred.top_5[0].score);
        }
    }

    #[test]
    fn unique_maximum_is_the_class() {
        let mut scores = vec![0.001_f32; NUM_CLASSES];
        scores[18] = 0.9;
        scores[40] = 0.05;

        let pred = classify(&scores, &FOOD_CLASSES).unwrap();
        assert_eq!(pred.class, "chicken_curry");
        assert_eq!(pred.label, "chicken curry");
        assert_eq!(pred.confidence, 0.9);
        assert_eq!(pred.top_5[1].label, "french_fries");
    }

    #[test]
    fn ties_break_toward_lower_index() {
        let mut scores = vec![0.0_f32; NUM_CLASSES];
        scores[7] = 0.4;
        scores[3] = 0.4;
        scores[90] = 0.2;

        for _ in 0..3 {
            assert_eq!(top_k(&scores, 3), vec![3, 7, 90]);
            let pred = classify(&scores, &FOOD_CLASSES).unwrap();
            assert_eq!(pred.class, FOOD_CLASSES[3]);
        }
        // the remaining zero scores fill in by index
        assert_eq!(top_k(&scores, 5), vec![3, 7, 90, 0, 1]);
    }

    #[test]
    fn nan_ranks_last() {
        let scores = [f32::NAN, 0.1, 0.7, f32::NAN, 0.2];
        assert_eq!(top_k(&scores, 5), vec![2, 4, 1, 0, 3]);
        assert_eq!(argmax(&scores), Some(2));
    }

    #[test]
    fn top_k_is_bounded_by_length() {
        assert_eq!(top_k(&[0.3, 0.7], 5), vec![1, 0]);
        assert!(top_k(&[], 5).is_empty());
    }

    #[test]
    fn index_outside_label_table_fails_loudly() {
        let mut scores = vec![0.0_f32; NUM_CLASSES + 1];
        scores[NUM_CLASSES] = 1.0;
        let err = classify(&scores, &FOOD_CLASSES).unwrap_err();
        assert!(matches!(err, SmartfoodError::InternalInconsistency(_)));
    }

    #[test]
    fn empty_scores_fail_loudly() {
        assert!(matches!(
            classify(&[], &FOOD_CLASSES),
            Err(SmartfoodError::InternalInconsistency(_))
        ));
    }

    #[test]
    fn denormalize_inverts_min_max_scaling() {
        assert_eq!(denormalize(0.5, 0.0, 1000.0), 500.0);
        assert_eq!(denormalize(0.0, 150.0, 900.0), 150.0);
        assert_eq!(denormalize(1.0, 150.0, 900.0), 900.0);
    }

    #[test]
    fn degenerate_scaler_collapses_to_min() {
        for x in [-3.0, 0.0, 0.37, 1.0, 42.0] {
            assert_eq!(denormalize(x, 200.0, 200.0), 200.0);
        }
    }

    #[test]
    fn argmax_prefers_lower_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn calorie_prediction_combines_both_heads() {
        let scaler = ScalerParams {
            min: vec![0.0, 5.0],
            max: vec![1000.0, 9.0],
        };
        let config = model_config(&["breakfast", "lunch", "dinner", "snack"]);
        let outputs = vec![vec![0.5], vec![0.1, 0.6, 0.2, 0.1]];

        let pred = calorie_prediction(&outputs, &scaler, &config).unwrap();
        assert_eq!(pred.calories, 500.0);
        assert_eq!(pred.category, 1);
        assert_eq!(pred.category_confidence, 0.6);
        assert_eq!(pred.category_name, "lunch");
    }

    #[test]
    fn calorie_prediction_serializes_camel_case() {
        let pred = CaloriePrediction {
            calories: 200.0,
            category: 2,
            category_confidence: 0.5,
            category_name: "dinner".to_string(),
        };
        let json = serde_json::to_value(&pred).unwrap();
        assert_eq!(json["categoryConfidence"], 0.5);
        assert_eq!(json["categoryName"], "dinner");
        assert_eq!(json["category"], 2);
    }

    #[test]
    fn category_outside_config_fails_loudly() {
        let scaler = ScalerParams {
            min: vec![0.0],
            max: vec![1.0],
        };
        let config = model_config(&["breakfast"]);
        let outputs = vec![vec![0.5], vec![0.1, 0.9]];

        let err = calorie_prediction(&outputs, &scaler, &config).unwrap_err();
        assert!(matches!(err, SmartfoodError::InternalInconsistency(_)));
    }

    #[test]
    fn missing_heads_fail_loudly() {
        let scaler = ScalerParams {
            min: vec![0.0],
            max: vec![1.0],
        };
        let config = model_config(&["breakfast"]);

        assert!(calorie_prediction(&[vec![0.5]], &scaler, &config).is_err());
        assert!(calorie_prediction(&[vec![], vec![1.0]], &scaler, &config).is_err());
        assert!(calorie_prediction(&[vec![0.5], vec![]], &scaler, &config).is_err());
    }

    #[test]
    fn empty_scaler_is_a_configuration_error() {
        let scaler = ScalerParams {
            min: vec![],
            max: vec![],
        };
        assert!(matches!(
            scaler.calorie_bounds(),
            Err(SmartfoodError::Configuration(_))
        ));
    }
}
