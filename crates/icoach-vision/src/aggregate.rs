//! Reduction of per-frame metric records into summary statistics.
//!
//! A pure reduction: the record order never affects the result, and the
//! empty collection reduces to the all-zero `frames == 0` state rather
//! than an error.

use icoach_models::{MetricRecord, SummaryStatistics};

use crate::config::AnalysisConfig;

/// Median of a value collection (numpy semantics: even-length collections
/// average the two middle values). Empty input yields 0.0.
fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Arithmetic mean; 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0); 0.0 for empty input.
fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Fraction of records satisfying a predicate, over ALL retained records.
fn fraction<F: Fn(&MetricRecord) -> bool>(records: &[MetricRecord], pred: F) -> f64 {
    records.iter().filter(|r| pred(r)).count() as f64 / records.len() as f64
}

/// Reduce all retained records from one run into summary statistics.
pub fn aggregate(records: &[MetricRecord], config: &AnalysisConfig) -> SummaryStatistics {
    if records.is_empty() {
        return SummaryStatistics::default();
    }

    let ears: Vec<f64> = records.iter().map(|r| r.ear).collect();
    let smiles: Vec<f64> = records.iter().map(|r| r.smile_idx).collect();
    let bbox_areas: Vec<f64> = records.iter().map(|r| r.bbox_area).collect();
    let lumas: Vec<f64> = records.iter().map(|r| r.luma).collect();

    let blink_count = ears
        .iter()
        .filter(|ear| **ear < config.blink_ear_threshold)
        .count();

    let eye_contact_pct = fraction(records, |r| {
        r.yaw.abs() <= config.eye_contact_max_yaw_deg
            && r.pitch.abs() <= config.eye_contact_max_pitch_deg
    });

    // One pooled population of yaw and pitch values, not per-axis.
    let mut pooled: Vec<f64> = records.iter().map(|r| r.yaw).collect();
    pooled.extend(records.iter().map(|r| r.pitch));
    let head_movement_std = population_std(&pooled);

    let torso: Vec<f64> = records.iter().filter_map(|r| r.torso_lean_deg).collect();
    let shoulder: Vec<f64> = records
        .iter()
        .filter_map(|r| r.shoulder_level_diff)
        .collect();

    SummaryStatistics {
        frames: records.len(),
        ear_median: median(ears),
        blink_count,
        smile_median: median(smiles),
        eye_contact_pct,
        head_movement_std,
        framing_avg: mean(&bbox_areas),
        lighting_mean: mean(&lumas),
        torso_lean_median_deg: median(torso),
        shoulder_level_diff_mean: mean(&shoulder),
        // Absent posture data counts as false, not excluded.
        hands_visible_pct: fraction(records, |r| r.hands_visible),
        hands_near_face_pct: fraction(records, |r| r.hands_near_face),
        arms_crossed_pct: fraction(records, |r| r.arms_crossed),
    }
}
