//! Segment selection policy.
//!
//! Turns the collaborator's raw shot/action intervals into the bounded,
//! ordered analysis plan the frame sampler consumes.

use std::cmp::Ordering;

use icoach_indexing::RawInterval;
use icoach_models::Segment;
use tracing::debug;

use crate::config::AnalysisConfig;

/// Select and order segments for frame analysis.
///
/// - Intervals shorter than `min_segment_len_s` are discarded.
/// - Surviving shots are labeled `"shot"`; actions `"action:<label>"`
///   (falling back to `"action"` when the collaborator gave no label).
/// - The merged sequence is sorted ascending by start. The sort is stable,
///   so entries with equal starts keep their original relative order.
/// - The result is truncated to `max_selected_segments`. A caller-supplied
///   cap is the orchestrator's concern, applied after selection.
///
/// Deterministic given deterministic input ordering.
pub fn select_segments(
    shots: &[RawInterval],
    actions: &[RawInterval],
    config: &AnalysisConfig,
) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::with_capacity(shots.len() + actions.len());

    for shot in shots {
        if shot.end - shot.start >= config.min_segment_len_s {
            segments.push(Segment::new(shot.start, shot.end, "shot"));
        }
    }

    for action in actions {
        if action.end - action.start >= config.min_segment_len_s {
            let label = action.label.as_deref().unwrap_or("action");
            segments.push(Segment::new(
                action.start,
                action.end,
                format!("action:{label}"),
            ));
        }
    }

    // Stable sort on start only: ties keep shot-before-action input order.
    segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
    if segments.len() > config.max_selected_segments {
        debug!(
            selected = config.max_selected_segments,
            dropped = segments.len() - config.max_selected_segments,
            "segment cap reached"
        );
        segments.truncate(config.max_selected_segments);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: f64, end: f64, label: Option<&str>) -> RawInterval {
        RawInterval {
            start,
            end,
            label: label.map(str::to_string),
        }
    }

    #[test]
    fn test_short_shot_dropped_action_labeled() {
        let shots = vec![interval(0.0, 1.5, None)];
        let actions = vec![interval(2.0, 5.0, Some("point"))];
        let segments = select_segments(&shots, &actions, &AnalysisConfig::default());

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, "action:point");
        assert_eq!(segments[0].start, 2.0);
    }

    #[test]
    fn test_unlabeled_action_gets_fallback_label() {
        let actions = vec![interval(0.0, 3.0, None)];
        let segments = select_segments(&[], &actions, &AnalysisConfig::default());
        assert_eq!(segments[0].label, "action:action");
    }

    #[test]
    fn test_sorted_by_start() {
        let shots = vec![interval(10.0, 14.0, None), interval(0.0, 4.0, None)];
        let actions = vec![interval(5.0, 8.0, Some("nod"))];
        let segments = select_segments(&shots, &actions, &AnalysisConfig::default());

        let starts: Vec<f64> = segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_stable_on_equal_starts() {
        // Shot and action start together: shot was merged first, so it stays
        // first after the stable sort.
        let shots = vec![interval(3.0, 8.0, None)];
        let actions = vec![interval(3.0, 6.0, Some("lean"))];
        let segments = select_segments(&shots, &actions, &AnalysisConfig::default());

        assert_eq!(segments[0].label, "shot");
        assert_eq!(segments[1].label, "action:lean");
    }

    #[test]
    fn test_capped_at_twenty() {
        let shots: Vec<RawInterval> = (0..30)
            .map(|i| interval(i as f64 * 10.0, i as f64 * 10.0 + 5.0, None))
            .collect();
        let segments = select_segments(&shots, &[], &AnalysisConfig::default());

        assert_eq!(segments.len(), 20);
        assert_eq!(segments.last().unwrap().start, 190.0);
    }

    #[test]
    fn test_exactly_min_length_is_eligible() {
        let shots = vec![interval(0.0, 2.0, None)];
        let segments = select_segments(&shots, &[], &AnalysisConfig::default());
        assert_eq!(segments.len(), 1);
    }
}
