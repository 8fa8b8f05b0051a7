//! Collaborator analysis payloads.

use serde_json::Value;

/// One raw time interval from the collaborator's analysis.
///
/// Shot intervals carry no label; action intervals usually do.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInterval {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Free-text label, when the collaborator provided one
    pub label: Option<String>,
}

/// The collaborator's full analysis output for one video.
///
/// The payload is opaque JSON; only the `shots` and `actions` arrays are
/// interpreted here. Everything else is carried through verbatim for the
/// result envelope.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    raw: Value,
}

impl VideoAnalysis {
    /// Wrap a raw analysis payload.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// The full raw payload.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Shot boundary intervals.
    pub fn shots(&self) -> Vec<RawInterval> {
        intervals_from(&self.raw, "shots")
    }

    /// Action event intervals.
    pub fn actions(&self) -> Vec<RawInterval> {
        intervals_from(&self.raw, "actions")
    }

    /// The raw payload restricted to the given top-level keys.
    pub fn filtered(&self, keys: &[&str]) -> Value {
        let mut out = serde_json::Map::new();
        if let Some(obj) = self.raw.as_object() {
            for key in keys {
                if let Some(v) = obj.get(*key) {
                    out.insert((*key).to_string(), v.clone());
                }
            }
        }
        Value::Object(out)
    }
}

/// Extract `(start, end, label)` intervals from one array of the payload.
///
/// Entries with a missing or non-numeric start/end are skipped rather than
/// failing the whole analysis.
fn intervals_from(raw: &Value, key: &str) -> Vec<RawInterval> {
    let Some(items) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let start = item.get("start")?.as_f64()?;
            let end = item.get("end")?.as_f64()?;
            let label = item
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(RawInterval { start, end, label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis() -> VideoAnalysis {
        VideoAnalysis::new(json!({
            "shots": [
                {"start": 0.0, "end": 4.5},
                {"start": "bad", "end": 9.0},
                {"start": 6.0, "end": 9.0}
            ],
            "actions": [
                {"start": 1.0, "end": 3.5, "label": "point"}
            ],
            "captions": [{"text": "hello"}],
            "objects": [{"name": "chair"}]
        }))
    }

    #[test]
    fn test_shots_skip_malformed_entries() {
        let shots = analysis().shots();
        assert_eq!(shots.len(), 2);
        assert_eq!(shots[0].start, 0.0);
        assert_eq!(shots[1].end, 9.0);
        assert!(shots[0].label.is_none());
    }

    #[test]
    fn test_actions_carry_labels() {
        let actions = analysis().actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].label.as_deref(), Some("point"));
    }

    #[test]
    fn test_missing_key_is_empty() {
        let empty = VideoAnalysis::new(json!({}));
        assert!(empty.shots().is_empty());
        assert!(empty.actions().is_empty());
    }

    #[test]
    fn test_filtered_keeps_only_requested_keys() {
        let filtered = analysis().filtered(&["shots", "captions", "ocr"]);
        let obj = filtered.as_object().unwrap();
        assert!(obj.contains_key("shots"));
        assert!(obj.contains_key("captions"));
        assert!(!obj.contains_key("objects"));
        assert!(!obj.contains_key("ocr"));
    }
}
