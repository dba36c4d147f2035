//! Multi-frame voting that turns raw detections into confirmed ones.
//!
//! A single frame's decode can be a false positive from motion blur or
//! partial occlusion. Each decoded value accumulates one vote per frame it
//! appears in; it is reported once its count reaches the threshold and on
//! every later frame it still appears in.

use std::collections::HashMap;

use scanzoom_models::Detection;

/// Vote table keyed by decoded value.
///
/// Counts only grow while a session runs. Values that stop appearing keep
/// their count until [`DetectionVoter::clear`].
#[derive(Debug, Clone)]
pub struct DetectionVoter {
    threshold: u32,
    votes: HashMap<String, u32>,
}

impl DetectionVoter {
    /// Create a voter that confirms values after `threshold` sightings.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            votes: HashMap::new(),
        }
    }

    /// Count one frame's detections and return the confirmed subset, in
    /// input order.
    ///
    /// Detections without a decoded value are ignored and never vote.
    pub fn vote(&mut self, detections: &[Detection]) -> Vec<Detection> {
        let mut confirmed = Vec::new();
        for detection in detections {
            let Some(value) = detection.value() else {
                continue;
            };

            let count = self.votes.entry(value.to_string()).or_insert(0);
            *count = count.saturating_add(1);

            if *count >= self.threshold {
                confirmed.push(detection.clone());
            }
        }
        confirmed
    }

    /// Current count for a value.
    pub fn votes_for(&self, value: &str) -> u32 {
        self.votes.get(value).copied().unwrap_or(0)
    }

    /// Number of distinct values seen since the last clear.
    pub fn tracked_values(&self) -> usize {
        self.votes.len()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Drop every count.
    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanzoom_models::BoundingBox;

    fn det(value: &str) -> Detection {
        Detection::new(value, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_confirms_on_third_sighting() {
        let mut voter = DetectionVoter::new(3);

        assert!(voter.vote(&[det("a")]).is_empty());
        assert!(voter.vote(&[det("a")]).is_empty());
        let confirmed = voter.vote(&[det("a")]);
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].value(), Some("a"));
    }

    #[test]
    fn test_confirmed_value_keeps_reporting_past_threshold() {
        let mut voter = DetectionVoter::new(3);
        for _ in 0..3 {
            voter.vote(&[det("a")]);
        }
        for _ in 0..5 {
            assert_eq!(voter.vote(&[det("a")]).len(), 1);
        }
        assert_eq!(voter.votes_for("a"), 8);
    }

    #[test]
    fn test_votes_are_cumulative_across_gaps() {
        let mut voter = DetectionVoter::new(3);
        voter.vote(&[det("a")]);
        voter.vote(&[]);
        voter.vote(&[det("b")]);
        voter.vote(&[det("a")]);
        voter.vote(&[]);
        assert_eq!(voter.vote(&[det("a")]).len(), 1);
        assert_eq!(voter.votes_for("b"), 1);
    }

    #[test]
    fn test_undecoded_detections_never_vote() {
        let mut voter = DetectionVoter::new(3);
        let undecoded = Detection::undecoded(BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        for _ in 0..10 {
            assert!(voter.vote(&[undecoded.clone(), det("")]).is_empty());
        }
        assert_eq!(voter.tracked_values(), 0);
    }

    #[test]
    fn test_mixed_frame_preserves_order() {
        let mut voter = DetectionVoter::new(2);
        voter.vote(&[det("a"), det("b")]);
        let confirmed = voter.vote(&[det("b"), det("c"), det("a")]);
        let values: Vec<_> = confirmed.iter().filter_map(|d| d.value()).collect();
        assert_eq!(values, vec!["b", "a"]);
    }

    #[test]
    fn test_duplicate_value_in_one_frame_votes_twice() {
        let mut voter = DetectionVoter::new(3);
        voter.vote(&[det("a"), det("a")]);
        assert_eq!(voter.votes_for("a"), 2);
        assert_eq!(voter.vote(&[det("a")]).len(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut voter = DetectionVoter::new(3);
        for _ in 0..4 {
            voter.vote(&[det("a"), det("b")]);
        }
        voter.clear();
        assert_eq!(voter.tracked_values(), 0);
        assert!(voter.vote(&[det("a")]).is_empty());
    }

    #[test]
    fn test_zero_threshold_is_raised_to_one() {
        let mut voter = DetectionVoter::new(0);
        assert_eq!(voter.threshold(), 1);
        assert_eq!(voter.vote(&[det("a")]).len(), 1);
    }
}
