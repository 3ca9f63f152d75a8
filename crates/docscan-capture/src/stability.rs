// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stability tracking — decides when the detected page has stopped moving.

use docscan_core::{Quad, ScannerConfig};
use tracing::{debug, trace};

/// Counts consecutive similar observations and reports when the run is
/// long enough to capture.
///
/// The first observation of a run counts as one. A missing observation or
/// a quad that moved too far breaks the run. After a settle the tracker
/// starts over, so the count never exceeds `required`.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    required: u32,
    threshold: f32,
    count: u32,
    last: Option<Quad>,
}

impl StabilityTracker {
    pub fn new(required: u32, threshold: f32) -> Self {
        Self {
            required: required.max(1),
            threshold,
            count: 0,
            last: None,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.required_stable_count, config.similarity_threshold)
    }

    /// Feed one frame's result. Returns `true` exactly when this
    /// observation completes a stable run.
    pub fn observe(&mut self, candidate: Option<Quad>) -> bool {
        let Some(candidate) = candidate else {
            if self.count > 0 {
                trace!(count = self.count, "page lost; stability reset");
            }
            self.reset();
            return false;
        };

        match self.last {
            Some(last) if last.is_similar(&candidate, self.threshold) => self.count += 1,
            Some(_) => {
                trace!(count = self.count, "page moved; new run");
                self.count = 1;
            }
            None => self.count = 1,
        }
        self.last = Some(candidate);

        if self.count >= self.required {
            debug!(required = self.required, "page settled");
            self.reset();
            return true;
        }
        false
    }

    /// Length of the current run.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last(&self) -> Option<Quad> {
        self.last
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::Point;

    fn quad(offset: f32) -> Quad {
        Quad::new(
            Point::new(0.1 + offset, 0.9),
            Point::new(0.9 + offset, 0.9),
            Point::new(0.1 + offset, 0.1),
            Point::new(0.9 + offset, 0.1),
        )
    }

    fn settles_at(tracker: &mut StabilityTracker, frames: &[Option<Quad>]) -> Vec<usize> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(i, q)| tracker.observe(*q).then_some(i + 1))
            .collect()
    }

    #[test]
    fn five_identical_frames_settle_on_the_fifth() {
        let mut tracker = StabilityTracker::new(5, 0.02);
        let frames = vec![Some(quad(0.0)); 5];
        assert_eq!(settles_at(&mut tracker, &frames), vec![5]);
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn movement_restarts_the_run() {
        // Four frames at A, then five at B: the fifth B is the ninth frame.
        let mut tracker = StabilityTracker::new(5, 0.02);
        let mut frames = vec![Some(quad(0.0)); 4];
        frames.extend(vec![Some(quad(0.05)); 5]);
        assert_eq!(settles_at(&mut tracker, &frames), vec![9]);
    }

    #[test]
    fn single_outlier_breaks_the_run() {
        // A x4, B, A x5: settles on frame ten.
        let mut tracker = StabilityTracker::new(5, 0.02);
        let mut frames = vec![Some(quad(0.0)); 4];
        frames.push(Some(quad(0.05)));
        frames.extend(vec![Some(quad(0.0)); 5]);
        assert_eq!(settles_at(&mut tracker, &frames), vec![10]);
    }

    #[test]
    fn missing_frame_resets() {
        let mut tracker = StabilityTracker::new(3, 0.02);
        assert!(!tracker.observe(Some(quad(0.0))));
        assert!(!tracker.observe(Some(quad(0.0))));
        assert!(!tracker.observe(None));
        assert_eq!(tracker.count(), 0);
        assert!(tracker.last().is_none());
        assert!(!tracker.observe(Some(quad(0.0))));
        assert!(!tracker.observe(Some(quad(0.0))));
        assert!(tracker.observe(Some(quad(0.0))));
    }

    #[test]
    fn small_jitter_counts_as_stable() {
        let mut tracker = StabilityTracker::new(3, 0.02);
        let frames = [Some(quad(0.0)), Some(quad(0.01)), Some(quad(0.019))];
        assert_eq!(settles_at(&mut tracker, &frames), vec![3]);
    }

    #[test]
    fn threshold_is_strict() {
        let at = |x: f32| {
            Quad::new(
                Point::new(x, 0.75),
                Point::new(x + 0.5, 0.75),
                Point::new(x, 0.25),
                Point::new(x + 0.5, 0.25),
            )
        };
        let mut tracker = StabilityTracker::new(2, 0.25);
        assert!(!tracker.observe(Some(at(0.0))));
        // Exactly the threshold apart on x is not similar.
        assert!(!tracker.observe(Some(at(0.25))));
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn count_never_exceeds_required() {
        let mut tracker = StabilityTracker::new(4, 0.02);
        for _ in 0..40 {
            tracker.observe(Some(quad(0.0)));
            assert!(tracker.count() < 4);
        }
    }

    #[test]
    fn settles_again_after_a_full_new_run() {
        let mut tracker = StabilityTracker::new(2, 0.02);
        let frames = vec![Some(quad(0.0)); 6];
        assert_eq!(settles_at(&mut tracker, &frames), vec![2, 4, 6]);
    }
}
