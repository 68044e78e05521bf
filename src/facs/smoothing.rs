use std::collections::VecDeque;

use crate::facs::classifier::{EmotionLabel, EmotionSample};

/// Bounded FIFO of recent raw samples, voted on every frame.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    capacity: usize,
    samples: VecDeque<EmotionSample>,
}

impl SmoothingWindow {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &EmotionSample> {
        self.samples.iter()
    }

    /// Appends `sample`, evicts the oldest entry past capacity, and returns the
    /// majority label with the mean confidence of the whole window.
    pub fn smooth(&mut self, sample: EmotionSample) -> EmotionSample {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.vote().unwrap_or(sample)
    }

    /// Majority label over the current window. Ties go to the label that first
    /// appears in the window (oldest to newest); `None` when empty.
    pub fn vote(&self) -> Option<EmotionSample> {
        if self.samples.is_empty() {
            return None;
        }

        // Distinct labels in order of first appearance; at most seven.
        let mut counts: Vec<(EmotionLabel, usize)> = Vec::with_capacity(7);
        let mut total_confidence = 0.0f32;
        for s in &self.samples {
            total_confidence += s.confidence;
            match counts.iter_mut().find(|(label, _)| *label == s.label) {
                Some((_, count)) => *count += 1,
                None => counts.push((s.label, 1)),
            }
        }

        let mut best = counts[0];
        for &(label, count) in &counts[1..] {
            if count > best.1 {
                best = (label, count);
            }
        }

        Some(EmotionSample::new(
            best.0,
            total_confidence / self.samples.len() as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(label: EmotionLabel, confidence: f32) -> EmotionSample {
        EmotionSample::new(label, confidence)
    }

    #[test]
    fn test_uniform_window_returns_mean_confidence() {
        let mut window = SmoothingWindow::new(5);
        window.smooth(sample(EmotionLabel::Sad, 0.2));
        window.smooth(sample(EmotionLabel::Sad, 0.4));
        let out = window.smooth(sample(EmotionLabel::Sad, 0.9));
        assert_eq!(out.label, EmotionLabel::Sad);
        assert!((out.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tie_goes_to_first_seen_label() {
        let mut window = SmoothingWindow::new(4);
        let mut out = None;
        for label in [EmotionLabel::Happy, EmotionLabel::Sad, EmotionLabel::Happy, EmotionLabel::Sad] {
            out = Some(window.smooth(sample(label, 0.5)));
        }
        assert_eq!(out.unwrap().label, EmotionLabel::Happy);
    }

    #[test]
    fn test_tie_ignores_which_label_reached_the_count_first() {
        // Happy reaches two first, but Sad appeared first in the window.
        let mut window = SmoothingWindow::new(4);
        for label in [EmotionLabel::Sad, EmotionLabel::Happy, EmotionLabel::Happy, EmotionLabel::Sad] {
            window.smooth(sample(label, 0.5));
        }
        assert_eq!(window.vote().unwrap().label, EmotionLabel::Sad);
    }

    #[test]
    fn test_oldest_sample_is_evicted() {
        let mut window = SmoothingWindow::new(3);
        window.smooth(sample(EmotionLabel::Angry, 1.0));
        window.smooth(sample(EmotionLabel::Neutral, 0.5));
        window.smooth(sample(EmotionLabel::Happy, 0.5));
        let out = window.smooth(sample(EmotionLabel::Happy, 0.5));

        assert_eq!(window.len(), 3);
        assert!(window.samples().all(|s| s.label != EmotionLabel::Angry));
        assert_eq!(out.label, EmotionLabel::Happy);
        assert!((out.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_majority_beats_latest() {
        let mut window = SmoothingWindow::new(5);
        window.smooth(sample(EmotionLabel::Neutral, 0.8));
        window.smooth(sample(EmotionLabel::Neutral, 0.8));
        let out = window.smooth(sample(EmotionLabel::Surprised, 0.2));
        assert_eq!(out.label, EmotionLabel::Neutral);
        assert!((out.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_clear_and_empty_vote() {
        let mut window = SmoothingWindow::new(2);
        assert!(window.vote().is_none());
        window.smooth(sample(EmotionLabel::Happy, 1.0));
        window.clear();
        assert!(window.is_empty());
        assert!(window.vote().is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = SmoothingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.smooth(sample(EmotionLabel::Happy, 1.0));
        let out = window.smooth(sample(EmotionLabel::Sad, 0.0));
        assert_eq!(out, sample(EmotionLabel::Sad, 0.0));
    }

    proptest! {
        #[test]
        fn window_never_exceeds_capacity(capacity in 1usize..12, labels in proptest::collection::vec(0u8..6, 0..40)) {
            let all = [
                EmotionLabel::Happy,
                EmotionLabel::Sad,
                EmotionLabel::Surprised,
                EmotionLabel::Angry,
                EmotionLabel::Sleepy,
                EmotionLabel::Neutral,
            ];
            let mut window = SmoothingWindow::new(capacity);
            for l in labels {
                let out = window.smooth(sample(all[l as usize], 0.5));
                prop_assert!(window.len() <= capacity);
                prop_assert!((out.confidence - 0.5).abs() < 1e-5);
            }
        }
    }
}
