use log::debug;

use crate::settings::GestureConfig;
use crate::tracking::{landmarks::index, HandObservation};

use super::types::{GestureEvent, GestureKind};

/// Largest scroll magnitude emitted for a single frame.
const MAX_SCROLL_STEP: f64 = 0.25;

/// Pinch distance used when the thumb or index landmark is missing.
const MISSING_PINCH_DISTANCE: f64 = 1.0;

/// Mutable state carried between `process` calls for one tracking session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierState {
    pub smoothed_position: Option<(f64, f64)>,
    pub last_pinched: bool,
    /// Timestamp of the last emitted click; `None` until the first one.
    pub last_event_time: Option<f64>,
    pub drag_active: bool,
}

/// Transforms landmark observations into pointer gestures.
///
/// Not synchronized: one logical task drives a classifier at a time.
pub struct GestureClassifier {
    config: GestureConfig,
    state: ClassifierState,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: ClassifierState::default(),
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn process(&mut self, observation: &HandObservation) -> GestureEvent {
        let pointer = self.smooth_pointer(observation);
        let pinch_distance = pinch_distance(observation);
        let middle_delta = middle_delta(observation);
        let now = observation.timestamp;

        let mut kind = GestureKind::Move;
        let mut scroll_delta = 0.0;
        let mut is_click = false;
        let mut is_drag = false;
        let mut drag_released = false;

        if middle_delta.abs() > self.config.scroll_threshold {
            kind = GestureKind::Scroll;
            scroll_delta = -middle_delta.abs().min(MAX_SCROLL_STEP).copysign(middle_delta);
        }

        // Pinch overrides whatever the scroll check decided.
        if pinch_distance < self.config.click_threshold {
            if !self.state.last_pinched && self.debounce_elapsed(now) {
                kind = GestureKind::Click;
                is_click = true;
                self.state.last_event_time = Some(now);
            } else {
                kind = GestureKind::Drag;
                is_drag = true;
            }
            self.state.drag_active = true;
            self.state.last_pinched = true;
        } else {
            drag_released = self.state.drag_active;
            self.state.last_pinched = false;
            self.state.drag_active = false;
        }

        let event = match pointer {
            Some(pointer) => GestureEvent {
                kind,
                pointer: Some(pointer),
                scroll_delta,
                is_click,
                is_drag,
                drag_released,
            },
            None => GestureEvent {
                drag_released,
                ..GestureEvent::idle()
            },
        };

        debug!("Gesture detected: {:?}", event);
        event
    }

    /// Clears smoothing and pinch state, e.g. when the hand is lost.
    ///
    /// The click debounce timestamp survives so a re-acquired pinch still
    /// respects the window measured from the previous click.
    pub fn reset(&mut self) {
        self.state.smoothed_position = None;
        self.state.last_pinched = false;
        self.state.drag_active = false;
    }

    fn debounce_elapsed(&self, now: f64) -> bool {
        match self.state.last_event_time {
            Some(last) => now - last > self.config.debounce_ms as f64 / 1000.0,
            None => true,
        }
    }

    fn smooth_pointer(&mut self, observation: &HandObservation) -> Option<(f64, f64)> {
        let tip = observation.landmark(index::INDEX_FINGER_TIP)?;
        let raw = (tip.x, tip.y);

        let smoothed = match self.state.smoothed_position {
            None => raw,
            Some((prev_x, prev_y)) => {
                let alpha = self.config.smoothing_alpha.clamp(0.0, 1.0);
                (
                    alpha * raw.0 + (1.0 - alpha) * prev_x,
                    alpha * raw.1 + (1.0 - alpha) * prev_y,
                )
            }
        };
        self.state.smoothed_position = Some(smoothed);

        Some((smoothed.0.clamp(0.0, 1.0), smoothed.1.clamp(0.0, 1.0)))
    }
}

fn pinch_distance(observation: &HandObservation) -> f64 {
    match (
        observation.landmark(index::THUMB_TIP),
        observation.landmark(index::INDEX_FINGER_TIP),
    ) {
        (Some(thumb), Some(tip)) => (thumb.x - tip.x).hypot(thumb.y - tip.y),
        _ => MISSING_PINCH_DISTANCE,
    }
}

/// Vertical offset of the middle fingertip relative to the index fingertip.
fn middle_delta(observation: &HandObservation) -> f64 {
    match (
        observation.landmark(index::INDEX_FINGER_TIP),
        observation.landmark(index::MIDDLE_FINGER_TIP),
    ) {
        (Some(tip), Some(middle)) => middle.y - tip.y,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{Handedness, Landmark};

    fn hand(
        index_tip: (f64, f64),
        thumb_tip: (f64, f64),
        middle_tip: (f64, f64),
        t: f64,
    ) -> HandObservation {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); 21];
        landmarks[8] = Landmark::new(index_tip.0, index_tip.1);
        landmarks[4] = Landmark::new(thumb_tip.0, thumb_tip.1);
        landmarks[12] = Landmark::new(middle_tip.0, middle_tip.1);
        HandObservation {
            frame_size: (640, 480),
            landmarks,
            handedness: Handedness::Right,
            timestamp: t,
        }
    }

    fn open_hand(index_tip: (f64, f64), t: f64) -> HandObservation {
        hand(index_tip, (0.0, 0.0), index_tip, t)
    }

    fn pinched(t: f64) -> HandObservation {
        hand((0.5, 0.5), (0.49, 0.5), (0.5, 0.5), t)
    }

    #[test]
    fn pinch_triggers_click() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        let event = classifier.process(&hand((0.5, 0.5), (0.48, 0.5), (0.5, 0.7), 0.1));

        assert_eq!(event.kind, GestureKind::Click);
        assert!(event.is_click);
        assert!(!event.is_drag);
        assert!(classifier.state().drag_active);
    }

    #[test]
    fn pointer_smoothing_applies() {
        let config = GestureConfig {
            smoothing_alpha: 0.5,
            ..GestureConfig::default()
        };
        let mut classifier = GestureClassifier::new(config);

        classifier.process(&hand((0.1, 0.1), (0.0, 0.0), (0.1, 0.2), 0.1));
        let event = classifier.process(&hand((0.9, 0.9), (0.0, 0.0), (0.9, 0.8), 0.2));

        let (x, y) = event.pointer.unwrap();
        assert!((x - 0.5).abs() < 0.05);
        assert!((y - 0.5).abs() < 0.05);
    }

    #[test]
    fn smoothing_converges_on_constant_input() {
        for alpha in [0.1, 0.25, 0.5, 0.9] {
            let config = GestureConfig {
                smoothing_alpha: alpha,
                ..GestureConfig::default()
            };
            let mut classifier = GestureClassifier::new(config);
            classifier.process(&open_hand((0.0, 1.0), 0.0));

            let mut last = None;
            for step in 1..200 {
                last = classifier.process(&open_hand((0.7, 0.3), step as f64)).pointer;
            }
            let (x, y) = last.unwrap();
            assert!((x - 0.7).abs() < 1e-6, "alpha {alpha} x={x}");
            assert!((y - 0.3).abs() < 1e-6, "alpha {alpha} y={y}");
        }
    }

    #[test]
    fn alpha_one_follows_raw_position() {
        let config = GestureConfig {
            smoothing_alpha: 1.0,
            ..GestureConfig::default()
        };
        let mut classifier = GestureClassifier::new(config);
        classifier.process(&open_hand((0.1, 0.1), 0.0));

        let event = classifier.process(&open_hand((0.8, 0.6), 0.1));
        assert_eq!(event.pointer, Some((0.8, 0.6)));
    }

    #[test]
    fn out_of_range_alpha_is_clamped() {
        let config = GestureConfig {
            smoothing_alpha: 4.0,
            ..GestureConfig::default()
        };
        let mut classifier = GestureClassifier::new(config);
        classifier.process(&open_hand((0.1, 0.1), 0.0));

        let event = classifier.process(&open_hand((0.4, 0.2), 0.1));
        let (x, y) = event.pointer.unwrap();
        assert!((x - 0.4).abs() < 1e-9);
        assert!((y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn pointer_is_clamped_to_unit_square() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let event = classifier.process(&open_hand((1.3, -0.2), 0.0));
        assert_eq!(event.pointer, Some((1.0, 0.0)));
    }

    #[test]
    fn scroll_detects_vertical_delta() {
        let config = GestureConfig {
            scroll_threshold: 0.05,
            ..GestureConfig::default()
        };
        let mut classifier = GestureClassifier::new(config);

        let event = classifier.process(&hand((0.5, 0.4), (0.0, 0.0), (0.5, 0.7), 0.1));

        assert_eq!(event.kind, GestureKind::Scroll);
        assert!(event.scroll_delta < 0.0);
    }

    #[test]
    fn scroll_magnitude_is_capped() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        let down = classifier.process(&hand((0.5, 0.3), (0.0, 0.0), (0.5, 0.6), 0.1));
        assert_eq!(down.kind, GestureKind::Scroll);
        assert!((down.scroll_delta + MAX_SCROLL_STEP).abs() < 1e-9);

        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let up = classifier.process(&hand((0.5, 0.6), (0.0, 0.0), (0.5, 0.45), 0.1));
        assert_eq!(up.kind, GestureKind::Scroll);
        assert!(up.scroll_delta > 0.0 && up.scroll_delta <= MAX_SCROLL_STEP);
        assert!((up.scroll_delta - 0.15).abs() < 1e-9);
    }

    #[test]
    fn small_middle_offset_is_plain_move() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let event = classifier.process(&hand((0.5, 0.5), (0.0, 0.0), (0.5, 0.55), 0.1));
        assert_eq!(event.kind, GestureKind::Move);
        assert_eq!(event.scroll_delta, 0.0);
    }

    #[test]
    fn repeated_pinch_inside_debounce_window_drags() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        let first = classifier.process(&pinched(1.0));
        assert!(first.is_click);

        let released = classifier.process(&open_hand((0.5, 0.5), 1.05));
        assert!(!released.is_drag);
        assert!(released.drag_released);

        let second = classifier.process(&pinched(1.1));
        assert_eq!(second.kind, GestureKind::Drag);
        assert!(!second.is_click);
        assert!(second.is_drag);
    }

    #[test]
    fn pinch_after_debounce_window_clicks_again() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        assert!(classifier.process(&pinched(1.0)).is_click);
        classifier.process(&open_hand((0.5, 0.5), 1.1));
        let again = classifier.process(&pinched(1.3));

        assert_eq!(again.kind, GestureKind::Click);
        assert!(again.is_click);
    }

    #[test]
    fn held_pinch_becomes_drag() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        assert_eq!(classifier.process(&pinched(1.0)).kind, GestureKind::Click);
        for step in 1..5 {
            let event = classifier.process(&pinched(1.0 + step as f64));
            assert_eq!(event.kind, GestureKind::Drag);
            assert!(event.is_drag);
        }
    }

    #[test]
    fn pinch_overrides_scroll() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());

        let event = classifier.process(&hand((0.5, 0.3), (0.49, 0.3), (0.5, 0.8), 0.5));

        assert_eq!(event.kind, GestureKind::Click);
        assert_eq!(event.scroll_delta, -MAX_SCROLL_STEP);
    }

    #[test]
    fn missing_index_tip_is_idle() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let observation = HandObservation {
            frame_size: (640, 480),
            landmarks: vec![Landmark::new(0.5, 0.5); 6],
            handedness: Handedness::Unknown,
            timestamp: 0.3,
        };

        let event = classifier.process(&observation);

        assert_eq!(event.kind, GestureKind::Idle);
        assert_eq!(event.pointer, None);
        assert!(!event.is_click);
        assert!(classifier.state().smoothed_position.is_none());
    }

    #[test]
    fn missing_middle_tip_suppresses_scroll() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        let mut landmarks = vec![Landmark::new(0.5, 0.5); 9];
        landmarks[8] = Landmark::new(0.2, 0.2);
        let observation = HandObservation {
            frame_size: (640, 480),
            landmarks,
            handedness: Handedness::Left,
            timestamp: 0.3,
        };

        let event = classifier.process(&observation);
        assert_eq!(event.kind, GestureKind::Move);
        assert_eq!(event.pointer, Some((0.2, 0.2)));
    }

    #[test]
    fn reset_clears_smoothing_and_pinch() {
        let mut classifier = GestureClassifier::new(GestureConfig::default());
        classifier.process(&pinched(1.0));

        classifier.reset();

        let state = classifier.state();
        assert!(state.smoothed_position.is_none());
        assert!(!state.last_pinched);
        assert!(!state.drag_active);

        let event = classifier.process(&open_hand((0.9, 0.1), 2.0));
        assert_eq!(event.pointer, Some((0.9, 0.1)));
        assert!(!event.drag_released);
    }
}
