use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EmotionConfig;
use crate::error::Result;
use crate::facs::{
    calibration::BaselineCalibrator,
    landmarks::{from_flat_coords, Point3D},
    EmotionClassifier, EmotionSample, FeatureVector, GeometricFeatureExtractor, SmoothingWindow,
};

// --- State Management ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Stopped,
    Running,
    /// Host temporarily not delivering frames (e.g. app in background).
    /// History is kept.
    Paused,
}

/// Per-frame output for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Smoothed result; `NoFace` frames bypass smoothing.
    pub emotion: EmotionSample,
    /// Unsmoothed decision-list output, absent when no face was seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<EmotionSample>,
    pub display: String,
    pub confidence_percent: u32,
    pub debug_overlay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_deviation: Option<BTreeMap<&'static str, f32>>,
    pub is_calibrated: bool,
}

impl FrameReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"failed to serialize frame report: {e}"}}"#)
        })
    }
}

/// Receives each processed frame; the host's drawing/UI layer.
pub trait FrameRenderer {
    fn render(&mut self, report: &FrameReport) -> Result<()>;
}

/// One detection session: extractor, classifier and the session's own
/// smoothing window. Not shared between cameras; the host serializes calls.
#[derive(Debug, Clone)]
pub struct EmotionSession {
    extractor: GeometricFeatureExtractor,
    classifier: EmotionClassifier,
    window: SmoothingWindow,
    calibrator: Option<BaselineCalibrator>,
    state: SessionState,
    debug_overlay: bool,
    last_result: Option<EmotionSample>,
}

impl Default for EmotionSession {
    fn default() -> Self {
        Self::new(EmotionConfig::default())
    }
}

impl EmotionSession {
    pub fn new(config: EmotionConfig) -> Self {
        let EmotionConfig {
            indices,
            thresholds,
            smoothing,
            calibration,
            debug_overlay,
        } = config;

        Self {
            extractor: GeometricFeatureExtractor::with_indices(indices),
            classifier: EmotionClassifier::new(thresholds),
            window: SmoothingWindow::new(smoothing.capacity),
            calibrator: calibration
                .enabled
                .then(|| BaselineCalibrator::new(calibration.frames)),
            state: SessionState::Stopped,
            debug_overlay,
            last_result: None,
        }
    }

    // --- Lifecycle ---

    /// Begins a new detection session; history and baseline start empty.
    pub fn start(&mut self) {
        self.window.clear();
        if let Some(cal) = self.calibrator.as_mut() {
            cal.reset();
        }
        self.last_result = None;
        self.state = SessionState::Running;
        info!(window = self.window.capacity(), "emotion session started");
    }

    pub fn stop(&mut self) {
        self.state = SessionState::Stopped;
        info!("emotion session stopped");
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
            debug!("emotion session paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            self.state = SessionState::Running;
            debug!("emotion session resumed");
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_overlay = enabled;
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.debug_overlay = !self.debug_overlay;
        self.debug_overlay
    }

    pub fn debug_overlay(&self) -> bool {
        self.debug_overlay
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    /// Most recent smoothed result, kept across skipped and no-face frames.
    pub fn last_result(&self) -> Option<EmotionSample> {
        self.last_result
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator
            .as_ref()
            .is_some_and(BaselineCalibrator::is_calibrated)
    }

    // --- Analysis ---

    /// Runs one frame through extract -> classify -> smooth.
    ///
    /// `None` means the provider found no face. Returns `Ok(None)` when the
    /// session is not running. Malformed landmark sets return an error and
    /// leave the window and last result untouched.
    pub fn process(&mut self, landmarks: Option<&[Point3D]>) -> Result<Option<FrameReport>> {
        if !self.is_running() {
            return Ok(None);
        }

        let Some(landmarks) = landmarks else {
            debug!("no face in frame");
            return Ok(Some(self.report(EmotionSample::no_face(), None, None)));
        };

        let features = match self.extractor.extract(landmarks) {
            Ok(features) => features,
            Err(e) => {
                warn!(error = %e, "skipping frame");
                return Err(e);
            }
        };

        if let Some(cal) = self.calibrator.as_mut() {
            cal.add_sample(features);
        }

        let raw = self.classifier.classify(&features);
        let smoothed = self.window.smooth(raw);
        self.last_result = Some(smoothed);
        debug!(
            raw = %raw.label,
            smoothed = %smoothed.label,
            confidence = smoothed.confidence,
            "frame classified"
        );

        Ok(Some(self.report(smoothed, Some(raw), Some(features))))
    }

    /// Flat `[x, y, z, ...]` variant of [`process`](Self::process); an empty
    /// buffer means no face.
    pub fn process_flat(&mut self, coords: &[f32]) -> Result<Option<FrameReport>> {
        if coords.is_empty() {
            return self.process(None);
        }
        let landmarks = from_flat_coords(coords)?;
        self.process(Some(&landmarks))
    }

    /// Drives the session from a frame source until it is exhausted. Each item
    /// is one provider result (`None` = no face). Bad frames are logged and
    /// skipped; renderer failures abort. Returns the number of frames rendered.
    pub fn run<I, R>(&mut self, frames: I, renderer: &mut R) -> Result<usize>
    where
        I: IntoIterator<Item = Option<Vec<Point3D>>>,
        R: FrameRenderer + ?Sized,
    {
        let mut rendered = 0;
        for frame in frames {
            match self.process(frame.as_deref()) {
                Ok(Some(report)) => {
                    renderer.render(&report)?;
                    rendered += 1;
                }
                // Errors were already logged by `process`.
                Ok(None) | Err(_) => {}
            }
        }
        Ok(rendered)
    }

    fn report(
        &self,
        emotion: EmotionSample,
        raw: Option<EmotionSample>,
        features: Option<FeatureVector>,
    ) -> FrameReport {
        let (features, baseline_deviation) = match features {
            Some(f) if self.debug_overlay => {
                let devs = self.calibrator.as_ref().and_then(|c| c.deviations(&f));
                (Some(f), devs)
            }
            _ => (None, None),
        };

        FrameReport {
            emotion,
            raw,
            display: emotion.label.display_text(),
            confidence_percent: emotion.confidence_percent(),
            debug_overlay: self.debug_overlay,
            features,
            baseline_deviation,
            is_calibrated: self.is_calibrated(),
        }
    }
}
