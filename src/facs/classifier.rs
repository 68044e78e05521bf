use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EmotionError, Result};
use crate::facs::features::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Happy,
    Sad,
    Surprised,
    Angry,
    Sleepy,
    Neutral,
    NoFace,
}

impl EmotionLabel {
    pub fn emoji(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "😊",
            EmotionLabel::Sad => "😔",
            EmotionLabel::Surprised => "😮",
            EmotionLabel::Angry => "😠",
            EmotionLabel::Sleepy => "😴",
            EmotionLabel::Neutral => "😐",
            EmotionLabel::NoFace => "",
        }
    }

    /// Text a renderer shows for this label, e.g. "Happy 😊".
    pub fn display_text(&self) -> String {
        match self {
            EmotionLabel::NoFace => "No face detected".to_string(),
            other => format!("{other} {}", other.emoji()),
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Surprised => "Surprised",
            EmotionLabel::Angry => "Angry",
            EmotionLabel::Sleepy => "Sleepy",
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::NoFace => "NoFace",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    pub label: EmotionLabel,
    pub confidence: f32,
}

impl EmotionSample {
    pub fn new(label: EmotionLabel, confidence: f32) -> Self {
        Self { label, confidence }
    }

    pub fn no_face() -> Self {
        Self::new(EmotionLabel::NoFace, 0.0)
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Threshold and gain constants of the decision list.
///
/// Each rule's confidence is `clamp01((value - offset) * gain)` (or
/// `(offset - value) * gain` for the "smaller is stronger" rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub happy_min_mar: f32,
    pub happy_min_mouth_width: f32,
    pub happy_mar_offset: f32,
    pub happy_gain: f32,

    pub surprised_min_mar: f32,
    pub surprised_min_eyebrow_raise: f32,
    pub surprised_mar_offset: f32,
    pub surprised_gain: f32,

    pub sad_max_mar: f32,
    pub sad_max_ear: f32,
    pub sad_mar_offset: f32,
    pub sad_gain: f32,

    pub angry_max_ear: f32,
    pub angry_max_mar: f32,
    pub angry_max_mouth_width: f32,
    pub angry_ear_offset: f32,
    pub angry_gain: f32,

    pub sleepy_max_ear: f32,
    pub sleepy_ear_offset: f32,
    pub sleepy_gain: f32,

    pub neutral_confidence: f32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            happy_min_mar: 0.30,
            happy_min_mouth_width: 0.15,
            happy_mar_offset: 0.25,
            happy_gain: 4.0,

            surprised_min_mar: 0.40,
            surprised_min_eyebrow_raise: 0.015,
            surprised_mar_offset: 0.35,
            surprised_gain: 3.0,

            sad_max_mar: 0.20,
            sad_max_ear: 0.18,
            sad_mar_offset: 0.22,
            sad_gain: 5.0,

            angry_max_ear: 0.15,
            angry_max_mar: 0.25,
            angry_max_mouth_width: 0.12,
            angry_ear_offset: 0.18,
            angry_gain: 6.0,

            sleepy_max_ear: 0.10,
            sleepy_ear_offset: 0.12,
            sleepy_gain: 8.0,

            neutral_confidence: 0.8,
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.happy_min_mar,
            self.happy_min_mouth_width,
            self.happy_mar_offset,
            self.happy_gain,
            self.surprised_min_mar,
            self.surprised_min_eyebrow_raise,
            self.surprised_mar_offset,
            self.surprised_gain,
            self.sad_max_mar,
            self.sad_max_ear,
            self.sad_mar_offset,
            self.sad_gain,
            self.angry_max_ear,
            self.angry_max_mar,
            self.angry_max_mouth_width,
            self.angry_ear_offset,
            self.angry_gain,
            self.sleepy_max_ear,
            self.sleepy_ear_offset,
            self.sleepy_gain,
            self.neutral_confidence,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EmotionError::InvalidConfig(
                "classifier thresholds must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.neutral_confidence) {
            return Err(EmotionError::InvalidConfig(format!(
                "neutral_confidence {} is outside [0, 1]",
                self.neutral_confidence
            )));
        }
        Ok(())
    }
}

pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// First-match-wins decision list over a [`FeatureVector`].
///
/// Rules overlap (a wide open smile can satisfy both Happy and Surprised), so
/// the order below is part of the observable behaviour.
#[derive(Debug, Clone, Default)]
pub struct EmotionClassifier {
    thresholds: ClassifierThresholds,
}

impl EmotionClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn classify(&self, f: &FeatureVector) -> EmotionSample {
        let t = &self.thresholds;

        // Happy: wide smile
        if f.mar > t.happy_min_mar && f.mouth_width > t.happy_min_mouth_width {
            return EmotionSample::new(
                EmotionLabel::Happy,
                clamp01((f.mar - t.happy_mar_offset) * t.happy_gain),
            );
        }

        // Surprised: open mouth, raised brows
        if f.mar > t.surprised_min_mar && f.eyebrow_raise > t.surprised_min_eyebrow_raise {
            return EmotionSample::new(
                EmotionLabel::Surprised,
                clamp01((f.mar - t.surprised_mar_offset) * t.surprised_gain),
            );
        }

        // Sad: small mouth, droopy eyes
        if f.mar < t.sad_max_mar && f.avg_ear < t.sad_max_ear {
            return EmotionSample::new(
                EmotionLabel::Sad,
                clamp01((t.sad_mar_offset - f.mar) * t.sad_gain),
            );
        }

        // Angry: narrowed eyes, tight mouth
        if f.avg_ear < t.angry_max_ear
            && f.mar < t.angry_max_mar
            && f.mouth_width < t.angry_max_mouth_width
        {
            return EmotionSample::new(
                EmotionLabel::Angry,
                clamp01((t.angry_ear_offset - f.avg_ear) * t.angry_gain),
            );
        }

        // Sleepy: eyes nearly closed
        if f.avg_ear < t.sleepy_max_ear {
            return EmotionSample::new(
                EmotionLabel::Sleepy,
                clamp01((t.sleepy_ear_offset - f.avg_ear) * t.sleepy_gain),
            );
        }

        EmotionSample::new(EmotionLabel::Neutral, clamp01(t.neutral_confidence))
    }
}
