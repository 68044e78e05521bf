//! Coarse facial emotion classification from face-mesh landmarks.
//!
//! Pipeline per frame: landmarks -> [`facs::GeometricFeatureExtractor`] ->
//! [`facs::EmotionClassifier`] -> [`facs::SmoothingWindow`], driven by a
//! [`core::EmotionSession`]. Landmark detection, capture and rendering live
//! in the host application.

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod facs;
pub mod logging;

pub use crate::config::EmotionConfig;
pub use crate::core::{EmotionSession, FrameReport};
pub use crate::error::{EmotionError, Result};
