use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;
use crate::facs::landmarks::{LandmarkIndexMap, Point3D};

/// Floor for ratio denominators. Coincident landmarks (closed mouth corners,
/// collapsed eye) would otherwise divide by zero.
pub const MIN_DENOMINATOR: f32 = 1e-6;

/// Scalar geometry of one face, derived purely from its landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    #[serde(rename = "leftEAR")]
    pub left_ear: f32,
    #[serde(rename = "rightEAR")]
    pub right_ear: f32,
    #[serde(rename = "avgEAR")]
    pub avg_ear: f32,
    pub mar: f32,
    pub mouth_open: f32,
    pub mouth_width: f32,
    pub eyebrow_raise: f32,
}

impl FeatureVector {
    pub const NAMES: [&'static str; 7] = [
        "leftEAR",
        "rightEAR",
        "avgEAR",
        "mar",
        "mouthOpen",
        "mouthWidth",
        "eyebrowRaise",
    ];

    pub fn named_values(&self) -> [(&'static str, f32); 7] {
        let [l, r, avg, mar, open, width, brow] = Self::NAMES;
        [
            (l, self.left_ear),
            (r, self.right_ear),
            (avg, self.avg_ear),
            (mar, self.mar),
            (open, self.mouth_open),
            (width, self.mouth_width),
            (brow, self.eyebrow_raise),
        ]
    }
}

/// Computes EAR / MAR / eyebrow features. Distances are always 3D; a provider
/// that omits depth simply contributes z = 0 to every point.
#[derive(Debug, Clone, Default)]
pub struct GeometricFeatureExtractor {
    indices: LandmarkIndexMap,
}

impl GeometricFeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indices(indices: LandmarkIndexMap) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &LandmarkIndexMap {
        &self.indices
    }

    pub fn extract(&self, landmarks: &[Point3D]) -> Result<FeatureVector> {
        self.indices.check(landmarks)?;
        let idx = &self.indices;
        let dist = |a: usize, b: usize| landmarks[a].euclidean_dist(&landmarks[b]);

        // 1. EAR, per eye then averaged
        let left_ear = self.eye_aspect_ratio(landmarks, &idx.left_eye);
        let right_ear = self.eye_aspect_ratio(landmarks, &idx.right_eye);
        let avg_ear = (left_ear + right_ear) / 2.0;

        // 2. MAR
        let mouth_open = dist(idx.upper_lip_center, idx.lower_lip_center);
        let mouth_side = dist(idx.upper_lip_side, idx.lower_lip_side);
        let mouth_width = dist(idx.mouth_left_corner, idx.mouth_right_corner);
        let mar = (mouth_open + mouth_side) / (2.0 * mouth_width.max(MIN_DENOMINATOR));

        // 3. Eyebrow raise (image y grows downward)
        let eyebrow_y = (landmarks[idx.left_eyebrow].y + landmarks[idx.right_eyebrow].y) / 2.0;
        let eye_y =
            (landmarks[idx.left_eye_reference].y + landmarks[idx.right_eye_reference].y) / 2.0;
        let eyebrow_raise = eye_y - eyebrow_y;

        let feats = FeatureVector {
            left_ear,
            right_ear,
            avg_ear,
            mar,
            mouth_open,
            mouth_width,
            eyebrow_raise,
        };
        trace!(?feats, "extracted features");
        Ok(feats)
    }

    fn eye_aspect_ratio(&self, landmarks: &[Point3D], eye: &[usize; 6]) -> f32 {
        let p = eye.map(|i| landmarks[i]);

        // Vertical distances
        let v1 = p[1].euclidean_dist(&p[5]);
        let v2 = p[2].euclidean_dist(&p[4]);

        // Horizontal distance
        let h = p[0].euclidean_dist(&p[3]);

        (v1 + v2) / (2.0 * h.max(MIN_DENOMINATOR))
    }
}
