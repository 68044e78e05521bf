// Indices based on MediaPipe Face Mesh (468 points, 478 with refined irises)

use serde::{Deserialize, Serialize};

use crate::error::{EmotionError, Result};

pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];
pub const UPPER_LIP_CENTER: usize = 13;
pub const LOWER_LIP_CENTER: usize = 14;
pub const UPPER_LIP_SIDE: usize = 78;
pub const LOWER_LIP_SIDE: usize = 308;
pub const MOUTH_LEFT_CORNER: usize = 61;
pub const MOUTH_RIGHT_CORNER: usize = 291;
pub const LEFT_EYEBROW: usize = 70;
pub const RIGHT_EYEBROW: usize = 300;
pub const LEFT_EYE_REFERENCE: usize = 33;
pub const RIGHT_EYE_REFERENCE: usize = 362;

/// A single landmark in normalized image space. `z` is relative depth and
/// defaults to 0 when the provider omits it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn euclidean_dist(&self, other: &Point3D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Which provider index plays which facial role. Thresholds are calibrated
/// against these exact indices, so a different topology needs a different map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandmarkIndexMap {
    /// Ordered `[p0..p5]`: outer corner, two upper lids, inner corner, two lower lids.
    pub left_eye: [usize; 6],
    pub right_eye: [usize; 6],
    pub upper_lip_center: usize,
    pub lower_lip_center: usize,
    pub upper_lip_side: usize,
    pub lower_lip_side: usize,
    pub mouth_left_corner: usize,
    pub mouth_right_corner: usize,
    pub left_eyebrow: usize,
    pub right_eyebrow: usize,
    pub left_eye_reference: usize,
    pub right_eye_reference: usize,
}

impl Default for LandmarkIndexMap {
    fn default() -> Self {
        Self {
            left_eye: LEFT_EYE,
            right_eye: RIGHT_EYE,
            upper_lip_center: UPPER_LIP_CENTER,
            lower_lip_center: LOWER_LIP_CENTER,
            upper_lip_side: UPPER_LIP_SIDE,
            lower_lip_side: LOWER_LIP_SIDE,
            mouth_left_corner: MOUTH_LEFT_CORNER,
            mouth_right_corner: MOUTH_RIGHT_CORNER,
            left_eyebrow: LEFT_EYEBROW,
            right_eyebrow: RIGHT_EYEBROW,
            left_eye_reference: LEFT_EYE_REFERENCE,
            right_eye_reference: RIGHT_EYE_REFERENCE,
        }
    }
}

impl LandmarkIndexMap {
    pub fn referenced(&self) -> impl Iterator<Item = usize> + '_ {
        self.left_eye
            .iter()
            .chain(self.right_eye.iter())
            .copied()
            .chain([
                self.upper_lip_center,
                self.lower_lip_center,
                self.upper_lip_side,
                self.lower_lip_side,
                self.mouth_left_corner,
                self.mouth_right_corner,
                self.left_eyebrow,
                self.right_eyebrow,
                self.left_eye_reference,
                self.right_eye_reference,
            ])
    }

    /// Minimum landmark count that covers every referenced index.
    pub fn required_len(&self) -> usize {
        self.referenced().max().map_or(0, |max| max + 1)
    }

    /// Checks that `landmarks` is long enough and that every point we read is finite.
    pub fn check(&self, landmarks: &[Point3D]) -> Result<()> {
        let required = self.required_len();
        if landmarks.len() < required {
            return Err(EmotionError::InsufficientLandmarks {
                required,
                actual: landmarks.len(),
            });
        }
        match self.referenced().find(|&i| !landmarks[i].is_finite()) {
            Some(index) => Err(EmotionError::NonFiniteLandmark { index }),
            None => Ok(()),
        }
    }
}

/// Converts a flat `[x0, y0, z0, x1, ...]` buffer (the host bridge format) into points.
pub fn from_flat_coords(coords: &[f32]) -> Result<Vec<Point3D>> {
    if coords.len() % 3 != 0 {
        return Err(EmotionError::MalformedFrame { len: coords.len() });
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| Point3D::new(c[0], c[1], c[2]))
        .collect())
}
