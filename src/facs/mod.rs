pub mod landmarks;
pub mod features;
pub mod classifier;
pub mod smoothing;
pub mod calibration;

pub use classifier::{ClassifierThresholds, EmotionClassifier, EmotionLabel, EmotionSample};
pub use features::{FeatureVector, GeometricFeatureExtractor};
pub use landmarks::{LandmarkIndexMap, Point3D};
pub use smoothing::SmoothingWindow;

/// Synthetic Face Mesh frames with exactly controllable geometry.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::landmarks::*;

    #[derive(Debug, Clone, Copy)]
    pub struct FaceShape {
        pub ear: f32,
        pub mouth_open: f32,
        pub mouth_side: f32,
        pub mouth_width: f32,
        pub eyebrow_raise: f32,
    }

    impl FaceShape {
        /// Relaxed face: EAR 0.3, MAR 0.1.
        pub fn neutral() -> Self {
            Self {
                ear: 0.3,
                mouth_open: 0.02,
                mouth_side: 0.02,
                mouth_width: 0.2,
                eyebrow_raise: 0.1,
            }
        }

        /// Broad smile: MAR ~0.53, width 0.3.
        pub fn happy() -> Self {
            Self {
                ear: 0.2,
                mouth_open: 0.12,
                mouth_side: 0.2,
                mouth_width: 0.3,
                eyebrow_raise: 0.05,
            }
        }

        /// Eyes almost shut, mouth relaxed.
        pub fn sleepy() -> Self {
            Self {
                ear: 0.05,
                mouth_open: 0.05,
                mouth_side: 0.05,
                mouth_width: 0.2,
                ..Self::neutral()
            }
        }
    }

    const EYE_Y: f32 = 0.4;
    const EYE_WIDTH: f32 = 0.1;
    const MOUTH_X: f32 = 0.5;
    const MOUTH_Y: f32 = 0.7;

    fn place_eye(points: &mut [Point3D], eye: [usize; 6], left_x: f32, ear: f32) {
        let half = ear * EYE_WIDTH / 2.0;
        let [p0, p1, p2, p3, p4, p5] = eye;
        points[p0] = Point3D::new(left_x, EYE_Y, 0.0);
        points[p3] = Point3D::new(left_x + EYE_WIDTH, EYE_Y, 0.0);
        points[p1] = Point3D::new(left_x + 0.03, EYE_Y - half, 0.0);
        points[p5] = Point3D::new(left_x + 0.03, EYE_Y + half, 0.0);
        points[p2] = Point3D::new(left_x + 0.07, EYE_Y - half, 0.0);
        points[p4] = Point3D::new(left_x + 0.07, EYE_Y + half, 0.0);
    }

    pub fn face(shape: &FaceShape) -> Vec<Point3D> {
        let mut points = vec![Point3D::new(0.5, 0.5, 0.0); 468];

        place_eye(&mut points, LEFT_EYE, 0.3, shape.ear);
        place_eye(&mut points, RIGHT_EYE, 0.6, shape.ear);

        let brow_y = EYE_Y - shape.eyebrow_raise;
        points[LEFT_EYEBROW] = Point3D::new(0.35, brow_y, 0.0);
        points[RIGHT_EYEBROW] = Point3D::new(0.65, brow_y, 0.0);

        points[UPPER_LIP_CENTER] = Point3D::new(MOUTH_X, MOUTH_Y - shape.mouth_open / 2.0, 0.0);
        points[LOWER_LIP_CENTER] = Point3D::new(MOUTH_X, MOUTH_Y + shape.mouth_open / 2.0, 0.0);
        points[UPPER_LIP_SIDE] = Point3D::new(MOUTH_X - 0.03, MOUTH_Y - shape.mouth_side / 2.0, 0.0);
        points[LOWER_LIP_SIDE] = Point3D::new(MOUTH_X - 0.03, MOUTH_Y + shape.mouth_side / 2.0, 0.0);
        points[MOUTH_LEFT_CORNER] = Point3D::new(MOUTH_X - shape.mouth_width / 2.0, MOUTH_Y, 0.0);
        points[MOUTH_RIGHT_CORNER] = Point3D::new(MOUTH_X + shape.mouth_width / 2.0, MOUTH_Y, 0.0);

        points
    }

    pub fn flat(points: &[Point3D]) -> Vec<f32> {
        points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }
}
