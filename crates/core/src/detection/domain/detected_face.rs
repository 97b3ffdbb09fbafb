use serde::{Deserialize, Serialize};

use crate::shared::point::Point;

/// Axis-aligned face bounds in detector coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Head rotation in degrees, as reported by the detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// One face returned by a single detector call.
///
/// `face_id` is only meaningful within that call; it is never used to
/// follow a face across frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    #[serde(default)]
    pub face_id: u32,
    #[serde(default)]
    pub left_eye: Vec<Point>,
    #[serde(default)]
    pub right_eye: Vec<Point>,
    pub confidence: f64,
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub head_pose: Option<HeadPose>,
}

impl DetectedFace {
    pub fn new(face_id: u32, left_eye: Vec<Point>, right_eye: Vec<Point>, confidence: f64) -> Self {
        Self {
            face_id,
            left_eye,
            right_eye,
            confidence,
            bounds: None,
            head_pose: None,
        }
    }

    /// Centroid of all eye landmarks, used as the face's position for
    /// frame-to-frame association. `None` without eye points: such a face
    /// carries no blink signal and is not tracked. Bounds are never mixed
    /// in, so a track always follows the same reference point.
    ///
    /// When only one eye is reported the centroid moves by about half the
    /// inter-ocular distance, well inside the default displacement gate.
    pub fn eye_centroid(&self) -> Option<Point> {
        let points: Vec<Point> = self
            .left_eye
            .iter()
            .chain(self.right_eye.iter())
            .copied()
            .collect();
        Point::centroid(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eye_centroid_uses_both_eyes() {
        let face = DetectedFace::new(
            0,
            vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)],
            vec![Point::new(10.0, 0.0), Point::new(12.0, 4.0)],
            0.9,
        );
        let c = face.eye_centroid().unwrap();
        assert_relative_eq!(c.x, 6.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn test_eye_centroid_ignores_bounds() {
        let bounds = Some(BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 40.0,
            height: 60.0,
        });
        let mut landmarks_only = DetectedFace::new(0, vec![Point::new(4.0, 4.0)], vec![], 0.9);
        landmarks_only.bounds = bounds;
        let c = landmarks_only.eye_centroid().unwrap();
        assert_relative_eq!(c.x, 4.0);
        assert_relative_eq!(c.y, 4.0);

        let mut bounds_only = DetectedFace::new(0, vec![], vec![], 0.9);
        bounds_only.bounds = bounds;
        assert!(bounds_only.eye_centroid().is_none());
    }

    #[test]
    fn test_eye_centroid_none_without_geometry() {
        let face = DetectedFace::new(0, vec![], vec![], 0.9);
        assert!(face.eye_centroid().is_none());
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"confidence":0.8,"left_eye":[{"x":1.0,"y":2.0}]}"#;
        let face: DetectedFace = serde_json::from_str(json).unwrap();
        assert_eq!(face.face_id, 0);
        assert_eq!(face.left_eye, vec![Point::new(1.0, 2.0)]);
        assert!(face.right_eye.is_empty());
        assert!(face.bounds.is_none());
    }
}
