//! Eye Aspect Ratio (Soukupová & Čech, 2016).
//!
//! Expects the six-point eye contour in the usual order:
//!
//! ```text
//!        p2   p3
//!   p1             p4
//!        p6   p5
//! ```
//!
//! `EAR = (|p2 - p6| + |p3 - p5|) / (2 |p1 - p4|)`. Roughly 0.3 for an
//! open eye and close to zero when the lids meet. Points beyond the sixth
//! are ignored.

use crate::shared::constants::MIN_EYE_LANDMARKS;
use crate::shared::error::ProcessingError;
use crate::shared::point::Point;

pub fn compute_ear(points: &[Point]) -> Result<f64, ProcessingError> {
    if points.len() < MIN_EYE_LANDMARKS {
        return Err(ProcessingError::InsufficientLandmarks {
            required: MIN_EYE_LANDMARKS,
            actual: points.len(),
        });
    }

    let vertical_a = points[1].distance(&points[5]);
    let vertical_b = points[2].distance(&points[4]);
    let horizontal = points[0].distance(&points[3]);

    // Coincident corners give no usable scale.
    if horizontal <= f64::EPSILON || !horizontal.is_finite() {
        return Err(ProcessingError::InsufficientLandmarks {
            required: MIN_EYE_LANDMARKS,
            actual: points.len(),
        });
    }

    Ok((vertical_a + vertical_b) / (2.0 * horizontal))
}
