/// EAR below which an eye counts as closed.
pub const DEFAULT_BLINK_THRESHOLD: f64 = 0.25;

/// Frames skipped between processed frames (0 = every frame).
pub const DEFAULT_FRAME_SKIP_COUNT: usize = 0;

/// Consecutive below-threshold samples needed to confirm a closure.
pub const DEFAULT_MIN_CLOSED_FRAMES: usize = 1;

/// Detections below this confidence are treated as absent.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Max eye-centroid displacement between processed frames for a detection
/// to keep its track slot, in detector coordinate units.
pub const DEFAULT_MAX_DISPLACEMENT: f64 = 80.0;

/// Processed frames a slot may go unseen before eviction (~0.5s at 30 fps).
pub const DEFAULT_MAX_UNSEEN_FRAMES: usize = 15;

/// p1..p6 eye contour: two corners, two upper-lid and two lower-lid points.
pub const MIN_EYE_LANDMARKS: usize = 6;
