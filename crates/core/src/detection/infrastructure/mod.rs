pub mod centroid_tracker;
pub mod landmark_trace;
pub mod replay_landmark_detector;
