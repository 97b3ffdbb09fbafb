use crate::blink::domain::blink_event::BlinkEye;
use crate::blink::domain::blink_state_machine::{BlinkStateMachine, BlinkTransition};

/// Blink machines owned by one tracked face.
///
/// Each eye runs independently. The combined machine is fed the larger of
/// the two EARs, so it reads "closed" only while both eyes are closed, and
/// it only receives a sample when both eyes were measured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceBlinkState {
    left: BlinkStateMachine,
    right: BlinkStateMachine,
    both: BlinkStateMachine,
}

/// One completed blink from `FaceBlinkState::observe`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blink {
    pub eye: BlinkEye,
    pub ear: f64,
    pub blink_count: u32,
}

impl FaceBlinkState {
    pub fn machine(&self, eye: BlinkEye) -> &BlinkStateMachine {
        match eye {
            BlinkEye::Left => &self.left,
            BlinkEye::Right => &self.right,
            BlinkEye::Both => &self.both,
        }
    }

    /// Feeds this frame's samples; missing samples leave that machine alone.
    /// Blinks come back in left, right, both order.
    pub fn observe(
        &mut self,
        left_ear: Option<f64>,
        right_ear: Option<f64>,
        threshold: f64,
        min_closed_frames: usize,
    ) -> Vec<Blink> {
        let combined = match (left_ear, right_ear) {
            (Some(l), Some(r)) => Some(l.max(r)),
            _ => None,
        };

        let mut blinks = Vec::new();
        for (eye, sample) in [
            (BlinkEye::Left, left_ear),
            (BlinkEye::Right, right_ear),
            (BlinkEye::Both, combined),
        ] {
            let Some(ear) = sample else { continue };
            let machine = match eye {
                BlinkEye::Left => &mut self.left,
                BlinkEye::Right => &mut self.right,
                BlinkEye::Both => &mut self.both,
            };
            if machine.update(ear, threshold, min_closed_frames) == BlinkTransition::Blinked {
                blinks.push(Blink {
                    eye,
                    ear,
                    blink_count: machine.blink_count(),
                });
            }
        }
        blinks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blink::domain::blink_state_machine::BlinkPhase;

    const T: f64 = 0.25;

    fn eyes(state: &mut FaceBlinkState, samples: &[(Option<f64>, Option<f64>)]) -> Vec<Blink> {
        samples
            .iter()
            .flat_map(|&(l, r)| state.observe(l, r, T, 1))
            .collect()
    }

    #[test]
    fn test_binocular_blink_fires_all_three() {
        let mut s = FaceBlinkState::default();
        let blinks = eyes(
            &mut s,
            &[(Some(0.3), Some(0.3)), (Some(0.1), Some(0.1)), (Some(0.3), Some(0.3))],
        );
        let kinds: Vec<BlinkEye> = blinks.iter().map(|b| b.eye).collect();
        assert_eq!(kinds, vec![BlinkEye::Left, BlinkEye::Right, BlinkEye::Both]);
    }

    #[test]
    fn test_wink_does_not_fire_combined() {
        let mut s = FaceBlinkState::default();
        let blinks = eyes(
            &mut s,
            &[(Some(0.3), Some(0.3)), (Some(0.1), Some(0.3)), (Some(0.3), Some(0.3))],
        );
        assert_eq!(blinks.len(), 1);
        assert_eq!(blinks[0].eye, BlinkEye::Left);
        assert_eq!(s.machine(BlinkEye::Both).blink_count(), 0);
    }

    #[test]
    fn test_missing_eye_sample_is_dropped_not_zero() {
        let mut s = FaceBlinkState::default();
        eyes(&mut s, &[(Some(0.3), None), (Some(0.3), None)]);

        // A zero sample would have started a closure.
        assert_eq!(s.machine(BlinkEye::Right).phase(), BlinkPhase::Open);
        assert_eq!(s.machine(BlinkEye::Right).frames_in_phase(), 0);
        assert_eq!(s.machine(BlinkEye::Both).frames_in_phase(), 0);
    }

    #[test]
    fn test_blink_carries_reopening_ear_and_count() {
        let mut s = FaceBlinkState::default();
        let blinks = eyes(&mut s, &[(Some(0.1), None), (Some(0.33), None)]);
        assert_eq!(blinks[0].ear, 0.33);
        assert_eq!(blinks[0].blink_count, 1);
    }
}
