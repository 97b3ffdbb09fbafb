use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BlinkPhase {
    Open,
    /// Below threshold, waiting for `min_closed_frames` confirmations.
    Closing,
    /// Closure confirmed; the next open sample completes a blink.
    Closed,
}

/// What a single EAR sample did to the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlinkTransition {
    None,
    StartedClosing,
    ConfirmedClosed,
    /// Closing reverted to Open without a confirmed closure.
    FalseAlarm,
    /// Closed → Open. Exactly one blink event per occurrence.
    Blinked,
}

/// Open → Closing → Closed → Open blink detector for one EAR signal.
///
/// Samples equal to the threshold count as open.
#[derive(Clone, Debug, PartialEq)]
pub struct BlinkStateMachine {
    phase: BlinkPhase,
    frames_in_phase: usize,
    blink_count: u32,
}

impl Default for BlinkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinkStateMachine {
    pub fn new() -> Self {
        Self {
            phase: BlinkPhase::Open,
            frames_in_phase: 0,
            blink_count: 0,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn frames_in_phase(&self) -> usize {
        self.frames_in_phase
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    /// Feeds one EAR sample. `min_closed_frames` of 0 is treated as 1.
    pub fn update(&mut self, ear: f64, threshold: f64, min_closed_frames: usize) -> BlinkTransition {
        let min_closed = min_closed_frames.max(1);
        let below = ear < threshold;

        match self.phase {
            BlinkPhase::Open if below => {
                self.enter(BlinkPhase::Closing);
                if self.frames_in_phase >= min_closed {
                    self.enter(BlinkPhase::Closed);
                    BlinkTransition::ConfirmedClosed
                } else {
                    BlinkTransition::StartedClosing
                }
            }
            BlinkPhase::Open => {
                self.frames_in_phase += 1;
                BlinkTransition::None
            }
            BlinkPhase::Closing if below => {
                self.frames_in_phase += 1;
                if self.frames_in_phase >= min_closed {
                    self.enter(BlinkPhase::Closed);
                    BlinkTransition::ConfirmedClosed
                } else {
                    BlinkTransition::None
                }
            }
            BlinkPhase::Closing => {
                self.enter(BlinkPhase::Open);
                BlinkTransition::FalseAlarm
            }
            BlinkPhase::Closed if below => {
                self.frames_in_phase += 1;
                BlinkTransition::None
            }
            BlinkPhase::Closed => {
                self.enter(BlinkPhase::Open);
                self.blink_count += 1;
                BlinkTransition::Blinked
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Entering a phase counts the triggering sample as its first frame.
    fn enter(&mut self, phase: BlinkPhase) {
        let carried = if self.phase == BlinkPhase::Closing && phase == BlinkPhase::Closed {
            self.frames_in_phase
        } else {
            1
        };
        self.phase = phase;
        self.frames_in_phase = carried;
    }
}
