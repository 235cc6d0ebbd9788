//! Cosmetic animation state, advanced by tick events.
//!
//! The chat core knows nothing about this; the UI asks the driver for frame
//! numbers and positions when it draws.

use chatline_core::Mode;

/// Frames of the landing-screen spinner.
pub const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

const KNOB_STEP: f32 = 0.5;
const TICKS_PER_DOT: u64 = 3;
const TICKS_PER_SPIN: u64 = 4;

pub trait AnimationDriver {
    /// Advance by one tick.
    fn tick(&mut self);

    /// Start sliding the theme switch knob towards `mode`.
    fn set_mode(&mut self, mode: Mode);

    /// Number of dots after "Thinking", 1 to 3.
    fn thinking_dots(&self) -> usize;

    /// Index into [`SPINNER`].
    fn spinner_frame(&self) -> usize;

    /// Knob position: 0.0 is light, 1.0 is somber.
    fn knob_progress(&self) -> f32;
}

#[derive(Debug, Clone)]
pub struct TickAnimator {
    ticks: u64,
    knob: f32,
    knob_target: f32,
}

fn knob_position(mode: Mode) -> f32 {
    match mode {
        Mode::Light => 0.0,
        Mode::Somber => 1.0,
    }
}

impl TickAnimator {
    pub fn new(mode: Mode) -> Self {
        let knob = knob_position(mode);
        Self {
            ticks: 0,
            knob,
            knob_target: knob,
        }
    }
}

impl AnimationDriver for TickAnimator {
    fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        if self.knob < self.knob_target {
            self.knob = (self.knob + KNOB_STEP).min(self.knob_target);
        } else if self.knob > self.knob_target {
            self.knob = (self.knob - KNOB_STEP).max(self.knob_target);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.knob_target = knob_position(mode);
    }

    fn thinking_dots(&self) -> usize {
        ((self.ticks / TICKS_PER_DOT) % 3) as usize + 1
    }

    fn spinner_frame(&self) -> usize {
        ((self.ticks / TICKS_PER_SPIN) % SPINNER.len() as u64) as usize
    }

    fn knob_progress(&self) -> f32 {
        self.knob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knob_slides_over_two_ticks() {
        let mut anim = TickAnimator::new(Mode::Light);
        anim.set_mode(Mode::Somber);

        assert_eq!(anim.knob_progress(), 0.0);
        anim.tick();
        assert_eq!(anim.knob_progress(), 0.5);
        anim.tick();
        assert_eq!(anim.knob_progress(), 1.0);
        anim.tick();
        assert_eq!(anim.knob_progress(), 1.0);
    }

    #[test]
    fn test_knob_reverses_mid_slide() {
        let mut anim = TickAnimator::new(Mode::Light);
        anim.set_mode(Mode::Somber);
        anim.tick();
        anim.set_mode(Mode::Light);
        anim.tick();
        assert_eq!(anim.knob_progress(), 0.0);
    }

    #[test]
    fn test_thinking_dots_cycle() {
        let mut anim = TickAnimator::new(Mode::Light);
        let mut seen = Vec::new();
        for _ in 0..9 {
            seen.push(anim.thinking_dots());
            anim.tick();
        }
        assert_eq!(seen, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert_eq!(anim.thinking_dots(), 1);
    }

    #[test]
    fn test_spinner_stays_in_range() {
        let mut anim = TickAnimator::new(Mode::Somber);
        for _ in 0..100 {
            assert!(anim.spinner_frame() < SPINNER.len());
            anim.tick();
        }
    }
}
