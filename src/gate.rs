//! Move gate: at most one rotation and one shift per cooldown window.

use crate::grid::Edge;
use std::time::{Duration, Instant};

/// Discrete move request from a player or a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Rotate,
    Shift(Edge),
    /// Hard drop of the next piece. Never gated.
    Drop,
}

#[derive(Debug, Clone)]
pub struct MoveGate {
    cooldown: Duration,
    /// Rotation closed until this instant.
    rotating_until: Option<Instant>,
    /// Shared by all four shift directions.
    shifting_until: Option<Instant>,
}

impl MoveGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            rotating_until: None,
            shifting_until: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn rotating(&self, now: Instant) -> bool {
        self.rotating_until.is_some_and(|t| now < t)
    }

    pub fn shifting(&self, now: Instant) -> bool {
        self.shifting_until.is_some_and(|t| now < t)
    }

    /// Admit a rotation and close the gate for one cooldown. `false` means dropped.
    pub fn try_rotate(&mut self, now: Instant) -> bool {
        if self.rotating(now) {
            return false;
        }
        self.rotating_until = Some(now + self.cooldown);
        true
    }

    /// Admit a shift when the gate is open and nothing is mid-drop.
    pub fn try_shift(&mut self, now: Instant, falling: usize) -> bool {
        if self.shifting(now) || falling > 0 {
            return false;
        }
        self.shifting_until = Some(now + self.cooldown);
        true
    }

    pub fn reset(&mut self) {
        self.rotating_until = None;
        self.shifting_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(100);

    #[test]
    fn second_rotation_inside_cooldown_is_dropped() {
        let t0 = Instant::now();
        let mut gate = MoveGate::new(COOLDOWN);
        assert!(gate.try_rotate(t0));
        assert!(!gate.try_rotate(t0 + Duration::from_millis(50)));
        assert!(!gate.try_rotate(t0 + Duration::from_millis(99)));
        assert!(gate.try_rotate(t0 + COOLDOWN));
    }

    #[test]
    fn rotate_and_shift_gates_are_independent() {
        let t0 = Instant::now();
        let mut gate = MoveGate::new(COOLDOWN);
        assert!(gate.try_rotate(t0));
        assert!(gate.try_shift(t0, 0));
        assert!(!gate.try_shift(t0 + Duration::from_millis(10), 0));
        assert!(gate.rotating(t0) && gate.shifting(t0));
    }

    #[test]
    fn shift_refused_while_falling() {
        let t0 = Instant::now();
        let mut gate = MoveGate::new(COOLDOWN);
        assert!(!gate.try_shift(t0, 1));
        // a refused shift does not start a cooldown
        assert!(!gate.shifting(t0));
        assert!(gate.try_shift(t0, 0));
    }

    #[test]
    fn reset_opens_both_gates() {
        let t0 = Instant::now();
        let mut gate = MoveGate::new(COOLDOWN);
        gate.try_rotate(t0);
        gate.try_shift(t0, 0);
        gate.reset();
        assert!(gate.try_rotate(t0));
        assert!(gate.try_shift(t0, 0));
    }
}
