//! Commanded-position counter for a servo stepper.
//!
//! The motion system does not pulse a step pin on a servo axis; instead the
//! step stream feeds this counter, and the control loop chases whatever it
//! reads here. The counter is monotonic per commanded direction and wraps in
//! unsigned 32-bit space like every other position quantity in the core.

/// Direction applied to subsequent steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepDirection {
    Forward,
    Backward,
}

/// Virtual stepper: the commanded micro-step position of one axis.
pub struct VirtualStepper {
    position: u32,
    direction: StepDirection,
}

impl VirtualStepper {
    pub const fn new() -> Self {
        Self {
            position: 0,
            direction: StepDirection::Forward,
        }
    }

    /// Commanded position, in micro-steps.
    #[inline(always)]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Overwrite the commanded position (used when anchoring the closed
    /// loop, and by homing).
    pub fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    /// Set the direction for subsequent [`step`](Self::step) calls.
    pub fn set_direction(&mut self, direction: StepDirection) {
        self.direction = direction;
    }

    /// Advance the commanded position by one micro-step in the current
    /// direction.
    pub fn step(&mut self) {
        let delta = match self.direction {
            StepDirection::Forward => 1u32,
            StepDirection::Backward => u32::MAX, // -1 in wrapping arithmetic
        };
        self.position = self.position.wrapping_add(delta);
    }

    /// Advance by `count` micro-steps in the current direction.
    pub fn step_by(&mut self, count: u32) {
        let delta = match self.direction {
            StepDirection::Forward => count,
            StepDirection::Backward => count.wrapping_neg(),
        };
        self.position = self.position.wrapping_add(delta);
    }

    /// Return to the power-on state: position zero, stepping forward.
    pub fn reset(&mut self) {
        self.position = 0;
        self.direction = StepDirection::Forward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_direction() {
        let mut vs = VirtualStepper::new();
        vs.step();
        vs.step();
        assert_eq!(vs.position(), 2);
        vs.set_direction(StepDirection::Backward);
        vs.step_by(5);
        assert_eq!(vs.position(), 2u32.wrapping_sub(5));
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut vs = VirtualStepper::new();
        vs.set_direction(StepDirection::Backward);
        vs.step_by(10);
        vs.reset();
        assert_eq!(vs.position(), 0);
        vs.step();
        assert_eq!(vs.position(), 1);
    }

    #[test]
    fn wraps_through_zero() {
        let mut vs = VirtualStepper::new();
        vs.set_direction(StepDirection::Backward);
        vs.step();
        assert_eq!(vs.position(), u32::MAX);
        // a forward delta against the wrapped value is still -1 -> 0 -> +1
        vs.set_direction(StepDirection::Forward);
        vs.step_by(2);
        assert_eq!(vs.position(), 1);
    }
}
