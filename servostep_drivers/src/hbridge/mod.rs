//! Two-phase H-bridge current driver behind the core's `PhaseDriver` trait.
//!
//! The coil-phase position maps onto the electrical angle (1024 phase units
//! per electrical revolution, i.e. four full steps); coil A carries the
//! cosine component and coil B the sine, each scaled by the commanded
//! current.

use hal::gpio::Pin;

use servostep_algo::driver::PhaseDriver;
use servostep_algo::math_integer::trigonometry::{scale_sin_cos, sin_cos};

use super::pinout;
use super::pwm::BridgePwm;

/// Phase units per electrical revolution: four full steps of 256.
const PHASE_PER_CYCLE: u32 = 1024;

pub struct HBridge {
    pwm: BridgePwm,
    enable_pin: Pin,
    reset_pin: Pin,
    last_phase: u32,
    enabled: bool,
}

impl HBridge {
    pub fn new(mut pwm: BridgePwm) -> Self {
        pwm.begin();

        let mut reset_pin = pinout::driver::reset();
        reset_pin.set_high();

        let mut enable_pin = pinout::driver::enable();
        enable_pin.set_low();

        HBridge {
            pwm,
            enable_pin,
            reset_pin,
            last_phase: 0,
            enabled: false,
        }
    }

    /// The PWM timer the bridge runs on, e.g. for the firmware to
    /// acknowledge its periodic tick.
    pub fn pwm_mut(&mut self) -> &mut BridgePwm {
        &mut self.pwm
    }

    fn apply(&mut self, phase: u32, current_scale: u32) {
        // electrical angle across the full u16 range
        let angle = ((phase % PHASE_PER_CYCLE) << 6) as u16;

        // 0..=255 current scale to i1.15 amplitude
        let amplitude = ((current_scale.min(255) * 0x7FFF) / 255) as i16;

        let (sin, cos) = sin_cos(angle);
        let (coil_b, coil_a) = scale_sin_cos((sin, cos), amplitude);

        self.pwm.set_coils(coil_a, coil_b);
    }
}

impl PhaseDriver for HBridge {
    fn enable(&mut self) {
        self.enable_pin.set_high();
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.pwm.idle();
        self.enable_pin.set_low();
        self.enabled = false;
    }

    fn reset(&mut self) {
        // pulse the bridge reset and clear the phase bookkeeping
        self.reset_pin.set_low();
        self.reset_pin.set_high();
        self.last_phase = 0;
        self.pwm.idle();
    }

    fn hold(&mut self, current_scale: u32) {
        let phase = self.last_phase;
        self.apply(phase, current_scale);
    }

    fn set_phase(&mut self, phase: u32, current_scale: u32) {
        if !self.enabled {
            return;
        }
        self.last_phase = phase;
        self.apply(phase, current_scale);
    }
}
