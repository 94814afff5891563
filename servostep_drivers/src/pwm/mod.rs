//! PWM timer driving the four H-bridge legs.
//!
//! Each coil maps onto a pair of complementary legs: the sign of the drive
//! value picks which leg conducts, the magnitude sets its duty, and the idle
//! leg stays low so the winding free-wheels through the low-side switches.

use hal::{
    clocks::Clocks,
    pac::TIM2,
    timer::{Alignment, OutputCompare, TimChannel, Timer, TimerConfig, TimerInterrupt},
};

use super::pinout;

/// Half-step added before the i1.15 -> compare-value shift so duties round
/// to nearest instead of truncating.
const DUTY_ROUND: u32 = 1 << 14;

pub struct BridgePwm {
    tim: Timer<TIM2>,
}

impl BridgePwm {
    /// Center-aligned PWM on TIM2 at `tick_hz`; the update interrupt doubles
    /// as the control-loop tick source.
    pub fn new(tim2: TIM2, clock_cfg: &Clocks, tick_hz: u16) -> Self {
        let mut tim = Timer::new_tim2(
            tim2,
            tick_hz as f32,
            TimerConfig {
                alignment: Alignment::Center1,
                auto_reload_preload: true,
                ..Default::default()
            },
            clock_cfg,
        );
        tim.enable_interrupt(TimerInterrupt::Update);
        tim.enable();

        BridgePwm { tim }
    }

    /// Route the four compare channels to the bridge legs and arm them.
    pub fn begin(&mut self) {
        for channel in [
            TimChannel::C1,
            TimChannel::C2,
            TimChannel::C3,
            TimChannel::C4,
        ] {
            self.tim.enable_pwm_output(channel, OutputCompare::Pwm1, 0.0);
        }
        pinout::driver::init_pwm_pins();
    }

    /// Acknowledge the periodic tick.
    pub fn clear_update_interrupt(&mut self) {
        self.tim.clear_interrupt(TimerInterrupt::Update);
    }

    /// Drive both coils from signed i1.15 values.
    pub fn set_coils(&mut self, drive_a: i16, drive_b: i16) {
        let period = self.tim.get_max_duty();
        let (a1, a2) = Self::split_legs(drive_a, period);
        let (b1, b2) = Self::split_legs(drive_b, period);
        self.tim.set_duty(TimChannel::C1, a1);
        self.tim.set_duty(TimChannel::C2, a2);
        self.tim.set_duty(TimChannel::C3, b1);
        self.tim.set_duty(TimChannel::C4, b2);
    }

    /// Ground both ends of both coils (slow-decay idle).
    pub fn idle(&mut self) {
        self.set_coils(0, 0);
    }

    fn split_legs(drive: i16, period: u32) -> (u32, u32) {
        let duty = (drive.unsigned_abs() as u32 * period + DUTY_ROUND) >> 15;
        if drive >= 0 {
            (duty, 0)
        } else {
            (0, duty)
        }
    }
}
