//! State blocks for the closed-loop controller: the PID accumulators and the
//! rest-position averager that anchors the encoder frame before the loop
//! closes.

use crate::math_integer::div_round_closest;
use crate::shutdown::Shutdown;

use super::phase::FULL_STEP;

/// PID accumulators and per-sample bookkeeping.
///
/// Gains are signed 16-bit fixed-point, pre-multiplied by 1024 on the host.
/// With the control error clamped to one full step the `kp * error` product
/// stays far inside i32; see the update routine for the ranges.
pub(crate) struct PidControl {
    pub kp: i16,
    pub ki: i16,
    pub kd: i16,
    /// Integral of the clamped error, held within one full step.
    pub integral: i32,
    /// Accumulated divergence between commanded and measured motion, in
    /// phase units. Unclamped in storage so long-run truth survives.
    pub error: i32,
    /// Phase of the encoder's rest position at init; measured phases are
    /// reported relative to this.
    pub phase_offset: u32,
    pub last_phase: u32,
    pub last_stp_pos: u32,
    pub last_sample_time: u32,
}

impl PidControl {
    pub const fn new() -> Self {
        Self {
            kp: 0,
            ki: 0,
            kd: 0,
            integral: 0,
            error: 0,
            phase_offset: 0,
            last_phase: 0,
            last_stp_pos: 0,
            last_sample_time: 0,
        }
    }

    pub fn set_gains(&mut self, kp: i16, ki: i16, kd: i16) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Clear everything the loop accumulates between samples. Called when
    /// the encoder frame is (re-)anchored.
    pub fn reset_tracking(&mut self) {
        self.integral = 0;
        self.error = 0;
        self.last_phase = 0;
        self.last_stp_pos = 0;
    }
}

/// Progress of the init averager across samples.
pub(crate) enum InitProgress {
    /// Pre-roll: rotor settling under hold current.
    Settling,
    /// Collecting rest-position samples.
    Sampling,
    /// Averaging finished; `mean_position` is the encoder rest position.
    Anchored { mean_position: u32 },
}

/// Averages successive encoder samples to find the rest position.
///
/// The mean is accumulated as signed deltas against the first sample, so an
/// encoder sitting across the counter wrap still averages correctly. Any
/// sample deviating from the running mean by more than one full step aborts
/// the axis: closing the loop on a jittering encoder would servo against
/// noise.
pub(crate) struct InitAverager {
    settle_ticks: u32,
    base: u32,
    accum: i64,
    count: u32,
}

impl InitAverager {
    /// Samples averaged once the rotor has settled.
    pub const SAMPLE_COUNT: u32 = 16;

    pub const fn start(settle_ticks: u32) -> Self {
        Self {
            settle_ticks,
            base: 0,
            accum: 0,
            count: 0,
        }
    }

    pub fn tick(
        &mut self,
        position: u32,
        full_steps_per_rotation: u32,
    ) -> Result<InitProgress, Shutdown> {
        if self.settle_ticks > 0 {
            self.settle_ticks -= 1;
            return Ok(InitProgress::Settling);
        }

        if self.count == 0 {
            self.base = position;
        }
        let delta = position.wrapping_sub(self.base) as i32;
        self.accum += delta as i64;
        self.count += 1;
        let mean_delta = (self.accum / self.count as i64) as i32;

        // deviation from the running mean, expressed in phase units
        let deviation = delta.wrapping_sub(mean_delta).unsigned_abs();
        let dev_phase = div_round_closest(full_steps_per_rotation as u64 * deviation as u64, 256);
        if dev_phase > FULL_STEP as u64 {
            return Err(Shutdown::EncoderVariance);
        }

        if self.count >= Self::SAMPLE_COUNT {
            Ok(InitProgress::Anchored {
                mean_position: self.base.wrapping_add(mean_delta as u32),
            })
        } else {
            Ok(InitProgress::Sampling)
        }
    }
}
