//! Encoder position to coil phase mapping.
//!
//! A phase is an integer angular position within the motor's electrical
//! frame: one full mechanical step is [`FULL_STEP`] = 256 phase units. The
//! mapping `phase = round(full_steps_per_rotation * position / 256)` lands in
//! a 24-bit space that wraps once per encoder-counter revolution; consumers
//! never track revolutions explicitly and instead unwrap per-sample phase
//! differences.

use crate::math_integer::div_round_closest;

/// Phase units per full mechanical step.
pub const FULL_STEP: i32 = 256;

/// The phase result space is 24 bits wide.
pub const PHASE_MASK: u32 = 0xFF_FFFF;

/// Bias applied to unwrap a phase difference that crossed the 24-bit
/// boundary.
pub const PHASE_BIAS: i32 = 1 << 24;

/// Largest plausible per-sample phase movement; a raw difference beyond this
/// is a wrap crossing, not motion.
pub const PHASE_MAX: i32 = 51_200;

/// Map an encoder position to its coil phase.
///
/// The product is computed in 64 bits so axes with large
/// `full_steps_per_rotation` cannot overflow, then reduced into the 24-bit
/// phase space.
#[inline(always)]
pub fn position_to_phase(full_steps_per_rotation: u32, position: u32) -> u32 {
    let scaled = div_round_closest(full_steps_per_rotation as u64 * position as u64, 256);
    (scaled as u32) & PHASE_MASK
}

/// Signed difference between two phases, unwrapped across the 24-bit
/// boundary.
///
/// Both inputs must already be reduced into the phase space. A raw
/// difference with magnitude above [`PHASE_MAX`] is treated as a boundary
/// crossing and biased back by [`PHASE_BIAS`].
#[inline(always)]
pub fn phase_difference(phase: u32, last_phase: u32) -> i32 {
    let mut diff = phase as i32 - last_phase as i32;
    if diff > PHASE_MAX {
        diff -= PHASE_BIAS;
    } else if diff < -PHASE_MAX {
        diff += PHASE_BIAS;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_monotonic_with_bounded_steps() {
        let fsr = 200u32;
        let max_step = (fsr as i64 + 255) / 256; // ceil(fsr / 256)
        let mut prev = position_to_phase(fsr, 0) as i64;
        for p in 1..200_000u32 {
            let phase = position_to_phase(fsr, p) as i64;
            assert!(phase >= prev, "not monotonic at p = {}", p);
            assert!(phase - prev <= max_step, "jump of {} at p = {}", phase - prev, p);
            prev = phase;
        }
    }

    #[test]
    fn rounds_to_nearest() {
        // 200 * 1000 / 256 = 781.25 -> 781; 200 * 1002 / 256 = 782.8 -> 783
        assert_eq!(position_to_phase(200, 1000), 781);
        assert_eq!(position_to_phase(200, 1002), 783);
    }

    #[test]
    fn large_axis_product_does_not_overflow() {
        // fsr * position overflows 32 bits; the 64-bit widening must keep
        // the reduced result exact
        let fsr = 51_200u32;
        let position = 0x00FF_FF00u32;
        let expected = ((fsr as u64 * position as u64 + 128) / 256) as u32 & PHASE_MASK;
        assert_eq!(position_to_phase(fsr, position), expected);
    }

    #[test]
    fn wrap_crossing_is_absorbed() {
        // phases straddling the 24-bit boundary: raw difference is near
        // 2^24, the unwrapped difference is the 20-unit physical move
        let before = PHASE_MASK - 9; // 2^24 - 10
        let after = 10u32;
        let d = phase_difference(after, before);
        assert_eq!(d, 20);
        assert!(d.unsigned_abs() < (PHASE_BIAS - PHASE_MAX) as u32);

        let d = phase_difference(before, after);
        assert_eq!(d, -20);
    }

    #[test]
    fn in_range_differences_pass_through() {
        assert_eq!(phase_difference(1000, 600), 400);
        assert_eq!(phase_difference(600, 1000), -400);
        assert_eq!(phase_difference(PHASE_MAX as u32, 0), PHASE_MAX);
    }

    #[test]
    fn random_walk_unwraps_every_crossing() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        // integrate unwrapped differences of a wrapping walk and compare
        // against the ground-truth accumulator
        let mut truth: i64 = 0;
        let mut last = 0u32;
        let mut integrated: i64 = 0;
        for _ in 0..100_000 {
            let step = rng.gen_range(-(PHASE_MAX as i64)..=PHASE_MAX as i64);
            truth += step;
            let phase = (truth.rem_euclid(1 << 24)) as u32;
            integrated += phase_difference(phase, last) as i64;
            last = phase;
            assert_eq!(integrated, truth);
        }
    }
}
