//! Hardware interfaces consumed by the control loop.
//!
//! The loop treats the H-bridge and the wallclock as black boxes behind these
//! traits. The MCU implementations live in `servostep_drivers`; tests use
//! in-memory fakes.

/// Two-phase H-bridge current driver.
///
/// `phase` is a coil-phase position where 256 units correspond to one full
/// mechanical step and 1024 units to one electrical revolution; the driver
/// only looks at the low bits. `current_scale` is 0..=255 and governs coil
/// current magnitude.
pub trait PhaseDriver {
    /// Power up the bridge outputs.
    fn enable(&mut self);

    /// Cut the bridge outputs; the rotor is free.
    fn disable(&mut self);

    /// Clear the driver's phase bookkeeping back to phase zero.
    fn reset(&mut self);

    /// Keep the coils energized at the last commanded phase, at the given
    /// current scale. Used to let the rotor settle before sampling.
    fn hold(&mut self, current_scale: u32);

    /// Energize the coils for the given phase position and current scale.
    fn set_phase(&mut self, phase: u32, current_scale: u32);
}

/// Free-running hardware clock.
pub trait Clock {
    /// Monotonic, wrapping 32-bit tick counter. Elapsed time between two
    /// readings is `later.wrapping_sub(earlier)`, valid modulo 2^32.
    fn read_time(&self) -> u32;
}
