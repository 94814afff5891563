//! Free-running wallclock for the control loop.

use cortex_m::peripheral::{DCB, DWT};

use servostep_algo::driver::Clock;

/// DWT cycle counter as the core's 32-bit wrapping tick source. One tick is
/// one CPU cycle; the control core scales deltas down before they enter the
/// PID.
pub struct DwtClock;

impl DwtClock {
    pub fn new(dcb: &mut DCB, dwt: &mut DWT) -> Self {
        dcb.enable_trace();
        dwt.enable_cycle_counter();
        DwtClock
    }
}

impl Clock for DwtClock {
    fn read_time(&self) -> u32 {
        DWT::cycle_count()
    }
}
