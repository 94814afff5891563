//! Host command entry points and the object-id registry.
//!
//! The wire transport and RPC framing live outside this crate; whatever
//! carries the bytes decodes them into [`Command`] values and hands them to
//! [`ServoRegistry::dispatch`] from the command context, holding the
//! registry lock. Responses travel back the same way.

use heapless::Vec;

use crate::driver::{Clock, PhaseDriver};
use crate::servo_stepper::ServoStepper;
use crate::shutdown::Shutdown;

/// Decoded host command targeting one servo-stepper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `servo_stepper_set_mode oid mode run_current_scale flex kp ki kd`
    ///
    /// `flex` is reinterpreted by the target mode: hold current for
    /// open-loop and closed-loop entry, excite angle for torque mode.
    SetMode {
        oid: u8,
        mode: u8,
        run_current_scale: u32,
        flex: u32,
        kp: i16,
        ki: i16,
        kd: i16,
    },
    /// `servo_stepper_get_stats oid`
    GetStats { oid: u8 },
}

/// Response emitted back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// `servo_stepper_stats oid=%c error=%i max_time=%u`
    ServoStepperStats { oid: u8, error: i32, max_time: u32 },
}

struct Entry<D: PhaseDriver, C: Clock> {
    oid: u8,
    servo: ServoStepper<D, C>,
}

/// Fixed-capacity registry mapping object ids to servo-stepper instances.
///
/// Instances are registered once at configuration time and live until
/// process teardown. The registry itself is the shared-mutable object both
/// execution contexts touch, so the firmware wraps it in a resource lock;
/// nothing here synchronizes.
pub struct ServoRegistry<D: PhaseDriver, C: Clock, const N: usize> {
    entries: Vec<Entry<D, C>, N>,
}

impl<D: PhaseDriver, C: Clock, const N: usize> ServoRegistry<D, C, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// `config_servo_stepper`: bind a configured instance to an object id.
    pub fn config_servo_stepper(
        &mut self,
        oid: u8,
        servo: ServoStepper<D, C>,
    ) -> Result<(), Shutdown> {
        if self.entries.iter().any(|e| e.oid == oid) {
            return Err(Shutdown::OidInUse);
        }
        self.entries
            .push(Entry { oid, servo })
            .map_err(|_| Shutdown::OidInUse)
    }

    /// Look up an instance by object id.
    pub fn lookup(&mut self, oid: u8) -> Result<&mut ServoStepper<D, C>, Shutdown> {
        self.entries
            .iter_mut()
            .find(|e| e.oid == oid)
            .map(|e| &mut e.servo)
            .ok_or(Shutdown::InvalidOid)
    }

    /// Feed an encoder sample to the instance bound to `oid`. ISR context.
    pub fn update(&mut self, oid: u8, position: u32) -> Result<(), Shutdown> {
        self.lookup(oid)?.update(position)
    }

    /// Execute one decoded command. Command context, under the registry
    /// lock.
    pub fn dispatch(&mut self, command: Command) -> Result<Option<Response>, Shutdown> {
        match command {
            Command::SetMode {
                oid,
                mode,
                run_current_scale,
                flex,
                kp,
                ki,
                kd,
            } => {
                self.lookup(oid)?
                    .set_mode(mode, run_current_scale, flex, kp, ki, kd)?;
                Ok(None)
            }
            Command::GetStats { oid } => {
                let stats = self.lookup(oid)?.stats();
                Ok(Some(Response::ServoStepperStats {
                    oid,
                    error: stats.error,
                    max_time: stats.max_time,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo_stepper::testing::{test_servo, MockDriver, TestClock};
    use crate::servo_stepper::{ServoMode, MODE_HPID, MODE_OPEN_LOOP};

    fn registry_with_axis(oid: u8) -> ServoRegistry<MockDriver, TestClock, 4> {
        let mut registry = ServoRegistry::new();
        registry
            .config_servo_stepper(oid, test_servo(200, 256))
            .unwrap();
        registry
    }

    #[test]
    fn set_mode_routes_by_oid() {
        let mut registry = registry_with_axis(3);
        registry
            .dispatch(Command::SetMode {
                oid: 3,
                mode: MODE_OPEN_LOOP,
                run_current_scale: 200,
                flex: 50,
                kp: 0,
                ki: 0,
                kd: 0,
            })
            .unwrap();
        assert_eq!(registry.lookup(3).unwrap().mode(), ServoMode::OpenLoop);
    }

    #[test]
    fn stats_response_carries_oid_and_error() {
        let mut registry = registry_with_axis(7);
        let response = registry.dispatch(Command::GetStats { oid: 7 }).unwrap();
        assert_eq!(
            response,
            Some(Response::ServoStepperStats {
                oid: 7,
                error: 0,
                max_time: 0
            })
        );
    }

    #[test]
    fn unknown_oid_faults() {
        let mut registry = registry_with_axis(1);
        let err = registry.dispatch(Command::GetStats { oid: 9 }).unwrap_err();
        assert_eq!(err, Shutdown::InvalidOid);
        assert_eq!(err.message(), "Invalid oid");
    }

    #[test]
    fn duplicate_oid_faults() {
        let mut registry = registry_with_axis(1);
        let err = registry
            .config_servo_stepper(1, test_servo(200, 256))
            .unwrap_err();
        assert_eq!(err, Shutdown::OidInUse);
    }

    #[test]
    fn illegal_transition_surfaces_through_dispatch() {
        let mut registry = registry_with_axis(0);
        registry
            .dispatch(Command::SetMode {
                oid: 0,
                mode: 2, // torque
                run_current_scale: 200,
                flex: 64,
                kp: 0,
                ki: 0,
                kd: 0,
            })
            .unwrap();
        let err = registry
            .dispatch(Command::SetMode {
                oid: 0,
                mode: MODE_HPID,
                run_current_scale: 200,
                flex: 50,
                kp: 1024,
                ki: 0,
                kd: 0,
            })
            .unwrap_err();
        assert_eq!(err, Shutdown::PidModeTransition);
    }

    #[test]
    fn update_reaches_the_right_axis() {
        let mut registry = registry_with_axis(2);
        registry
            .dispatch(Command::SetMode {
                oid: 2,
                mode: MODE_OPEN_LOOP,
                run_current_scale: 150,
                flex: 30,
                kp: 0,
                ki: 0,
                kd: 0,
            })
            .unwrap();
        registry.lookup(2).unwrap().virtual_stepper_mut().set_position(4);
        registry.update(2, 0).unwrap();
        let servo = registry.lookup(2).unwrap();
        assert_eq!(servo.driver().last_set_phase(), Some((4 * 256, 150)));
    }
}
