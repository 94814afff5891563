#![no_std]

//! STM32 hardware bindings for the servo-stepper control core.
//!
//! Implements the core's [`PhaseDriver`](servostep_algo::driver::PhaseDriver)
//! and [`Clock`](servostep_algo::driver::Clock) traits on top of `stm32-hal2`:
//! a 4-channel PWM H-bridge, a blocking/DMA SPI angle sensor, and the DWT
//! cycle counter as the free-running wallclock.

use defmt_rtt as _; // global logger via RTT

pub mod clock;
pub mod encoder_spi;
pub mod hbridge;
pub mod pinout;
pub mod pwm;
