#![no_std]

//! Control core for a closed-loop "servo stepper": a two-phase stepper motor
//! driven through an H-bridge while a rotary encoder closes the position loop.
//!
//! Everything in this crate is integer arithmetic and runs without allocation,
//! so the same code executes in a 6 kHz timer interrupt on the MCU and inside
//! host unit tests. Hardware access goes through the narrow [`driver`] traits;
//! the `servostep_drivers` crate provides the STM32 implementations.

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

pub mod commands;
pub mod driver;
pub mod encoder_position;
pub mod math_integer;
pub mod servo_stepper;
pub mod shutdown;
pub mod virtual_stepper;

pub use commands::{Command, Response, ServoRegistry};
pub use servo_stepper::{ServoConfig, ServoMode, ServoStepper};
pub use shutdown::Shutdown;
