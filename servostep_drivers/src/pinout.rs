//! Board pin map.
//!
//! Pins are configured where they are handed out; this module only
//! centralizes the assignments so a board revision is a one-file change.

use hal::gpio::{Pin, PinMode, Port};

pub mod driver {
    use super::*;

    /// H-bridge reset, active low.
    pub fn reset() -> Pin {
        Pin::new(Port::B, 2, PinMode::Output)
    }

    /// H-bridge output enable.
    pub fn enable() -> Pin {
        Pin::new(Port::A, 4, PinMode::Output)
    }

    /// TIM2 CH1..CH4 on the four bridge legs (A1, A2, B1, B2).
    pub fn init_pwm_pins() {
        Pin::new(Port::A, 1, PinMode::Alt(1));
        Pin::new(Port::A, 0, PinMode::Alt(1));
        Pin::new(Port::B, 10, PinMode::Alt(1));
        Pin::new(Port::B, 11, PinMode::Alt(1));
    }
}

pub mod encoder {
    use super::*;

    /// SCK/MISO/MOSI on SPI1; returns the software-driven chip select.
    pub fn init_spi_pins() -> Pin {
        Pin::new(Port::A, 5, PinMode::Alt(5));
        Pin::new(Port::A, 6, PinMode::Alt(5));
        Pin::new(Port::A, 7, PinMode::Alt(5));
        Pin::new(Port::C, 4, PinMode::Output)
    }
}

pub mod led {
    use super::*;

    /// Latched on a fatal shutdown.
    pub fn fault() -> Pin {
        Pin::new(Port::B, 15, PinMode::Output)
    }

    /// Lit while the closed loop is active.
    pub fn status() -> Pin {
        Pin::new(Port::B, 14, PinMode::Output)
    }
}
