//! SPI magnetic angle sensor, AS5047-class.
//!
//! The sensor reports a 14-bit angle with parity and error flags in the top
//! two bits of the response word. Reads run as a DMA transfer started in one
//! half of the control period and latched from the transfer-complete
//! interrupt, so the blocking cost inside the timer tick is zero.

use hal::{
    gpio::Pin,
    pac::SPI1,
    spi::{BaudRate, Spi, SpiConfig, SpiMode},
};

use super::pinout;

/// 14 data bits; parity and the error flag sit above.
const ANGLE_MASK: u16 = 0x3FFF;

pub struct EncoderSpi {
    spi: Spi<SPI1>,
    cs_pin: Pin,
    angle: u16,
}

impl EncoderSpi {
    /// Angle-register read command followed by the clock-out word for the
    /// response.
    pub const READ_ANGLE_FRAME: [u8; 4] = [0xFF, 0xFF, 0x00, 0x00];

    pub fn new(spi_reg: SPI1) -> Self {
        let mut cs_pin = pinout::encoder::init_spi_pins();
        cs_pin.set_high();

        // mode 1, sclk low between frames: what the sensor samples on
        let spi = Spi::new(
            spi_reg,
            SpiConfig {
                mode: SpiMode::mode1(),
                ..Default::default()
            },
            BaudRate::Div32,
        );

        EncoderSpi {
            spi,
            cs_pin,
            angle: 0,
        }
    }

    pub fn get_spi(&mut self) -> &mut Spi<SPI1> {
        &mut self.spi
    }

    /// Last latched angle, one mechanical revolution across the u16 range.
    pub fn angle(&self) -> u16 {
        self.angle
    }

    /// Assert chip select before starting the DMA transfer.
    pub fn begin_read(&mut self) {
        self.cs_pin.set_low();
    }

    /// Deassert chip select and latch the angle out of the response frame.
    pub fn finish_read(&mut self, frame: [u8; 4]) -> u16 {
        self.cs_pin.set_high();
        let word = u16::from_be_bytes([frame[2], frame[3]]);
        // drop the status bits, stretch 14 bits across the full u16 range
        self.angle = (word & ANGLE_MASK) << 2;
        self.angle
    }
}
