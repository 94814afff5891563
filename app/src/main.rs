#![no_main]
#![no_std]

//! Single-axis servo-stepper firmware.
//!
//! TIM2 runs at twice the 6 kHz control rate and alternates between two
//! jobs: starting the DMA read of the SPI angle sensor, and feeding the
//! latched angle through the control core. Mode changes and stats queries
//! run as priority-0 software tasks; locking the registry from there masks
//! the control interrupt, which is the per-instance critical section the
//! core's command entry points rely on.

use defmt_rtt as _;
use panic_probe as _;

use hal::{
    clocks::Clocks,
    dma::{self, Dma, DmaChannel, DmaInput, DmaInterrupt, DmaPeriph},
    pac,
};

use cortex_m;

static mut SPI_READ_BUF: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

/// Control samples per second.
const SAMPLE_HZ: u32 = 6_000;

/// Object id of the single axis.
const SERVO_OID: u8 = 0;

/// Motor geometry: 1.8 degree motor, 16 microsteps per full step.
const FULL_STEPS_PER_ROTATION: u32 = 200;
const STEP_MULTIPLIER: u32 = 16;

/// Current scales handed to the H-bridge (0..=255).
const RUN_CURRENT_SCALE: u32 = 200;
const HOLD_CURRENT_SCALE: u32 = 60;

/// Host-style PID gains, pre-multiplied by 1024.
const PID_KP: i16 = 4 << 10;
const PID_KI: i16 = 1 << 10;
const PID_KD: i16 = 1 << 8;

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    use servostep_algo::commands::{Command, Response, ServoRegistry};
    use servostep_algo::encoder_position::PositionTracker;
    use servostep_algo::math_integer::time_scale_shift;
    use servostep_algo::servo_stepper::{MODE_HPID, MODE_OPEN_LOOP};
    use servostep_algo::shutdown::Shutdown;
    use servostep_algo::{ServoConfig, ServoStepper};

    use servostep_drivers::clock::DwtClock;
    use servostep_drivers::encoder_spi::EncoderSpi;
    use servostep_drivers::hbridge::HBridge;
    use servostep_drivers::{pinout, pwm};

    type Registry = ServoRegistry<HBridge, DwtClock, 1>;

    #[shared]
    struct Shared {
        spi1: EncoderSpi,
        registry: Registry,
    }

    #[local]
    struct Local {
        tracker: PositionTracker,
        underflow: bool,
        ticks: u32,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let mut cp = ctx.core;

        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();
        let sysclk_freq = clock_cfg.sysclk();
        defmt::debug!("SYSTEM: Clock frequency is {} MHz", sysclk_freq / 1_000_000);

        // TIM2 ticks at twice the control rate; every other tick runs the
        // loop, the other starts the encoder read
        let bridge_pwm = pwm::BridgePwm::new(dp.TIM2, &clock_cfg, (SAMPLE_HZ * 2) as u16);
        let hbridge = HBridge::new(bridge_pwm);

        let wallclock = DwtClock::new(&mut cp.DCB, &mut cp.DWT);

        let config = ServoConfig {
            full_steps_per_rotation: FULL_STEPS_PER_ROTATION,
            step_multiplier: STEP_MULTIPLIER,
            invert_direction: false,
            time_scale_shift: time_scale_shift(sysclk_freq, SAMPLE_HZ),
            // ~0.3 s of hold current before init sampling
            init_settle_ticks: SAMPLE_HZ * 3 / 10,
        };

        let mut registry = Registry::new();
        registry
            .config_servo_stepper(SERVO_OID, ServoStepper::new(config, hbridge, wallclock))
            .unwrap();
        registry
            .dispatch(Command::SetMode {
                oid: SERVO_OID,
                mode: MODE_OPEN_LOOP,
                run_current_scale: RUN_CURRENT_SCALE,
                flex: HOLD_CURRENT_SCALE,
                kp: 0,
                ki: 0,
                kd: 0,
            })
            .unwrap();

        let spi1 = EncoderSpi::new(dp.SPI1);

        let _dma1 = Dma::new(dp.DMA1);
        dma::enable_mux1();
        dma::mux(DmaPeriph::Dma1, DmaChannel::C3, DmaInput::Spi1Tx);
        dma::mux(DmaPeriph::Dma1, DmaChannel::C2, DmaInput::Spi1Rx);

        (
            Shared { spi1, registry },
            Local {
                tracker: PositionTracker::new(),
                underflow: true,
                ticks: 0,
            },
        )
    }

    #[task(binds = TIM2, shared = [spi1, registry], local = [tracker, underflow, ticks])]
    fn tim2_period_elapsed(mut cx: tim2_period_elapsed::Context) {
        // Acknowledge the tick through the timer the H-bridge runs on
        cx.shared.registry.lock(|registry| {
            if let Ok(servo) = registry.lookup(SERVO_OID) {
                servo.driver_mut().pwm_mut().clear_update_interrupt();
            }
        });

        *cx.local.underflow = !*cx.local.underflow;

        if *cx.local.underflow {
            // Control half: fold the latched angle into the absolute
            // position and run one sample of the active mode
            let angle = cx.shared.spi1.lock(|spi1| spi1.angle());
            let position = cx.local.tracker.tick(angle);

            cx.shared.registry.lock(|registry| {
                if let Err(err) = registry.update(SERVO_OID, position) {
                    shutdown_axis(registry, err);
                }
            });

            *cx.local.ticks = cx.local.ticks.wrapping_add(1);
            if *cx.local.ticks == SAMPLE_HZ / 2 {
                // half a second of open-loop hold, then close the loop
                engage_closed_loop::spawn().ok();
            }
            if *cx.local.ticks % SAMPLE_HZ == 0 {
                report_stats::spawn().ok();
            }
        } else {
            // Acquisition half: start the SPI DMA read
            encoder_begin_read::spawn().ok();
        }
    }

    #[task(priority = 0, shared = [spi1])]
    async fn encoder_begin_read(mut cx: encoder_begin_read::Context) {
        cx.shared.spi1.lock(|spi1| unsafe {
            spi1.begin_read();
            spi1.get_spi().transfer_dma(
                &EncoderSpi::READ_ANGLE_FRAME,
                &mut *core::ptr::addr_of_mut!(SPI_READ_BUF),
                DmaChannel::C3,
                DmaChannel::C2,
                Default::default(),
                Default::default(),
                DmaPeriph::Dma1,
            );
        });
    }

    #[task(binds = DMA1_CH2, shared = [spi1], priority = 1)]
    fn encoder_end_read(mut cx: encoder_end_read::Context) {
        dma::clear_interrupt(
            DmaPeriph::Dma1,
            DmaChannel::C2,
            DmaInterrupt::TransferComplete,
        );
        cx.shared.spi1.lock(|spi1| {
            spi1.get_spi()
                .stop_dma(DmaChannel::C3, Some(DmaChannel::C2), DmaPeriph::Dma1);
            spi1.get_spi()
                .cleanup_dma(DmaPeriph::Dma1, DmaChannel::C3, Some(DmaChannel::C2));
            spi1.finish_read(unsafe { *core::ptr::addr_of!(SPI_READ_BUF) });
        });
    }

    /// Command context: transition open-loop -> closed loop. The registry
    /// lock masks the control interrupt for the duration of the mutation.
    #[task(priority = 0, shared = [registry])]
    async fn engage_closed_loop(mut cx: engage_closed_loop::Context) {
        defmt::info!("servo: closing the loop");
        cx.shared.registry.lock(|registry| {
            let result = registry.dispatch(Command::SetMode {
                oid: SERVO_OID,
                mode: MODE_HPID,
                run_current_scale: RUN_CURRENT_SCALE,
                flex: HOLD_CURRENT_SCALE,
                kp: PID_KP,
                ki: PID_KI,
                kd: PID_KD,
            });
            match result {
                Ok(_) => pinout::led::status().set_high(),
                Err(err) => shutdown_axis(registry, err),
            }
        });
    }

    /// Command context: periodic stats readout.
    #[task(priority = 0, shared = [registry])]
    async fn report_stats(mut cx: report_stats::Context) {
        let response = cx
            .shared
            .registry
            .lock(|registry| registry.dispatch(Command::GetStats { oid: SERVO_OID }));
        match response {
            Ok(Some(Response::ServoStepperStats {
                oid,
                error,
                max_time,
            })) => {
                defmt::info!(
                    "servo_stepper_stats oid={} error={} max_time={}",
                    oid,
                    error,
                    max_time
                );
            }
            Ok(None) => {}
            Err(err) => cx
                .shared
                .registry
                .lock(|registry| shutdown_axis(registry, err)),
        }
    }

    /// Non-recoverable fault: report, de-energize, latch the fault LED.
    fn shutdown_axis(registry: &mut Registry, err: Shutdown) {
        defmt::error!("servo shutdown: {}", err);
        if let Ok(servo) = registry.lookup(SERVO_OID) {
            servo.set_disabled();
        }
        pinout::led::fault().set_high();
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
