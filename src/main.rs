#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use atx_latch::gpio::PinPowerOutput;
use atx_latch::Suspend;
use panic_halt as _;
use rp_pico::hal;
use rp_pico::hal::gpio::pin::bank0::{Gpio19, Gpio20};

/// Set by the wake alarm, consumed by the control loop.
pub static WOKE: AtomicBool = AtomicBool::new(false);

pub type ButtonPin = hal::gpio::Pin<Gpio20, hal::gpio::PullUpInput>;
pub type PowerPin = hal::gpio::Pin<Gpio19, hal::gpio::PushPullOutput>;

#[cfg(feature = "status-led")]
pub type PowerEnable = atx_latch::gpio::WithIndicator<
  PinPowerOutput<PowerPin>,
  hal::gpio::Pin<hal::gpio::pin::bank0::Gpio25, hal::gpio::PushPullOutput>,
>;
#[cfg(not(feature = "status-led"))]
pub type PowerEnable = PinPowerOutput<PowerPin>;

/// Sleeps until the wake alarm has fired.
pub struct AlarmSleep;

impl Suspend for AlarmSleep {
  fn suspend(&mut self) {
    loop {
      // WFI inside the critical section still wakes on the pending alarm IRQ,
      // which then runs as soon as the section ends
      let woke = cortex_m::interrupt::free(|_| {
        if WOKE.load(Ordering::Acquire) {
          WOKE.store(false, Ordering::Release);
          true
        } else {
          cortex_m::asm::wfi();
          false
        }
      });
      if woke {
        return;
      }
    }
  }
}

#[rtic::app(device = rp_pico::hal::pac, peripherals = true)]
mod app {

  use core::sync::atomic::Ordering;

  use defmt::*;
  use defmt_rtt as _;
  use embedded_hal::digital::v2::PinState;
  use embedded_hal::watchdog::WatchdogEnable;
  use rp_pico::hal::clocks::init_clocks_and_plls;
  use rp_pico::hal::timer::Alarm;
  use rp_pico::hal::watchdog::Watchdog;
  use rp_pico::hal::{self, Sio};
  use rp_pico::XOSC_CRYSTAL_FREQ;

  use atx_latch::consts::*;
  use atx_latch::gpio::{PinButton, PinPowerOutput};
  use atx_latch::{Controller, ResetCause, WakeScheduler};

  use crate::{AlarmSleep, ButtonPin, PowerEnable, WOKE};

  #[shared]
  struct Shared {}

  #[local]
  struct Local {
    alarm: hal::timer::Alarm0,
    scheduler: WakeScheduler<Watchdog, AlarmSleep>,
    controller: Controller<PinButton<ButtonPin>, PowerEnable>,
  }

  #[init]
  fn init(mut c: init::Context) -> (Shared, Local, init::Monotonics) {
    // Soft-reset does not release the hardware spinlocks
    // Release them now to avoid a deadlock after debug or watchdog reset
    unsafe {
      hal::sio::spinlock_reset();
    }

    let reason = c.device.WATCHDOG.reason.read();
    let reset_cause = ResetCause::from_watchdog_reason(reason.timer().bit_is_set(), reason.force().bit_is_set());
    if reset_cause.is_watchdog() {
      warn!("Restarted by the watchdog ({}), supply starts off", reset_cause);
    }
    info!("Initializing Raspberry Pi Pico.");

    let mut resets = c.device.RESETS;
    let mut watchdog = Watchdog::new(c.device.WATCHDOG);
    let _clocks = unwrap!(init_clocks_and_plls(
      XOSC_CRYSTAL_FREQ,
      c.device.XOSC,
      c.device.CLOCKS,
      c.device.PLL_SYS,
      c.device.PLL_USB,
      &mut resets,
      &mut watchdog,
    )
    .ok());

    let sio = Sio::new(c.device.SIO);
    let pins = rp_pico::Pins::new(c.device.IO_BANK0, c.device.PADS_BANK0, sio.gpio_bank0, &mut resets);

    // Released level first, then output: the supply must not see a start pulse
    let power_pin = pins.gpio19.into_push_pull_output_in_state(!POWER_ENABLE_ACTIVE_LEVEL);
    let button_pin = pins.gpio20.into_pull_up_input();
    // Ground for the other switch lead; the pad keeps its config when the handle drops
    let _switch_return = pins.gpio21.into_push_pull_output_in_state(PinState::Low);

    let power = PinPowerOutput::new(power_pin, POWER_ENABLE_ACTIVE_LEVEL);
    #[cfg(feature = "status-led")]
    let power = atx_latch::gpio::WithIndicator::new(
      power,
      pins.led.into_push_pull_output_in_state(!STATUS_LED_ACTIVE_LEVEL),
      STATUS_LED_ACTIVE_LEVEL,
    );
    let controller = Controller::new(PinButton::active_low(button_pin), power, TICK_CONFIG.power_off_ticks());

    let mut timer = hal::Timer::new(c.device.TIMER, &mut resets);
    let mut alarm = unwrap!(timer.alarm_0());
    alarm.enable_interrupt();
    unwrap!(alarm.schedule(TICK_CONFIG.tick_period()).ok());

    watchdog.pause_on_debug(true);
    watchdog.start(TICK_CONFIG.watchdog_timeout());
    let scheduler = WakeScheduler::new(watchdog, AlarmSleep);

    // Configure cores
    c.core.SCB.set_sleepdeep();

    info!(
      "Initialization successful, waking every {} ms ({} Hz), power-off after {} ticks",
      TICK_PERIOD_MS,
      TICK_CONFIG.tick_rate_hz(),
      TICK_CONFIG.power_off_ticks()
    );

    (
      Shared {},
      Local {
        alarm,
        scheduler,
        controller,
      },
      init::Monotonics(),
    )
  }

  #[task(
        binds = TIMER_IRQ_0,
        priority = 1,
        local = [alarm],
    )]
  fn wake(c: wake::Context) {
    let alarm = c.local.alarm;
    alarm.clear_interrupt();
    WOKE.store(true, Ordering::Release);

    // Without a next wake the loop stops feeding and the watchdog restarts us
    if alarm.schedule(TICK_CONFIG.tick_period()).is_err() {
      error!("Cannot re-arm the wake alarm");
    }
  }

  #[idle(local = [scheduler, controller])]
  fn idle(c: idle::Context) -> ! {
    let controller = c.local.controller;
    c.local.scheduler.run_forever(|| {
      controller.tick();
    })
  }
}
