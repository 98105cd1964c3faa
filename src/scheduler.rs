//! Wake/suspend cadence: feed the watchdog, run a tick, sleep until the next wake.

use embedded_hal::watchdog::Watchdog;

/// Low-power wait for the platform's periodic wake source.
///
/// Must return on the next wake and never earlier than one wake period after the
/// previous return; nothing here may be driven by the button.
pub trait Suspend {
  fn suspend(&mut self);
}

/// Drives ticks from a periodic wake source.
///
/// The watchdog is fed at the start of every tick. A tick that hangs stops the
/// feeding and the watchdog restarts the device, which starts with the supply off.
pub struct WakeScheduler<W, S> {
  watchdog: W,
  sleep: S,
  ticks: u32,
}

impl<W, S> WakeScheduler<W, S>
where
  W: Watchdog,
  S: Suspend,
{
  pub fn new(watchdog: W, sleep: S) -> Self {
    Self {
      watchdog,
      sleep,
      ticks: 0,
    }
  }

  /// Completed ticks since start, wrapping.
  pub fn ticks(&self) -> u32 {
    self.ticks
  }

  /// One wake cycle: feed, tick, suspend.
  pub fn run_once<F: FnOnce()>(&mut self, tick: F) {
    self.watchdog.feed();
    tick();
    self.ticks = self.ticks.wrapping_add(1);
    self.sleep.suspend();
  }

  pub fn run_forever<F: FnMut()>(&mut self, mut tick: F) -> ! {
    loop {
      self.run_once(&mut tick);
    }
  }
}

/// Why the previous run ended, as reported by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
  /// Power-on, brown-out or an external reset.
  PowerOn,
  /// The watchdog timed out: a tick stalled.
  WatchdogTimeout,
  /// Software forced a reset through the watchdog.
  WatchdogForced,
}

impl ResetCause {
  /// Decodes the two flags of the RP2040 `WATCHDOG.REASON` register.
  pub fn from_watchdog_reason(timer: bool, force: bool) -> Self {
    match (timer, force) {
      (true, _) => ResetCause::WatchdogTimeout,
      (false, true) => ResetCause::WatchdogForced,
      (false, false) => ResetCause::PowerOn,
    }
  }

  pub fn is_watchdog(&self) -> bool {
    !matches!(self, ResetCause::PowerOn)
  }
}
