// Definitions valid for one particular electrical setup

use embedded_hal::digital::v2::PinState;
use fugit::MicrosDurationU32;

use crate::error::ConfigError;

/// Level that asserts the power-enable line.
///
/// # Semantics
/// According to the ATX specification, `PS_ON#` must be pulled to ground to start the PSU.
/// The opposite level releases it and the supply drops back to standby.
pub const POWER_ENABLE_ACTIVE_LEVEL: PinState = PinState::Low;

/// Level that lights the on-board LED of the Pico.
pub const STATUS_LED_ACTIVE_LEVEL: PinState = PinState::High;

/// Wake period, in milliseconds.
///
/// Every wake is one tick: the button is sampled and the power state updated once.
/// 36 ms is coarse enough to ride out contact bounce of a mechanical case switch.
pub const TICK_PERIOD_MS: u32 = 36;

/// How long the button must be held, while powered, before the supply is switched off.
pub const POWER_OFF_HOLD_MS: u32 = 500;

/// The watchdog is fed once per tick, so it must outlast one full sleep.
pub const WATCHDOG_TIMEOUT_MS: u32 = 2 * TICK_PERIOD_MS;

/// Longest timeout the RP2040 watchdog can count, in microseconds.
pub const WATCHDOG_MAX_US: u32 = 8_388_607;

/// The validated configuration the firmware runs with. Rejected values fail the build.
pub const TICK_CONFIG: TickConfig = match TickConfig::new(TICK_PERIOD_MS, POWER_OFF_HOLD_MS, WATCHDOG_TIMEOUT_MS) {
  Ok(config) => config,
  Err(_) => panic!("invalid tick configuration"),
};

/// Wake cadence and the hold threshold derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickConfig {
  tick_period_ms: u32,
  tick_rate_hz: u32,
  power_off_ticks: u32,
  watchdog_timeout_ms: u32,
}

impl TickConfig {
  /// Derives the tick rate and power-off threshold from wall-clock durations.
  ///
  /// The tick rate is whole wakes per second and the threshold is rounded down, so the
  /// real hold time carries the tolerance of the wake source.
  pub const fn new(tick_period_ms: u32, power_off_hold_ms: u32, watchdog_timeout_ms: u32) -> Result<Self, ConfigError> {
    if tick_period_ms == 0 {
      return Err(ConfigError::ZeroTickPeriod);
    }
    if tick_period_ms > 1000 {
      return Err(ConfigError::TickPeriodTooLong(tick_period_ms));
    }

    let tick_rate_hz = 1000 / tick_period_ms;
    let power_off_ticks = (power_off_hold_ms as u64 * tick_rate_hz as u64 / 1000) as u32;
    if power_off_ticks == 0 {
      return Err(ConfigError::HoldShorterThanTick(power_off_hold_ms));
    }

    if watchdog_timeout_ms <= tick_period_ms {
      return Err(ConfigError::WatchdogNotLongerThanTick);
    }
    if watchdog_timeout_ms as u64 * 1000 > WATCHDOG_MAX_US as u64 {
      return Err(ConfigError::WatchdogTooLong(watchdog_timeout_ms));
    }

    Ok(Self {
      tick_period_ms,
      tick_rate_hz,
      power_off_ticks,
      watchdog_timeout_ms,
    })
  }

  /// Wake period, in the alarm's native resolution.
  pub fn tick_period(&self) -> MicrosDurationU32 {
    MicrosDurationU32::millis(self.tick_period_ms)
  }

  /// Wakes per second.
  pub const fn tick_rate_hz(&self) -> u32 {
    self.tick_rate_hz
  }

  /// Continuous hold, in ticks after the press edge, that switches the supply off.
  pub const fn power_off_ticks(&self) -> u32 {
    self.power_off_ticks
  }

  pub fn watchdog_timeout(&self) -> MicrosDurationU32 {
    MicrosDurationU32::millis(self.watchdog_timeout_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_configuration_derives_threshold() {
    assert_eq!(TICK_CONFIG.tick_rate_hz(), 27);
    // 500 ms at 27 Hz is 13.5 ticks, rounded down
    assert_eq!(TICK_CONFIG.power_off_ticks(), 13);
    assert_eq!(TICK_CONFIG.tick_period().to_millis(), 36);
    assert_eq!(TICK_CONFIG.watchdog_timeout().to_micros(), 72_000);
  }

  #[test]
  fn threshold_rounds_down() {
    let config = TickConfig::new(100, 999, 250).unwrap();
    assert_eq!(config.tick_rate_hz(), 10);
    assert_eq!(config.power_off_ticks(), 9);
  }

  #[test]
  fn rejects_zero_period() {
    assert_eq!(TickConfig::new(0, 500, 100), Err(ConfigError::ZeroTickPeriod));
  }

  #[test]
  fn rejects_period_over_one_second() {
    assert_eq!(TickConfig::new(1001, 5000, 3000), Err(ConfigError::TickPeriodTooLong(1001)));
  }

  #[test]
  fn rejects_hold_shorter_than_a_tick() {
    assert_eq!(TickConfig::new(36, 20, 72), Err(ConfigError::HoldShorterThanTick(20)));
  }

  #[test]
  fn rejects_watchdog_that_fires_during_sleep() {
    assert_eq!(TickConfig::new(36, 500, 36), Err(ConfigError::WatchdogNotLongerThanTick));
    assert_eq!(TickConfig::new(36, 500, 10), Err(ConfigError::WatchdogNotLongerThanTick));
  }

  #[test]
  fn rejects_watchdog_beyond_hardware_limit() {
    assert_eq!(TickConfig::new(36, 500, 8_389), Err(ConfigError::WatchdogTooLong(8_389)));
    assert!(TickConfig::new(36, 500, 8_388).is_ok());
  }
}
