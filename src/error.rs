//! Errors raised while validating the build-time tick configuration.

/// Reasons a [`TickConfig`](crate::consts::TickConfig) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
  #[error("wake period must be non-zero")]
  ZeroTickPeriod,
  #[error("wake period of {0} ms is longer than one second")]
  TickPeriodTooLong(u32),
  #[error("power-off hold of {0} ms is shorter than one tick")]
  HoldShorterThanTick(u32),
  #[error("watchdog timeout must be longer than the wake period")]
  WatchdogNotLongerThanTick,
  #[error("watchdog timeout of {0} ms exceeds the hardware limit")]
  WatchdogTooLong(u32),
}
