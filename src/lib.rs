//! Momentary pushbutton to latched ATX power-enable.
//!
//! Press the case button to switch the supply on; press and hold it to switch it off.
//! The device sleeps between ticks: on every periodic wake the watchdog is fed, the
//! button sampled once and the power state updated.
//!
//! - [`scheduler::WakeScheduler`]: wake/feed/tick/suspend cycle
//! - [`sampler::ButtonSampler`]: press edge and hold counting
//! - [`power::PowerStateMachine`]: on/off policy against a [`power::PowerOutput`]
//! - [`controller::Controller`]: the state of one latch, advanced once per tick
//! - [`gpio`]: `embedded-hal` pin adapters
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod consts;
pub mod controller;
pub mod error;
pub mod gpio;
pub mod power;
pub mod sampler;
pub mod scheduler;

pub use consts::{TickConfig, TICK_CONFIG};
pub use controller::Controller;
pub use error::ConfigError;
pub use power::{PowerOutput, PowerState, PowerStateMachine, Transition};
pub use sampler::{ButtonEvent, ButtonInput, ButtonLevel, ButtonSampler};
pub use scheduler::{ResetCause, Suspend, WakeScheduler};
