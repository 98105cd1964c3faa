//! `embedded-hal` pin adapters for the button and the power-enable line.

use embedded_hal::digital::v2::{InputPin, OutputPin, PinState};

use crate::power::PowerOutput;
use crate::sampler::{ButtonInput, ButtonLevel};

/// A button read straight from an input pin.
pub struct PinButton<P> {
  pin: P,
  pressed_level: PinState,
}

impl<P: InputPin> PinButton<P> {
  pub fn new(pin: P, pressed_level: PinState) -> Self {
    Self { pin, pressed_level }
  }

  /// Switch to ground with a pull-up: low means pressed.
  pub fn active_low(pin: P) -> Self {
    Self::new(pin, PinState::Low)
  }

  pub fn release(self) -> P {
    self.pin
  }
}

impl<P: InputPin> ButtonInput for PinButton<P> {
  fn level(&mut self) -> ButtonLevel {
    let pressed = match self.pressed_level {
      PinState::High => self.pin.is_high(),
      PinState::Low => self.pin.is_low(),
    };

    match pressed {
      Ok(true) => ButtonLevel::Pressed,
      Ok(false) => ButtonLevel::Released,
      // a failed read must never look like a press
      Err(_) => {
        warn!("Button read failed, treating as released");
        ButtonLevel::Released
      }
    }
  }
}

/// Power-enable line on an output pin.
pub struct PinPowerOutput<P> {
  pin: P,
  active_level: PinState,
}

impl<P: OutputPin> PinPowerOutput<P> {
  pub fn new(pin: P, active_level: PinState) -> Self {
    Self { pin, active_level }
  }

  pub fn release(self) -> P {
    self.pin
  }

  fn drive(&mut self, state: PinState) {
    if self.pin.set_state(state).is_err() {
      warn!("Power-enable write failed");
    }
  }
}

impl<P: OutputPin> PowerOutput for PinPowerOutput<P> {
  fn assert_power(&mut self) {
    self.drive(self.active_level);
  }

  fn deassert_power(&mut self) {
    self.drive(!self.active_level);
  }
}

/// Mirrors every power change on an indicator LED.
pub struct WithIndicator<O, L> {
  output: O,
  led: L,
  lit_level: PinState,
}

impl<O: PowerOutput, L: OutputPin> WithIndicator<O, L> {
  pub fn new(output: O, led: L, lit_level: PinState) -> Self {
    Self { output, led, lit_level }
  }

  pub fn release(self) -> (O, L) {
    (self.output, self.led)
  }

  fn show(&mut self, state: PinState) {
    if self.led.set_state(state).is_err() {
      warn!("Status LED write failed");
    }
  }
}

impl<O: PowerOutput, L: OutputPin> PowerOutput for WithIndicator<O, L> {
  fn assert_power(&mut self) {
    self.output.assert_power();
    self.show(self.lit_level);
  }

  fn deassert_power(&mut self) {
    self.output.deassert_power();
    self.show(!self.lit_level);
  }
}
