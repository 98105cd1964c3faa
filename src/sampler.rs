//! Per-tick button sampling with press-edge detection and hold counting.

/// Level of the button line as seen by the control logic, after wiring polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLevel {
  Released,
  Pressed,
}

/// Anything that can report the button level once per tick.
pub trait ButtonInput {
  fn level(&mut self) -> ButtonLevel;
}

/// What one tick of sampling observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
  /// Not pressed. Carries no hold count.
  Released,
  /// First pressed tick after a released one; the hold count is zero.
  PressEdge,
  /// Still pressed, `n` ticks after the edge.
  Held(u32),
}

impl ButtonEvent {
  pub fn is_pressed(&self) -> bool {
    !matches!(self, ButtonEvent::Released)
  }

  /// Ticks since the press edge, or `None` while released.
  pub fn hold_count(&self) -> Option<u32> {
    match *self {
      ButtonEvent::Released => None,
      ButtonEvent::PressEdge => Some(0),
      ButtonEvent::Held(ticks) => Some(ticks),
    }
  }
}

/// Turns raw per-tick levels into [`ButtonEvent`]s.
///
/// A single read is trusted as-is: the tick interval is the only debounce.
#[derive(Debug, Default)]
pub struct ButtonSampler {
  was_pressed: bool,
  hold_count: u32,
}

impl ButtonSampler {
  pub const fn new() -> Self {
    Self {
      was_pressed: false,
      hold_count: 0,
    }
  }

  pub fn sample(&mut self, level: ButtonLevel) -> ButtonEvent {
    match level {
      ButtonLevel::Released => {
        self.was_pressed = false;
        ButtonEvent::Released
      }
      ButtonLevel::Pressed if !self.was_pressed => {
        self.was_pressed = true;
        self.hold_count = 0;
        ButtonEvent::PressEdge
      }
      ButtonLevel::Pressed => {
        // saturate: a wrapped counter would read as a fresh edge
        self.hold_count = self.hold_count.saturating_add(1);
        ButtonEvent::Held(self.hold_count)
      }
    }
  }
}
