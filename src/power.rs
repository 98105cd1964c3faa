//! On/off policy for the power-enable line.

use crate::sampler::ButtonEvent;

/// The two drive modes of the power-enable line.
///
/// Implementations must take effect before returning; the state machine treats both
/// calls as infallible.
pub trait PowerOutput {
  fn assert_power(&mut self);
  fn deassert_power(&mut self);
}

impl<T: PowerOutput + ?Sized> PowerOutput for &mut T {
  fn assert_power(&mut self) {
    (**self).assert_power()
  }

  fn deassert_power(&mut self) {
    (**self).deassert_power()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
  #[default]
  Off,
  On,
}

impl PowerState {
  pub fn is_on(&self) -> bool {
    *self == PowerState::On
  }
}

/// A change made by [`PowerStateMachine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
  PoweredOn,
  PowerOffArmed,
  PoweredOff,
}

/// Press to power on; press and keep holding to power off.
///
/// Powering off needs a press edge while on (which arms it) followed by an unbroken
/// hold of `power_off_ticks`. A tap while on leaves the machine armed, which is
/// harmless: the next edge re-arms and the hold count restarts from zero.
#[derive(Debug)]
pub struct PowerStateMachine {
  state: PowerState,
  power_off_armed: bool,
  power_off_ticks: u32,
}

impl PowerStateMachine {
  /// Starts in [`PowerState::Off`], unarmed.
  pub const fn new(power_off_ticks: u32) -> Self {
    Self {
      state: PowerState::Off,
      power_off_armed: false,
      power_off_ticks,
    }
  }

  pub fn state(&self) -> PowerState {
    self.state
  }

  pub fn is_power_off_armed(&self) -> bool {
    self.power_off_armed
  }

  pub fn power_off_ticks(&self) -> u32 {
    self.power_off_ticks
  }

  /// Applies one tick's button event, driving `output` on a state change.
  pub fn step<O: PowerOutput>(&mut self, event: ButtonEvent, output: &mut O) -> Option<Transition> {
    match (self.state, event) {
      (PowerState::Off, ButtonEvent::PressEdge) => {
        output.assert_power();
        self.state = PowerState::On;
        self.power_off_armed = false;
        Some(Transition::PoweredOn)
      }
      (PowerState::Off, _) => None,
      (PowerState::On, ButtonEvent::PressEdge) => {
        if self.power_off_armed {
          None
        } else {
          self.power_off_armed = true;
          Some(Transition::PowerOffArmed)
        }
      }
      (PowerState::On, ButtonEvent::Held(ticks)) if self.power_off_armed && ticks >= self.power_off_ticks => {
        output.deassert_power();
        self.state = PowerState::Off;
        self.power_off_armed = false;
        Some(Transition::PoweredOff)
      }
      (PowerState::On, _) => None,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use proptest::prelude::*;

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub(crate) enum Drive {
    Assert,
    Deassert,
  }

  /// Records every drive request.
  #[derive(Debug, Default)]
  pub(crate) struct FakeOutput {
    pub(crate) history: Vec<Drive>,
  }

  impl FakeOutput {
    pub(crate) fn last(&self) -> Option<Drive> {
      self.history.last().copied()
    }
  }

  impl PowerOutput for FakeOutput {
    fn assert_power(&mut self) {
      self.history.push(Drive::Assert);
    }

    fn deassert_power(&mut self) {
      self.history.push(Drive::Deassert);
    }
  }

  const THRESHOLD: u32 = 10;

  fn powered_on() -> (PowerStateMachine, FakeOutput) {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();
    machine.step(ButtonEvent::PressEdge, &mut output);
    machine.step(ButtonEvent::Released, &mut output);
    assert_eq!(machine.state(), PowerState::On);
    assert!(!machine.is_power_off_armed());
    (machine, output)
  }

  #[test]
  fn starts_off_and_unarmed() {
    let machine = PowerStateMachine::new(THRESHOLD);
    assert_eq!(machine.state(), PowerState::Off);
    assert!(!machine.is_power_off_armed());
    assert_eq!(machine.power_off_ticks(), THRESHOLD);
  }

  #[test]
  fn press_edge_while_off_powers_on() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();

    assert_eq!(machine.step(ButtonEvent::PressEdge, &mut output), Some(Transition::PoweredOn));
    assert_eq!(machine.state(), PowerState::On);
    assert!(!machine.is_power_off_armed());
    assert_eq!(output.history, [Drive::Assert]);
  }

  #[test]
  fn hold_after_power_on_does_not_arm_or_power_off() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();

    machine.step(ButtonEvent::PressEdge, &mut output);
    for ticks in 1..=THRESHOLD * 3 {
      assert_eq!(machine.step(ButtonEvent::Held(ticks), &mut output), None);
    }
    assert_eq!(machine.state(), PowerState::On);
    assert!(!machine.is_power_off_armed());
    assert_eq!(output.history, [Drive::Assert]);
  }

  #[test]
  fn held_or_released_while_off_is_ignored() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();

    assert_eq!(machine.step(ButtonEvent::Held(3), &mut output), None);
    assert_eq!(machine.step(ButtonEvent::Held(THRESHOLD), &mut output), None);
    assert_eq!(machine.step(ButtonEvent::Released, &mut output), None);
    assert_eq!(machine.state(), PowerState::Off);
    assert!(output.history.is_empty());
  }

  #[test]
  fn no_press_keeps_supply_off() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();

    for _ in 0..1_000 {
      machine.step(ButtonEvent::Released, &mut output);
    }
    assert_eq!(machine.state(), PowerState::Off);
    assert!(!machine.is_power_off_armed());
    assert!(output.history.is_empty());
  }

  #[test]
  fn press_edge_while_on_arms_without_powering_off() {
    let (mut machine, mut output) = powered_on();

    assert_eq!(machine.step(ButtonEvent::PressEdge, &mut output), Some(Transition::PowerOffArmed));
    assert_eq!(machine.state(), PowerState::On);
    assert!(machine.is_power_off_armed());
    assert_eq!(output.last(), Some(Drive::Assert));
  }

  #[test]
  fn press_edge_while_armed_is_a_no_op() {
    let (mut machine, mut output) = powered_on();
    machine.step(ButtonEvent::PressEdge, &mut output);

    assert_eq!(machine.step(ButtonEvent::PressEdge, &mut output), None);
    assert!(machine.is_power_off_armed());
    assert_eq!(machine.state(), PowerState::On);
  }

  #[test]
  fn continuous_hold_to_threshold_powers_off() {
    let (mut machine, mut output) = powered_on();
    machine.step(ButtonEvent::PressEdge, &mut output);

    for ticks in 1..THRESHOLD {
      assert_eq!(machine.step(ButtonEvent::Held(ticks), &mut output), None);
      assert_eq!(machine.state(), PowerState::On, "powered off early at hold {}", ticks);
      assert!(machine.is_power_off_armed());
    }

    assert_eq!(
      machine.step(ButtonEvent::Held(THRESHOLD), &mut output),
      Some(Transition::PoweredOff)
    );
    assert_eq!(machine.state(), PowerState::Off);
    assert!(!machine.is_power_off_armed());
    assert_eq!(output.history, [Drive::Assert, Drive::Deassert]);
  }

  #[test]
  fn threshold_boundary() {
    let (mut machine, mut output) = powered_on();
    machine.step(ButtonEvent::PressEdge, &mut output);

    machine.step(ButtonEvent::Held(THRESHOLD - 1), &mut output);
    assert_eq!(machine.state(), PowerState::On);
    machine.step(ButtonEvent::Held(THRESHOLD), &mut output);
    assert_eq!(machine.state(), PowerState::Off);
  }

  #[test]
  fn hold_past_power_off_does_not_power_back_on() {
    let (mut machine, mut output) = powered_on();
    machine.step(ButtonEvent::PressEdge, &mut output);
    machine.step(ButtonEvent::Held(THRESHOLD), &mut output);

    for ticks in THRESHOLD + 1..THRESHOLD * 4 {
      assert_eq!(machine.step(ButtonEvent::Held(ticks), &mut output), None);
    }
    assert_eq!(machine.state(), PowerState::Off);
    assert_eq!(output.history, [Drive::Assert, Drive::Deassert]);
  }

  #[test]
  fn short_tap_while_on_leaves_latent_arm() {
    let (mut machine, mut output) = powered_on();
    machine.step(ButtonEvent::PressEdge, &mut output);
    for ticks in 1..THRESHOLD / 2 {
      machine.step(ButtonEvent::Held(ticks), &mut output);
    }
    machine.step(ButtonEvent::Released, &mut output);

    assert_eq!(machine.state(), PowerState::On);
    assert!(machine.is_power_off_armed());
    assert_eq!(output.history, [Drive::Assert]);
  }

  #[test]
  fn repeated_short_taps_never_power_off() {
    let (mut machine, mut output) = powered_on();

    for _ in 0..20 {
      machine.step(ButtonEvent::PressEdge, &mut output);
      for ticks in 1..THRESHOLD {
        machine.step(ButtonEvent::Held(ticks), &mut output);
      }
      machine.step(ButtonEvent::Released, &mut output);
    }
    assert_eq!(machine.state(), PowerState::On);
    assert_eq!(output.history, [Drive::Assert]);
  }

  #[test]
  fn power_cycle_twice() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();

    for _ in 0..2 {
      machine.step(ButtonEvent::PressEdge, &mut output);
      machine.step(ButtonEvent::Released, &mut output);
      machine.step(ButtonEvent::PressEdge, &mut output);
      for ticks in 1..=THRESHOLD {
        machine.step(ButtonEvent::Held(ticks), &mut output);
      }
      machine.step(ButtonEvent::Released, &mut output);
      assert_eq!(machine.state(), PowerState::Off);
    }
    assert_eq!(
      output.history,
      [Drive::Assert, Drive::Deassert, Drive::Assert, Drive::Deassert]
    );
  }

  #[test]
  fn output_works_through_a_mutable_reference() {
    let mut machine = PowerStateMachine::new(THRESHOLD);
    let mut output = FakeOutput::default();
    {
      let mut borrowed = &mut output;
      machine.step(ButtonEvent::PressEdge, &mut borrowed);
    }
    assert_eq!(output.history, [Drive::Assert]);
  }

  fn event() -> impl Strategy<Value = ButtonEvent> {
    prop_oneof![
      Just(ButtonEvent::Released),
      Just(ButtonEvent::PressEdge),
      (1..2 * THRESHOLD).prop_map(ButtonEvent::Held),
    ]
  }

  proptest! {
    #[test]
    fn released_ticks_change_nothing(
      history in prop::collection::vec(event(), 0..64),
      releases in 1usize..32,
    ) {
      let mut machine = PowerStateMachine::new(THRESHOLD);
      let mut output = FakeOutput::default();
      for event in history {
        machine.step(event, &mut output);
      }

      let state = machine.state();
      let armed = machine.is_power_off_armed();
      let drives = output.history.len();
      for _ in 0..releases {
        prop_assert_eq!(machine.step(ButtonEvent::Released, &mut output), None);
        prop_assert_eq!(machine.state(), state);
        prop_assert_eq!(machine.is_power_off_armed(), armed);
      }
      prop_assert_eq!(output.history.len(), drives);
    }

    #[test]
    fn armed_only_while_on(history in prop::collection::vec(event(), 0..128)) {
      let mut machine = PowerStateMachine::new(THRESHOLD);
      let mut output = FakeOutput::default();
      for event in history {
        machine.step(event, &mut output);
        if machine.is_power_off_armed() {
          prop_assert_eq!(machine.state(), PowerState::On);
        }
        let expected = if machine.state().is_on() { Drive::Assert } else { Drive::Deassert };
        if let Some(last) = output.last() {
          prop_assert_eq!(last, expected);
        }
      }
    }
  }
}
