//! One tick of the latch: read the button, sample it, run the power policy.

use crate::power::{PowerOutput, PowerState, PowerStateMachine, Transition};
use crate::sampler::{ButtonEvent, ButtonInput, ButtonSampler};

/// All state of the latch, owned by the control loop.
///
/// Created on every start with the supply off and the output driven de-asserted, so a
/// restart for any reason leaves the supply in standby.
pub struct Controller<B, O> {
  button: B,
  output: O,
  sampler: ButtonSampler,
  machine: PowerStateMachine,
}

impl<B, O> Controller<B, O>
where
  B: ButtonInput,
  O: PowerOutput,
{
  pub fn new(button: B, mut output: O, power_off_ticks: u32) -> Self {
    output.deassert_power();
    info!("Latch ready, power-off after {} held ticks", power_off_ticks);

    Self {
      button,
      output,
      sampler: ButtonSampler::new(),
      machine: PowerStateMachine::new(power_off_ticks),
    }
  }

  /// Runs one tick to completion.
  pub fn tick(&mut self) -> Option<Transition> {
    let event = self.sampler.sample(self.button.level());
    if event != ButtonEvent::Released {
      trace!("Button {}", event);
    }

    let transition = self.machine.step(event, &mut self.output);
    match transition {
      Some(Transition::PoweredOn) => info!("Power on"),
      Some(Transition::PowerOffArmed) => debug!("Power-off armed"),
      Some(Transition::PoweredOff) => info!("Power off after {} held ticks", self.machine.power_off_ticks()),
      None => {}
    }
    transition
  }

  pub fn power_state(&self) -> PowerState {
    self.machine.state()
  }

  pub fn is_power_off_armed(&self) -> bool {
    self.machine.is_power_off_armed()
  }

  pub fn output(&self) -> &O {
    &self.output
  }

  /// Gives the pins back, e.g. to hand them to a new controller after a simulated restart.
  pub fn release(self) -> (B, O) {
    (self.button, self.output)
  }
}
