//! Actuator drivers on top of `embedded-hal` pins.
//!
//! Every driver takes the full [`ActuatorCommand`] stream and ignores the
//! commands that are not meant for it, so a node can hand the same policy
//! output to whatever combination of drivers its board has.

use embedded_hal::{
    digital::{self, OutputPin},
    pwm::{self, SetDutyCycle},
};
use thiserror_no_std::Error;

use crate::policy::{ActuatorCommand, FanState, IndicatorColor};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("Output pin error {0:?}")]
    Pin(digital::ErrorKind),
    #[error("PWM channel error {0:?}")]
    Pwm(pwm::ErrorKind),
}

pub trait Actuator {
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError>;
}

impl<A: Actuator, B: Actuator> Actuator for (A, B) {
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError> {
        let first = self.0.apply(cmd);
        let second = self.1.apply(cmd);
        first.and(second)
    }
}

/// Apply every command, carrying on past failures. The last failure is
/// returned.
pub fn apply_all<A: Actuator>(actuator: &mut A, cmds: &[ActuatorCommand]) -> Result<(), ActuatorError> {
    let mut result = Ok(());
    for cmd in cmds {
        if let Err(e) = actuator.apply(*cmd) {
            log::error!("Failed to apply {cmd:?}: {e:}");
            result = Err(e);
        }
    }
    result
}

/// Ventilator on a single switched output
pub struct FanDriver<P> {
    pin: P,
    state: Option<FanState>,
}

impl<P: OutputPin> FanDriver<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, state: None }
    }

    /// Last state successfully driven, `None` before the first command
    pub fn state(&self) -> Option<FanState> {
        self.state
    }

    pub fn set(&mut self, state: FanState) -> Result<(), ActuatorError> {
        let driven = if state.on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        driven.map_err(|e| ActuatorError::Pin(digital::Error::kind(&e)))?;

        if self.state != Some(state) {
            log::info!("Fan {}", if state.on { "ON" } else { "OFF" });
        }
        self.state = Some(state);
        Ok(())
    }
}

impl<P: OutputPin> Actuator for FanDriver<P> {
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError> {
        match cmd {
            ActuatorCommand::Fan(state) => self.set(state),
            ActuatorCommand::Indicator(_) => Ok(()),
        }
    }
}

/// RGB status LED, one PWM channel per color
pub struct RgbIndicator<R, G, B> {
    red: R,
    green: G,
    blue: B,
    active_low: bool,
    color: Option<IndicatorColor>,
}

impl<R, G, B> RgbIndicator<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self {
            red,
            green,
            blue,
            active_low: false,
            color: None,
        }
    }

    /// For common anode LEDs, where a low duty cycle means bright
    pub fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    pub fn color(&self) -> Option<IndicatorColor> {
        self.color
    }

    pub fn set(&mut self, color: IndicatorColor) -> Result<(), ActuatorError> {
        let level = |v: u8| -> u16 {
            if self.active_low {
                u16::from(u8::MAX - v)
            } else {
                u16::from(v)
            }
        };
        let (r, g, b) = (level(color.r), level(color.g), level(color.b));

        drive(&mut self.red, r)?;
        drive(&mut self.green, g)?;
        drive(&mut self.blue, b)?;

        if self.color != Some(color) {
            log::debug!("Indicator ({}, {}, {})", color.r, color.g, color.b);
        }
        self.color = Some(color);
        Ok(())
    }
}

fn drive<C: SetDutyCycle>(channel: &mut C, level: u16) -> Result<(), ActuatorError> {
    channel
        .set_duty_cycle_fraction(level, u16::from(u8::MAX))
        .map_err(|e| ActuatorError::Pwm(pwm::Error::kind(&e)))
}

impl<R, G, B> Actuator for RgbIndicator<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError> {
        match cmd {
            ActuatorCommand::Indicator(color) => self.set(color),
            ActuatorCommand::Fan(_) => Ok(()),
        }
    }
}
