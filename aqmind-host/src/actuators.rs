use aqmindp_node::{Actuator, ActuatorCommand, ActuatorError, FanState, IndicatorColor};

/// Stand-in for the fan relay and status LED: logs every change
#[derive(Debug, Default)]
pub struct LogActuators {
    fan: Option<FanState>,
    indicator: Option<IndicatorColor>,
}

impl LogActuators {
    pub fn fan(&self) -> Option<FanState> {
        self.fan
    }

    pub fn indicator(&self) -> Option<IndicatorColor> {
        self.indicator
    }
}

impl Actuator for LogActuators {
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError> {
        match cmd {
            ActuatorCommand::Fan(state) => {
                if self.fan != Some(state) {
                    log::info!("Fan -> {}", if state.on { "ON" } else { "OFF" });
                }
                self.fan = Some(state);
            }
            ActuatorCommand::Indicator(color) => {
                if self.indicator != Some(color) {
                    log::info!("Indicator -> #{:02x}{:02x}{:02x}", color.r, color.g, color.b);
                }
                self.indicator = Some(color);
            }
        }
        Ok(())
    }
}
