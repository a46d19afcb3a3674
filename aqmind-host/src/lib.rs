//! Host side collaborators for the node core, so a room node and a fan node
//! can run as ordinary Linux processes against a real MQTT broker.
//!
//! Nothing here knows about the control loop; it only implements the traits
//! `aqmindp-node` and `aqmindp-sensor` ask for.

mod actuators;
mod env;
mod radio;
mod sensors;
mod time;
mod transport;

pub use actuators::LogActuators;
pub use env::{apply_env_overrides, sensor_failure_rate, HostError};
pub use radio::HostRadio;
pub use sensors::SimulatedSensors;
pub use time::{StdClock, StdDelay};
pub use transport::{MqttTransport, TransportError};
