//! Firmware core for the air quality nodes.
//!
//! A deployment is two boards sharing one broker topic:
//!
//! 1. a room node ([`RoomNode`]) that samples its sensors every few seconds,
//! drives its own fan and status LED, and publishes the [`Reading`];
//! 2. a fan node ([`FanNode`]) that subscribes to the topic and drives the
//! ventilator from what the room node publishes.
//!
//! Hardware and network stacks stay behind traits ([`Radio`],
//! [`BrokerTransport`], [`SensorSuite`], [`Actuator`], [`Clock`] and
//! `embedded_hal::delay::DelayNs`) so the same core runs on a board or on a
//! host.
//!
//! [`Reading`]: aqmindp_sensor::Reading
//! [`SensorSuite`]: aqmindp_sensor::SensorSuite
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod actuator;
pub mod broker;
pub mod clock;
pub mod config;
pub mod link;
pub mod node;
pub mod policy;

pub use actuator::{apply_all, Actuator, ActuatorError, FanDriver, RgbIndicator};
pub use broker::{
    BrokerClient, BrokerError, BrokerTransport, InboundMessage, SessionId, SessionState,
};
pub use clock::Clock;
pub use config::{BrokerEndpoint, Credentials, LinkBudget, NodeConfig, Role, ThresholdConfig};
pub use link::{LinkError, LinkManager, LinkState, Radio, RadioStatus};
pub use node::{ConsumerReport, Connectivity, CycleReport, FanNode, NodeError, RoomNode};
pub use policy::{evaluate, evaluate_all, ActuatorCommand, ActuatorKind, FanState, IndicatorColor};
