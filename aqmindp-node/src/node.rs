//! The two node roles and the connectivity they share.
//!
//! Both roles are driven by calling `tick` from a loop (see `run`). A tick
//! first makes sure the node is online, re-associating the link and
//! re-opening the broker session as needed, and then does the role's work:
//!
//! - [`RoomNode`] samples its sensors on a fixed interval, drives its own
//!   actuators from the reading and publishes it.
//! - [`FanNode`] waits for readings on its topic and drives its actuators
//!   from whatever arrives.
//!
//! Errors never escape a tick; they are logged and reported in the tick's
//! outcome.

use aqmindp_sensor::{decode, encode, sample, DecodeError, Reading, SensorSuite};
use alloc::string::String;
use embedded_hal::delay::DelayNs;
use rand_core::RngCore;
use thiserror_no_std::Error;

use crate::{
    actuator::{apply_all, Actuator, ActuatorError},
    broker::{BrokerClient, BrokerError, BrokerTransport, SessionId},
    clock::{Clock, Interval},
    config::{Credentials, LinkBudget, NodeConfig, ThresholdConfig},
    link::{LinkError, LinkManager, Radio},
    policy::{evaluate_all, ActuatorCommand},
};

/// Pause between loop iterations in `run`
pub const LOOP_TICK_MS: u32 = 100;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Link plus broker session, brought up in that order
pub struct Connectivity<R, T, D, G> {
    link: LinkManager<R, D>,
    broker: BrokerClient<T, D, G>,
    credentials: Credentials,
    budget: LinkBudget,
}

impl<R, T, D, G> Connectivity<R, T, D, G>
where
    R: Radio,
    T: BrokerTransport,
    D: DelayNs + Clone,
    G: RngCore,
{
    pub fn new(radio: R, transport: T, delay: D, rng: G, config: &NodeConfig) -> Self {
        Self {
            link: LinkManager::new(radio, delay.clone()),
            broker: BrokerClient::new(transport, delay, rng, config),
            credentials: config.credentials.clone(),
            budget: config.link_budget,
        }
    }

    pub fn link(&self) -> &LinkManager<R, D> {
        &self.link
    }

    pub fn broker(&self) -> &BrokerClient<T, D, G> {
        &self.broker
    }

    /// Associate the link if needed, then block until a broker session
    /// exists or the link drops out from under it.
    pub fn ensure_online(&mut self) -> Result<SessionId, NodeError> {
        if !self.link.supervise().is_associated() {
            // any old session died with the link
            self.broker.disconnect();
            if !self.link.connect(&self.credentials, self.budget).is_associated() {
                let cause = self.link.last_error().unwrap_or(LinkError::TimedOut);
                log::warn!("Link unavailable: {cause:}");
                return Err(NodeError::Link(cause));
            }
        }

        let link = &mut self.link;
        let id = self
            .broker
            .ensure_session(|| link.supervise().is_associated())?;
        Ok(id)
    }
}

/// Outcome of one [`RoomNode::tick`]
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// Not time to sample yet
    Idle,
    Published(Reading),
    /// Sampled and actuated, but the reading could not be published
    Dropped { reading: Reading, reason: BrokerError },
}

/// Producer role: samples, actuates locally and publishes
pub struct RoomNode<R, T, D, G, S, A, C> {
    net: Connectivity<R, T, D, G>,
    sensors: S,
    actuators: A,
    clock: C,
    interval: Interval,
    topic: String,
    thresholds: ThresholdConfig,
    device_id: u32,
}

impl<R, T, D, G, S, A, C> RoomNode<R, T, D, G, S, A, C>
where
    R: Radio,
    T: BrokerTransport,
    D: DelayNs + Clone,
    G: RngCore,
    S: SensorSuite,
    A: Actuator,
    C: Clock,
{
    pub fn new(
        net: Connectivity<R, T, D, G>,
        sensors: S,
        actuators: A,
        clock: C,
        config: &NodeConfig,
    ) -> Self {
        Self {
            net,
            sensors,
            actuators,
            clock,
            interval: Interval::new(config.sample_interval_ms),
            topic: config.topic.clone(),
            thresholds: config.thresholds,
            device_id: config.device_id,
        }
    }

    pub fn net(&self) -> &Connectivity<R, T, D, G> {
        &self.net
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    /// One pass of the producer loop.
    ///
    /// With the link down the reading is still taken and actuated on schedule
    /// and then dropped. With the link up but no broker, this blocks in the
    /// broker reconnect loop and samples nothing until a session exists.
    pub fn tick(&mut self) -> CycleReport {
        match self.net.ensure_online() {
            Ok(_) => {
                // nothing is subscribed, this only services keep-alive
                if let Err(e) = self.net.broker.poll() {
                    log::warn!("Broker poll failed: {e:}");
                }
            }
            Err(e) => log::warn!("Offline, sampling anyway: {e:}"),
        }

        if !self.interval.due(self.clock.now_ms()) {
            return CycleReport::Idle;
        }

        let reading = sample(&mut self.sensors);
        log::info!("Device {} {reading:}", self.device_id);

        let commands = evaluate_all(&reading, &self.thresholds);
        if let Err(e) = apply_all(&mut self.actuators, &commands) {
            log::warn!("Actuation incomplete: {e:}");
        }

        let payload = encode(&reading);
        match self.net.broker.publish(&self.topic, payload.as_bytes()) {
            Ok(()) => {
                log::info!("Published {payload} to {}", self.topic);
                CycleReport::Published(reading)
            }
            Err(reason) => {
                log::warn!("Dropping reading: {reason:}");
                CycleReport::Dropped { reading, reason }
            }
        }
    }

    pub fn run<W: DelayNs>(&mut self, delay: &mut W) -> ! {
        log::info!("Room node {} starting", self.device_id);
        loop {
            self.tick();
            delay.delay_ms(LOOP_TICK_MS);
        }
    }
}

/// Outcome of one [`FanNode::tick`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerReport {
    /// Online, nothing for us this tick
    Idle,
    Actuated {
        reading: Reading,
        commands: [ActuatorCommand; 2],
    },
    /// A message arrived but was not a reading
    Discarded(DecodeError),
    Offline(NodeError),
}

/// Consumer role: drives actuators from readings published by a room node
pub struct FanNode<R, T, D, G, A> {
    net: Connectivity<R, T, D, G>,
    actuators: A,
    topic: String,
    thresholds: ThresholdConfig,
    device_id: u32,
}

impl<R, T, D, G, A> FanNode<R, T, D, G, A>
where
    R: Radio,
    T: BrokerTransport,
    D: DelayNs + Clone,
    G: RngCore,
    A: Actuator,
{
    pub fn new(net: Connectivity<R, T, D, G>, actuators: A, config: &NodeConfig) -> Self {
        Self {
            net,
            actuators,
            topic: config.topic.clone(),
            thresholds: config.thresholds,
            device_id: config.device_id,
        }
    }

    pub fn net(&self) -> &Connectivity<R, T, D, G> {
        &self.net
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn tick(&mut self) -> ConsumerReport {
        if let Err(e) = self.net.ensure_online() {
            return ConsumerReport::Offline(e);
        }

        // a fresh session resubscribes by itself; this covers the first one
        if !self.net.broker.is_subscribed(&self.topic) {
            if let Err(e) = self.net.broker.subscribe(&self.topic) {
                return ConsumerReport::Offline(e.into());
            }
        }

        let message = match self.net.broker.poll() {
            Ok(Some(message)) => message,
            Ok(None) => return ConsumerReport::Idle,
            Err(e) => return ConsumerReport::Offline(e.into()),
        };

        if message.topic != self.topic {
            log::debug!("Ignoring message on {}", message.topic);
            return ConsumerReport::Idle;
        }

        let reading = match decode(&message.payload) {
            Ok(reading) => reading,
            Err(e) => {
                log::error!("Discarding message on {}: {e:}", message.topic);
                return ConsumerReport::Discarded(e);
            }
        };
        log::info!("Received {reading:}");

        let commands = evaluate_all(&reading, &self.thresholds);
        if let Err(e) = apply_all(&mut self.actuators, &commands) {
            log::warn!("Actuation incomplete: {e:}");
        }
        ConsumerReport::Actuated { reading, commands }
    }

    pub fn run<W: DelayNs>(&mut self, delay: &mut W) -> ! {
        log::info!("Fan node {} listening on {}", self.device_id, self.topic);
        loop {
            self.tick();
            delay.delay_ms(LOOP_TICK_MS);
        }
    }
}
