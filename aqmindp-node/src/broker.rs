//! Publish/subscribe session on top of an associated link.
//!
//! [`BrokerClient`] owns the session state machine
//!
//! ```text
//! Disconnected --attempt--> Connecting --ok--> Connected(id)
//!      ^                        |                  |
//!      +-------- error ---------+--- transport ----+
//! ```
//!
//! and a [`BrokerTransport`] does the actual protocol work. Nothing is queued:
//! publishing without a session fails straight away with
//! [`BrokerError::NotConnected`].

use alloc::{format, string::String, vec::Vec};
use core::fmt;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;
use thiserror_no_std::Error;

use crate::config::{BrokerEndpoint, NodeConfig};

/// Topics remembered for re-subscription after a reconnect
pub const MAX_SUBSCRIPTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Protocol side of the session. Implementations are expected to be
/// non-blocking except for `connect`, which may wait for the broker's
/// acknowledgement.
pub trait BrokerTransport {
    type Error: fmt::Debug;

    fn connect(
        &mut self,
        endpoint: &BrokerEndpoint,
        client_id: &str,
        keep_alive_secs: u16,
    ) -> Result<(), Self::Error>;

    /// Whether the transport still believes the session is up
    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Service keep-alive and hand back at most one inbound message
    fn poll(&mut self) -> Result<Option<InboundMessage>, Self::Error>;

    fn disconnect(&mut self);
}

/// Client identifier presented to the broker for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(SessionId),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Broker connect failed")]
    ConnectFailed,
    #[error("No broker session")]
    NotConnected,
    #[error("Publish failed")]
    PublishFailed,
    #[error("Subscribe failed")]
    SubscribeFailed,
    #[error("Broker connection lost")]
    ConnectionLost,
    #[error("Link is down")]
    LinkDown,
    #[error("Subscription list full")]
    TooManySubscriptions,
}

pub struct BrokerClient<T, D, G> {
    transport: T,
    delay: D,
    rng: G,
    endpoint: BrokerEndpoint,
    client_id_prefix: String,
    keep_alive_secs: u16,
    reconnect_delay_ms: u32,
    state: SessionState,
    subscriptions: heapless::Vec<String, MAX_SUBSCRIPTIONS>,
}

impl<T, D, G> BrokerClient<T, D, G>
where
    T: BrokerTransport,
    D: DelayNs,
    G: RngCore,
{
    pub fn new(transport: T, delay: D, rng: G, config: &NodeConfig) -> Self {
        Self {
            transport,
            delay,
            rng,
            endpoint: config.broker.clone(),
            client_id_prefix: config.client_id_prefix.clone(),
            keep_alive_secs: config.keep_alive_secs,
            reconnect_delay_ms: config.reconnect_delay_ms,
            state: SessionState::Disconnected,
            subscriptions: heapless::Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Append a random suffix to the configured prefix so a rebooted node
    /// never collides with its own stale session on the broker.
    fn new_session_id(&mut self) -> SessionId {
        let suffix = self.rng.next_u32() as u16;
        SessionId(format!("{}-{:x}", self.client_id_prefix, suffix))
    }

    /// One connect attempt with a fresh session id. Remembered topics are
    /// subscribed again on success.
    pub fn connect_once(&mut self) -> Result<SessionId, BrokerError> {
        let id = self.new_session_id();
        self.state = SessionState::Connecting;
        log::info!(
            "Connecting to broker {}:{} as {id:}",
            self.endpoint.host,
            self.endpoint.port
        );

        if let Err(e) = self
            .transport
            .connect(&self.endpoint, id.as_str(), self.keep_alive_secs)
        {
            log::error!("Broker connect failed {e:?}");
            self.state = SessionState::Disconnected;
            return Err(BrokerError::ConnectFailed);
        }

        for topic in self.subscriptions.iter() {
            if let Err(e) = self.transport.subscribe(topic) {
                log::error!("Resubscribe to {topic:} failed {e:?}");
                self.transport.disconnect();
                self.state = SessionState::Disconnected;
                return Err(BrokerError::SubscribeFailed);
            }
            log::info!("Resubscribed to {topic:}");
        }

        log::info!("Broker session {id:} established");
        self.state = SessionState::Connected(id.clone());
        Ok(id)
    }

    /// Block until a session exists, retrying with the fixed reconnect delay.
    ///
    /// There is no attempt limit; the only way out without a session is the
    /// link going away, checked through `link_up` before every attempt, in
    /// which case [`BrokerError::LinkDown`] is returned.
    pub fn ensure_session(
        &mut self,
        mut link_up: impl FnMut() -> bool,
    ) -> Result<SessionId, BrokerError> {
        loop {
            if let SessionState::Connected(id) = &self.state {
                if self.transport.is_connected() {
                    return Ok(id.clone());
                }
                log::warn!("Broker session {id:} dropped");
                self.state = SessionState::Disconnected;
            }

            if !link_up() {
                log::warn!("Link down, not connecting to broker");
                return Err(BrokerError::LinkDown);
            }

            match self.connect_once() {
                Ok(id) => return Ok(id),
                Err(e) => {
                    log::warn!("{e:}, retrying in {} ms", self.reconnect_delay_ms);
                    self.delay.delay_ms(self.reconnect_delay_ms);
                }
            }
        }
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        self.require_session()?;
        match self.transport.publish(topic, payload) {
            Ok(()) => {
                log::debug!("Published {} bytes to {topic:}", payload.len());
                Ok(())
            }
            Err(e) => {
                log::error!("Publish to {topic:} failed {e:?}");
                self.drop_session();
                Err(BrokerError::PublishFailed)
            }
        }
    }

    /// Subscribe and remember the topic for later sessions
    pub fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        self.require_session()?;
        let known = self.is_subscribed(topic);
        if !known && self.subscriptions.is_full() {
            log::error!("Cannot track subscription to {topic:}");
            return Err(BrokerError::TooManySubscriptions);
        }

        if let Err(e) = self.transport.subscribe(topic) {
            log::error!("Subscribe to {topic:} failed {e:?}");
            self.drop_session();
            return Err(BrokerError::SubscribeFailed);
        }

        if !known {
            // capacity checked above
            let _ = self.subscriptions.push(String::from(topic));
        }
        log::info!("Subscribed to {topic:}");
        Ok(())
    }

    /// Must be called every loop tick
    pub fn poll(&mut self) -> Result<Option<InboundMessage>, BrokerError> {
        self.require_session()?;
        self.transport.poll().map_err(|e| {
            log::error!("Broker poll failed {e:?}");
            self.drop_session();
            BrokerError::ConnectionLost
        })
    }

    pub fn disconnect(&mut self) {
        if self.is_connected() {
            log::info!("Closing broker session");
        }
        self.transport.disconnect();
        self.state = SessionState::Disconnected;
    }

    fn require_session(&mut self) -> Result<(), BrokerError> {
        match self.state {
            SessionState::Connected(_) if self.transport.is_connected() => Ok(()),
            SessionState::Connected(_) => {
                log::warn!("Broker session dropped by transport");
                self.state = SessionState::Disconnected;
                Err(BrokerError::NotConnected)
            }
            _ => Err(BrokerError::NotConnected),
        }
    }

    fn drop_session(&mut self) {
        self.transport.disconnect();
        self.state = SessionState::Disconnected;
    }
}
