//! MQTT transport on `rumqttc`'s blocking client.
//!
//! The client only moves packets while its [`Connection`] is being driven,
//! so `connect` drives it until the broker acknowledges, `poll` drives it
//! for a short slice every tick and `disconnect` drives it until the
//! DISCONNECT has gone out.

use std::time::{Duration, Instant};

use aqmindp_node::{BrokerEndpoint, BrokerTransport, InboundMessage};
use rumqttc::{
    Client, ClientError, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions,
    Outgoing, Packet, QoS, RecvTimeoutError,
};
use thiserror::Error;

const REQUEST_CAPACITY: usize = 10;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_SLICE: Duration = Duration::from_millis(50);
// Poll slices spent flushing DISCONNECT before the socket is dropped
const DISCONNECT_SLICES: usize = 10;

type Next = Result<Result<Event, ConnectionError>, RecvTimeoutError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Broker refused connection: {0:?}")]
    Refused(ConnectReturnCode),
    #[error("Timed out waiting for broker acknowledgement")]
    ConnectTimeout,
    #[error("Connection Error")]
    Connection(#[from] ConnectionError),
    #[error("Client Error")]
    Client(#[from] ClientError),
    #[error("Connection closed")]
    Closed,
    #[error("No session")]
    NotConnected,
}

struct Session {
    client: Client,
    connection: Connection,
}

pub struct MqttTransport {
    session: Option<Session>,
    connected: bool,
    connect_timeout: Duration,
    poll_slice: Duration,
}

impl MqttTransport {
    pub fn new() -> Self {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_SLICE)
    }

    pub fn with_timeouts(connect_timeout: Duration, poll_slice: Duration) -> Self {
        Self {
            session: None,
            connected: false,
            connect_timeout,
            poll_slice,
        }
    }

    fn session(&mut self) -> Result<&mut Session, TransportError> {
        self.session.as_mut().ok_or(TransportError::NotConnected)
    }

    fn lost(&mut self, e: TransportError) -> TransportError {
        log::error!("MQTT session lost: {e:}");
        self.connected = false;
        e
    }
}

impl Default for MqttTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn await_ack(connection: &mut Connection, timeout: Duration) -> Result<(), TransportError> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TransportError::ConnectTimeout);
        }
        if let Some(outcome) = ack_outcome(connection.recv_timeout(remaining)) {
            return outcome;
        }
    }
}

/// `None` while the ConnAck is still outstanding
fn ack_outcome(next: Next) -> Option<Result<(), TransportError>> {
    match next {
        Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => Some(match ack.code {
            ConnectReturnCode::Success => Ok(()),
            code => Err(TransportError::Refused(code)),
        }),
        Ok(Ok(event)) => {
            log::trace!("Awaiting ConnAck, got {event:?}");
            None
        }
        Ok(Err(ConnectionError::ConnectionRefused(code))) => {
            Some(Err(TransportError::Refused(code)))
        }
        Ok(Err(e)) => Some(Err(e.into())),
        Err(RecvTimeoutError::Timeout) => Some(Err(TransportError::ConnectTimeout)),
        Err(RecvTimeoutError::Disconnected) => Some(Err(TransportError::Closed)),
    }
}

/// Map one step of the connection to a delivered message. An error means
/// the session is gone.
fn inbound(next: Next) -> Result<Option<InboundMessage>, TransportError> {
    match next {
        Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => Ok(Some(InboundMessage {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        })),
        Ok(Ok(Event::Incoming(Packet::Disconnect))) => Err(TransportError::Closed),
        Ok(Ok(event)) => {
            log::trace!("MQTT event {event:?}");
            Ok(None)
        }
        Ok(Err(e)) => Err(e.into()),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
    }
}

impl BrokerTransport for MqttTransport {
    type Error = TransportError;

    fn connect(
        &mut self,
        endpoint: &BrokerEndpoint,
        client_id: &str,
        keep_alive_secs: u16,
    ) -> Result<(), TransportError> {
        self.disconnect();

        let mut options = MqttOptions::new(client_id, endpoint.host.as_str(), endpoint.port);
        options.set_keep_alive(Duration::from_secs(u64::from(keep_alive_secs)));
        options.set_clean_session(true);

        let (client, mut connection) = Client::new(options, REQUEST_CAPACITY);
        await_ack(&mut connection, self.connect_timeout)?;

        log::debug!("ConnAck from {}:{}", endpoint.host, endpoint.port);
        self.session = Some(Session { client, connection });
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let session = self.session()?;
        // queued for the connection; sent on the next poll
        session
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| self.lost(e.into()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let session = self.session()?;
        session
            .client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| self.lost(e.into()))
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        let slice = self.poll_slice;
        let next = self.session()?.connection.recv_timeout(slice);
        inbound(next).map_err(|e| self.lost(e))
    }

    fn disconnect(&mut self) {
        self.connected = false;
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.client.try_disconnect() {
            log::debug!("Disconnect request not queued: {e:}");
            return;
        }
        for _ in 0..DISCONNECT_SLICES {
            match session.connection.recv_timeout(self.poll_slice) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => {
                    log::debug!("Disconnect sent");
                    return;
                }
                Ok(Ok(_)) => {}
                Ok(Err(_)) | Err(_) => break,
            }
        }
        log::debug!("Closing without a clean disconnect");
    }
}
