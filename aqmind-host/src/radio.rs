//! Link "radio" for a host that is already on a network.
//!
//! There is nothing to associate with, so the link counts as up when the
//! broker host resolves and the kernel has a route to it. The address
//! reported is the local address that route would use.
//!
//! The broker is resolved once per `begin` and kept until `disconnect`, so a
//! resolver hiccup does not take down a link that still has a route.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};

use aqmindp_node::{BrokerEndpoint, Credentials, Radio, RadioStatus};

pub struct HostRadio {
    broker: BrokerEndpoint,
    active: bool,
    target: Option<SocketAddr>,
}

impl HostRadio {
    pub fn new(broker: BrokerEndpoint) -> Self {
        Self {
            broker,
            active: false,
            target: None,
        }
    }

    fn resolve(&self) -> Option<SocketAddr> {
        (self.broker.host.as_str(), self.broker.port)
            .to_socket_addrs()
            .map_err(|e| {
                log::warn!("Unable to resolve {}: {e:}", self.broker.host);
            })
            .ok()?
            .next()
    }

    fn route_to(target: SocketAddr) -> std::io::Result<IpAddr> {
        let bind: SocketAddr = match target {
            SocketAddr::V4(_) => ([0u8; 4], 0).into(),
            SocketAddr::V6(_) => ([0u16; 8], 0).into(),
        };
        // connect on UDP sends nothing, it only picks a route
        let socket = UdpSocket::bind(bind)?;
        socket.connect(target)?;
        Ok(socket.local_addr()?.ip())
    }
}

impl Radio for HostRadio {
    fn begin(&mut self, credentials: &Credentials) {
        log::debug!("Host network in use, ignoring ssid {}", credentials.ssid);
        self.active = true;
        self.target = self.resolve();
    }

    fn status(&mut self) -> RadioStatus {
        if !self.active {
            return RadioStatus::Idle;
        }
        if self.target.is_none() {
            // still waiting on the first successful lookup
            self.target = self.resolve();
        }
        let Some(target) = self.target else {
            return RadioStatus::NoNetworkAvailable;
        };
        match Self::route_to(target) {
            Ok(addr) => RadioStatus::Connected(addr),
            Err(e) => {
                log::warn!("No route to {target:}: {e:}");
                RadioStatus::ConnectionLost
            }
        }
    }

    fn disconnect(&mut self) {
        self.active = false;
        self.target = None;
    }
}
