//! Wireless link supervision.
//!
//! The [`LinkManager`] owns the radio and is the only thing that moves the
//! [`LinkState`]. Association is a blocking poll on a fixed interval with a
//! bounded number of attempts; when the budget runs out the manager hands
//! control back to the caller instead of retrying forever.

use core::net::IpAddr;

use embedded_hal::delay::DelayNs;
use thiserror_no_std::Error;

use crate::config::{Credentials, LinkBudget};

/// What the radio reports when asked for its association status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioStatus {
    Idle,
    NoNetworkAvailable,
    ScanCompleted,
    Connected(IpAddr),
    ConnectFailed,
    ConnectionLost,
    Disconnected,
}

/// Interface to the radio stack
pub trait Radio {
    /// Start associating with the given network. Non-blocking, progress is
    /// observed through [`Radio::status`].
    fn begin(&mut self, credentials: &Credentials);

    fn status(&mut self) -> RadioStatus;

    /// Abort any association attempt and drop the link
    fn disconnect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Associated(IpAddr),
    Disconnected,
}

impl LinkState {
    pub fn is_associated(&self) -> bool {
        matches!(self, LinkState::Associated(_))
    }
}

/// Why the last association attempt failed. None of these are fatal to the
/// node, only to the attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("Network not found")]
    NoSuchNetwork,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Link lost")]
    LinkLost,
    #[error("Timed out waiting for association")]
    TimedOut,
}

pub struct LinkManager<R, D> {
    radio: R,
    delay: D,
    state: LinkState,
    last_error: Option<LinkError>,
}

impl<R, D> LinkManager<R, D>
where
    R: Radio,
    D: DelayNs,
{
    pub fn new(radio: R, delay: D) -> Self {
        Self {
            radio,
            delay,
            state: LinkState::Idle,
            last_error: None,
        }
    }

    pub fn status(&self) -> LinkState {
        self.state
    }

    pub fn last_error(&self) -> Option<LinkError> {
        self.last_error
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Associate with the network, blocking for at most `budget`.
    ///
    /// Returns [`LinkState::Associated`] on success. On failure the state is
    /// [`LinkState::Disconnected`] and the cause is in [`Self::last_error`]; it
    /// is up to the caller whether to try again.
    pub fn connect(&mut self, credentials: &Credentials, budget: LinkBudget) -> LinkState {
        log::info!("Connecting to {}", credentials.ssid);
        self.state = LinkState::Connecting;
        self.radio.begin(credentials);

        // most specific thing the radio told us while we waited
        let mut cause: Option<LinkError> = None;

        for attempt in 0..budget.max_attempts {
            match self.radio.status() {
                RadioStatus::Connected(addr) => {
                    log::info!("Link associated, address {addr:}");
                    self.state = LinkState::Associated(addr);
                    self.last_error = None;
                    return self.state;
                }
                RadioStatus::ConnectFailed => {
                    log::error!("Association with {} rejected", credentials.ssid);
                    return self.fail(LinkError::AuthenticationFailed);
                }
                RadioStatus::NoNetworkAvailable => {
                    log::warn!("Network {} not found", credentials.ssid);
                    cause = Some(LinkError::NoSuchNetwork);
                }
                RadioStatus::ConnectionLost => {
                    log::warn!("Link lost while associating");
                    cause = Some(LinkError::LinkLost);
                }
                RadioStatus::ScanCompleted => log::debug!("Scan completed"),
                RadioStatus::Disconnected => log::debug!("Radio disconnected"),
                RadioStatus::Idle => log::trace!("Radio idle, attempt {attempt}"),
            }
            self.delay.delay_ms(budget.poll_interval_ms);
        }

        log::error!(
            "Failed to associate after {} attempts",
            budget.max_attempts
        );
        self.fail(cause.unwrap_or(LinkError::TimedOut))
    }

    /// Poll the radio once and notice if an established link went away.
    /// Never blocks.
    pub fn supervise(&mut self) -> LinkState {
        if let LinkState::Associated(current) = self.state {
            match self.radio.status() {
                RadioStatus::Connected(addr) => {
                    if addr != current {
                        log::info!("Link address changed {current:} -> {addr:}");
                        self.state = LinkState::Associated(addr);
                    }
                }
                status => {
                    log::error!("Link dropped, radio reports {status:?}");
                    self.state = LinkState::Disconnected;
                    self.last_error = Some(LinkError::LinkLost);
                }
            }
        }
        self.state
    }

    fn fail(&mut self, error: LinkError) -> LinkState {
        self.radio.disconnect();
        self.state = LinkState::Disconnected;
        self.last_error = Some(error);
        self.state
    }
}
