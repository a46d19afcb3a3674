//! Environment overrides on top of the build time configuration.

use std::env;

use aqmindp_node::NodeConfig;
use thiserror::Error;

pub const BROKER_HOST_VAR: &str = "AQMIND_BROKER_HOST";
pub const BROKER_PORT_VAR: &str = "AQMIND_BROKER_PORT";
pub const TOPIC_VAR: &str = "AQMIND_TOPIC";
pub const FAILURE_RATE_VAR: &str = "AQMIND_SENSOR_FAILURE_RATE";

#[derive(Error, Debug, PartialEq)]
pub enum HostError {
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

fn lookup(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

pub fn apply_env_overrides(config: &mut NodeConfig) -> Result<(), HostError> {
    overrides_from(config, lookup)
}

/// Probability in `[0, 1]` that a simulated sensor read fails, 0 if unset
pub fn sensor_failure_rate() -> Result<f64, HostError> {
    failure_rate_from(lookup(FAILURE_RATE_VAR))
}

fn overrides_from(
    config: &mut NodeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), HostError> {
    if let Some(host) = lookup(BROKER_HOST_VAR) {
        config.broker.host = host;
    }
    if let Some(port) = lookup(BROKER_PORT_VAR) {
        config.broker.port = port.trim().parse().map_err(|_| HostError::InvalidEnv {
            var: BROKER_PORT_VAR,
            value: port.clone(),
        })?;
    }
    if let Some(topic) = lookup(TOPIC_VAR) {
        config.topic = topic;
    }
    log::info!(
        "Broker {}:{} topic {}",
        config.broker.host,
        config.broker.port,
        config.topic
    );
    Ok(())
}

fn failure_rate_from(raw: Option<String>) -> Result<f64, HostError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Ok(rate),
        _ => Err(HostError::InvalidEnv {
            var: FAILURE_RATE_VAR,
            value: raw,
        }),
    }
}
