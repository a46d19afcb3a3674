//! Node configuration.
//!
//! Deployment constants (credentials, broker, topic, alert limits) are fixed
//! at build time from `cfg.toml` and converted into a [`NodeConfig`], which is
//! what the rest of the firmware takes. Tests and host builds construct
//! [`NodeConfig`] directly instead.

use alloc::string::{String, ToString};

#[toml_cfg::toml_config]
pub struct Config {
    #[default("aqmind")]
    wifi_ssid: &'static str,
    #[default("")]
    wifi_password: &'static str,
    #[default("192.168.1.10")]
    broker_host: &'static str,
    #[default(1883)]
    broker_port: u16,
    #[default("sensors/bedroom")]
    topic: &'static str,
    #[default(1)]
    device_id: u32,
    #[default(220)]
    tvoc_limit: i32,
    #[default(800)]
    eco2_limit: i32,
    #[default(3)]
    aqi_limit: i32,
}

/// Which side of the topic a node sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Samples sensors and publishes readings
    Producer,
    /// Subscribes to readings and drives the ventilator
    Consumer,
}

impl Role {
    /// Fixed delay between broker connect attempts
    pub fn reconnect_delay_ms(&self) -> u32 {
        match self {
            Role::Producer => 2_000,
            Role::Consumer => 5_000,
        }
    }

    pub fn client_id_prefix(&self) -> &'static str {
        match self {
            Role::Producer => "aqmind-room",
            Role::Consumer => "aqmind-fan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

/// Alert limits for the ventilation decision. A metric at or above its limit
/// is in alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub tvoc_limit: i32,
    pub eco2_limit: i32,
    pub aqi_limit: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            tvoc_limit: 220,
            eco2_limit: 800,
            aqi_limit: 3,
        }
    }
}

/// How long the link manager waits for association before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkBudget {
    pub poll_interval_ms: u32,
    pub max_attempts: u32,
}

impl Default for LinkBudget {
    // about 10 seconds
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub role: Role,
    pub device_id: u32,
    pub credentials: Credentials,
    pub broker: BrokerEndpoint,
    pub topic: String,
    pub thresholds: ThresholdConfig,
    pub link_budget: LinkBudget,
    pub sample_interval_ms: u64,
    pub reconnect_delay_ms: u32,
    pub client_id_prefix: String,
    pub keep_alive_secs: u16,
}

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_KEEP_ALIVE_SECS: u16 = 15;

impl NodeConfig {
    /// Role defaults around the given deployment values
    pub fn new(role: Role, credentials: Credentials, broker: BrokerEndpoint, topic: &str) -> Self {
        Self {
            role,
            device_id: 0,
            credentials,
            broker,
            topic: topic.to_string(),
            thresholds: ThresholdConfig::default(),
            link_budget: LinkBudget::default(),
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            reconnect_delay_ms: role.reconnect_delay_ms(),
            client_id_prefix: role.client_id_prefix().to_string(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }

    /// The configuration baked in from `cfg.toml`
    pub fn from_build_config(role: Role) -> Self {
        let cfg = CONFIG;
        let mut config = Self::new(
            role,
            Credentials {
                ssid: cfg.wifi_ssid.to_string(),
                password: cfg.wifi_password.to_string(),
            },
            BrokerEndpoint {
                host: cfg.broker_host.to_string(),
                port: cfg.broker_port,
            },
            cfg.topic,
        );
        config.device_id = cfg.device_id;
        config.thresholds = ThresholdConfig {
            tvoc_limit: cfg.tvoc_limit,
            eco2_limit: cfg.eco2_limit,
            aqi_limit: cfg.aqi_limit,
        };
        config
    }
}
