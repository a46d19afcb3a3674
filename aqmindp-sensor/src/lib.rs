//! Sensor lib shared by every air-quality node build and by anything that
//! consumes what the nodes publish.
//!
//! Defines:
//!
//! 1. [`Reading`], the normalized snapshot a node produces once per sampling
//! cycle (temperature / humidity from the climate chip, TVOC / eCO2 / AQI
//! from the air quality chip). Fields that could not be read are `None`
//! rather than a magic number.
//! 2. [`SensorSuite`], the interface board support code implements for the
//! physical sensors, and [`sample`] which pulls one [`Reading`] from it
//! without ever failing the cycle.
//! 3. The wire codec ([`encode`] / [`decode`]) used for the payload that
//! goes over the broker between producer and consumer nodes.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod codec;
mod reading;
mod sensor;

pub use codec::{decode, encode, DecodeError, MAX_PAYLOAD_LEN};
pub use reading::Reading;
pub use sensor::{sample, AirQualitySample, SensorError, SensorStatus, SensorSuite};

/// Wire value for an unavailable integer field
pub const SENTINEL: i32 = -1;

/// Wire value for an unavailable floating point field
pub const SENTINEL_F: f32 = -1.0;
