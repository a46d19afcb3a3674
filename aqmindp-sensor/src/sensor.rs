//! Collaborator interface for the node's sensor chips.
//!
//! Register level access to the temperature/humidity chip and the air quality
//! chip lives in board support code. The core only needs the two reads below
//! and treats any failure as "unavailable this cycle".

use thiserror_no_std::Error;

use crate::Reading;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("Read Error")]
    ReadError,
    #[error("Sensor not ready")]
    NotReady,
}

/// Operating state reported by the air quality chip alongside its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Normal,
    WarmUp,
    InitialStartUp,
    Invalid,
}

impl From<u8> for SensorStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => SensorStatus::Normal,
            1 => SensorStatus::WarmUp,
            2 => SensorStatus::InitialStartUp,
            _ => SensorStatus::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualitySample {
    pub status: SensorStatus,
    pub aqi: i32,
    pub tvoc: i32,
    pub eco2: i32,
}

pub trait SensorSuite {
    /// Temperature in celsius and relative humidity in percent
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorError>;

    fn read_air_quality(&mut self) -> Result<AirQualitySample, SensorError>;

    /// Feed ambient conditions to the air quality chip so it can compensate
    /// its gas readings. Chips without compensation keep the default.
    fn set_compensation(&mut self, _temperature: f32, _humidity: f32) -> Result<(), SensorError> {
        Ok(())
    }
}

/// Pull one reading from the sensors. Never fails: every read error is
/// logged and its fields are left unavailable.
pub fn sample<S: SensorSuite>(sensors: &mut S) -> Reading {
    let climate = sensors
        .read_temperature_humidity()
        .map_err(|e| {
            log::error!("Error reading temperature/humidity {e:?}");
        })
        .ok();

    if let Some((temperature, humidity)) = climate {
        if let Err(e) = sensors.set_compensation(temperature, humidity) {
            log::warn!("Unable to update air quality compensation {e:?}");
        }
    }

    let air = sensors
        .read_air_quality()
        .map_err(|e| {
            log::error!("Error reading air quality {e:?}");
        })
        .ok();

    if let Some(a) = air {
        match a.status {
            SensorStatus::WarmUp | SensorStatus::InitialStartUp => {
                log::info!("Air quality sensor status {:?}, values may drift", a.status)
            }
            _ => log::trace!("Air quality sensor status {:?}", a.status),
        }
    }

    Reading::assemble(climate, air)
}
