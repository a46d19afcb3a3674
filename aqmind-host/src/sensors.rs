//! Simulated sensor pair producing plausible indoor values.
//!
//! Every read takes a small random step from the previous value, clamped to
//! a sane range, so a fan node downstream sees slow drifts across the limits
//! rather than noise. An optional failure rate makes reads fail at random.

use aqmindp_sensor::{AirQualitySample, SensorError, SensorStatus, SensorSuite};
use rand::Rng;

// reads reported as warm-up after start
const WARM_UP_READS: u32 = 3;

pub struct SimulatedSensors<G> {
    rng: G,
    failure_rate: f64,
    temperature: f32,
    humidity: f32,
    tvoc: i32,
    eco2: i32,
    air_reads: u32,
    compensation: Option<(f32, f32)>,
}

impl<G: Rng> SimulatedSensors<G> {
    pub fn new(rng: G, failure_rate: f64) -> Self {
        Self {
            rng,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            temperature: 21.0,
            humidity: 45.0,
            tvoc: 120,
            eco2: 550,
            air_reads: 0,
            compensation: None,
        }
    }

    pub fn compensation(&self) -> Option<(f32, f32)> {
        self.compensation
    }

    fn fails(&mut self) -> bool {
        self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate)
    }
}

/// AQI category (1-5) the way the UBA scale bands eCO2
fn aqi_for(eco2: i32) -> i32 {
    match eco2 {
        i32::MIN..=599 => 1,
        600..=799 => 2,
        800..=999 => 3,
        1000..=1499 => 4,
        _ => 5,
    }
}

impl<G: Rng> SensorSuite for SimulatedSensors<G> {
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorError> {
        if self.fails() {
            return Err(SensorError::ReadError);
        }
        self.temperature = (self.temperature + self.rng.gen_range(-0.3..=0.3)).clamp(15.0, 32.0);
        self.humidity = (self.humidity + self.rng.gen_range(-1.0..=1.0)).clamp(20.0, 80.0);
        Ok((self.temperature, self.humidity))
    }

    fn read_air_quality(&mut self) -> Result<AirQualitySample, SensorError> {
        if self.fails() {
            return Err(SensorError::NotReady);
        }
        self.tvoc = (self.tvoc + self.rng.gen_range(-25..=30)).clamp(0, 1_200);
        self.eco2 = (self.eco2 + self.rng.gen_range(-40..=45)).clamp(400, 2_500);

        let status = if self.air_reads < WARM_UP_READS {
            SensorStatus::WarmUp
        } else {
            SensorStatus::Normal
        };
        self.air_reads = self.air_reads.saturating_add(1);

        Ok(AirQualitySample {
            status,
            aqi: aqi_for(self.eco2),
            tvoc: self.tvoc,
            eco2: self.eco2,
        })
    }

    fn set_compensation(&mut self, temperature: f32, humidity: f32) -> Result<(), SensorError> {
        log::trace!("Compensating for {temperature:.2}C {humidity:.2}%");
        self.compensation = Some((temperature, humidity));
        Ok(())
    }
}
