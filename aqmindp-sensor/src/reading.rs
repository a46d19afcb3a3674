use crate::sensor::{AirQualitySample, SensorStatus};

/// One normalized snapshot of the node's sensors for a single cycle.
///
/// A field that the sensors could not provide this cycle is `None`. On the
/// wire that becomes the `-1` / `-1.0` sentinel (see [`crate::codec`]), but in
/// memory there is no magic number that could be mistaken for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    /// Total volatile organic compounds, ppb
    pub tvoc: Option<i32>,
    /// Equivalent CO2, ppm
    pub eco2: Option<i32>,
    /// Air quality category, 1 (excellent) to 5 (unhealthy)
    pub aqi: Option<i32>,
    /// Degrees celsius
    pub temperature: Option<f32>,
    /// Relative humidity, percent
    pub humidity: Option<f32>,
}

impl Reading {
    /// Assemble a reading from whatever the sensor collaborators produced
    /// this cycle. A failed read arrives here as `None` and leaves its fields
    /// unavailable; an air quality sample flagged [`SensorStatus::Invalid`] is
    /// treated the same way.
    pub fn assemble(climate: Option<(f32, f32)>, air: Option<AirQualitySample>) -> Self {
        let (temperature, humidity) = match climate {
            Some((t, h)) => (finite(t), finite(h)),
            None => (None, None),
        };

        let air = air.filter(|sample| {
            if sample.status == SensorStatus::Invalid {
                log::warn!("Air quality sensor reports invalid output, dropping sample");
                false
            } else {
                true
            }
        });

        match air {
            Some(sample) => Self {
                tvoc: present(sample.tvoc),
                eco2: present(sample.eco2),
                aqi: present(sample.aqi),
                temperature,
                humidity,
            },
            None => Self {
                temperature,
                humidity,
                ..Self::default()
            },
        }
    }

    /// True when no field carries a measurement
    pub fn is_empty(&self) -> bool {
        self.tvoc.is_none()
            && self.eco2.is_none()
            && self.aqi.is_none()
            && self.temperature.is_none()
            && self.humidity.is_none()
    }
}

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn int(v: Option<i32>) -> i32 {
            v.unwrap_or(crate::SENTINEL)
        }
        write!(
            f,
            "aqi {} tvoc {} ppb eco2 {} ppm temp {:.2} C humidity {:.2} %",
            int(self.aqi),
            int(self.tvoc),
            int(self.eco2),
            self.temperature.unwrap_or(crate::SENTINEL_F),
            self.humidity.unwrap_or(crate::SENTINEL_F),
        )
    }
}

// Negative integers are never a measurement, only the sentinel family
fn present(v: i32) -> Option<i32> {
    (v >= 0).then_some(v)
}

fn finite(v: f32) -> Option<f32> {
    v.is_finite().then_some(v)
}
