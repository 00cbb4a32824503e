/// Temperature and humidity decoded from a frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

impl Reading {
    /// Temperature in degrees Fahrenheit.
    pub fn temperature_f(&self) -> f32 {
        celsius_to_fahrenheit(self.temperature)
    }

    /// Dew point in degrees Celsius.
    ///
    /// Uses the Magnus approximation (a = 17.271, b = 237.7 C), see
    /// <http://en.wikipedia.org/wiki/Dew_point>.
    pub fn dew_point_c(&self) -> f32 {
        const A: f64 = 17.271;
        const B: f64 = 237.7;

        let temp = self.temperature as f64;
        let gamma = (A * temp) / (B + temp) + libm::log(self.relative_humidity as f64 / 100.0);
        ((B * gamma) / (A - gamma)) as f32
    }

    /// Dew point in degrees Fahrenheit.
    pub fn dew_point_f(&self) -> f32 {
        celsius_to_fahrenheit(self.dew_point_c())
    }
}

fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

/// The supported sensor families.
///
/// Each variant carries its own timing constants and its own way of
/// turning the four data bytes into physical values.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorProfile {
    /// DHT11: whole degrees and whole percent, one byte each.
    Dht11,
    /// DHT22 (AM2302): tenths, big-endian, sign bit on temperature.
    #[default]
    Dht22,
}

impl SensorProfile {
    /// Short name of the sensor.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dht11 => "DHT11",
            Self::Dht22 => "DHT22",
        }
    }

    /// Minimum number of milliseconds between two queries of the sensor.
    pub const fn min_sample_period_ms(&self) -> u32 {
        match self {
            Self::Dht11 => 1000,
            Self::Dht22 => 2000,
        }
    }

    /// High run length, in capture counts, above which a bit is a 1.
    ///
    /// At 512 kHz a 0 bit is about 13 counts and a 1 bit about 37.
    pub const fn one_bit_threshold(&self) -> u32 {
        match self {
            Self::Dht11 => 25,
            Self::Dht22 => 25,
        }
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_c(&self, data: &[u8; 4]) -> f32 {
        match self {
            Self::Dht11 => data[2] as i8 as f32,
            Self::Dht22 => {
                let is_temp_negative = (data[2] >> 7) != 0;
                let temp_hi = data[2] & 0b0111_1111;
                let temperature = u16::from_be_bytes([temp_hi, data[3]]) as f32 / 10.0;
                if is_temp_negative {
                    -temperature
                } else {
                    temperature
                }
            }
        }
    }

    /// Relative humidity in percent.
    pub fn humidity(&self, data: &[u8; 4]) -> f32 {
        match self {
            Self::Dht11 => data[0] as i8 as f32,
            Self::Dht22 => u16::from_be_bytes([data[0], data[1]]) as f32 / 10.0,
        }
    }

    /// Converts the 4 data bytes into a `Reading`.
    pub fn parse(&self, data: &[u8; 4]) -> Reading {
        Reading {
            temperature: self.temperature_c(data),
            relative_humidity: self.humidity(data),
        }
    }
}
