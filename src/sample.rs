use core::ops::Index;

use crate::decode::checksum;
use crate::profile::{Reading, SensorProfile};

/// Outcome of an acquisition request.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// A frame with 40 bits and a valid checksum was received.
    Success,
    /// The line or the capture peripheral failed.
    Error,
    /// No valid frame within the configured number of tries.
    TooManyRetries,
    /// Another acquisition was already in flight.
    Busy,
}

/// Result of one acquisition request, handed to the completion by value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    status: Status,
    profile: SensorProfile,
    bytes: [u8; 5],
    tries: u8,
}

impl Sample {
    pub(crate) fn new(profile: SensorProfile) -> Self {
        Sample {
            status: Status::Error,
            profile,
            bytes: [0; 5],
            tries: 0,
        }
    }

    pub(crate) fn busy(profile: SensorProfile) -> Self {
        Sample {
            status: Status::Busy,
            ..Sample::new(profile)
        }
    }

    /// Sets the status to `Error`, zeros the bytes and the try counter.
    pub fn clear(&mut self) {
        *self = Sample::new(self.profile);
    }

    /// Clears the frame left by a previous attempt, keeping the try counter.
    pub(crate) fn reset_frame(&mut self) {
        self.status = Status::Error;
        self.bytes = [0; 5];
    }

    pub(crate) fn set_frame(&mut self, bytes: [u8; 5]) {
        self.bytes = bytes;
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn add_try(&mut self) {
        self.tries = self.tries.saturating_add(1);
    }

    /// Returns true if the fifth byte is the truncated sum of the first four.
    ///
    /// `is_success()` already implies a valid checksum.
    pub fn is_valid_checksum(&self) -> bool {
        checksum(&self.data()) == self.bytes[4]
    }

    /// Returns the outcome of the request.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Sensor model the bytes are interpreted with.
    pub fn profile(&self) -> SensorProfile {
        self.profile
    }

    /// Number of attempts made: 1 normally, more if frames had to be retried.
    pub fn tries(&self) -> u8 {
        self.tries
    }

    /// Raw bytes: humidity high/low, temperature high/low, checksum.
    pub fn bytes(&self) -> [u8; 5] {
        self.bytes
    }

    /// Returns true if the frame was received with a valid checksum.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns true if the request was rejected because another was in flight.
    pub fn is_busy(&self) -> bool {
        self.status == Status::Busy
    }

    /// Returns true if the line or capture hardware failed.
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Returns true if no valid frame arrived within the allowed tries.
    pub fn is_too_many_retries(&self) -> bool {
        self.status == Status::TooManyRetries
    }

    /// Decoded values, only available when the acquisition succeeded.
    pub fn reading(&self) -> Option<Reading> {
        self.is_success().then(|| self.profile.parse(&self.data()))
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_c(&self) -> Option<f32> {
        self.reading().map(|r| r.temperature)
    }

    /// Temperature in degrees Fahrenheit.
    pub fn temperature_f(&self) -> Option<f32> {
        self.reading().map(|r| r.temperature_f())
    }

    /// Relative humidity in percent (0-100).
    pub fn humidity(&self) -> Option<f32> {
        self.reading().map(|r| r.relative_humidity)
    }

    /// Dew point in degrees Celsius.
    pub fn dew_point_c(&self) -> Option<f32> {
        self.reading().map(|r| r.dew_point_c())
    }

    /// Dew point in degrees Fahrenheit.
    pub fn dew_point_f(&self) -> Option<f32> {
        self.reading().map(|r| r.dew_point_f())
    }

    fn data(&self) -> [u8; 4] {
        let [b0, b1, b2, b3, _] = self.bytes;
        [b0, b1, b2, b3]
    }
}

impl Index<usize> for Sample {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.bytes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with(profile: SensorProfile, bytes: [u8; 5], status: Status) -> Sample {
        let mut sample = Sample::new(profile);
        sample.set_frame(bytes);
        sample.set_status(status);
        sample.add_try();
        sample
    }

    #[test]
    fn test_checksum_valid_for_truncated_sum() {
        for payload in [
            [0x00, 0x00, 0x00, 0x00],
            [0x01, 0x45, 0x00, 0xC9],
            [0xFF, 0xFF, 0xFF, 0xFF],
            [0x80, 0x7F, 0x01, 0xFE],
            [50, 0, 25, 0],
        ] {
            let sum = payload.iter().fold(0u8, |sum, v| sum.wrapping_add(*v));
            let [a, b, c, d] = payload;
            let sample = sample_with(SensorProfile::Dht22, [a, b, c, d, sum], Status::Error);
            assert!(sample.is_valid_checksum());
        }
    }

    #[test]
    fn test_checksum_fails_after_single_byte_change() {
        // Changing one byte moves the sum (or the checksum) by a non-zero
        // amount modulo 256, so there are no collisions to exclude.
        let bytes = [0x02, 0x8C, 0x80, 0x01, 0x0F];
        assert!(sample_with(SensorProfile::Dht22, bytes, Status::Error).is_valid_checksum());

        for index in 0..5 {
            for delta in 1..=255u8 {
                let mut corrupted = bytes;
                corrupted[index] = corrupted[index].wrapping_add(delta);
                let sample = sample_with(SensorProfile::Dht22, corrupted, Status::Error);
                assert!(
                    !sample.is_valid_checksum(),
                    "byte {} changed by {}",
                    index,
                    delta
                );
            }
        }
    }

    #[test]
    fn test_reading_only_on_success() {
        let bytes = [0x01, 0x45, 0x00, 0xC9, 0x0F];

        let ok = sample_with(SensorProfile::Dht22, bytes, Status::Success);
        assert_eq!(ok.humidity(), Some(32.5));
        assert_eq!(ok.temperature_c(), Some(20.1));
        assert!(ok.temperature_f().is_some());
        assert!(ok.dew_point_c().is_some());
        assert!(ok.dew_point_f().is_some());

        for status in [Status::Error, Status::TooManyRetries, Status::Busy] {
            let failed = sample_with(SensorProfile::Dht22, bytes, status);
            assert_eq!(failed.reading(), None);
            assert_eq!(failed.temperature_c(), None);
            assert_eq!(failed.humidity(), None);
        }
    }

    #[test]
    fn test_dht11_interpretation() {
        let sample = sample_with(SensorProfile::Dht11, [50, 0, 25, 0, 75], Status::Success);
        assert_eq!(sample.humidity(), Some(50.0));
        assert_eq!(sample.temperature_c(), Some(25.0));
        assert_eq!(sample.temperature_f(), Some(77.0));
    }

    #[test]
    fn test_status_predicates() {
        let profile = SensorProfile::Dht22;
        assert!(Sample::busy(profile).is_busy());
        assert!(Sample::new(profile).is_error());
        assert!(sample_with(profile, [0; 5], Status::Success).is_success());
        assert!(sample_with(profile, [0; 5], Status::TooManyRetries).is_too_many_retries());
    }

    #[test]
    fn test_clear_zeros_bytes() {
        let mut sample = sample_with(
            SensorProfile::Dht11,
            [1, 2, 3, 4, 10],
            Status::Success,
        );
        sample.add_try();
        assert_eq!(sample.tries(), 2);

        sample.clear();

        assert_eq!(sample.bytes(), [0; 5]);
        assert_eq!(sample.tries(), 0);
        assert_eq!(sample.status(), Status::Error);
        assert_eq!(sample.profile(), SensorProfile::Dht11);
    }

    #[test]
    fn test_reset_frame_keeps_tries() {
        let mut sample = sample_with(SensorProfile::Dht22, [9; 5], Status::Success);
        sample.reset_frame();

        assert_eq!(sample.bytes(), [0; 5]);
        assert_eq!(sample.tries(), 1);
        assert!(sample.is_error());
    }

    #[test]
    fn test_index() {
        let sample = sample_with(SensorProfile::Dht22, [1, 2, 3, 4, 10], Status::Success);
        assert_eq!(sample[0], 1);
        assert_eq!(sample[4], 10);
    }
}
