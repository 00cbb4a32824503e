//! The oversampling capture peripheral.
//!
//! An audio sample-capture peripheral (I2S in receive mode) is clocked at a
//! fixed rate with its data input wired to the sensor line. Every bit of every
//! received sample word is then one reading of the line level, which gives a
//! timer resolution the software clock cannot.

use core::sync::atomic::{AtomicU8, Ordering};

/// Sample words captured per acquisition.
pub const CAPTURE_SAMPLES: usize = 180;

/// Notifications after which the capture buffer is full.
///
/// The peripheral asks for the next buffer once when the capture starts and
/// again once the buffer has been filled.
const NOTIFICATIONS_PER_CAPTURE: u8 = 2;

/// Parameters handed to the capture peripheral before each capture.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig<Id> {
    /// Line the peripheral reads from (its serial data input).
    pub data_pin: Id,
    /// Frames per second.
    pub sample_rate_hz: u32,
    /// Bits per sample word.
    pub sample_width_bits: u8,
    /// Sample words per frame (2 = stereo).
    pub channels: u8,
    /// Sample words to capture.
    pub samples: usize,
}

impl<Id> CaptureConfig<Id> {
    /// 16 000 stereo frames of 16 bit samples: 512 000 line readings per second.
    pub const fn new(data_pin: Id) -> Self {
        CaptureConfig {
            data_pin,
            sample_rate_hz: 16_000,
            sample_width_bits: 16,
            channels: 2,
            samples: CAPTURE_SAMPLES,
        }
    }

    /// Line readings per second.
    pub const fn bit_rate_hz(&self) -> u32 {
        self.sample_rate_hz * self.sample_width_bits as u32 * self.channels as u32
    }

    /// Capture length in 32 bit words, the unit the peripheral counts in.
    pub const fn words(&self) -> usize {
        self.samples * self.sample_width_bits as usize / 32
    }
}

/// A fixed-rate capture peripheral used as a line sampler.
///
/// The peripheral owns the capture buffer. The completion interrupt must do
/// nothing but call [`CaptureSignal::notify`] (and stop the peripheral once it
/// returns `true`).
pub trait CapturePeripheral<Id> {
    type Error;

    /// Routes the peripheral's interrupt to the handler calling `notify`.
    fn attach_interrupt(&mut self);

    /// Configures the peripheral for one capture.
    fn init(&mut self, config: &CaptureConfig<Id>) -> Result<(), Self::Error>;

    /// Starts filling the buffer.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stops the peripheral and releases its pins.
    fn uninit(&mut self);

    /// The captured sample words. Only meaningful once the capture is complete.
    fn samples(&self) -> &[u16];
}

impl<Id, T: CapturePeripheral<Id> + ?Sized> CapturePeripheral<Id> for &mut T {
    type Error = T::Error;

    fn attach_interrupt(&mut self) {
        T::attach_interrupt(self)
    }

    fn init(&mut self, config: &CaptureConfig<Id>) -> Result<(), Self::Error> {
        T::init(self, config)
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        T::start(self)
    }

    fn uninit(&mut self) {
        T::uninit(self)
    }

    fn samples(&self) -> &[u16] {
        T::samples(self)
    }
}

/// Completion hand-off between the capture interrupt and the polling loop.
///
/// The interrupt only bumps a counter; everything else, including reading the
/// buffer, happens from [`poll`](crate::DhtCapture::poll).
#[derive(Debug, Default)]
pub struct CaptureSignal {
    notifications: AtomicU8,
}

impl CaptureSignal {
    /// Creates a signal with no notifications, usable in a `static`.
    pub const fn new() -> Self {
        CaptureSignal {
            notifications: AtomicU8::new(0),
        }
    }

    /// Called from the capture interrupt when the peripheral needs a buffer.
    ///
    /// Returns `true` once the capture is complete; the handler should then
    /// stop the peripheral.
    pub fn notify(&self) -> bool {
        // Single writer: load and store are enough, no read-modify-write needed.
        let count = self.notifications.load(Ordering::Relaxed).saturating_add(1);
        self.notifications.store(count, Ordering::Release);
        count >= NOTIFICATIONS_PER_CAPTURE
    }

    /// Returns true once the capture buffer is full.
    pub fn is_complete(&self) -> bool {
        self.notifications.load(Ordering::Acquire) >= NOTIFICATIONS_PER_CAPTURE
    }

    /// Re-arms the signal. Only called while no capture is running.
    pub(crate) fn reset(&self) {
        self.notifications.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config() {
        let config = CaptureConfig::new(3u8);
        assert_eq!(config.data_pin, 3);
        assert_eq!(config.bit_rate_hz(), 512_000);
        assert_eq!(config.words(), 90);
        assert_eq!(config.samples, CAPTURE_SAMPLES);
    }

    #[test]
    fn test_signal_completes_after_second_notification() {
        let signal = CaptureSignal::new();
        assert!(!signal.is_complete());

        assert!(!signal.notify());
        assert!(!signal.is_complete());

        assert!(signal.notify());
        assert!(signal.is_complete());

        // Late notifications keep it complete.
        assert!(signal.notify());
        assert!(signal.is_complete());

        signal.reset();
        assert!(!signal.is_complete());
    }
}
