//! DHT11/DHT22 Sensor Driver using an Oversampling Capture Peripheral
//!
//! This crate reads the DHT11 and DHT22 (AM2302) temperature and humidity
//! sensors on platforms whose software timing is too coarse to bit-bang the
//! sensor's single-wire protocol. Instead of timing pulses in software, a
//! fixed-rate sample-capture peripheral (an I2S receiver, normally used for
//! audio) records the data line at 512 kHz, and the pulse lengths are decoded
//! from the captured bits afterwards.
//!
//! # Features
//! - Non-blocking API: [`DhtCapture::request`] returns at once and
//!   [`DhtCapture::poll`], called from the main loop, drives the acquisition
//! - Completions run from `poll`, never from interrupt context
//! - Automatic retries on corrupted frames, spaced by the sensor's minimum
//!   sample period
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! The driver depends on the following capabilities:
//! - [`DataLine`] to drive and release the data line; implemented for any
//!   open-drain [`OutputPin`]
//! - [`CapturePeripheral`] for the sample-capture peripheral, whose interrupt
//!   notifies a [`CaptureSignal`]
//! - [`Clock`] for monotonic milliseconds
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs retries and failures
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod acquire;
pub mod capture;
pub mod decode;
pub mod error;
pub mod line;
pub mod profile;
pub mod sample;

pub use acquire::{Config, DhtCapture, State};
pub use capture::{CaptureConfig, CapturePeripheral, CaptureSignal};
pub use error::{HardwareError, ProtocolError};
pub use line::{Clock, DataLine};
pub use profile::{Reading, SensorProfile};
pub use sample::{Sample, Status};
