use crate::capture::{CaptureConfig, CapturePeripheral, CaptureSignal};
use crate::decode::{decode, verify};
use crate::error::{HardwareError, ProtocolError};
use crate::line::{Clock, DataLine};
use crate::profile::SensorProfile;
use crate::sample::{Sample, Status};

/// Default number of attempts at a valid frame.
pub const DEFAULT_MAX_TRIES: u8 = 4;

/// How long the start pulse holds the line low.
const START_PULSE_MS: u32 = 18;

/// Bounded wait for the capture to complete. A capture takes about 6 ms.
const CAPTURE_TIMEOUT_MS: u32 = 15;

/// Driver settings.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Attempts at a frame with a valid checksum before giving up.
    pub max_tries: u8,
    /// Duration of the start pulse.
    pub start_pulse_ms: u32,
    /// Time after which a capture that has not completed is a hardware error.
    pub capture_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_tries: DEFAULT_MAX_TRIES,
            start_pulse_ms: START_PULSE_MS,
            capture_timeout_ms: CAPTURE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Sets the number of attempts at a valid frame.
    pub fn with_max_tries(self, max_tries: u8) -> Self {
        Config { max_tries, ..self }
    }

    /// Sets how long the line is held low to request a reading.
    pub fn with_start_pulse_ms(self, start_pulse_ms: u32) -> Self {
        Config {
            start_pulse_ms,
            ..self
        }
    }

    /// Sets how long to wait for the capture before reporting an error.
    pub fn with_capture_timeout_ms(self, capture_timeout_ms: u32) -> Self {
        Config {
            capture_timeout_ms,
            ..self
        }
    }
}

/// Acquisition state.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No acquisition in flight, a request can be made.
    Idle,
    /// Waiting for the sensor's minimum sample period before the start pulse.
    Start,
    /// Holding the line low.
    SendStart,
    /// Capture running.
    Sampling,
}

type HwError<L, C> =
    HardwareError<<L as DataLine>::Error, <C as CapturePeripheral<<L as DataLine>::Id>>::Error>;

/// Asynchronous DHT11/DHT22 driver timing the sensor with a capture peripheral.
///
/// Nothing blocks: [`request`](Self::request) only records the request and
/// [`poll`](Self::poll), called from the main loop, advances the acquisition.
/// The completion runs from `poll`, never from interrupt context.
///
/// Only one instance should exist per capture peripheral and line.
pub struct DhtCapture<'a, L, C, K, F>
where
    L: DataLine,
    C: CapturePeripheral<L::Id>,
    K: Clock,
    F: FnOnce(Sample),
{
    line: L,
    capture: C,
    clock: K,
    signal: &'a CaptureSignal,
    config: Config,
    state: State,
    line_id: Option<L::Id>,
    profile: SensorProfile,
    completion: Option<F>,
    result: Sample,
    state_ms: u32,
    last_capture_ms: Option<u32>,
    last_error: Option<HwError<L, C>>,
}

impl<'a, L, C, K, F> DhtCapture<'a, L, C, K, F>
where
    L: DataLine,
    C: CapturePeripheral<L::Id>,
    K: Clock,
    F: FnOnce(Sample),
{
    /// Creates a new driver.
    ///
    /// # Arguments
    ///
    /// * `line` - The sensor data line(s).
    /// * `capture` - The capture peripheral whose data input is wired to the line.
    /// * `clock` - Monotonic millisecond clock.
    /// * `signal` - Completion signal notified by the capture interrupt.
    pub fn new(line: L, capture: C, clock: K, signal: &'a CaptureSignal) -> Self {
        DhtCapture {
            line,
            capture,
            clock,
            signal,
            config: Config::default(),
            state: State::Idle,
            line_id: None,
            profile: SensorProfile::default(),
            completion: None,
            result: Sample::new(SensorProfile::default()),
            state_ms: 0,
            last_capture_ms: None,
            last_error: None,
        }
    }

    /// Replaces the driver settings.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Maximum attempts at a frame with a valid checksum. Default is 4.
    ///
    /// Each retry waits out the sensor's minimum sample period, 2 s for a DHT22.
    pub fn with_max_tries(mut self, max_tries: u8) -> Self {
        self.config.max_tries = max_tries;
        self
    }

    /// Changes the number of attempts; takes effect on the next request.
    pub fn set_max_tries(&mut self, max_tries: u8) {
        self.config.max_tries = max_tries;
    }

    /// Returns the current settings.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Wires the capture interrupt. Call once at startup.
    pub fn setup(&mut self) {
        self.capture.attach_interrupt();
    }

    /// Returns the current acquisition state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns true if a request would be accepted.
    pub fn can_sample(&self) -> bool {
        self.state == State::Idle
    }

    /// The most recent completed result, for callers that poll instead of
    /// using the completion.
    pub fn last_result(&self) -> Sample {
        self.result
    }

    /// The hardware failure behind the most recent `Error` result.
    pub fn last_hardware_error(&self) -> Option<&HwError<L, C>> {
        self.last_error.as_ref()
    }

    /// Requests a DHT22 sample on `line_id`. See [`request_with`](Self::request_with).
    pub fn request(&mut self, line_id: L::Id, completion: F) {
        self.request_with(line_id, completion, SensorProfile::default());
    }

    /// Requests a sample on `line_id`, interpreted according to `profile`.
    ///
    /// Returns immediately. `completion` is called exactly once: from a later
    /// [`poll`](Self::poll) with the result, or right away with a `Busy`
    /// sample if another acquisition is in flight, which is left untouched.
    ///
    /// A normal acquisition takes about 24 ms. A checksum failure retries
    /// after the sensor's minimum sample period.
    pub fn request_with(&mut self, line_id: L::Id, completion: F, profile: SensorProfile) {
        if self.state != State::Idle {
            debug!("busy, rejecting request");
            completion(Sample::busy(profile));
            return;
        }

        self.line_id = Some(line_id);
        self.profile = profile;
        self.completion = Some(completion);
        self.result = Sample::new(profile);
        self.state = State::Start;
    }

    /// Advances the acquisition. Call on every iteration of the main loop.
    ///
    /// Runs the completion when the acquisition finishes during this call,
    /// and also returns the finished sample.
    pub fn poll(&mut self) -> Option<Sample> {
        let line_id = self.line_id?;

        let outcome = match self.state {
            State::Idle => return None,
            State::Start => self.poll_start(line_id),
            State::SendStart => self.poll_send_start(line_id),
            State::Sampling => self.poll_sampling(),
        };

        match outcome {
            Ok(None) => None,
            Ok(Some(status)) => Some(self.complete(status)),
            Err(err) => {
                error!("{=str}", err.as_str());
                self.last_error = Some(err);
                Some(self.complete(Status::Error))
            }
        }
    }

    /// Gives back the line, capture peripheral and clock.
    pub fn release(self) -> (L, C, K) {
        (self.line, self.capture, self.clock)
    }

    fn elapsed_ms(&self, since: u32) -> u32 {
        self.clock.now_ms().wrapping_sub(since)
    }

    fn poll_start(&mut self, line_id: L::Id) -> Result<Option<Status>, HwError<L, C>> {
        if let Some(last) = self.last_capture_ms {
            if self.elapsed_ms(last) < self.profile.min_sample_period_ms() {
                return Ok(None);
            }
        }

        self.result.reset_frame();

        // The pull-up kept the line high while it was an input.
        self.line.drive_low(line_id).map_err(HardwareError::Line)?;
        self.state_ms = self.clock.now_ms();
        self.state = State::SendStart;
        Ok(None)
    }

    fn poll_send_start(&mut self, line_id: L::Id) -> Result<Option<Status>, HwError<L, C>> {
        if self.elapsed_ms(self.state_ms) < self.config.start_pulse_ms {
            return Ok(None);
        }

        // The pull-up holds the line high for 20-40 us, then the sensor answers.
        self.line.release(line_id).map_err(HardwareError::Line)?;

        self.capture
            .init(&CaptureConfig::new(line_id))
            .map_err(HardwareError::CaptureInit)?;

        self.signal.reset();
        if let Err(err) = self.capture.start() {
            self.capture.uninit();
            return Err(HardwareError::CaptureStart(err));
        }

        self.result.add_try();
        self.state_ms = self.clock.now_ms();
        self.state = State::Sampling;
        Ok(None)
    }

    fn poll_sampling(&mut self) -> Result<Option<Status>, HwError<L, C>> {
        let complete = self.signal.is_complete();
        if !complete && self.elapsed_ms(self.state_ms) < self.config.capture_timeout_ms {
            return Ok(None);
        }

        self.capture.uninit();

        if !complete {
            return Err(HardwareError::CaptureTimeout);
        }

        self.last_capture_ms = Some(self.clock.now_ms());

        // A frame with a bad checksum is kept so its raw bytes can be inspected.
        let checked = decode(self.capture.samples(), self.profile.one_bit_threshold())
            .and_then(|frame| {
                self.result.set_frame(frame);
                verify(&frame)
            });

        match checked {
            Ok(()) => {
                info!("{=str} read after {} tries", self.profile.name(), self.result.tries());
                return Ok(Some(Status::Success));
            }
            Err(ProtocolError::Framing { pairs }) => {
                warn!("framing error: pairs={} expected 40", pairs);
            }
            Err(ProtocolError::ChecksumMismatch {
                expected,
                calculated,
            }) => {
                warn!("bad checksum: expected {=u8:x} calculated {=u8:x}", expected, calculated);
            }
        }

        if self.result.tries() >= self.config.max_tries {
            return Ok(Some(Status::TooManyRetries));
        }

        debug!("retrying");
        self.state_ms = self.clock.now_ms();
        self.state = State::Start;
        Ok(None)
    }

    /// Goes back to `Idle` before running the completion.
    fn complete(&mut self, status: Status) -> Sample {
        self.result.set_status(status);
        self.state = State::Idle;
        self.line_id = None;

        let sample = self.result;
        if let Some(completion) = self.completion.take() {
            completion(sample);
        }
        sample
    }
}
