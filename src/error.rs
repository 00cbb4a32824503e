/// A corrupted frame. Recovered locally by retrying the acquisition.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The capture did not contain exactly 40 data bits.
    ///
    /// `pairs` is the final pair index reached by the decoder; a complete
    /// frame ends at 40.
    Framing { pairs: i32 },
    /// Checksum did not match the received data.
    ChecksumMismatch { expected: u8, calculated: u8 },
}

/// A failure of the line or capture hardware. Never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareError<LE, CE> {
    /// Error from the GPIO data line while driving or releasing it.
    Line(LE),
    /// The capture peripheral rejected its configuration.
    CaptureInit(CE),
    /// The capture peripheral could not be started.
    CaptureStart(CE),
    /// The capture peripheral never reported a full buffer.
    CaptureTimeout,
}

impl<LE, CE> HardwareError<LE, CE> {
    /// Short description of the failing stage, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line(_) => "data line error",
            Self::CaptureInit(_) => "capture init failed",
            Self::CaptureStart(_) => "capture start failed",
            Self::CaptureTimeout => "capture timed out",
        }
    }
}
