use embedded_hal::digital::OutputPin;

/// The single-wire data line, with an external pull-up.
///
/// `Id` selects which sensor line to use when one driver serves several;
/// it is also what the capture peripheral is configured with.
pub trait DataLine {
    type Id: Copy;
    type Error;

    /// Switches the line to output and drives it low.
    fn drive_low(&mut self, id: Self::Id) -> Result<(), Self::Error>;

    /// Switches the line to input, letting the pull-up take it high.
    fn release(&mut self, id: Self::Id) -> Result<(), Self::Error>;
}

/// An open-drain [`OutputPin`] is a data line: setting it high releases it.
impl<P: OutputPin> DataLine for P {
    type Id = ();
    type Error = P::Error;

    fn drive_low(&mut self, _id: ()) -> Result<(), Self::Error> {
        self.set_low()
    }

    fn release(&mut self, _id: ()) -> Result<(), Self::Error> {
        self.set_high()
    }
}

/// Monotonic millisecond clock. Wraps around.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        T::now_ms(self)
    }
}
