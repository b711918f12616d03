use embedded_hal::{digital::OutputPin, spi::SpiBus};

/// Byte level access to the chip.
///
/// A transaction is bracketed by [`Transport::begin_transaction`] and
/// [`Transport::end_transaction`], which assert and release chip select.
/// The driver never opens two transactions at once.
pub trait Transport {
    type Error;

    /// Bring up the bus. Called once from the driver's `init`.
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Assert chip select.
    fn begin_transaction(&mut self) -> Result<(), Self::Error>;

    /// Release chip select. Self-timed cycles start on this edge.
    fn end_transaction(&mut self) -> Result<(), Self::Error>;

    /// Shift one byte out while shifting one byte in.
    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        T::init(self)
    }

    fn begin_transaction(&mut self) -> Result<(), Self::Error> {
        T::begin_transaction(self)
    }

    fn end_transaction(&mut self) -> Result<(), Self::Error> {
        T::end_transaction(self)
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        T::transfer_byte(self, out)
    }
}

/// Errors of [`SpiTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiTransportError<BusError, PinError> {
    /// The SPI bus failed
    Bus(BusError),

    /// The chip select pin could not be set
    Pin(PinError),
}

/// [`Transport`] over an embedded-hal SPI bus and an active low chip select pin
pub struct SpiTransport<BUS, CS> {
    bus: BUS,
    cs: CS,
}

impl<BUS, CS> SpiTransport<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    pub fn new(bus: BUS, cs: CS) -> Self {
        Self { bus, cs }
    }

    /// Give back the bus and the pin
    pub fn release(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }
}

impl<BUS, CS> Transport for SpiTransport<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    type Error = SpiTransportError<BUS::Error, CS::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(SpiTransportError::Pin)
    }

    fn begin_transaction(&mut self) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(SpiTransportError::Pin)
    }

    fn end_transaction(&mut self) -> Result<(), Self::Error> {
        let flushed = self.bus.flush().map_err(SpiTransportError::Bus);
        self.cs.set_high().map_err(SpiTransportError::Pin)?;
        flushed
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        let mut word = [out];
        self.bus
            .transfer_in_place(&mut word)
            .map_err(SpiTransportError::Bus)?;
        Ok(word[0])
    }
}
