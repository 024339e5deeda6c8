use core::fmt::{self, Debug};

use embedded_hal::can::ErrorKind;

use crate::{timing::BitTimingParam, CanSpeed, McpSpeed};

pub type Result<T, SPIE, CSE> = core::result::Result<T, Error<SPIE, CSE>>;

/// Errors raised by the driver.
///
/// `SPIE` and `CSE` are the error types of the SPI bus and the chip-select
/// pin respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<SPIE, CSE> {
    /// The SPI exchange failed.
    Spi(SPIE),
    /// Driving the chip-select pin failed.
    Hal(CSE),
    /// A receive buffer reported a data length code above 8.
    CorruptFrame(u8),
    /// `CANSTAT` reported a reserved operation mode.
    UnknownMode(u8),
    /// Transmit buffer index outside of 0..=2.
    InvalidTxBuffer(u8),
    /// Frame payload longer than 8 bytes.
    PayloadTooLong(usize),
    /// A bit-timing parameter is out of range.
    InvalidBitTiming(BitTimingParam),
    /// No bit-timing preset exists for this speed combination.
    InvalidConfiguration(CanSpeed, McpSpeed),
    /// Register exchange longer than the driver's transfer buffer.
    TransferTooLong(usize),
    /// The SPI bus returned fewer bytes than were exchanged. Holds the
    /// number of bytes received.
    ShortResponse(usize),
    /// The requested operation is not implemented by the driver.
    Unsupported(Unsupported),
}

/// Operations the driver refuses rather than encoding them incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum Unsupported {
    /// Transmitting a frame with a 29-bit identifier.
    ExtendedTransmit,
    /// Transmitting a remote transmission request.
    RemoteTransmit,
}

/// Broad classes of [`Error`], used by callers to decide whether to retry,
/// discard or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum ErrorCategory {
    /// The bus exchange itself failed.
    Transport,
    /// The chip returned data that cannot be interpreted.
    InvalidData,
    /// The caller passed an invalid argument. Raised before any bus access.
    InvalidArgument,
    /// The operation is not supported.
    Unsupported,
}

impl<SPIE, CSE> Error<SPIE, CSE> {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Spi(_) | Error::Hal(_) | Error::ShortResponse(_) => ErrorCategory::Transport,
            Error::CorruptFrame(_) | Error::UnknownMode(_) => ErrorCategory::InvalidData,
            Error::InvalidTxBuffer(_)
            | Error::PayloadTooLong(_)
            | Error::InvalidBitTiming(_)
            | Error::InvalidConfiguration(..)
            | Error::TransferTooLong(_) => ErrorCategory::InvalidArgument,
            Error::Unsupported(_) => ErrorCategory::Unsupported,
        }
    }
}

impl<SPIE: Debug, CSE: Debug> embedded_hal::can::Error for Error<SPIE, CSE> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Failed configuration. Hands the SPI bus and chip-select pin back so that
/// construction can be retried.
pub struct ConfigureError<SPI, CS, SPIE, CSE> {
    pub error: Error<SPIE, CSE>,
    pub spi: SPI,
    pub cs: CS,
}

impl<SPI, CS, SPIE, CSE> ConfigureError<SPI, CS, SPIE, CSE> {
    /// Returns the SPI bus and chip-select pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS, SPIE: Debug, CSE: Debug> Debug for ConfigureError<SPI, CS, SPIE, CSE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<SPI, CS, SPIE, CSE> From<ConfigureError<SPI, CS, SPIE, CSE>> for Error<SPIE, CSE> {
    fn from(e: ConfigureError<SPI, CS, SPIE, CSE>) -> Self {
        e.error
    }
}
