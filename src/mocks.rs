use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use mockall::mock;

mock! {
    pub SPIBus {}

    impl Transfer<u8> for SPIBus {
        type Error = u32;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'static [u8], u32>;
    }
}

mock! {
    pub Pin {}

    impl OutputPin for Pin {
        type Error = u32;

        fn set_low(&mut self) -> Result<(), u32>;
        fn set_high(&mut self) -> Result<(), u32>;
    }
}

/// Delay which returns immediately.
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_ms: u32,
}

impl DelayMs<u8> for NoDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.total_ms += u32::from(ms);
    }
}
