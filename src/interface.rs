//! The bus transport the driver talks through. The driver itself only needs the capabilities in
//! `DisplayInterface`; `spi::SpiInterface` builds them from an `embedded-hal` SPI master, two GPIO
//! pins and a DMA channel.

/// The level of the D/C pin, selecting whether bytes on the bus are commands or display RAM data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Command,
    Data,
}

pub trait DisplayInterface {
    /// Change the serial clock rate.
    fn set_clock(&mut self, hz: u32) -> Result<(), ()>;
    /// Assert (`true`) or deassert the display's chip-select.
    fn select(&mut self, active: bool) -> Result<(), ()>;
    /// Drive the D/C pin.
    fn set_mode(&mut self, mode: Mode) -> Result<(), ()>;
    /// Clock out `buf`, returning once the last byte has left the bus.
    fn send_sync(&mut self, buf: &[u8]) -> Result<(), ()>;
    /// Start clocking out `buf` in the background and return immediately.
    ///
    /// The transport may keep reading `buf` until `poll_burst` reports completion, so the bytes
    /// must stay untouched until then. Only one burst may be outstanding.
    fn start_burst(&mut self, buf: &[u8]) -> Result<(), ()>;
    /// `Ok` once the background engine has queued the last byte of the burst.
    fn poll_burst(&mut self) -> nb::Result<(), ()>;
    /// `Ok` once the bus transmit/receive FIFOs are empty and no clock edges are pending.
    /// Deasserting chip-select before this corrupts the next command.
    fn poll_drained(&mut self) -> nb::Result<(), ()>;
    /// Clear the background engine's completion and status flags so the next burst can start.
    fn reset_burst(&mut self) -> Result<(), ()>;
}

/// A bus whose clock rate can be changed on the fly. The SH1106 will only accept commands at a
/// lower rate than it accepts display data.
pub trait BusClock {
    type Error;

    fn set_clock(&mut self, hz: u32) -> Result<(), Self::Error>;
}

/// A DMA channel wired to the transmit side of the display's SPI bus.
pub trait BurstChannel {
    type Error;

    /// Point the channel at `buf` and enable it. See `DisplayInterface::start_burst` for the
    /// lifetime requirements on `buf`.
    fn start(&mut self, buf: &[u8]) -> Result<(), Self::Error>;
    fn poll_complete(&mut self) -> nb::Result<(), Self::Error>;
    fn poll_drained(&mut self) -> nb::Result<(), Self::Error>;
    /// Clear completion, disable the channel, and reset the SPI request/status registers it used.
    fn reset(&mut self) -> Result<(), Self::Error>;
}

pub mod spi {
    //! The SPI interface supports the "4-wire" interface of the controller, where each word on the
    //! bus is 8 bits and a separate D/C GPIO selects commands or data. Chip-select is driven as a
    //! GPIO rather than by the SPI peripheral, because it has to stay asserted across a DMA burst.

    use hal::digital::v2::OutputPin;

    use super::{BurstChannel, BusClock, DisplayInterface, Mode};

    pub struct SpiInterface<SPI, DMA, DC, CS> {
        /// The SPI master device connected to the SH1106.
        spi: SPI,
        /// The DMA channel feeding `spi`'s transmit FIFO.
        dma: DMA,
        /// A GPIO output pin connected to the D/C (data/command) pin of the SH1106.
        dc: DC,
        /// A GPIO output pin connected to the active-low chip-select of the SH1106.
        cs: CS,
    }

    impl<SPI, DMA, DC, CS> SpiInterface<SPI, DMA, DC, CS>
    where
        SPI: hal::blocking::spi::Write<u8> + BusClock,
        DMA: BurstChannel,
        DC: OutputPin,
        CS: OutputPin,
    {
        pub fn new(spi: SPI, dma: DMA, dc: DC, cs: CS) -> Self {
            Self { spi, dma, dc, cs }
        }

        /// Give back the peripherals.
        pub fn release(self) -> (SPI, DMA, DC, CS) {
            (self.spi, self.dma, self.dc, self.cs)
        }
    }

    impl<SPI, DMA, DC, CS> DisplayInterface for SpiInterface<SPI, DMA, DC, CS>
    where
        SPI: hal::blocking::spi::Write<u8> + BusClock,
        DMA: BurstChannel,
        DC: OutputPin,
        CS: OutputPin,
    {
        fn set_clock(&mut self, hz: u32) -> Result<(), ()> {
            self.spi.set_clock(hz).map_err(|_| ())
        }

        fn select(&mut self, active: bool) -> Result<(), ()> {
            let res = match active {
                true => self.cs.set_low(),
                false => self.cs.set_high(),
            };
            res.map_err(|_| ())
        }

        fn set_mode(&mut self, mode: Mode) -> Result<(), ()> {
            let res = match mode {
                Mode::Command => self.dc.set_low(),
                Mode::Data => self.dc.set_high(),
            };
            res.map_err(|_| ())
        }

        fn send_sync(&mut self, buf: &[u8]) -> Result<(), ()> {
            self.spi.write(buf).map_err(|_| ())
        }

        fn start_burst(&mut self, buf: &[u8]) -> Result<(), ()> {
            self.dma.start(buf).map_err(|_| ())
        }

        fn poll_burst(&mut self) -> nb::Result<(), ()> {
            self.dma.poll_complete().map_err(|e| e.map(|_| ()))
        }

        fn poll_drained(&mut self) -> nb::Result<(), ()> {
            self.dma.poll_drained().map_err(|e| e.map(|_| ()))
        }

        fn reset_burst(&mut self) -> Result<(), ()> {
            self.dma.reset().map_err(|_| ())
        }
    }

}
