//! One-time panel bring-up and the blocking clear that goes with it.

use hal::blocking::delay::DelayMs;
use hal::digital::v2::OutputPin;

use crate::command::consts::*;
use crate::command::Command;
use crate::display::{Display, Phase};
use crate::interface::{DisplayInterface, Mode};

static EMPTY_PAGE: [u8; PAGE_SIZE] = [0; PAGE_SIZE];

impl<DI> Display<DI>
where
    DI: DisplayInterface,
{
    /// Reset the panel through `rst`, send the configured initialization table, clear display RAM
    /// and turn the display on. Takes a little over 50ms, most of it in `delay`.
    pub fn init<RST, DELAY>(&mut self, rst: &mut RST, delay: &mut DELAY) -> Result<(), ()>
    where
        RST: OutputPin,
        DELAY: DelayMs<u8>,
    {
        debug!("init {}", self.config);
        self.flush()?;

        // Power-on reset pulse.
        rst.set_high().map_err(|_| ())?;
        delay.delay_ms(1);
        rst.set_low().map_err(|_| ())?;
        delay.delay_ms(10);
        rst.set_high().map_err(|_| ())?;

        self.iface.select(false)?;
        self.iface.set_clock(self.config.data_clock_hz)?;
        self.iface.set_mode(Mode::Command)?;

        // The controller needs a second low pulse, and the same again before it takes commands.
        rst.set_low().map_err(|_| ())?;
        delay.delay_ms(20);
        rst.set_high().map_err(|_| ())?;
        delay.delay_ms(20);

        self.run_or_abandon(|disp| {
            disp.iface.set_clock(disp.config.command_clock_hz)?;
            disp.iface.select(true)?;
            disp.iface.send_sync(disp.config.init_table())?;
            disp.iface.select(false)?;
            disp.iface.set_clock(disp.config.data_clock_hz)
        })?;

        self.clear()?;
        debug!("init done");
        Ok(())
    }

    /// Zero every page of display RAM, then turn the display on. Blocks until all of it has been
    /// clocked out, so this is meant for bring-up rather than the frame loop.
    pub fn clear(&mut self) -> Result<(), ()> {
        self.flush()?;
        self.run_or_abandon(Self::clear_ram)?;
        debug!("cleared");
        Ok(())
    }

    fn clear_ram(&mut self) -> Result<(), ()> {
        self.phase = Phase::Command;
        self.iface.set_clock(self.config.command_clock_hz)?;
        self.iface.select(true)?;
        for page in 0..NUM_PAGES as u8 {
            // The page address does not advance by itself, so every page gets its own address.
            self.iface.set_mode(Mode::Command)?;
            self.iface.send_sync(self.data_start.seek(page, 0)?)?;
            self.iface.set_mode(Mode::Data)?;
            self.iface.send_sync(&EMPTY_PAGE)?;
        }
        self.iface.select(false)?;

        self.iface.select(true)?;
        Command::DisplayOn(true).send(&mut self.iface)?;
        self.iface.set_mode(Mode::Data)?;
        self.iface.select(false)?;
        self.phase = Phase::Idle;
        Ok(())
    }
}
