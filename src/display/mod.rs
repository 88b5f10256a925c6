//! The main API to the display driver. `Display` owns the bus to the panel and moves a caller-owned
//! framebuffer onto it one sub-page at a time, overlapping each DMA burst with whatever the caller
//! does until the next `flush`.
//!
//! Transfers follow a fixed protocol per sub-page: address the page and column with a short
//! synchronous command burst, switch D/C to data, then hand the sub-page to the DMA channel while
//! keeping chip-select asserted. `flush` waits for the burst and the bus FIFOs to drain before it
//! releases chip-select. Only one burst is ever outstanding.
//!
//! Neither the in-flight burst nor the framebuffer bytes it reads are guarded at runtime. Calling
//! `send_page` again, or modifying the page that was just sent, before `flush` has returned will
//! put corrupted data on the panel without any error being reported.

pub mod init;

use crate::command::consts::*;
use crate::command::{transfer_order, Command, DataStart};
use crate::config::{Config, TransferMode};
use crate::interface::{DisplayInterface, Mode};

/// Where the transfer engine is in the per-page protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No transfer outstanding and chip-select released.
    Idle,
    /// Addressing commands for a page are being sent.
    Command,
    /// A sub-page burst belongs to the DMA channel and chip-select is held until `flush`.
    AsyncData,
}

/// A driver for an SH1106 display.
pub struct Display<DI>
where
    DI: DisplayInterface,
{
    iface: DI,
    config: Config,
    data_start: DataStart,
    phase: Phase,
}

impl<DI> Display<DI>
where
    DI: DisplayInterface,
{
    /// Construct a new display driver for a panel connected to `iface`. Nothing is sent until
    /// `init`.
    pub fn new(iface: DI, config: Config) -> Self {
        Display {
            iface,
            config,
            data_start: DataStart::new(),
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while a sub-page burst has been started and not yet flushed.
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::AsyncData
    }

    /// Send one sub-page of `page_data` (the `PAGE_SIZE` bytes of page `page`) to the panel.
    ///
    /// With `TransferMode::Dma` this returns as soon as the burst has started, leaving the bus
    /// owned by the transfer. `flush` must be called before sending anything else and before
    /// `page_data` is modified. With `TransferMode::Blocking` the bytes are on the panel when this
    /// returns.
    ///
    /// Returns `Err(())` without touching the bus if `page` or `subpage` is out of range or
    /// `page_data` is too short to hold the sub-page. If the bus itself fails part way through,
    /// chip-select is released and the engine is back in `Phase::Idle` when the error returns.
    pub fn send_page(&mut self, page: u8, subpage: u8, page_data: &[u8]) -> Result<(), ()> {
        let start = subpage as usize * SUBPAGE_SIZE;
        let burst = match (page as usize, subpage as usize) {
            (p, s) if p < NUM_PAGES && s < NUM_SUBPAGES => {
                page_data.get(start..start + SUBPAGE_SIZE).ok_or(())?
            }
            _ => return Err(()),
        };
        trace!("send page {=u8} subpage {=u8}", page, subpage);
        self.run_or_abandon(|disp| disp.transfer(page, subpage, burst))
    }

    fn transfer(&mut self, page: u8, subpage: u8, burst: &[u8]) -> Result<(), ()> {
        self.phase = Phase::Command;
        self.iface.set_clock(self.config.command_clock_hz)?;
        self.iface.set_mode(Mode::Command)?;
        self.iface.select(true)?;
        self.iface.send_sync(self.data_start.seek(page, subpage)?)?;
        self.iface.set_mode(Mode::Data)?;

        match self.config.transfer_mode {
            TransferMode::Dma => {
                self.iface.start_burst(burst)?;
                self.phase = Phase::AsyncData;
            }
            TransferMode::Blocking => {
                self.iface.send_sync(burst)?;
                self.iface.select(false)?;
                self.phase = Phase::Idle;
            }
        }
        Ok(())
    }

    /// Wait for the outstanding burst, if any, to leave the bus, then release chip-select and
    /// make the DMA channel ready for the next `send_page`. Spins without a timeout; a wedged bus
    /// hangs here.
    pub fn flush(&mut self) -> Result<(), ()> {
        if self.phase != Phase::AsyncData {
            return Ok(());
        }
        nb::block!(self.iface.poll_burst())?;
        // Dropping CS while the SPI peripheral still has words in its FIFOs cuts off the tail of
        // the burst and garbles the next command.
        nb::block!(self.iface.poll_drained())?;
        self.iface.select(false)?;
        self.phase = Phase::Idle;
        self.iface.reset_burst()?;
        trace!("burst flushed");
        Ok(())
    }

    /// Send a whole `FRAME_SIZE` byte frame, page by page and sub-page by sub-page, flushing
    /// before each burst. The last burst is still in flight on return, so the frame must not be
    /// modified before the next `flush`.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<(), ()> {
        if frame.len() != FRAME_SIZE {
            return Err(());
        }
        for (page, subpage) in transfer_order() {
            let start = page as usize * PAGE_SIZE;
            self.flush()?;
            self.send_page(page, subpage, &frame[start..start + PAGE_SIZE])?;
        }
        Ok(())
    }

    /// Turn the panel on, or put it to sleep.
    pub fn display_on(&mut self, on: bool) -> Result<(), ()> {
        self.command(Command::DisplayOn(on))
    }

    /// Control the contrast.
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), ()> {
        self.command(Command::SetContrast(contrast))
    }

    /// Switch between normal and inverse display. The setting is also kept in the config so a
    /// later `init` preserves it.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), ()> {
        self.command(Command::SetInverted(inverted))?;
        self.config = self.config.inverted(inverted);
        Ok(())
    }

    /// Hook for shifting the visible window within the controller's 132 RAM columns. Panels
    /// supported so far are wired so that column 0 is the first visible column, so this does
    /// nothing.
    pub fn adjust_offset(&mut self, _offset: u8) {}

    /// Give back the interface. Any outstanding burst is not flushed.
    pub fn release(self) -> DI {
        self.iface
    }

    fn command(&mut self, cmd: Command) -> Result<(), ()> {
        self.flush()?;
        self.run_or_abandon(|disp| {
            disp.iface.set_clock(disp.config.command_clock_hz)?;
            disp.iface.select(true)?;
            cmd.send(&mut disp.iface)?;
            disp.iface.select(false)
        })
    }

    /// Run a sequence of bus operations. If any of them fails, release chip-select, reset the DMA
    /// channel and drop back to `Phase::Idle` before handing the error on.
    fn run_or_abandon<F>(&mut self, steps: F) -> Result<(), ()>
    where
        F: FnOnce(&mut Self) -> Result<(), ()>,
    {
        let res = steps(self);
        if res.is_err() {
            debug!("bus error, abandoning transfer");
            // The first error is the one reported.
            let _ = self.iface.select(false);
            let _ = self.iface.reset_burst();
            self.phase = Phase::Idle;
        }
        res
    }
}
