//! Driver library for the Sino Wealth SH1106 dot matrix OLED display controller, as fitted to
//! 128x64 monochrome panels, with page transfers offloaded to a DMA channel so the next frame can
//! be composed while the previous one is still being clocked out.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate embedded_hal as hal;

#[macro_use]
mod fmt;

pub mod command;
pub mod config;
pub mod display;
pub mod interface;

// Re-exports for primary API.
pub use command::{consts, Command};
pub use config::{Config, Orientation, TransferMode};
pub use display::{Display, Phase};
pub use interface::spi::SpiInterface;
pub use interface::{BurstChannel, BusClock, DisplayInterface, Mode};
