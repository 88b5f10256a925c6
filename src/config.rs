//! Hardware variant configuration: panel orientation, inversion, how pages are transferred, and
//! the bus clock rates. Each orientation/inversion variant maps onto one fixed initialization
//! table, so nothing outside this module needs to know which variant is in use.

/// How the panel is mounted relative to its natural orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Normal,
    /// Rotated 180 degrees: segment remap and COM scan direction are both reversed.
    Flipped180,
}

/// How `Display::send_page` moves pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    /// Hand the sub-page to the DMA channel and return. Chip-select stays asserted until
    /// `Display::flush`.
    Dma,
    /// Clock the sub-page out synchronously and release the bus before returning.
    Blocking,
}

/// Expands to a complete initialization table, differing between variants only in segment remap,
/// COM scan direction and normal/inverse display.
macro_rules! init_table {
    ($seg_remap:expr, $com_scan:expr, $display_mode:expr) => {
        [
            0xAE, // display off
            0xD5, 0x80, // clock divide ratio / oscillator frequency
            0xA8, 0x3F, // multiplex ratio, 1/64 duty
            0x40, // start line 0
            0x20, 0x02, // page addressing mode
            $seg_remap,
            $com_scan,
            0xDA, 0x12, // COM pins hardware configuration
            0x81, 0x6F, // contrast
            0xD9, 0xD3, // pre-charge period
            0xDB, 0x20, // VCOMH deselect level
            0x2E, // scroll off
            0xA4, // output follows RAM
            $display_mode,
        ]
    };
}

pub const INIT_TABLE_LEN: usize = 21;

static INIT_NORMAL: [u8; INIT_TABLE_LEN] = init_table!(0xA1, 0xC8, 0xA6);
static INIT_NORMAL_INVERTED: [u8; INIT_TABLE_LEN] = init_table!(0xA1, 0xC8, 0xA7);
static INIT_FLIPPED: [u8; INIT_TABLE_LEN] = init_table!(0xA0, 0xC0, 0xA6);
static INIT_FLIPPED_INVERTED: [u8; INIT_TABLE_LEN] = init_table!(0xA0, 0xC0, 0xA7);

/// A configuration for the display. Defaults match the stock panel: normal orientation, not
/// inverted, DMA transfers, 8 MHz for commands and 30 MHz otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    orientation: Orientation,
    inverted: bool,
    pub(crate) transfer_mode: TransferMode,
    pub(crate) command_clock_hz: u32,
    pub(crate) data_clock_hz: u32,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            orientation: Orientation::Normal,
            inverted: false,
            transfer_mode: TransferMode::Dma,
            command_clock_hz: 8_000_000,
            data_clock_hz: 30_000_000,
        }
    }

    /// Extend this `Config` to select the mounting orientation.
    pub fn orientation(self, orientation: Orientation) -> Self {
        Self {
            orientation,
            ..self
        }
    }

    /// Extend this `Config` to start the panel in inverse display mode.
    pub fn inverted(self, inverted: bool) -> Self {
        Self { inverted, ..self }
    }

    /// Extend this `Config` to select DMA or blocking page transfers.
    pub fn transfer_mode(self, transfer_mode: TransferMode) -> Self {
        Self {
            transfer_mode,
            ..self
        }
    }

    /// Extend this `Config` with the clock rate used whenever commands are sent.
    pub fn command_clock_hz(self, hz: u32) -> Self {
        Self {
            command_clock_hz: hz,
            ..self
        }
    }

    /// Extend this `Config` with the clock rate the bus is returned to after initialization.
    pub fn data_clock_hz(self, hz: u32) -> Self {
        Self {
            data_clock_hz: hz,
            ..self
        }
    }

    pub fn get_orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn get_transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }

    /// The fixed command sequence that brings the panel up in this variant, ending with the
    /// display still off.
    pub fn init_table(&self) -> &'static [u8] {
        match (self.orientation, self.inverted) {
            (Orientation::Normal, false) => &INIT_NORMAL,
            (Orientation::Normal, true) => &INIT_NORMAL_INVERTED,
            (Orientation::Flipped180, false) => &INIT_FLIPPED,
            (Orientation::Flipped180, true) => &INIT_FLIPPED_INVERTED,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.get_orientation(), Orientation::Normal);
        assert!(!cfg.is_inverted());
        assert_eq!(cfg.get_transfer_mode(), TransferMode::Dma);
        assert_eq!(cfg.command_clock_hz, 8_000_000);
        assert_eq!(cfg.data_clock_hz, 30_000_000);
    }

    #[test]
    fn builder_overrides() {
        let cfg = Config::new()
            .orientation(Orientation::Flipped180)
            .inverted(true)
            .transfer_mode(TransferMode::Blocking)
            .command_clock_hz(4_000_000)
            .data_clock_hz(16_000_000);
        assert_eq!(cfg.get_orientation(), Orientation::Flipped180);
        assert!(cfg.is_inverted());
        assert_eq!(cfg.get_transfer_mode(), TransferMode::Blocking);
        assert_eq!(cfg.command_clock_hz, 4_000_000);
        assert_eq!(cfg.data_clock_hz, 16_000_000);
    }

    #[test]
    fn stock_init_table() {
        assert_eq!(
            Config::new().init_table(),
            &[
                0xAE, 0xD5, 0x80, 0xA8, 0x3F, 0x40, 0x20, 0x02, 0xA1, 0xC8, 0xDA, 0x12,
                0x81, 0x6F, 0xD9, 0xD3, 0xDB, 0x20, 0x2E, 0xA4, 0xA6,
            ][..]
        );
    }

    #[test]
    fn variants_differ_only_in_remap_scan_and_mode() {
        let variants = [
            (Config::new(), [0xA1, 0xC8, 0xA6]),
            (Config::new().inverted(true), [0xA1, 0xC8, 0xA7]),
            (
                Config::new().orientation(Orientation::Flipped180),
                [0xA0, 0xC0, 0xA6],
            ),
            (
                Config::new()
                    .orientation(Orientation::Flipped180)
                    .inverted(true),
                [0xA0, 0xC0, 0xA7],
            ),
        ];
        let stock = Config::new().init_table();
        for (cfg, [seg, com, mode]) in variants.iter() {
            let table = cfg.init_table();
            assert_eq!(table.len(), INIT_TABLE_LEN);
            assert_eq!(table[0], 0xAE);
            assert_eq!((table[8], table[9], table[20]), (*seg, *com, *mode));
            assert_eq!(&table[..8], &stock[..8]);
            assert_eq!(&table[10..20], &stock[10..20]);
        }
    }

    #[test]
    fn transfer_mode_does_not_change_table() {
        assert_eq!(
            Config::new().transfer_mode(TransferMode::Blocking).init_table(),
            Config::new().init_table()
        );
    }
}
