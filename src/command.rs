//! The command set of the SH1106 used by this driver, and its page addressing model.
//!
//! Note 1: The display RAM of the SH1106 is arranged in 8 pages of 132 columns. Each page is a
//! horizontal strip 8 pixels tall, and each byte written into a page drives one column of 8
//! vertically stacked pixels, LSB at the top. A 128 pixel wide panel uses 128 of those columns.
//!
//! Note 2: Unlike controllers that take arguments on the data channel, every byte of an SH1106
//! command (including its arguments) is sent with D/C held in command mode.

use itertools::iproduct;

use crate::interface::{DisplayInterface, Mode};

pub mod consts {
    //! Panel geometry. These values define the wire-level chunking of a frame and must match the
    //! physical panel exactly.

    pub const NUM_PIXEL_COLS: usize = 128;
    pub const NUM_PIXEL_ROWS: usize = 64;
    /// Columns of display RAM in the controller, some of which are not connected on 128 pixel
    /// wide panels.
    pub const NUM_RAM_COLS: usize = 132;
    pub const NUM_PAGES: usize = NUM_PIXEL_ROWS / 8;
    pub const PAGE_SIZE: usize = NUM_PIXEL_COLS;
    /// Bytes per DMA burst. A page is sent as `NUM_SUBPAGES` bursts of this size.
    pub const SUBPAGE_SIZE: usize = PAGE_SIZE / 2;
    pub const NUM_SUBPAGES: usize = PAGE_SIZE / SUBPAGE_SIZE;
    pub const FRAME_SIZE: usize = NUM_PAGES * PAGE_SIZE;

    const _: () = assert!(PAGE_SIZE % SUBPAGE_SIZE == 0);
    const _: () = assert!(PAGE_SIZE <= NUM_RAM_COLS);
}

use self::consts::*;

/// Display on/off, the only single byte commands the transfer path itself needs.
pub const DISPLAY_OFF: u8 = 0xAE;
pub const DISPLAY_ON: u8 = 0xAF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Turn the panel on (`true`) or put it to sleep with all segments off (`false`). Display RAM
    /// is retained in either state.
    DisplayOn(bool),
    /// Set the contrast (segment output current). Range 0-255.
    SetContrast(u8),
    /// Show display RAM inverted, so that 1 bits are dark.
    SetInverted(bool),
    /// Set the column address pointer for subsequent data writes. Range 0-131. (Note 1)
    SetColumnAddress(u8),
    /// Set the page address pointer for subsequent data writes. Range 0-7. The page address does
    /// not advance on its own when the column pointer runs off the end of a page.
    SetPageAddress(u8),
}

macro_rules! ok_command {
    ($buf:ident, $cmd:expr,[]) => {{
        $buf[0] = $cmd;
        Ok(&$buf[..1])
    }};
    ($buf:ident, $cmd:expr,[$arg0:expr]) => {{
        $buf[0] = $cmd;
        $buf[1] = $arg0;
        Ok(&$buf[..2])
    }};
}

impl Command {
    /// Encode the command into `buf`, returning the bytes to put on the wire.
    pub fn encode(self, buf: &mut [u8; 2]) -> Result<&[u8], ()> {
        match self {
            Command::DisplayOn(on) => ok_command!(
                buf,
                match on {
                    true => DISPLAY_ON,
                    false => DISPLAY_OFF,
                },
                []
            ),
            Command::SetContrast(contrast) => ok_command!(buf, 0x81, [contrast]),
            Command::SetInverted(inverted) => ok_command!(
                buf,
                match inverted {
                    true => 0xA7,
                    false => 0xA6,
                },
                []
            ),
            Command::SetColumnAddress(col) => match col as usize {
                0..=131 => {
                    buf[0] = 0x10 | (col >> 4);
                    buf[1] = col & 0x0F;
                    Ok(&buf[..2])
                }
                _ => Err(()),
            },
            Command::SetPageAddress(page) => match page as usize {
                p if p < NUM_PAGES => ok_command!(buf, 0xB0 | page, []),
                _ => Err(()),
            },
        }
    }

    /// Send the command to the display at `iface`. Chip-select is left as the caller has it.
    pub fn send<DI>(self, iface: &mut DI) -> Result<(), ()>
    where
        DI: DisplayInterface,
    {
        let mut buf = [0u8; 2];
        let bytes = self.encode(&mut buf)?;
        iface.set_mode(Mode::Command)?;
        iface.send_sync(bytes)
    }
}

/// The "data start" sequence sent in front of every page write: column address high nibble, low
/// nibble, then page address. One instance is kept for the lifetime of the driver and rewritten
/// in place before each transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataStart([u8; 3]);

impl DataStart {
    pub const fn new() -> Self {
        DataStart([0x10, 0x00, 0xB0])
    }

    /// Point the sequence at the first column of `subpage` within `page` and return it. Out of
    /// range arguments are rejected and leave the sequence as it was.
    pub fn seek(&mut self, page: u8, subpage: u8) -> Result<&[u8], ()> {
        if subpage as usize >= NUM_SUBPAGES {
            return Err(());
        }
        let col = (subpage as usize * SUBPAGE_SIZE) as u8;
        let mut col_buf = [0u8; 2];
        let mut page_buf = [0u8; 2];
        let col_cmd = Command::SetColumnAddress(col).encode(&mut col_buf)?;
        let page_cmd = Command::SetPageAddress(page).encode(&mut page_buf)?;
        self.0[..2].copy_from_slice(col_cmd);
        self.0[2..].copy_from_slice(page_cmd);
        Ok(&self.0)
    }
}

impl Default for DataStart {
    fn default() -> Self {
        Self::new()
    }
}

/// Every `(page, subpage)` of a frame in the order they must go out: pages top to bottom, and
/// within a page, sub-pages left to right.
pub fn transfer_order() -> impl Iterator<Item = (u8, u8)> + Clone {
    iproduct!(0..NUM_PAGES as u8, 0..NUM_SUBPAGES as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Sent, TestSpyInterface};
    use proptest::prelude::*;
    use std::vec::Vec;

    #[test]
    fn display_on_off() {
        let di = TestSpyInterface::new();
        Command::DisplayOn(true).send(&mut di.split()).unwrap();
        Command::DisplayOn(false).send(&mut di.split()).unwrap();
        di.check_multi(&[
            Sent::Mode(Mode::Command),
            Sent::Sync(vec![0xAF]),
            Sent::Mode(Mode::Command),
            Sent::Sync(vec![0xAE]),
        ]);
    }

    #[test]
    fn set_contrast() {
        let di = TestSpyInterface::new();
        Command::SetContrast(0x6F).send(&mut di.split()).unwrap();
        di.check_multi(&[Sent::Mode(Mode::Command), Sent::Sync(vec![0x81, 0x6F])]);
    }

    #[test]
    fn set_inverted() {
        let mut buf = [0u8; 2];
        assert_eq!(Command::SetInverted(true).encode(&mut buf), Ok(&[0xA7][..]));
        assert_eq!(Command::SetInverted(false).encode(&mut buf), Ok(&[0xA6][..]));
    }

    #[test]
    fn set_page_address() {
        let mut buf = [0u8; 2];
        assert_eq!(Command::SetPageAddress(0).encode(&mut buf), Ok(&[0xB0][..]));
        assert_eq!(Command::SetPageAddress(7).encode(&mut buf), Ok(&[0xB7][..]));
        assert_eq!(Command::SetPageAddress(8).encode(&mut buf), Err(()));
    }

    #[test]
    fn set_column_address() {
        let mut buf = [0u8; 2];
        assert_eq!(
            Command::SetColumnAddress(0x42).encode(&mut buf),
            Ok(&[0x14, 0x02][..])
        );
        assert_eq!(
            Command::SetColumnAddress(131).encode(&mut buf),
            Ok(&[0x18, 0x03][..])
        );
        assert_eq!(Command::SetColumnAddress(132).encode(&mut buf), Err(()));
    }

    #[test]
    fn rejected_command_sends_nothing() {
        let di = TestSpyInterface::new();
        assert_eq!(Command::SetPageAddress(8).send(&mut di.split()), Err(()));
        di.check_multi(&[]);
    }

    #[test]
    fn data_start_every_page_and_subpage() {
        let mut seq = DataStart::new();
        for (page, subpage) in transfer_order() {
            let col = subpage as usize * SUBPAGE_SIZE;
            assert_eq!(
                seq.seek(page, subpage),
                Ok(&[0x10 | (col >> 4) as u8, (col & 0x0F) as u8, 0xB0 | page][..])
            );
        }
        assert_eq!(seq.seek(3, 1), Ok(&[0x14, 0x00, 0xB3][..]));
    }

    #[test]
    fn data_start_rejects_out_of_range() {
        let mut seq = DataStart::new();
        seq.seek(2, 1).unwrap();
        assert_eq!(seq.seek(NUM_PAGES as u8, 0), Err(()));
        assert_eq!(seq.seek(16, 4), Err(()));
        assert_eq!(seq.seek(0, NUM_SUBPAGES as u8), Err(()));
        assert_eq!(seq, DataStart([0x14, 0x00, 0xB2]));
    }

    #[test]
    fn transfer_order_is_page_major() {
        let order = transfer_order().collect::<Vec<_>>();
        assert_eq!(order.len(), NUM_PAGES * NUM_SUBPAGES);
        assert_eq!(&order[..3], &[(0, 0), (0, 1), (1, 0)]);
        assert_eq!(order.last(), Some(&(7, 1)));
    }

    proptest! {
        #[test]
        fn data_start_accepts_only_panel_addresses(page: u8, subpage: u8) {
            let mut seq = DataStart::new();
            match seq.seek(page, subpage) {
                Ok(bytes) => {
                    prop_assert!((page as usize) < NUM_PAGES);
                    prop_assert!((subpage as usize) < NUM_SUBPAGES);
                    prop_assert_eq!(bytes[0] & 0xF0, 0x10);
                    prop_assert_eq!(bytes[2], 0xB0 | page);
                    let col = ((bytes[0] & 0x0F) as usize) << 4 | bytes[1] as usize;
                    prop_assert_eq!(col, subpage as usize * SUBPAGE_SIZE);
                }
                Err(()) => prop_assert!(
                    (page as usize) >= NUM_PAGES || (subpage as usize) >= NUM_SUBPAGES
                ),
            }
        }

        #[test]
        fn column_address_splits_nibbles(col in 0u8..132) {
            let mut buf = [0u8; 2];
            let bytes = Command::SetColumnAddress(col).encode(&mut buf).unwrap();
            prop_assert_eq!(bytes[0] & 0xF0, 0x10);
            prop_assert_eq!(((bytes[0] & 0x0F) << 4) | bytes[1], col);
        }
    }
}
