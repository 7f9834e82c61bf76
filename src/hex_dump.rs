use std::{fmt::Write as _, num::NonZeroUsize};

/// Controls how [`rows`] renders bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexDumpFormat {
    /// Number of bytes per row.
    pub row_width: NonZeroUsize,
    /// Print `0x05` rather than `0x5`.
    pub zero_pad: bool,
}

impl Default for HexDumpFormat {
    fn default() -> Self {
        HexDumpFormat {
            row_width: NonZeroUsize::new(16).expect("16 is not zero"),
            zero_pad: false,
        }
    }
}

/// Renders `bytes` as rows of `0x..;` tokens, separated by a single space.
pub fn rows(bytes: &[u8], format: HexDumpFormat) -> impl Iterator<Item = String> + '_ {
    bytes
        .chunks(format.row_width.get())
        .map(move |row| format_row(row, format.zero_pad))
}

fn format_row(row: &[u8], zero_pad: bool) -> String {
    let mut res = String::with_capacity(row.len() * "0x00; ".len());

    for (i, byte) in row.iter().enumerate() {
        if i != 0 {
            res.push(' ');
        }

        let written = if zero_pad {
            write!(res, "0x{byte:02x};")
        } else {
            write!(res, "0x{byte:x};")
        };
        written.expect("Writing into a String does not fail");
    }

    res
}
