use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;

use crate::{
    dump::{DumpRequest, DumpTarget},
    extract::AddressRange,
    hex_dump::HexDumpFormat,
};

/// Dumps the bytes of a jump table and a PC table embedded in an ELF file.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Input ELF file to inspect.
    #[arg(value_name = "ELF")]
    pub input: PathBuf,

    /// Start address of the jump table, in hex.
    #[arg(value_parser = parse_hex_address)]
    pub jtable_start: u64,

    /// Stop address of the jump table (exclusive), in hex.
    #[arg(value_parser = parse_hex_address)]
    pub jtable_stop: u64,

    /// Start address of the PC table, in hex.
    #[arg(value_parser = parse_hex_address)]
    pub pctable_start: u64,

    /// Stop address of the PC table (exclusive), in hex.
    #[arg(value_parser = parse_hex_address)]
    pub pctable_stop: u64,

    /// Section holding the jump table.
    #[arg(long, value_name = "NAME", default_value = ".rodata")]
    pub jtable_section: String,

    /// Section holding the PC table.
    #[arg(long, value_name = "NAME", default_value = ".data")]
    pub pctable_section: String,

    /// Number of bytes printed per row.
    #[arg(long, value_name = "N", default_value = "16")]
    pub row_width: NonZeroUsize,

    /// Print every byte as two hex digits.
    #[arg(long)]
    pub zero_pad: bool,

    /// Dump the PC table even if the jump table could not be dumped.
    #[arg(long)]
    pub keep_going: bool,

    /// List all the sections of the input.
    #[arg(long)]
    pub list_sections: bool,

    /// List all the segments of the input.
    #[arg(long)]
    pub list_segments: bool,

    /// Log more details to stderr.  Repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn dump_request(&self) -> DumpRequest {
        DumpRequest {
            targets: vec![
                DumpTarget {
                    section: self.jtable_section.clone(),
                    range: AddressRange::new(self.jtable_start, self.jtable_stop),
                },
                DumpTarget {
                    section: self.pctable_section.clone(),
                    range: AddressRange::new(self.pctable_start, self.pctable_stop),
                },
            ],
            format: HexDumpFormat {
                row_width: self.row_width,
                zero_pad: self.zero_pad,
            },
            keep_going: self.keep_going,
            list_sections: self.list_sections,
            list_segments: self.list_segments,
        }
    }
}

/// Addresses are always hex.  A `0x` prefix is optional.
fn parse_hex_address(text: &str) -> Result<u64, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    // `from_str_radix` accepts a leading sign.
    if !digits.starts_with(|c: char| c.is_ascii_hexdigit()) {
        return Err(format!("\"{text}\" is not a hex address"));
    }

    u64::from_str_radix(digits, 16).map_err(|err| format!("\"{text}\" is not a hex address: {err}"))
}
