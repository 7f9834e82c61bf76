use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which end of an [`AddressRange`](crate::extract::AddressRange) fell outside of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Start address is below the section base address.
    Start,
    /// Stop address is past the section end.
    Stop,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Start => f.write_str("Start address must not be below"),
            Bound::Stop => f.write_str("Stop address must not be past"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse the input ELF: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("Invalid file class: 0x{0:x}")]
    InvalidFileClass(u8),

    #[error("Invalid file encoding: 0x{0:x}")]
    InvalidFileEncoding(u8),

    #[error("Cannot read {name} section")]
    SectionNotFound { name: String },

    #[error(
        "{bound} the {section} section range [0x{base:x}, 0x{end:x}).\n\
         Got: 0x{address:x}"
    )]
    RangeOutOfBounds {
        section: String,
        bound: Bound,
        address: u64,
        base: u64,
        end: u64,
    },

    #[error("Range start 0x{start:x} is past its stop 0x{stop:x}")]
    ReversedRange { start: u64, stop: u64 },

    #[error("Section {section} has no file data for [0x{start:x}, 0x{stop:x})")]
    SectionDataMissing { section: String, start: u64, stop: u64 },

    #[error(
        "Section {section} file range 0x{offset:x} + 0x{size:x} is outside of the input \
         ({file_size} bytes)"
    )]
    SectionOutsideFile {
        section: String,
        offset: u64,
        size: u64,
        file_size: usize,
    },
}

impl Error {
    /// Process exit code reported for this error.  Every kind gets its own code, so that scripts
    /// can tell them apart.  `2` is left to `clap` usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidFileClass(_) => 3,
            Error::InvalidFileEncoding(_) => 4,
            Error::SectionNotFound { .. } => 5,
            Error::RangeOutOfBounds { .. } => 6,
            Error::ReversedRange { .. } => 7,
            Error::SectionDataMissing { .. } => 8,
            Error::SectionOutsideFile { .. } => 9,
            Error::ReadInput { .. } => 10,
            Error::Parse(_) => 11,
            Error::Io(_) => 12,
        }
    }
}
