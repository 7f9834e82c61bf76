//! Maps an absolute address range onto the bytes of a section.

use log::debug;

use crate::{
    error::{Bound, Error},
    image::Section,
};

/// `[start, stop)` in the program address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u64,
    pub stop: u64,
}

impl AddressRange {
    pub fn new(start: u64, stop: u64) -> Self {
        AddressRange { start, stop }
    }

    /// Number of bytes in the range.  Only meaningful for ranges that passed [`extract`].
    pub fn byte_count(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }
}

/// Returns bytes of `section` that are mapped at `range`.
///
/// The whole range must be inside of `[base_address, base_address + size)`, and `start` must not
/// be past `stop`.  Sections without file content, such as `.bss`, produce
/// [`Error::SectionDataMissing`] for any non-empty range.  Sections whose header points past the
/// end of the input produce [`Error::SectionOutsideFile`].
pub fn extract<'image>(section: &Section<'image>, range: AddressRange) -> Result<&'image [u8], Error> {
    let AddressRange { start, stop } = range;
    let base = section.base_address;
    let end = section.end_address();

    let out_of_bounds = |bound, address| Error::RangeOutOfBounds {
        section: section.name.to_owned(),
        bound,
        address,
        base,
        end,
    };

    if start < base {
        return Err(out_of_bounds(Bound::Start, start));
    }
    if stop > end {
        return Err(out_of_bounds(Bound::Stop, stop));
    }
    if start > stop {
        return Err(Error::ReversedRange { start, stop });
    }

    // Both offsets are within `size`, but `size` itself may not fit into `usize` on 32 bit hosts.
    let missing_data = || Error::SectionDataMissing {
        section: section.name.to_owned(),
        start,
        stop,
    };
    let from = usize::try_from(start - base).map_err(|_| missing_data())?;
    let to = usize::try_from(stop - base).map_err(|_| missing_data())?;

    let bytes = section.bytes()?.get(from..to).ok_or_else(missing_data)?;

    debug!(
        "Extracted {} bytes at offsets [0x{from:x}, 0x{to:x}) of {}",
        bytes.len(),
        section.name,
    );
    Ok(bytes)
}
