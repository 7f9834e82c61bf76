//! Prints a summary of the input ELF, followed by a hex dump of each requested address range.

use std::io;

use log::{debug, info, warn};

use crate::{
    error::Error,
    extract::{extract, AddressRange},
    hex_dump::{self, HexDumpFormat},
    image::ElfImage,
};

/// An address range to dump, and the section it is expected to be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTarget {
    pub section: String,
    pub range: AddressRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRequest {
    /// Dumped in order.
    pub targets: Vec<DumpTarget>,
    pub format: HexDumpFormat,
    /// When a target fails, continue with the next one.  The run still fails with the first error,
    /// and the caller reports it.  Later failures are only logged.
    pub keep_going: bool,
    pub list_sections: bool,
    pub list_segments: bool,
}

pub fn run(input_bytes: &[u8], request: &DumpRequest, output: &mut impl io::Write) -> Result<(), Error> {
    let image = ElfImage::load(input_bytes)?;

    print_summary(&image, request, output)?;

    let mut first_failure = None;
    for (i, target) in request.targets.iter().enumerate() {
        if i != 0 {
            writeln!(output)?;
        }

        match dump_target(&image, target, request.format, output) {
            Ok(()) => {}
            Err(err @ Error::Io(_)) => return Err(err),
            Err(err) if !request.keep_going => return Err(err),
            Err(err) if first_failure.is_none() => {
                debug!("Continuing after the {} range failed: {err}", target.section);
                first_failure = Some(err);
            }
            Err(err) => warn!("Skipping the {} range: {err}", target.section),
        }
    }

    first_failure.map_or(Ok(()), Err)
}

fn print_summary(
    image: &ElfImage,
    request: &DumpRequest,
    output: &mut impl io::Write,
) -> Result<(), Error> {
    writeln!(output, "ELF file class: {}", image.class)?;
    writeln!(output, "ELF file encoding: {}", image.encoding)?;

    writeln!(output, "Number of sections: {}", image.sections.len())?;
    if request.list_sections {
        for (i, section) in image.sections.iter().enumerate() {
            writeln!(
                output,
                "{i:2} {:<25} {:<7} 0x{:x}",
                section.name, section.size, section.base_address,
            )?;
        }
    }

    writeln!(output, "Number of segments: {}", image.segments.len())?;
    if request.list_segments {
        for (i, segment) in image.segments.iter().enumerate() {
            writeln!(
                output,
                "{i:2} 0x{:x} 0x{:<8x} 0x{:<4x} {:3}",
                segment.flags, segment.virtual_address, segment.file_size, segment.memory_size,
            )?;
        }
    }

    Ok(())
}

fn dump_target(
    image: &ElfImage,
    DumpTarget { section, range }: &DumpTarget,
    format: HexDumpFormat,
    output: &mut impl io::Write,
) -> Result<(), Error> {
    let section = image.find_section(section)?;
    writeln!(
        output,
        "Section {} of size {} bytes found at range [0x{:x}, 0x{:x})",
        section.name,
        section.size,
        section.base_address,
        section.end_address(),
    )?;

    let bytes = extract(section, *range)?;
    info!(
        "Dumping {} bytes of {} at [0x{:x}, 0x{:x})",
        bytes.len(),
        section.name,
        range.start,
        range.stop,
    );

    writeln!(
        output,
        "Dumping {} entries in {} section (0x{:x}) of [0x{:x}, 0x{:x})",
        range.byte_count(),
        section.name,
        section.base_address,
        range.start,
        range.stop,
    )?;
    for row in hex_dump::rows(bytes, format) {
        writeln!(output, "{row}")?;
    }

    Ok(())
}
