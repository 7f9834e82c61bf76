//! A read-only view of the input ELF, reduced to what the dump needs: the file class and
//! encoding, and the sections with their addresses and bytes.
//!
//! Decoding itself is done by `goblin`.  Section bytes are borrowed from the input buffer, so an
//! [`ElfImage`] can not outlive the bytes it was loaded from.

use std::fmt;

use goblin::elf::{
    header::{EI_CLASS, EI_DATA, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG, SELFMAG},
    section_header::SHT_NOBITS,
    Elf, ProgramHeader, SectionHeader,
};
use log::{debug, trace};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Elf32 => f.write_str("ELF32"),
            Class::Elf64 => f.write_str("ELF64"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    LittleEndian,
    BigEndian,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::LittleEndian => f.write_str("Little endian"),
            Encoding::BigEndian => f.write_str("Big endian"),
        }
    }
}

/// Where the content of a section is, in the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionData<'image> {
    InFile(&'image [u8]),
    /// `SHT_NOBITS`: the section occupies no space in the file.
    NoBits,
    /// The section header points past the end of the input.  Only an error when the section is
    /// actually read.
    OutsideFile { offset: u64, file_size: usize },
}

/// A named section, as mapped into the program address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'image> {
    pub name: &'image str,
    pub base_address: u64,
    pub size: u64,
    pub data: SectionData<'image>,
}

impl<'image> Section<'image> {
    /// Address one past the last byte of the section.  Saturates for sections that wrap around
    /// the address space.
    pub fn end_address(&self) -> u64 {
        self.base_address.saturating_add(self.size)
    }

    /// Section content in the file.  Empty for `SHT_NOBITS` sections, even when `size` is not.
    pub fn bytes(&self) -> Result<&'image [u8], Error> {
        match self.data {
            SectionData::InFile(bytes) => Ok(bytes),
            SectionData::NoBits => Ok(&[]),
            SectionData::OutsideFile { offset, file_size } => Err(Error::SectionOutsideFile {
                section: self.name.to_owned(),
                offset,
                size: self.size,
                file_size,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub flags: u32,
    pub virtual_address: u64,
    pub file_size: u64,
    pub memory_size: u64,
}

impl From<&ProgramHeader> for Segment {
    fn from(header: &ProgramHeader) -> Self {
        Segment {
            flags: header.p_flags,
            virtual_address: header.p_vaddr,
            file_size: header.p_filesz,
            memory_size: header.p_memsz,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage<'image> {
    pub class: Class,
    pub encoding: Encoding,
    /// In section header table order.
    pub sections: Vec<Section<'image>>,
    pub segments: Vec<Segment>,
}

impl<'image> ElfImage<'image> {
    pub fn load(input_bytes: &'image [u8]) -> Result<Self, Error> {
        // Unknown class and encoding values get their own errors, instead of a `goblin` parse
        // failure.  Inputs without the ELF magic are left for `goblin` to reject.
        if let Some(ident) = input_bytes.get(..=EI_DATA) {
            if ident[..SELFMAG] == ELFMAG[..] {
                check_class(ident[EI_CLASS])?;
                check_encoding(ident[EI_DATA])?;
            }
        }

        let elf = Elf::parse(input_bytes)?;
        let class = if elf.is_64 { Class::Elf64 } else { Class::Elf32 };
        let encoding = if elf.little_endian {
            Encoding::LittleEndian
        } else {
            Encoding::BigEndian
        };
        debug!(
            "Parsed {class} {encoding} file: {} sections, {} segments",
            elf.section_headers.len(),
            elf.program_headers.len(),
        );

        let sections = elf
            .section_headers
            .iter()
            .map(|header| {
                let name = elf.shdr_strtab.get_at(header.sh_name).unwrap_or("");
                section_from_header(input_bytes, name, header)
            })
            .collect();

        let segments = elf.program_headers.iter().map(Segment::from).collect();

        Ok(ElfImage {
            class,
            encoding,
            sections,
            segments,
        })
    }

    /// Finds the first section called `name`, in section header table order.
    pub fn find_section(&self, name: &str) -> Result<&Section<'image>, Error> {
        debug!("Looking for the {name} section");

        let section = self
            .sections
            .iter()
            .find(|section| section.name == name)
            .ok_or_else(|| Error::SectionNotFound {
                name: name.to_owned(),
            })?;

        debug!(
            "Found {name} at [0x{:x}, 0x{:x})",
            section.base_address,
            section.end_address(),
        );
        Ok(section)
    }
}

fn check_class(ei_class: u8) -> Result<Class, Error> {
    match ei_class {
        ELFCLASS32 => Ok(Class::Elf32),
        ELFCLASS64 => Ok(Class::Elf64),
        other => Err(Error::InvalidFileClass(other)),
    }
}

fn check_encoding(ei_data: u8) -> Result<Encoding, Error> {
    match ei_data {
        ELFDATA2LSB => Ok(Encoding::LittleEndian),
        ELFDATA2MSB => Ok(Encoding::BigEndian),
        other => Err(Error::InvalidFileEncoding(other)),
    }
}

fn section_from_header<'image>(
    input_bytes: &'image [u8],
    name: &'image str,
    SectionHeader {
        sh_type,
        sh_addr,
        sh_offset,
        sh_size,
        ..
    }: &SectionHeader,
) -> Section<'image> {
    trace!("Section {name}: type {sh_type}, addr 0x{sh_addr:x}, size 0x{sh_size:x}");

    let data = if *sh_type == SHT_NOBITS {
        SectionData::NoBits
    } else {
        let in_file = usize::try_from(*sh_offset).ok().and_then(|start| {
            let end = usize::try_from(sh_offset.checked_add(*sh_size)?).ok()?;
            input_bytes.get(start..end)
        });

        match in_file {
            Some(bytes) => SectionData::InFile(bytes),
            None => {
                debug!(
                    "Section {name} at file offset 0x{sh_offset:x}, size 0x{sh_size:x} is not \
                     inside of the input ({} bytes)",
                    input_bytes.len(),
                );
                SectionData::OutsideFile {
                    offset: *sh_offset,
                    file_size: input_bytes.len(),
                }
            }
        }
    };

    Section {
        name,
        base_address: *sh_addr,
        size: *sh_size,
        data,
    }
}
