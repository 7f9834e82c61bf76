//! Builds small ELF files in memory, for tests.
//!
//! Layout: ELF header, program header table, `.shstrtab` content, the content of each section in
//! the order they were added, and finally the section header table.  Section headers start with
//! the null section, then the added sections, then `.shstrtab`.

use std::io;

use goblin::{
    container::{Container, Ctx},
    elf::{
        header::{
            EI_CLASS, EI_DATA, EI_VERSION, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB,
            ELFMAG, EM_X86_64, ET_EXEC, EV_CURRENT, SELFMAG, SIZEOF_IDENT,
        },
        program_header::PT_LOAD,
        section_header::{SHF_ALLOC, SHF_WRITE, SHT_NOBITS, SHT_PROGBITS, SHT_STRTAB},
        Header, ProgramHeader, SectionHeader,
    },
};
use scroll::{
    ctx::{SizeWith, TryIntoCtx},
    Endian, IOwrite,
};

pub struct TestSection {
    name: &'static str,
    sh_type: u32,
    address: u64,
    content: Vec<u8>,
    size: u64,
}

impl TestSection {
    pub fn progbits(name: &'static str, address: u64, content: Vec<u8>) -> Self {
        let size = content.len() as u64;
        TestSection {
            name,
            sh_type: SHT_PROGBITS,
            address,
            content,
            size,
        }
    }

    pub fn nobits(name: &'static str, address: u64, size: u64) -> Self {
        TestSection {
            name,
            sh_type: SHT_NOBITS,
            address,
            content: vec![],
            size,
        }
    }

    /// Overrides `sh_size`, without changing the number of bytes written into the file.
    pub fn claimed_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

pub struct TestElf {
    ctx: Ctx,
    sections: Vec<TestSection>,
    segments: Vec<ProgramHeader>,
}

impl TestElf {
    pub fn new(ctx: Ctx) -> Self {
        TestElf {
            ctx,
            sections: vec![],
            segments: vec![],
        }
    }

    pub fn section(mut self, section: TestSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn load_segment(mut self, p_flags: u32, p_vaddr: u64, p_filesz: u64, p_memsz: u64) -> Self {
        self.segments.push(ProgramHeader {
            p_type: PT_LOAD,
            p_flags,
            p_offset: 0,
            p_vaddr,
            p_paddr: p_vaddr,
            p_filesz,
            p_memsz,
            p_align: 0x1000,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let TestElf {
            ctx,
            sections,
            segments,
        } = self;

        let header_size = Header::size_with(&ctx) as u64;
        let program_header_size = ProgramHeader::size_with(&ctx) as u64;
        let section_header_size = SectionHeader::size_with(&ctx) as u64;

        let mut shstrtab = vec![0u8];
        let mut name_offset = |name: &str| {
            let offset = shstrtab.len();
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            offset
        };

        let section_names = sections
            .iter()
            .map(|section| name_offset(section.name))
            .collect::<Vec<_>>();
        let shstrtab_name = name_offset(".shstrtab");

        let program_headers_start = header_size;
        let shstrtab_start = program_headers_start + program_header_size * segments.len() as u64;

        let mut section_headers = vec![SectionHeader {
            sh_name: 0,
            sh_type: 0,
            sh_flags: 0,
            sh_addr: 0,
            sh_offset: 0,
            sh_size: 0,
            sh_link: 0,
            sh_info: 0,
            sh_addralign: 0,
            sh_entsize: 0,
        }];

        let mut content_end = shstrtab_start + shstrtab.len() as u64;
        for (section, sh_name) in sections.iter().zip(section_names) {
            section_headers.push(SectionHeader {
                sh_name,
                sh_type: section.sh_type,
                sh_flags: u64::from(SHF_ALLOC | SHF_WRITE),
                sh_addr: section.address,
                sh_offset: content_end,
                sh_size: section.size,
                sh_link: 0,
                sh_info: 0,
                sh_addralign: 1,
                sh_entsize: 0,
            });
            content_end += section.content.len() as u64;
        }

        section_headers.push(SectionHeader {
            sh_name: shstrtab_name,
            sh_type: SHT_STRTAB,
            sh_flags: 0,
            sh_addr: 0,
            sh_offset: shstrtab_start,
            sh_size: shstrtab.len() as u64,
            sh_link: 0,
            sh_info: 0,
            sh_addralign: 1,
            sh_entsize: 0,
        });

        let section_headers_start = content_end.next_multiple_of(8);

        let mut e_ident = [0u8; SIZEOF_IDENT];
        e_ident[..SELFMAG].copy_from_slice(&ELFMAG[..]);
        e_ident[EI_CLASS] = match ctx.container {
            Container::Little => ELFCLASS32,
            Container::Big => ELFCLASS64,
        };
        e_ident[EI_DATA] = if ctx.le == Endian::Little {
            ELFDATA2LSB
        } else {
            ELFDATA2MSB
        };
        e_ident[EI_VERSION] = EV_CURRENT;

        let header = Header {
            e_ident,
            e_type: ET_EXEC,
            e_machine: EM_X86_64,
            e_version: u32::from(EV_CURRENT),
            e_entry: 0,
            e_phoff: if segments.is_empty() {
                0
            } else {
                program_headers_start
            },
            e_shoff: section_headers_start,
            e_flags: 0,
            e_ehsize: header_size as u16,
            e_phentsize: program_header_size as u16,
            e_phnum: segments.len() as u16,
            e_shentsize: section_header_size as u16,
            e_shnum: section_headers.len() as u16,
            e_shstrndx: (section_headers.len() - 1) as u16,
        };

        let mut output = vec![];
        output
            .iowrite_with(header, ctx)
            .expect("ELF header serializes into a Vec");

        let mut buf = [0u8; 256];
        for segment in segments {
            iowrite_from_scroll(&mut buf, &mut output, segment, ctx)
                .expect("`ProgramHeader` values serialize correctly");
        }

        output.extend_from_slice(&shstrtab);
        for section in &sections {
            output.extend_from_slice(&section.content);
        }

        output.resize(section_headers_start as usize, 0);
        for header in section_headers {
            iowrite_from_scroll(&mut buf, &mut output, header, ctx)
                .expect("`SectionHeader` values serialize correctly");
        }

        output
    }
}

fn iowrite_from_scroll<T>(
    buf: &mut [u8],
    output: &mut impl io::Write,
    value: T,
    ctx: Ctx,
) -> Result<(), <T as TryIntoCtx<Ctx>>::Error>
where
    T: SizeWith<Ctx> + TryIntoCtx<Ctx>,
{
    let buf = &mut buf[0..T::size_with(&ctx)];
    value.try_into_ctx(buf, ctx)?;
    output
        .write_all(buf)
        .expect("Output can fit all the serialized values");
    Ok(())
}
