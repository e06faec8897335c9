// ELF header emission for RISC-V 64-bit little-endian executables
//
// The headers are built as ordinary groups of data leaves, so every field that
// depends on the final layout (entry point, program header offset, file size)
// is just a Value resolved by the layout driver.
//
// Reference: ELF-64 Object File Format, Version 1.5 Draft 2

use crate::node::{GroupId, Program, bytes, check_size, halfs, quads, words};

// ============================================================================
// ELF Constants
// ============================================================================

// ELF Identification
pub const EI_MAG: [u8; 4] = [0x7f, b'E', b'L', b'F'];
pub const EI_CLASS: u8 = 2; // ELFCLASS64
pub const EI_DATA: u8 = 1; // ELFDATA2LSB (little endian)
pub const EI_VERSION: u8 = 1; // EV_CURRENT
pub const EI_OSABI: u8 = 0; // ELFOSABI_SYSV

// ELF File Types
pub const ET_EXEC: u16 = 2;

// Machine Type
pub const EM_RISCV: u16 = 0xF3;

// Object File Version
pub const EV_CURRENT: u32 = 1;

// Program Header Types
pub const PT_LOAD: u32 = 1;

// Program Header Flags
pub const PF_X: u32 = 0x1;
pub const PF_R: u32 = 0x4;

// Header and entry sizes (64-bit ELF)
pub const ELF_HEADER_SIZE: u32 = 64;
pub const PROGRAM_HEADER_SIZE: u32 = 56;

pub const SEGMENT_ALIGN: u32 = 0x1000;

/// Groups making up the file and program headers of a single-segment image
#[derive(Debug, Clone, Copy)]
pub struct ElfHeaders {
    pub ehdr: GroupId,
    pub phdr: GroupId,
}

/// Build an ELF header and one PT_LOAD program header
///
/// The image is loaded at the address of `ehdr` (the layout origin when the
/// headers come first) and extends up to `file_end`. Execution starts at
/// `entry`.
pub fn headers(program: &mut Program, entry: GroupId, file_end: GroupId) -> ElfHeaders {
    let ehdr = program.named_group("ehdr");
    let phdr = program.named_group("phdr");

    let mut ident = [0u8; 16];
    ident[..4].copy_from_slice(&EI_MAG);
    ident[4] = EI_CLASS;
    ident[5] = EI_DATA;
    ident[6] = EI_VERSION;
    ident[7] = EI_OSABI;

    program.extend(
        ehdr,
        [
            bytes(ident.map(u32::from)),
            halfs([ET_EXEC, EM_RISCV].map(u32::from)), // e_type, e_machine
            words([EV_CURRENT]),                       // e_version
            quads([entry]),                            // e_entry
            quads([phdr - ehdr]),                      // e_phoff
            quads([0]),                                // e_shoff
            words([0]),                                // e_flags
            halfs([ELF_HEADER_SIZE, PROGRAM_HEADER_SIZE]), // e_ehsize, e_phentsize
            halfs([1, 0, 0, 0]), // e_phnum, e_shentsize, e_shnum, e_shstrndx
            check_size(ELF_HEADER_SIZE),
        ],
    );

    let file_size = file_end - ehdr;
    program.extend(
        phdr,
        [
            words([PT_LOAD, PF_R | PF_X]), // p_type, p_flags
            quads([0]),                    // p_offset
            quads([ehdr, ehdr]),           // p_vaddr, p_paddr
            quads([file_size.clone(), file_size]), // p_filesz, p_memsz
            quads([SEGMENT_ALIGN]),        // p_align
            check_size(PROGRAM_HEADER_SIZE),
        ],
    );

    ElfHeaders { ehdr, phdr }
}
