// samples_tests.rs
//
// End-to-end layout of the built-in sample executables

use crate::assembler::{Assembly, assemble};
use crate::decoder::{Fields, decode_as};
use crate::dump;
use crate::elf::{EM_RISCV, ELF_HEADER_SIZE, PROGRAM_HEADER_SIZE};
use crate::format::Format;
use crate::register::{A0, A2, ZERO};
use crate::samples::{self, GREETING, Sample};
use pretty_assertions::assert_eq;

const ORIGIN: i64 = 0x10000;

fn build(sample: &Sample) -> Assembly {
    assemble(&sample.program, sample.root, ORIGIN).expect("sample should lay out cleanly")
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn u64_at(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

#[test]
fn test_hello_layout() {
    let sample = samples::hello();
    let assembly = build(&sample);
    let out = &assembly.bytes;

    assert_eq!(out.len(), 184);
    assert_eq!(assembly.passes, 2);
    assert_eq!(assembly.address_of(sample.entry), ORIGIN + 120);

    // load greeting: auipc a1, 0; addi a1, a1, 48
    assert_eq!(u32_at(out, 124), 0x0000_0597);
    assert_eq!(u32_at(out, 128), 0x0305_8593);
    // branch to the failure exit
    assert_eq!(u32_at(out, 144), 0x00c5_1863);
    assert_eq!(decode_as(Format::B, u32_at(out, 144)), Fields::B { rs1: A0, rs2: A2, offset: 16 });
    assert_eq!(&out[172..], GREETING.as_bytes());

    // greeting length goes in a2
    assert_eq!(
        decode_as(Format::I, u32_at(out, 132)),
        Fields::I { rd: A2, rs1: ZERO, imm: GREETING.len() as i64 }
    );
}

#[test]
fn test_hello_elf_headers() {
    let sample = samples::hello();
    let assembly = build(&sample);
    let out = &assembly.bytes;

    assert_eq!(&out[..4], b"\x7fELF");
    assert_eq!(out[4], 2); // 64-bit
    assert_eq!(out[5], 1); // little endian
    assert_eq!(u16_at(out, 16), 2); // ET_EXEC
    assert_eq!(u16_at(out, 18), EM_RISCV);
    assert_eq!(u64_at(out, 24), (ORIGIN + 120) as u64); // e_entry
    assert_eq!(u64_at(out, 32), ELF_HEADER_SIZE as u64); // e_phoff
    assert_eq!(u16_at(out, 52), ELF_HEADER_SIZE as u16);
    assert_eq!(u16_at(out, 54), PROGRAM_HEADER_SIZE as u16);
    assert_eq!(u16_at(out, 56), 1); // e_phnum

    let phdr = ELF_HEADER_SIZE as usize;
    assert_eq!(u32_at(out, phdr), 1); // PT_LOAD
    assert_eq!(u32_at(out, phdr + 4), 0x5); // R + X
    assert_eq!(u64_at(out, phdr + 8), 0); // p_offset
    assert_eq!(u64_at(out, phdr + 16), ORIGIN as u64); // p_vaddr
    assert_eq!(u64_at(out, phdr + 32), 184); // p_filesz
    assert_eq!(u64_at(out, phdr + 40), 184); // p_memsz
    assert_eq!(u64_at(out, phdr + 48), 0x1000); // p_align
}

#[test]
fn test_hello_at_other_origin() {
    let sample = samples::hello();
    let assembly = assemble(&sample.program, sample.root, 0x40_0000).expect("lays out");
    assert_eq!(assembly.bytes.len(), 184);
    assert_eq!(u64_at(&assembly.bytes, 24), 0x40_0000 + 120);
    // code is position independent apart from the headers
    let at_default = build(&samples::hello());
    assert_eq!(&assembly.bytes[120..], &at_default.bytes[120..]);
}

#[test]
fn test_exit_layout() {
    let sample = samples::exit();
    let assembly = build(&sample);
    let out = &assembly.bytes;

    assert_eq!(out.len(), 132);
    assert_eq!(u64_at(out, 24), (ORIGIN + 120) as u64);
    assert_eq!(u64_at(out, 64 + 32), 132);
    // addi a0, zero, 0; addi a7, zero, 93; ecall
    assert_eq!(u32_at(out, 120), 0x0000_0513);
    assert_eq!(u32_at(out, 124), 0x05d0_0893);
    assert_eq!(u32_at(out, 128), 0x0000_0073);
}

#[test]
fn test_exit_listing() {
    let sample = samples::exit();
    let assembly = build(&sample);
    let labels = dump::labels(&sample.program, |id| assembly.address_of(id));
    assert_eq!(labels.first(), Some(&(ORIGIN, "ehdr")));

    let listing = dump::dump_code(&assembly.bytes, assembly.origin, &labels);
    assert!(listing.contains("_start:\n  00010078:  00000513  addi    a0, zero, 0\n"), "{}", listing);
    assert!(listing.contains("  00010080:  00000073  ecall\n"), "{}", listing);
}
