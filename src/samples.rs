// samples.rs
//
// Built-in sample programs: small RISC-V Linux executables constructed
// directly as node trees.

use crate::elf;
use crate::node::{GroupId, Program, string};
use crate::opcodes::{addi, bne, ecall, lli};
use crate::register::{A0, A1, A2, A7, ZERO};

// Linux system call numbers
pub const SYS_WRITE: u32 = 64;
pub const SYS_EXIT: u32 = 93;

pub const STDOUT: u32 = 1;

pub const GREETING: &str = "Hello world\n";

/// A sample ready to be laid out
#[derive(Debug)]
pub struct Sample {
    pub program: Program,
    pub root: GroupId,
    /// Execution starts at this group's address
    pub entry: GroupId,
}

/// Write a greeting to stdout, exit 0 on success and 1 on a short write
pub fn hello() -> Sample {
    let mut program = Program::new();
    let start = program.named_group("_start");
    let file_end = program.named_group("file_end");
    let headers = elf::headers(&mut program, start, file_end);

    let greeting = program.named_group("greeting");
    program.push(greeting, string(GREETING));

    let success = exit_with(&mut program, "success", 0);
    let failure = exit_with(&mut program, "failure", 1);

    let load_greeting = lli(&mut program, A1, greeting);
    let root = program.group_of(vec![
        headers.ehdr.into(),
        headers.phdr.into(),
        start.into(),
        addi(A0, ZERO, STDOUT),
        load_greeting,
        addi(A2, ZERO, GREETING.len()),
        addi(A7, ZERO, SYS_WRITE),
        ecall(),
        bne(A0, A2, failure),
        success.into(),
        failure.into(),
        greeting.into(),
        file_end.into(),
    ]);

    Sample { program, root, entry: start }
}

/// Exit immediately with status 0
pub fn exit() -> Sample {
    let mut program = Program::new();
    let start = program.named_group("_start");
    let file_end = program.named_group("file_end");
    let headers = elf::headers(&mut program, start, file_end);
    program.extend(start, [addi(A0, ZERO, 0), addi(A7, ZERO, SYS_EXIT), ecall()]);

    let root = program.group_of(vec![
        headers.ehdr.into(),
        headers.phdr.into(),
        start.into(),
        file_end.into(),
    ]);

    Sample { program, root, entry: start }
}

fn exit_with(program: &mut Program, name: &str, status: u32) -> GroupId {
    let group = program.named_group(name);
    program.extend(group, [addi(A0, ZERO, status), addi(A7, ZERO, SYS_EXIT), ecall()]);
    group
}
