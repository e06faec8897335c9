// assembler_tests.rs
//
// Tests for the fixpoint layout driver: forward references, PC-relative
// limits, convergence and its failure modes.

use crate::assembler::{
    Assembly, LayoutOptions, NoOpCallback, PassCallback, assemble, assemble_with, encode_pass,
};
use crate::decoder::{Fields, decode_as};
use crate::error::{Diagnostic, LayoutError};
use crate::format::Format;
use crate::node::{GroupId, Node, Program, space, words};
use crate::opcodes::{addi, beq, bne, ecall, jal, lli, nop};
use crate::register::{A0, A1, RA, ZERO};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

fn word_at(assembly: &Assembly, address: i64) -> u32 {
    let offset = (address - assembly.origin) as usize;
    u32::from_le_bytes(assembly.bytes[offset..offset + 4].try_into().unwrap())
}

fn field_errors(result: Result<Assembly, LayoutError>) -> Vec<String> {
    match result {
        Err(LayoutError::Fields(diagnostics)) => diagnostics.iter().map(|d| d.to_string()).collect(),
        Err(e) => panic!("expected field errors, got {}", e),
        Ok(_) => panic!("expected field errors, got success"),
    }
}

/// Build `root = [branch(target), space(gap), target]`
fn branch_over_gap(gap: i64, branch: impl FnOnce(GroupId) -> Node) -> (Program, GroupId) {
    let mut program = Program::new();
    let target = program.group();
    let root = program.group_of(vec![branch(target), space(gap), target.into()]);
    (program, root)
}

/// Build `root = [target, space(gap), branch(target)]`
fn branch_back_over_gap(gap: i64, branch: impl FnOnce(GroupId) -> Node) -> (Program, GroupId) {
    let mut program = Program::new();
    let target = program.group();
    let root = program.group_of(vec![target.into(), space(gap), branch(target)]);
    (program, root)
}

#[test]
fn test_forward_reference_converges() {
    let mut program = Program::new();
    let g = program.named_group("g");
    program.push(g, ecall());
    let root = program.group_of(vec![jal(RA, g), nop(), nop(), g.into()]);

    let assembly = assemble(&program, root, 0x1000).expect("layout should converge");
    assert_eq!(assembly.bytes.len(), 16);
    assert_eq!(assembly.address_of(g), 0x100c);
    assert_eq!(assembly.address_of(root), 0x1000);
    assert_eq!(assembly.passes, 2);
    assert_eq!(decode_as(Format::J, word_at(&assembly, 0x1000)), Fields::J { rd: RA, offset: 12 });
    assert_eq!(word_at(&assembly, 0x100c), 0x73);
}

#[test]
fn test_errors_from_early_passes_are_discarded() {
    // in the first pass the target still resolves to 0, far out of branch range
    let mut program = Program::new();
    let g = program.group();
    program.push(g, ecall());
    let root = program.group_of(vec![beq(A0, A1, g), g.into()]);

    let first = encode_pass(&program, root, 0x10000, &mut crate::layout::Layout::new());
    assert_eq!(first.errors.len(), 1);

    let assembly = assemble(&program, root, 0x10000).expect("final pass has no errors");
    assert_eq!(decode_as(Format::B, word_at(&assembly, 0x10000)), Fields::B { rs1: A0, rs2: A1, offset: 4 });
}

#[test]
fn test_branch_forward_limits() {
    let (program, root) = branch_over_gap(4090, |t| beq(ZERO, ZERO, t));
    let assembly = assemble(&program, root, 0x10000).expect("+4094 is in range");
    assert_eq!(word_at(&assembly, 0x10000), 0x7e00_0fe3);

    let (program, root) = branch_over_gap(4092, |t| beq(ZERO, ZERO, t));
    assert_eq!(field_errors(assemble(&program, root, 0x10000)), vec!["imm field (b_type) 4096"]);
}

#[test]
fn test_branch_backward_limits() {
    let (program, root) = branch_back_over_gap(4096, |t| bne(A0, A1, t));
    let assembly = assemble(&program, root, 0).expect("-4096 is in range");
    assert_eq!(decode_as(Format::B, word_at(&assembly, 4096)), Fields::B { rs1: A0, rs2: A1, offset: -4096 });

    let (program, root) = branch_back_over_gap(4098, |t| bne(A0, A1, t));
    assert_eq!(field_errors(assemble(&program, root, 0)), vec!["imm field (b_type) -4098"]);
}

#[test]
fn test_jump_limits() {
    let (program, root) = branch_over_gap(1_048_570, |t| jal(ZERO, t));
    let assembly = assemble(&program, root, 0x10000).expect("+1048574 is in range");
    assert_eq!(word_at(&assembly, 0x10000), 0x7fff_f06f);

    let (program, root) = branch_over_gap(1_048_572, |t| jal(ZERO, t));
    assert_eq!(field_errors(assemble(&program, root, 0x10000)), vec!["imm field (j_type) 1048576"]);
}

#[test]
fn test_odd_branch_target() {
    let (program, root) = branch_over_gap(3, |t| beq(ZERO, ZERO, t));
    assert_eq!(field_errors(assemble(&program, root, 0)), vec!["imm field (b_type) 7 not even"]);
}

#[test]
fn test_all_field_errors_reported_together() {
    let mut program = Program::new();
    let root = program.group_of(vec![addi(A0, ZERO, 5000), addi(A0, ZERO, -5000), words([-1])]);
    assert_eq!(
        field_errors(assemble(&program, root, 0)),
        vec!["imm field (i_type) 5000", "imm field (i_type) -5000", "words -0x1"]
    );
}

#[test]
fn test_fixed_point_is_idempotent() {
    let mut program = Program::new();
    let data = program.named_group("data");
    program.push(data, words([0xcafe_f00d_u32]));
    let load = lli(&mut program, A0, data);
    let root = program.group_of(vec![load, bne(A0, ZERO, data), space(100), data.into()]);

    let assembly = assemble(&program, root, 0x20000).expect("layout should converge");
    let mut layout = assembly.layout.clone();
    let again = encode_pass(&program, root, 0x20000, &mut layout);
    assert!(again.stabilized);
    assert!(again.errors.is_empty());
    assert_eq!(again.bytes, assembly.bytes);
    assert_eq!(layout, assembly.layout);
}

#[test]
fn test_lli_materializes_address() {
    let mut program = Program::new();
    let far = program.named_group("far");
    program.push(far, words([0]));
    let load = lli(&mut program, A0, far);
    let root = program.group_of(vec![load, space(0x1_2340), far.into()]);

    let assembly = assemble(&program, root, 0x10000).expect("layout should converge");
    let offset = assembly.address_of(far) - 0x10000;
    assert_eq!(offset, 0x1_2348);

    let Fields::U { imm: upper, .. } = decode_as(Format::U, word_at(&assembly, 0x10000)) else {
        panic!("expected auipc");
    };
    let Fields::I { imm: lower, .. } = decode_as(Format::I, word_at(&assembly, 0x10004)) else {
        panic!("expected addi");
    };
    assert_eq!(upper + lower, offset);
    assert_eq!(lower, 0x348);
}

#[test]
fn test_address_dependent_space_takes_extra_pass() {
    // the space size is the size of `b`, which is only known once `c` has
    // been placed after it
    let mut program = Program::new();
    let b = program.group_of(vec![words([0])]);
    let c = program.group();
    let root = program.group_of(vec![space(c - b), b.into(), c.into()]);

    let assembly = assemble(&program, root, 0x100).expect("layout should converge");
    assert_eq!(assembly.passes, 3);
    assert_eq!(assembly.bytes.len(), 8);
    assert_eq!(assembly.address_of(b), 0x104);
    assert_eq!(assembly.address_of(c), 0x108);
}

#[test]
fn test_cyclic_layout_hits_pass_cap() {
    // the space before `b` grows with b's own address: never stable
    let mut program = Program::new();
    let a = program.group();
    let b = program.group();
    let root = program.group_of(vec![addi(A0, ZERO, 5000), a.into(), space(b - a + 4), b.into()]);

    let options = LayoutOptions { max_passes: 6 };
    match assemble_with(&program, root, 0, &options, &NoOpCallback) {
        Err(LayoutError::NotConverged { passes, diagnostics }) => {
            assert_eq!(passes, 6);
            let messages: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
            assert_eq!(messages, vec!["imm field (i_type) 5000"]);
        }
        other => panic!("expected non-convergence, got {:?}", other.map(|a| a.passes)),
    }
}

#[test]
#[should_panic(expected = "group 0 (loop) contains itself")]
fn test_group_containing_itself_is_fatal() {
    let mut program = Program::new();
    let g = program.named_group("loop");
    program.push(g, words([1]));
    program.push(g, g);
    let _ = assemble(&program, g, 0);
}

#[test]
#[should_panic(expected = "contains itself")]
fn test_mutually_nested_groups_are_fatal() {
    let mut program = Program::new();
    let a = program.group();
    let b = program.group_of(vec![a.into()]);
    program.push(a, b);
    let _ = assemble(&program, a, 0);
}

#[test]
#[should_panic(expected = "group 0 is placed more than once in the tree")]
fn test_group_placed_twice_is_fatal() {
    let mut program = Program::new();
    let g = program.group_of(vec![words([1])]);
    let root = program.group_of(vec![g.into(), g.into()]);
    let _ = assemble(&program, root, 0);
}

#[test]
fn test_unplaced_groups_are_listed() {
    let mut program = Program::new();
    let orphan = program.named_group("orphan");
    let root = program.group_of(vec![jal(ZERO, orphan)]);

    let pass = encode_pass(&program, root, 0, &mut crate::layout::Layout::new());
    assert_eq!(pass.unplaced, vec![orphan]);

    // still lays out; the reference resolves to 0
    let assembly = assemble(&program, root, 0x100).expect("converges");
    assert_eq!(decode_as(Format::J, word_at(&assembly, 0x100)), Fields::J { rd: ZERO, offset: -0x100 });
}

struct RecordingCallback {
    passes: RefCell<Vec<(usize, bool, usize)>>,
}

impl PassCallback for RecordingCallback {
    fn on_pass(&self, pass: usize, stabilized: bool, bytes: &[u8], _: &[Diagnostic]) {
        self.passes.borrow_mut().push((pass, stabilized, bytes.len()));
    }
}

#[test]
fn test_callback_sees_every_pass() {
    let mut program = Program::new();
    let g = program.group_of(vec![ecall()]);
    let root = program.group_of(vec![jal(ZERO, g), g.into()]);

    let callback = RecordingCallback { passes: RefCell::new(Vec::new()) };
    assemble_with(&program, root, 0x400, &LayoutOptions::default(), &callback).expect("converges");
    assert_eq!(*callback.passes.borrow(), vec![(1, false, 8), (2, true, 8)]);
}

#[test]
fn test_origin_zero_single_pass() {
    let mut program = Program::new();
    let root = program.group_of(vec![addi(A0, ZERO, 1)]);
    let assembly = assemble(&program, root, 0).expect("converges");
    assert_eq!(assembly.passes, 1);
    assert_eq!(assembly.bytes, 0x0010_0513u32.to_le_bytes().to_vec());
}
