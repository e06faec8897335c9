// dump.rs
//
// Human-readable views of the layout: a per-pass progress table and a listing
// of the final image.

use crate::assembler::PassCallback;
use crate::decoder::decode;
use crate::error::Diagnostic;
use crate::node::{GroupId, Program};
use std::fmt::Write;

/// Prints convergence progress to stderr, one row per pass
pub struct ProgressCallback;

impl ProgressCallback {
    pub fn print_header(&self) {
        eprintln!("Convergence:");
        eprintln!("  Pass    Size  Errors  Stable");
        eprintln!("  ----  ------  ------  ------");
    }
}

impl PassCallback for ProgressCallback {
    fn on_pass(&self, pass: usize, stabilized: bool, bytes: &[u8], diagnostics: &[Diagnostic]) {
        eprintln!(
            "  {:4}  {:6}  {:6}  {:>6}",
            pass,
            bytes.len(),
            diagnostics.len(),
            if stabilized { "yes" } else { "no" }
        );
    }
}

/// List an image as 32-bit words with their disassembly
///
/// `labels` (address, name) are printed above the word containing them.
/// A trailing partial word is shown as raw bytes.
pub fn dump_code(bytes: &[u8], origin: i64, labels: &[(i64, &str)]) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(4).enumerate() {
        let address = origin + (i * 4) as i64;
        for (_, name) in labels.iter().filter(|(a, _)| (address..address + 4).contains(a)) {
            let _ = writeln!(out, "{}:", name);
        }
        if let Ok(word) = <[u8; 4]>::try_from(chunk) {
            let word = u32::from_le_bytes(word);
            let _ = writeln!(out, "  {:08x}:  {:08x}  {}", address, word, decode(word));
        } else {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let _ = writeln!(out, "  {:08x}:  {}", address, hex.join(" "));
        }
    }
    out
}

/// Named groups and their resolved addresses, sorted by address
pub fn labels(program: &Program, address_of: impl Fn(GroupId) -> i64) -> Vec<(i64, &str)> {
    let mut labels: Vec<(i64, &str)> = program
        .groups()
        .filter_map(|id| program.name(id).map(|name| (address_of(id), name)))
        .collect();
    labels.sort();
    labels
}
