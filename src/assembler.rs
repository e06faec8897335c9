// assembler.rs
//
// Fixpoint layout driver.
//
// The whole tree is re-encoded from the origin until no group's base address
// changes between two passes. Instructions are fixed-width, so this normally
// takes two passes; space and align leaves whose size depends on addresses
// can take more, and a cyclic dependency is stopped by a pass cap.

use crate::error::{Diagnostic, ErrorSink, LayoutError, Result};
use crate::layout::{EncodingContext, Layout};
use crate::node::{GroupId, Node, Program};
use tracing::{debug, info, warn};

/// Default cap on layout passes
pub const MAX_PASSES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub max_passes: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions { max_passes: MAX_PASSES }
    }
}

/// Output of one encoding pass
#[derive(Debug)]
pub struct Pass {
    pub bytes: Vec<u8>,
    pub errors: ErrorSink,
    /// True if every group kept the base address it had in the previous pass
    pub stabilized: bool,
    /// Groups in the program that the tree under the root never reached
    pub unplaced: Vec<GroupId>,
}

/// A converged, error-free layout
#[derive(Debug, Clone)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub origin: i64,
    pub passes: usize,
    pub layout: Layout,
}

impl Assembly {
    /// Resolved address of a group
    pub fn address_of(&self, group: GroupId) -> i64 {
        self.layout.base(group)
    }

    /// Address just past the last byte
    pub fn end(&self) -> i64 {
        self.origin + self.bytes.len() as i64
    }
}

/// Callback trait for per-pass inspection
///
/// Allows the binary to show convergence progress or dump intermediate
/// images without coupling the driver to any output format.
pub trait PassCallback {
    fn on_pass(&self, pass: usize, stabilized: bool, bytes: &[u8], diagnostics: &[Diagnostic]);
}

/// No-op callback for production use
pub struct NoOpCallback;

impl PassCallback for NoOpCallback {
    fn on_pass(&self, _: usize, _: bool, _: &[u8], _: &[Diagnostic]) {}
}

/// Encode the tree under `root` once, starting at `origin`
///
/// Updates the base address of every group reached and reports whether all
/// of them were already at those addresses.
pub fn encode_pass(program: &Program, root: GroupId, origin: i64, layout: &mut Layout) -> Pass {
    let mut cx = EncodingContext::new(program, origin, layout);
    let stabilized = Node::Group(root).encode(&mut cx, None);
    let unplaced = cx.unplaced();
    Pass { bytes: cx.block, errors: cx.errors, stabilized, unplaced }
}

/// Lay out and encode a program with default options
pub fn assemble(program: &Program, root: GroupId, origin: i64) -> Result<Assembly> {
    assemble_with(program, root, origin, &LayoutOptions::default(), &NoOpCallback)
}

/// Repeat encoding passes until the layout reaches a fixed point
///
/// Only the diagnostics of the final pass are reported, whether it converged
/// or hit the pass cap: earlier passes checked fields against addresses that
/// were still moving.
pub fn assemble_with<C: PassCallback>(
    program: &Program,
    root: GroupId,
    origin: i64,
    options: &LayoutOptions,
    callback: &C,
) -> Result<Assembly> {
    let mut layout = Layout::new();
    let mut last_errors = ErrorSink::new();

    for pass_number in 1..=options.max_passes {
        let pass = encode_pass(program, root, origin, &mut layout);
        debug!(
            pass = pass_number,
            size = pass.bytes.len(),
            stabilized = pass.stabilized,
            errors = pass.errors.len(),
            "layout pass"
        );
        callback.on_pass(pass_number, pass.stabilized, &pass.bytes, pass.errors.diagnostics());

        if pass.stabilized {
            for id in &pass.unplaced {
                warn!(
                    group = id.index(),
                    name = ?program.name(*id),
                    "group is not placed in the tree; its address resolves to 0"
                );
            }
            if !pass.errors.is_empty() {
                return Err(LayoutError::Fields(pass.errors.into_diagnostics()));
            }
            info!(passes = pass_number, size = pass.bytes.len(), "layout converged");
            return Ok(Assembly { bytes: pass.bytes, origin, passes: pass_number, layout });
        }
        last_errors = pass.errors;
    }

    warn!(passes = options.max_passes, errors = last_errors.len(), "layout did not converge");
    Err(LayoutError::NotConverged {
        passes: options.max_passes,
        diagnostics: last_errors.into_diagnostics(),
    })
}
