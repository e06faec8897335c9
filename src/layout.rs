// layout.rs
//
// This module holds the address layout of a program: the base address of every
// group as of the most recent encoding pass. It is kept apart from the node tree
// so the tree stays immutable while the layout is rewritten on every pass.

use crate::error::ErrorSink;
use crate::node::{GroupId, Program};

/// Resolved group base addresses
///
/// Groups that have never been encoded have base address 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    bases: Vec<i64>,
}

impl Layout {
    /// Create a new empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Base address of a group
    pub fn base(&self, group: GroupId) -> i64 {
        self.bases.get(group.index()).copied().unwrap_or(0)
    }

    /// Record a group's base address for the current pass
    pub fn set_base(&mut self, group: GroupId, address: i64) {
        let index = group.index();
        if index >= self.bases.len() {
            self.bases.resize(index + 1, 0);
        }
        self.bases[index] = address;
    }
}

/// Where a group stands in the current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Visit {
    #[default]
    Unplaced,
    Open,
    Closed,
}

/// State threaded through one encoding pass
pub struct EncodingContext<'a> {
    pub program: &'a Program,
    /// Address of the first byte of `block`
    pub origin: i64,
    /// Bytes emitted so far in this pass
    pub block: Vec<u8>,
    pub errors: ErrorSink,
    pub layout: &'a mut Layout,
    visits: Vec<Visit>,
}

impl<'a> EncodingContext<'a> {
    pub fn new(program: &'a Program, origin: i64, layout: &'a mut Layout) -> Self {
        EncodingContext {
            program,
            origin,
            block: Vec::new(),
            errors: ErrorSink::new(),
            layout,
            visits: vec![Visit::Unplaced; program.groups().count()],
        }
    }

    /// The address about to be written
    pub fn here(&self) -> i64 {
        self.origin + self.block.len() as i64
    }

    /// Mark a group as being encoded
    ///
    /// Panics if the group is already open (it contains itself) or was
    /// already placed earlier in this pass: the program must be a tree.
    pub fn enter(&mut self, group: GroupId) {
        let visit = &mut self.visits[group.index()];
        match *visit {
            Visit::Unplaced => *visit = Visit::Open,
            Visit::Open => panic!("{} contains itself", describe(self.program, group)),
            Visit::Closed => {
                panic!("{} is placed more than once in the tree", describe(self.program, group))
            }
        }
    }

    pub fn leave(&mut self, group: GroupId) {
        self.visits[group.index()] = Visit::Closed;
    }

    /// Groups that were not placed anywhere under the root in this pass
    pub fn unplaced(&self) -> Vec<GroupId> {
        self.program
            .groups()
            .filter(|id| self.visits[id.index()] == Visit::Unplaced)
            .collect()
    }
}

fn describe(program: &Program, group: GroupId) -> String {
    match program.name(group) {
        Some(name) => format!("group {} ({})", group.index(), name),
        None => format!("group {}", group.index()),
    }
}
