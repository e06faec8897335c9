// node.rs
//
// The encoding node tree.
//
// A program is a tree of Nodes rooted at a group. Groups live in an arena
// owned by Program and are referred to by GroupId, both from their parent's
// body and from Values that need the group's address. This lets a group be
// referenced before its body is filled in, and lets a group refer to itself.
// The mutable part of a group (its base address) lives in the Layout.

use crate::error::Arg;
use crate::format::{Instruction, Operands};
use crate::layout::EncodingContext;
use crate::value::{Value, resolve};
use tracing::trace;

/// Largest `space` leaf accepted before it is reported as an error
pub const MAX_SPACE: i64 = 16 * 1024 * 1024;

/// Handle to a group stored in a Program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct GroupBody {
    name: Option<String>,
    nodes: Vec<Node>,
}

/// Arena of groups making up a program tree
#[derive(Debug, Clone, Default)]
pub struct Program {
    groups: Vec<GroupBody>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, anonymous group
    pub fn group(&mut self) -> GroupId {
        self.groups.push(GroupBody::default());
        GroupId(self.groups.len() - 1)
    }

    /// Create an empty group with a name used in listings and logs
    pub fn named_group(&mut self, name: &str) -> GroupId {
        let id = self.group();
        self.groups[id.0].name = Some(name.to_string());
        id
    }

    /// Create a group holding `nodes`
    pub fn group_of(&mut self, nodes: Vec<Node>) -> GroupId {
        let id = self.group();
        self.groups[id.0].nodes = nodes;
        id
    }

    pub fn push(&mut self, group: GroupId, node: impl Into<Node>) {
        self.body_mut(group).push(node.into());
    }

    pub fn extend(&mut self, group: GroupId, nodes: impl IntoIterator<Item = Node>) {
        self.body_mut(group).extend(nodes);
    }

    pub fn body(&self, group: GroupId) -> &[Node] {
        &self.groups[group.0].nodes
    }

    pub fn name(&self, group: GroupId) -> Option<&str> {
        self.groups[group.0].name.as_deref()
    }

    /// Groups in creation order
    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.groups.len()).map(GroupId)
    }

    fn body_mut(&mut self, group: GroupId) -> &mut Vec<Node> {
        &mut self.groups[group.0].nodes
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Group(GroupId),
    Data(Data),
    Instruction(Instruction),
}

impl From<GroupId> for Node {
    fn from(id: GroupId) -> Self {
        Node::Group(id)
    }
}

impl From<Data> for Node {
    fn from(data: Data) -> Self {
        Node::Data(data)
    }
}

impl From<Instruction> for Node {
    fn from(inst: Instruction) -> Self {
        Node::Instruction(inst)
    }
}

impl Node {
    pub fn instruction(template: u32, operands: Operands) -> Self {
        Node::Instruction(Instruction { template, operands })
    }

    /// Append this node's bytes to the context's block
    ///
    /// Returns whether every group under this node kept the base address it
    /// had in the previous pass. `group` is the innermost enclosing group.
    pub fn encode(&self, cx: &mut EncodingContext<'_>, group: Option<GroupId>) -> bool {
        match self {
            Node::Group(id) => encode_group(*id, cx),
            Node::Data(data) => data.encode(cx, group),
            Node::Instruction(inst) => inst.encode(cx),
        }
    }
}

fn encode_group(id: GroupId, cx: &mut EncodingContext<'_>) -> bool {
    let start = cx.here();
    let previous = cx.layout.base(id);
    let mut stabilized = previous == start;
    if !stabilized {
        trace!(group = id.index(), name = ?cx.program.name(id), previous, start, "group moved");
    }
    cx.layout.set_base(id, start);
    cx.enter(id);

    let program = cx.program;
    for node in program.body(id) {
        let child = node.encode(cx, Some(id));
        stabilized = stabilized && child;
    }
    cx.leave(id);
    stabilized
}

// ============================================================================
// Raw Data Leaves
// ============================================================================

/// Width of an integer data item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Half,
    Word,
    Quad,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Quad => 8,
        }
    }

    fn max(self) -> i128 {
        (1i128 << (self.bytes() * 8)) - 1
    }

    fn template(self) -> &'static str {
        match self {
            Width::Byte => "bytes {}",
            Width::Half => "halfs {}",
            Width::Word => "words {}",
            Width::Quad => "quads {}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// Little-endian integers, each checked against the unsigned range of `width`
    Int(Width, Vec<Value>),
    /// UTF-8 text, no terminator
    String(String),
    /// Emits nothing; checks that the enclosing group is this many bytes long so far
    CheckSize(Value),
    /// Zero padding up to the next multiple of a power of two, at most `MAX_SPACE`
    Align(i64),
    /// A run of zero bytes
    Space(Value),
}

impl Data {
    fn encode(&self, cx: &mut EncodingContext<'_>, group: Option<GroupId>) -> bool {
        match self {
            Data::Int(width, values) => {
                for value in values {
                    let v = resolve(cx.here(), value, cx.layout);
                    cx.errors.check(
                        0 <= v && (v as i128) <= width.max(),
                        width.template(),
                        &[Arg::Hex(v)],
                    );
                    cx.block.extend_from_slice(&v.to_le_bytes()[..width.bytes()]);
                }
            }

            Data::String(text) => cx.block.extend_from_slice(text.as_bytes()),

            Data::CheckSize(size) => {
                let here = cx.here();
                match group {
                    Some(id) => {
                        let real = here - cx.layout.base(id);
                        let expected = resolve(here, size, cx.layout);
                        cx.errors.check(
                            real == expected,
                            "size mismatch {} != {}",
                            &[Arg::Int(real), Arg::Int(expected)],
                        );
                    }
                    None => cx.errors.check(false, "size check outside of a group", &[]),
                }
            }

            Data::Align(alignment) => {
                let alignment = *alignment;
                let valid = alignment > 0 && alignment <= MAX_SPACE && alignment.count_ones() == 1;
                cx.errors.check(valid, "alignment {}", &[Arg::Int(alignment)]);
                if valid {
                    let padding = (alignment - cx.here().rem_euclid(alignment)) % alignment;
                    cx.block.resize(cx.block.len() + padding as usize, 0);
                }
            }

            Data::Space(size) => {
                let size = resolve(cx.here(), size, cx.layout);
                let valid = (0..=MAX_SPACE).contains(&size);
                cx.errors.check(valid, "space size {}", &[Arg::Int(size)]);
                if valid {
                    cx.block.resize(cx.block.len() + size as usize, 0);
                }
            }
        }
        true
    }
}

// ============================================================================
// Data Constructors
// ============================================================================

fn ints<V: Into<Value>>(width: Width, values: impl IntoIterator<Item = V>) -> Node {
    Node::Data(Data::Int(width, values.into_iter().map(Into::into).collect()))
}

pub fn bytes<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Node {
    ints(Width::Byte, values)
}

pub fn halfs<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Node {
    ints(Width::Half, values)
}

pub fn words<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Node {
    ints(Width::Word, values)
}

pub fn quads<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Node {
    ints(Width::Quad, values)
}

pub fn string(text: &str) -> Node {
    Node::Data(Data::String(text.to_string()))
}

/// Like `string`, with a NUL terminator
pub fn asciz(text: &str) -> Node {
    Node::Data(Data::String(format!("{}\0", text)))
}

pub fn check_size(size: impl Into<Value>) -> Node {
    Node::Data(Data::CheckSize(size.into()))
}

/// Panics if `alignment` is not a power of two or is larger than `MAX_SPACE`.
pub fn align(alignment: u64) -> Node {
    assert!(alignment.is_power_of_two(), "alignment {} is not a power of two", alignment);
    assert!(
        alignment <= MAX_SPACE as u64,
        "alignment {} out of range (must be at most {})",
        alignment,
        MAX_SPACE
    );
    Node::Data(Data::Align(alignment as i64))
}

pub fn space(size: impl Into<Value>) -> Node {
    Node::Data(Data::Space(size.into()))
}
