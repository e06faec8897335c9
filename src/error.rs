// error.rs
//
// Error types for the layout engine.
//
// Field-level problems are collected as Diagnostic records during a pass and
// only formatted when they are reported. Driver-level failures are LayoutError.

use std::fmt;
use thiserror::Error;

/// A positional argument of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Hex(i64),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Hex(v) if v < 0 => write!(f, "-0x{:x}", v.unsigned_abs()),
            Arg::Hex(v) => write!(f, "0x{:x}", v),
        }
    }
}

/// A deferred-format error record: a template with `{}` placeholders plus
/// the arguments that fill them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub template: &'static str,
    pub args: Vec<Arg>,
}

impl Diagnostic {
    pub fn new(template: &'static str, args: Vec<Arg>) -> Self {
        Diagnostic { template, args }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = self.args.iter();
        let mut pieces = self.template.split("{}");
        if let Some(first) = pieces.next() {
            f.write_str(first)?;
        }
        for piece in pieces {
            match args.next() {
                Some(arg) => write!(f, "{}", arg)?,
                None => f.write_str("{}")?,
            }
            f.write_str(piece)?;
        }
        Ok(())
    }
}

/// Per-pass collection of diagnostics
#[derive(Debug, Default)]
pub struct ErrorSink {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic unless `condition` holds
    pub fn check(&mut self, condition: bool, template: &'static str, args: &[Arg]) {
        if !condition {
            self.diagnostics.push(Diagnostic::new(template, args.to_vec()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Failure of a complete layout run
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("{} field error(s):\n{}", .0.len(), format_diagnostics(.0))]
    Fields(Vec<Diagnostic>),

    /// `diagnostics` are the field errors of the last pass attempted
    #[error("layout did not converge after {passes} passes (cyclic address dependency?)")]
    NotConverged { passes: usize, diagnostics: Vec<Diagnostic> },
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| format!("  {}", d)).collect::<Vec<_>>().join("\n")
}

pub type Result<T> = std::result::Result<T, LayoutError>;
