pub mod assembler;
pub mod config;
pub mod decoder;
pub mod dump;
pub mod elf;
pub mod error;
pub mod fields;
pub mod format;
pub mod layout;
pub mod node;
pub mod opcodes;
pub mod register;
pub mod samples;
pub mod value;

#[cfg(test)]
mod assembler_tests;
#[cfg(test)]
mod samples_tests;
