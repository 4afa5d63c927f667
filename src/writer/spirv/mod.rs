//! Binary IR generation.
//!
//! [`Builder`] lowers a resolved [`Module`](crate::ast::Module) into SPIR-V
//! instructions grouped by module section. Every value gets a numeric id
//! counted from 1; types and constants are deduplicated by structure, so the
//! first use of a type or value decides its id.

pub mod builder;
pub mod expression;
pub mod function;
pub mod instruction;
pub mod statement;

#[cfg(test)]
pub mod test;

pub use builder::Builder;
pub use function::Function;
pub use instruction::{Instruction, Op, Operand, dump_instructions};

pub const MAGIC_NUMBER: u32 = 0x0723_0203;
/// SPIR-V 1.3.
pub const VERSION: u32 = 0x0001_0300;

#[derive(Debug, Clone)]
pub struct Options {
    /// Emit `OpName` for variables, parameters and functions.
    pub emit_debug_names: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            emit_debug_names: true,
        }
    }
}
