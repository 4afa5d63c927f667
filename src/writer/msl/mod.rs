//! Metal Shading Language text generation.

pub mod generator;
pub mod namer;

#[cfg(test)]
pub mod test;

pub use generator::{GeneratorImpl, INDENT_WIDTH};
pub use namer::Namer;

#[derive(Debug, Clone)]
pub struct Options {
    /// Start the output with `#include <metal_stdlib>`.
    pub include_header: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_header: true,
        }
    }
}
