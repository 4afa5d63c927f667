//! Shading-language compiler core: parses a WGSL dialect, resolves types and
//! address spaces, and writes SPIR-V style instructions or Metal source.

pub mod arena;
pub mod ast;
pub mod diagnostic;
pub mod glsl_std;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod source;
pub mod writer;

use thiserror::Error;
use tracing::debug;

use crate::diagnostic::Diagnostics;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::writer::{msl, spirv};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Name shown in rendered reports.
    pub file_name: String,
    /// Generate SPIR-V when set.
    pub spirv: Option<spirv::Options>,
    /// Generate Metal source when set.
    pub msl: Option<msl::Options>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            file_name: "<input>".to_string(),
            spirv: Some(spirv::Options::default()),
            msl: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Output {
    pub spirv: Option<Vec<u32>>,
    /// Text form of `spirv`, one instruction per line.
    pub spirv_dump: Option<String>,
    pub msl: Option<String>,
    /// Non-fatal diagnostics collected along the way.
    pub warnings: Diagnostics,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error:\n{}", .0.error())]
    Parse(Diagnostics),
    #[error("semantic error:\n{}", .0.error())]
    Resolve(Diagnostics),
    #[error("{backend} generation failed:\n{message}")]
    Generate {
        backend: &'static str,
        message: String,
    },
}

impl Error {
    /// Annotated report against the source the error came from.
    pub fn report(&self, file: &str, source: &str, color: bool) -> String {
        match self {
            Error::Parse(diagnostics) | Error::Resolve(diagnostics) => {
                diagnostics.report(file, source, color)
            }
            Error::Generate { .. } => self.to_string(),
        }
    }
}

/// Parses, resolves and generates every backend enabled in `options`.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Output, Error> {
    debug!(file = %options.file_name, bytes = source.len(), "compiling");

    let mut parser = Parser::new(source);
    let parsed = parser.parse();
    let (mut module, mut warnings) = parser.into_parts();
    if !parsed || warnings.has_error() {
        return Err(Error::Parse(warnings));
    }

    let (resolved, diagnostics) = {
        let mut resolver = Resolver::new(&mut module);
        let resolved = resolver.resolve();
        (resolved, resolver.into_diagnostics())
    };
    if !resolved || diagnostics.has_error() {
        return Err(Error::Resolve(diagnostics));
    }
    warnings.extend(diagnostics);

    let mut output = Output {
        warnings,
        ..Output::default()
    };

    if let Some(spirv_options) = &options.spirv {
        let mut builder = spirv::Builder::with_options(&module, spirv_options.clone());
        if !builder.generate() {
            return Err(Error::Generate {
                backend: "spirv",
                message: builder.error(),
            });
        }
        output.spirv = Some(builder.module_words());
        output.spirv_dump = Some(builder.dump());
    }

    if let Some(msl_options) = &options.msl {
        let mut generator = msl::GeneratorImpl::with_options(&module, msl_options.clone());
        if !generator.generate() {
            return Err(Error::Generate {
                backend: "msl",
                message: generator.error(),
            });
        }
        output.msl = Some(generator.into_result());
    }

    debug!(file = %options.file_name, "compiled");
    Ok(output)
}
