pub mod msl;
pub mod spirv;
