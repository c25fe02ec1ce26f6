//! PICA200 texture combiner (TEV) to GLSL fragment shader generation.
//!
//! A [`MaterialDescription`] captures one material's combiner stages, fragment lighting, alpha
//! test and texture bindings. [`generate_fragment_glsl`] turns it into GLSL 330 core source that
//! links against a fixed vertex shader and reads the [`uniforms::FragmentUniforms`] block.
//!
//! Descriptions usually come from model files via serde, or from raw GPU register words via
//! [`regs`]. [`FragmentShaderCache`] memoizes generated programs by
//! [`MaterialDescription::state_hash`].

pub mod cache;
pub mod error;
pub mod material;
pub mod regs;
pub mod shader_gen;
pub mod uniforms;
pub mod validate;

pub use cache::{FragmentShaderCache, ShaderCacheStats};
pub use error::GenerateError;
pub use material::*;
pub use shader_gen::{
    generate_fragment_glsl, generate_fragment_glsl_with_options, generate_fragment_shader,
    placeholder_fragment_glsl, GeneratedFragmentShader, GlslOptions, CONTRACT_VERSION,
};
pub use validate::validate_material;
