use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GenerateError;
use crate::material::MaterialDescription;
use crate::shader_gen::{
    generate_fragment_shader, placeholder_fragment_glsl, GeneratedFragmentShader, GlslOptions,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries replaced by the placeholder after a host compile failure.
    pub placeholders: u64,
}

/// Generated fragment shaders keyed by [`MaterialDescription::state_hash`].
///
/// Generation errors are returned to the caller and never cached.
#[derive(Debug, Default)]
pub struct FragmentShaderCache {
    options: GlslOptions,
    shaders: HashMap<blake3::Hash, Arc<GeneratedFragmentShader>>,
    stats: ShaderCacheStats,
}

impl FragmentShaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries are all generated with `options`.
    pub fn with_options(options: GlslOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> ShaderCacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn get_or_generate(
        &mut self,
        desc: &MaterialDescription,
    ) -> Result<Arc<GeneratedFragmentShader>, GenerateError> {
        let hash = desc.state_hash();
        if let Some(existing) = self.shaders.get(&hash) {
            self.stats.hits += 1;
            return Ok(Arc::clone(existing));
        }

        let generated = Arc::new(generate_fragment_shader(desc, self.options)?);
        self.shaders.insert(hash, Arc::clone(&generated));
        self.stats.misses += 1;
        debug!(hash = %hash.to_hex(), entries = self.shaders.len(), "cached fragment shader");
        Ok(generated)
    }

    /// Replace the entry for `hash` with the placeholder shader after the host failed to compile
    /// it. Later lookups of the same material get the placeholder instead of retrying.
    ///
    /// Returns `None` if `hash` was never cached.
    pub fn report_compile_failure(
        &mut self,
        hash: &blake3::Hash,
        compile_log: &str,
    ) -> Option<Arc<GeneratedFragmentShader>> {
        let entry = self.shaders.get_mut(hash)?;
        warn!(
            hash = %hash.to_hex(),
            log = compile_log,
            "fragment shader failed to compile; substituting placeholder"
        );

        let placeholder = Arc::new(GeneratedFragmentShader {
            hash: *hash,
            glsl: placeholder_fragment_glsl(),
            texture_units_mask: 0,
            uses_fragment_lighting: false,
        });
        *entry = Arc::clone(&placeholder);
        self.stats.placeholders += 1;
        Some(placeholder)
    }
}
