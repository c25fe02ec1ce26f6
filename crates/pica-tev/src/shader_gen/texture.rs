use tracing::trace;

use super::EmitContext;
use crate::material::{TexCoordConfig, TextureMapping};

/// Declare `ColorN` for `unit` unless an earlier stage (or the lighting block) already did.
pub(crate) fn emit_texture_once(ctx: &mut EmitContext<'_>, unit: usize) {
    if ctx.textures_emitted[unit] {
        return;
    }
    ctx.textures_emitted[unit] = true;

    let mapping = ctx.desc.textures[unit].mapping;
    let sample = sample_expr(unit, mapping, ctx.desc.tex_coord_config);
    trace!(unit, ?mapping, "emitting texture sample");
    ctx.line(&format!("vec4 Color{unit} = {sample};"));
}

fn sample_expr(unit: usize, mapping: TextureMapping, config: TexCoordConfig) -> String {
    let coord_set = config.coord_set(unit);
    match mapping {
        TextureMapping::Normal => format!("texture(Textures[{unit}], TexCoord{coord_set}.xy)"),
        TextureMapping::ProjectionMap => {
            format!("textureProj(Textures[{unit}], TexCoord{coord_set})")
        }
        // Only unit 0 may be cube mapped; it reads the dedicated cube sampler instead of
        // `Textures[0]`.
        TextureMapping::CameraCubeEnvMap => {
            format!("texture(TextureCube, TexCoord{coord_set}.xyz)")
        }
    }
}
