//! GLSL fragment shader generation for PICA200 texture combiner materials.
//!
//! The generated program links against a fixed vertex shader and reads a host-filled uniform
//! block. Both halves of that contract are declared in [`FRAGMENT_HEADER`]; the Rust mirror of the
//! uniform block lives in [`crate::uniforms`]. Bump [`CONTRACT_VERSION`] whenever either changes.

mod lighting;
mod source;
mod stage;
mod texture;

use std::fmt::Write;

use tracing::debug;

use crate::error::GenerateError;
use crate::material::{AlphaTestFunction, MaterialDescription, RenderLayer, TEXTURE_UNIT_COUNT};
use crate::validate::validate_material;

/// Version of the varying/uniform contract shared with the vertex shader and
/// [`crate::uniforms::FragmentUniforms`].
pub const CONTRACT_VERSION: u32 = 1;

/// Generation knobs that do not change the material's meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlslOptions {
    /// Stop emitting combiner stages after this many (development aid for inspecting
    /// intermediate stage results). `None` emits every stage.
    pub stage_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct GeneratedFragmentShader {
    /// [`MaterialDescription::state_hash`] of the source material.
    pub hash: blake3::Hash,
    pub glsl: String,
    /// Bit `n` is set when texture unit `n` is sampled.
    pub texture_units_mask: u8,
    /// True when the fragment lighting loop (and its LUT sampling) was emitted.
    pub uses_fragment_lighting: bool,
}

/// Generate the fragment shader for `desc` with default options.
pub fn generate_fragment_glsl(desc: &MaterialDescription) -> Result<String, GenerateError> {
    generate_fragment_glsl_with_options(desc, GlslOptions::default())
}

pub fn generate_fragment_glsl_with_options(
    desc: &MaterialDescription,
    options: GlslOptions,
) -> Result<String, GenerateError> {
    generate_fragment_shader(desc, options).map(|shader| shader.glsl)
}

/// Validate `desc` and emit its fragment shader.
///
/// Output is a pure function of `desc` and `options`: equal inputs produce byte-identical text,
/// which hosts rely on when caching compiled programs by source.
pub fn generate_fragment_shader(
    desc: &MaterialDescription,
    options: GlslOptions,
) -> Result<GeneratedFragmentShader, GenerateError> {
    validate_material(desc)?;

    let mut ctx = EmitContext::new(desc);

    ctx.line("PickingOutput = PickingColor;");
    ctx.line("Output = vec4(0.0);");
    ctx.line("vec4 Previous = vec4(0.0);");
    ctx.line("vec4 CombBuffer = vec4(0.0);");
    ctx.line("vec4 Constant5 = ConstantColor5;");

    let stage_count = options
        .stage_limit
        .map_or(desc.stages.len(), |limit| limit.min(desc.stages.len()));
    for (index, stage) in desc.stages.iter().take(stage_count).enumerate() {
        stage::emit_stage(&mut ctx, index, stage);
    }

    emit_alpha_test(&mut ctx);
    emit_debug_ladder(&mut ctx);
    if ctx.lighting == LightingEmission::Full {
        lighting::emit_lut_debug_ladder(&mut ctx);
    }
    ctx.line("Output.rgb += SelectionColor.rgb;");
    if desc.render_layer == RenderLayer::Opaque {
        ctx.line("Output.a = 1;");
    }

    let mut glsl = String::with_capacity(FRAGMENT_HEADER.len() + ctx.body.len() + 256);
    glsl.push_str(FRAGMENT_HEADER);
    if ctx.lighting == LightingEmission::Full {
        lighting::emit_material_constants(&mut glsl, &desc.lighting);
    }
    glsl.push_str("void main() {\n");
    glsl.push_str(&ctx.body);
    glsl.push_str("}\n");

    let texture_units_mask = ctx
        .textures_emitted
        .iter()
        .enumerate()
        .filter(|(_, emitted)| **emitted)
        .fold(0u8, |mask, (unit, _)| mask | (1 << unit));
    let hash = desc.state_hash();

    debug!(
        stages = stage_count,
        texture_units_mask,
        lighting = ?ctx.lighting,
        hash = %hash.to_hex(),
        "generated PICA fragment shader"
    );

    Ok(GeneratedFragmentShader {
        hash,
        glsl,
        texture_units_mask,
        uses_fragment_lighting: ctx.lighting == LightingEmission::Full,
    })
}

/// Shader used in place of a material whose generated program failed to compile on the host.
pub fn placeholder_fragment_glsl() -> String {
    let mut glsl = String::from(FRAGMENT_HEADER);
    glsl.push_str("void main() {\n");
    glsl.push_str("    PickingOutput = PickingColor;\n");
    glsl.push_str("    Output = vec4(1.0, 0.0, 1.0, 1.0);\n");
    glsl.push_str("}\n");
    glsl
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LightingEmission {
    NotEmitted,
    /// Lighting disabled; accumulators were declared as zero.
    Zeroed,
    Full,
}

/// Per-call memo of which shared declarations have already been written.
///
/// Never outlives one generation call, so generation stays reentrant.
pub(crate) struct EmitContext<'a> {
    pub desc: &'a MaterialDescription,
    pub body: String,
    pub textures_emitted: [bool; TEXTURE_UNIT_COUNT],
    pub lighting: LightingEmission,
    depth: usize,
}

impl<'a> EmitContext<'a> {
    fn new(desc: &'a MaterialDescription) -> Self {
        Self {
            desc,
            body: String::new(),
            textures_emitted: [false; TEXTURE_UNIT_COUNT],
            lighting: LightingEmission::NotEmitted,
            depth: 1,
        }
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.body.push_str("    ");
        }
        self.body.push_str(text);
        self.body.push('\n');
    }

    /// Write `header {` and indent until the matching [`Self::close_block`].
    pub fn open_block(&mut self, header: &str) {
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(&format!("{header} {{"));
        }
        self.depth += 1;
    }

    pub fn close_block(&mut self) {
        self.depth -= 1;
        self.line("}");
    }

    /// Write `} else if (...) {` at the current block's level.
    pub fn chain_block(&mut self, header: &str) {
        self.depth -= 1;
        self.line(&format!("}} {header} {{"));
        self.depth += 1;
    }
}

/// Condition under which the fragment fails the alpha test, or `None` when it always fails.
fn alpha_discard_condition(function: AlphaTestFunction) -> Option<&'static str> {
    match function {
        AlphaTestFunction::Never => None,
        AlphaTestFunction::Equal => Some("Output.a != AlphaRef"),
        AlphaTestFunction::NotEqual => Some("Output.a == AlphaRef"),
        AlphaTestFunction::Less => Some("Output.a >= AlphaRef"),
        AlphaTestFunction::LessEqual => Some("Output.a > AlphaRef"),
        AlphaTestFunction::Greater => Some("Output.a <= AlphaRef"),
        AlphaTestFunction::GreaterEqual => Some("Output.a < AlphaRef"),
    }
}

fn emit_alpha_test(ctx: &mut EmitContext<'_>) {
    let alpha_test = ctx.desc.alpha_test;
    if !alpha_test.enabled {
        return;
    }
    match alpha_discard_condition(alpha_test.function) {
        Some(cond) => ctx.line(&format!("if ({cond}) discard;")),
        None => ctx.line("discard;"),
    }
}

/// Runtime-selected visualizations driven by the `DebugShading` uniform. Ids outside 1..=8 leave
/// the combiner output untouched.
const DEBUG_SHADING_BRANCHES: [&str; 8] = [
    "Output = vec4(VertexColor.rgb, 1.0);",
    "Output = vec4(vec3(VertexColor.a), 1.0);",
    "Output = vec4(QuatRotate(normalize(QuatNormal), vec3(0.0, 0.0, 1.0)) * 0.5 + 0.5, 1.0);",
    "Output = vec4(QuatRotate(normalize(QuatNormal), vec3(1.0, 0.0, 0.0)) * 0.5 + 0.5, 1.0);",
    "Output = vec4(TexCoord0.xy, 0.0, 1.0);",
    "Output = vec4(TexCoord1.xy, 0.0, 1.0);",
    "Output = vec4(TexCoord2.xy, 0.0, 1.0);",
    "Output = vec4(CombBuffer.rgb, 1.0);",
];

fn emit_debug_ladder(ctx: &mut EmitContext<'_>) {
    emit_ladder(ctx, "DebugShading", &DEBUG_SHADING_BRANCHES);
}

pub(crate) fn emit_ladder(ctx: &mut EmitContext<'_>, selector: &str, branches: &[&str]) {
    let mut header = String::new();
    for (i, branch) in branches.iter().enumerate() {
        header.clear();
        let _ = write!(header, "if ({selector} == {})", i + 1);
        if i == 0 {
            ctx.open_block(&header);
        } else {
            ctx.chain_block(&format!("else {header}"));
        }
        ctx.line(branch);
    }
    if !branches.is_empty() {
        ctx.close_block();
    }
}

/// Declarations shared with the fixed vertex shader and the host's uniform buffer.
///
/// Layout must match [`crate::uniforms::FragmentUniforms`] (std140).
pub const FRAGMENT_HEADER: &str = r#"#version 330 core
// PICA TEV fragment contract version 1

#define MAX_LIGHTS 3
#define LUT_ROWS 12
#define LUT_DIST0 0
#define LUT_DIST1 1
#define LUT_FRESNEL 2
#define LUT_REFLEC_R 3
#define LUT_REFLEC_G 4
#define LUT_REFLEC_B 5
#define LUT_SPOT 6
#define LUT_DIST_ATT 9

struct Light {
    vec4 Position;
    vec4 Direction;
    vec4 Ambient;
    vec4 Diffuse;
    vec4 Specular0;
    vec4 Specular1;
    vec4 ConstantColor5;
    float AttScale;
    float AttBias;
    float AngleLutScale;
    int AngleLutInput;
    int SpotAttEnabled;
    int DistAttEnabled;
    int TwoSidedDiffuse;
    int Directional;
    int DisableConst5;
};

layout(std140) uniform FragmentUniforms {
    Light Lights[MAX_LIGHTS];
    vec4 ConstantColor0;
    vec4 ConstantColor1;
    vec4 ConstantColor2;
    vec4 ConstantColor3;
    vec4 ConstantColor4;
    vec4 ConstantColor5;
    vec4 DiffuseColor;
    vec4 AmbientColor;
    vec4 Specular0Color;
    vec4 Specular1Color;
    vec4 EmissionColor;
    vec4 SelectionColor;
    vec4 PickingColor;
    vec3 CameraView;
    float AlphaRef;
    int LightCount;
    int DebugShading;
    int DebugLut;
};

uniform sampler2D Textures[3];
uniform samplerCube TextureCube;
uniform sampler2D LutTexture;

in vec4 QuatNormal;
in vec4 VertexColor;
in vec4 TexCoord0;
in vec4 TexCoord1;
in vec4 TexCoord2;
in vec3 ViewVector;

layout(location = 0) out vec4 Output;
layout(location = 1) out vec4 PickingOutput;

vec3 QuatRotate(vec4 q, vec3 v) {
    return v + 2.0 * cross(q.xyz, cross(q.xyz, v) + q.w * v);
}

float SampleLut(int row, float index) {
    vec2 uv = vec2(clamp(index, 0.0, 1.0), (float(row) + 0.5) / float(LUT_ROWS));
    return texture(LutTexture, uv).r;
}

float CosPhi(vec3 n, vec3 h, vec3 t) {
    vec3 projected = h - n * dot(n, h);
    float len = length(projected);
    return len > 0.0 ? dot(projected / len, t) : 0.0;
}

float LutInput(int kind, vec3 n, vec3 l, vec3 v, vec3 h, vec3 t, vec3 s) {
    switch (kind) {
    case 0: return dot(n, h);
    case 1: return dot(v, h);
    case 2: return dot(n, v);
    case 3: return dot(l, n);
    case 4: return dot(-l, s);
    default: return CosPhi(n, h, t);
    }
}

"#;
