//! Per-fragment lighting: the block behind the `FragmentPrimaryColor` and
//! `FragmentSecondaryColor` combiner sources.
//!
//! Which LUT terms take part is fixed per material, so they are resolved here at generation
//! time. Per-light state (count, spot/distance attenuation, two-sided diffuse) lives in the
//! `Lights` uniform array and is branched on at run time.

use std::fmt::Write;

use tracing::trace;

use super::{emit_ladder, texture, EmitContext, LightingEmission};
use crate::material::{BumpMode, FresnelSelector, LutFlags, LutInput, MaterialLightingConfig};

/// Declare `FragPriColor`/`FragSecColor` the first time a stage reads either of them.
pub(crate) fn emit_lighting_once(ctx: &mut EmitContext<'_>) {
    if ctx.lighting != LightingEmission::NotEmitted {
        return;
    }

    let config = ctx.desc.lighting;
    if !config.fragment_lighting_enabled {
        ctx.lighting = LightingEmission::Zeroed;
        trace!("fragment lighting disabled; zeroing accumulators");
        ctx.line("vec4 FragPriColor = vec4(0.0);");
        ctx.line("vec4 FragSecColor = vec4(0.0);");
        return;
    }

    ctx.lighting = LightingEmission::Full;
    trace!(
        bump_mode = ?config.bump_mode,
        luts = ?config.luts_enabled,
        fresnel = ?config.fresnel,
        "emitting fragment lighting block"
    );

    let bump_unit = config.bump_unit();
    if let Some(unit) = bump_unit {
        texture::emit_texture_once(ctx, unit);
    }

    ctx.line("vec4 FragPriColor = vec4(0.0, 0.0, 0.0, 1.0);");
    ctx.line("vec4 FragSecColor = vec4(0.0, 0.0, 0.0, 1.0);");
    for name in LUT_DEBUG_VALUES {
        ctx.line(&format!("float {name} = 0.0;"));
    }

    emit_surface_frame(ctx, &config, bump_unit);
    emit_light_loop(ctx, &config);

    ctx.line("FragPriColor = clamp(FragPriColor, 0.0, 1.0);");
    ctx.line("FragSecColor = clamp(FragSecColor, 0.0, 1.0);");
}

fn emit_surface_frame(
    ctx: &mut EmitContext<'_>,
    config: &MaterialLightingConfig,
    bump_unit: Option<usize>,
) {
    ctx.line("vec3 SurfNormal = vec3(0.0, 0.0, 1.0);");
    ctx.line("vec3 SurfTangent = vec3(1.0, 0.0, 0.0);");

    let perturbed = match (config.bump_mode, bump_unit) {
        (BumpMode::AsBump, Some(unit)) => Some(("SurfNormal", unit)),
        (BumpMode::AsTangent, Some(unit)) => Some(("SurfTangent", unit)),
        _ => None,
    };
    if let Some((target, unit)) = perturbed {
        ctx.line(&format!("{target} = Color{unit}.xyz * 2.0 - 1.0;"));
        if config.renormalize_z {
            ctx.line(&format!(
                "{target}.z = sqrt(max(1.0 - dot({target}.xy, {target}.xy), 0.0));"
            ));
        }
    }

    ctx.line("vec4 NormalQuat = normalize(QuatNormal);");
    ctx.line("vec3 Normal = QuatRotate(NormalQuat, SurfNormal);");
    ctx.line("vec3 Tangent = QuatRotate(NormalQuat, SurfTangent);");
    ctx.line("vec3 View = normalize(ViewVector);");
}

fn emit_light_loop(ctx: &mut EmitContext<'_>, config: &MaterialLightingConfig) {
    let flags = config.luts_enabled;
    let luts = &config.luts;

    ctx.open_block("for (int i = 0; i < min(LightCount, MAX_LIGHTS); i++)");
    ctx.line("Light light = Lights[i];");
    ctx.line(
        "vec3 LightVector = light.Directional != 0 ? normalize(light.Position.xyz) \
         : normalize(light.Position.xyz + ViewVector);",
    );
    ctx.line("vec3 SpotDirection = normalize(light.Direction.xyz);");
    ctx.line("vec3 HalfVector = normalize(LightVector + View);");
    ctx.line("float NdotL = dot(Normal, LightVector);");
    ctx.line(
        "float DiffuseDot = light.TwoSidedDiffuse != 0 ? abs(NdotL) : clamp(NdotL, 0.0, 1.0);",
    );

    ctx.line("float SpotAtt = 1.0;");
    ctx.line(
        "if (light.SpotAttEnabled != 0) SpotAtt = SampleLut(LUT_SPOT + i, light.AngleLutScale * \
         LutInput(light.AngleLutInput, Normal, LightVector, View, HalfVector, Tangent, \
         SpotDirection));",
    );
    ctx.line("float DistAtt = 1.0;");
    ctx.line(
        "if (light.DistAttEnabled != 0) DistAtt = SampleLut(LUT_DIST_ATT + i, \
         light.AttBias + light.AttScale * length(light.Position.xyz + ViewVector));",
    );

    ctx.line(
        "FragPriColor.rgb += AmbientColor.rgb * light.Ambient.rgb + \
         DiffuseColor.rgb * light.Diffuse.rgb * DiffuseDot;",
    );

    let mut specular0 = vec!["Specular0Color.rgb", "light.Specular0.rgb"];
    let mut specular1 = vec!["Specular1Color.rgb", "light.Specular1.rgb"];

    if flags.contains(LutFlags::DIST0) {
        emit_lut_sample(ctx, "Dist0", "LUT_DIST0", luts.dist0.input);
        specular0.push("Dist0");
    }
    if flags.contains(LutFlags::REFLECTION) {
        emit_lut_sample(ctx, "ReflecR", "LUT_REFLEC_R", luts.reflec_r.input);
        emit_lut_sample(ctx, "ReflecG", "LUT_REFLEC_G", luts.reflec_g.input);
        emit_lut_sample(ctx, "ReflecB", "LUT_REFLEC_B", luts.reflec_b.input);
        ctx.line("vec3 Reflection = vec3(ReflecR, ReflecG, ReflecB);");
        specular1.push("Reflection");
    }
    if flags.contains(LutFlags::DIST1) {
        emit_lut_sample(ctx, "Dist1", "LUT_DIST1", luts.dist1.input);
        specular1.push("Dist1");
    }
    if flags.geo_factor0() || flags.geo_factor1() {
        ctx.line("vec3 HalfRaw = LightVector + View;");
        ctx.line("float GeoFactor = NdotL / max(dot(HalfRaw, HalfRaw), 0.0001);");
        if flags.geo_factor0() {
            specular0.push("GeoFactor");
        }
        if flags.geo_factor1() {
            specular1.push("GeoFactor");
        }
    }

    ctx.line(&format!("vec3 Specular0 = {};", specular0.join(" * ")));
    ctx.line(&format!("vec3 Specular1 = {};", specular1.join(" * ")));

    if config.clamp_highlight {
        ctx.line("float ClampMask = NdotL > 0.0 ? 1.0 : 0.0;");
        ctx.line("FragSecColor.rgb += (Specular0 + Specular1) * SpotAtt * DistAtt * ClampMask;");
    } else {
        ctx.line("FragSecColor.rgb += (Specular0 + Specular1) * SpotAtt * DistAtt;");
    }

    if config.fresnel != FresnelSelector::None {
        emit_lut_sample(ctx, "Fresnel", "LUT_FRESNEL", luts.fresnel.input);
        if matches!(config.fresnel, FresnelSelector::Primary | FresnelSelector::Both) {
            ctx.line("FragPriColor.a = Fresnel;");
        }
        if matches!(config.fresnel, FresnelSelector::Secondary | FresnelSelector::Both) {
            ctx.line("FragSecColor.a = Fresnel;");
        }
    }

    ctx.line("if (light.DisableConst5 == 0) Constant5 = light.ConstantColor5;");
    ctx.close_block();
}

/// Sample one material LUT row into `float {name}` and mirror it into the debug value.
fn emit_lut_sample(ctx: &mut EmitContext<'_>, name: &str, row: &str, input: LutInput) {
    ctx.line(&format!(
        "float {name} = SampleLut({row}, LutScale{name} * {});",
        lut_input_expr(input)
    ));
    ctx.line(&format!("Lut{name} = {name};"));
}

fn lut_input_expr(input: LutInput) -> &'static str {
    match input {
        LutInput::NormalHalf => "dot(Normal, HalfVector)",
        LutInput::ViewHalf => "dot(View, HalfVector)",
        LutInput::NormalView => "dot(Normal, View)",
        LutInput::LightNormal => "dot(LightVector, Normal)",
        LutInput::LightSpot => "dot(-LightVector, SpotDirection)",
        LutInput::CosPhi => "CosPhi(Normal, HalfVector, Tangent)",
    }
}

/// Locals holding the last sampled value of each material LUT, shown by the `DebugLut` ladder.
const LUT_DEBUG_VALUES: [&str; 6] = [
    "LutDist0",
    "LutDist1",
    "LutFresnel",
    "LutReflecR",
    "LutReflecG",
    "LutReflecB",
];

/// Write `const float LutScaleX` for every LUT the light loop samples.
pub(crate) fn emit_material_constants(glsl: &mut String, config: &MaterialLightingConfig) {
    let flags = config.luts_enabled;
    let luts = &config.luts;
    let mut scales = Vec::with_capacity(6);
    if flags.contains(LutFlags::DIST0) {
        scales.push(("Dist0", luts.dist0.scale));
    }
    if flags.contains(LutFlags::DIST1) {
        scales.push(("Dist1", luts.dist1.scale));
    }
    if config.fresnel != FresnelSelector::None {
        scales.push(("Fresnel", luts.fresnel.scale));
    }
    if flags.contains(LutFlags::REFLECTION) {
        scales.push(("ReflecR", luts.reflec_r.scale));
        scales.push(("ReflecG", luts.reflec_g.scale));
        scales.push(("ReflecB", luts.reflec_b.scale));
    }

    for (name, scale) in scales {
        let _ = writeln!(glsl, "const float LutScale{name} = {};", glsl_float(scale));
    }
    glsl.push('\n');
}

/// Finite `f32` as a GLSL float literal. `Debug` always keeps a decimal point or exponent.
fn glsl_float(value: f32) -> String {
    format!("{value:?}")
}

pub(crate) fn emit_lut_debug_ladder(ctx: &mut EmitContext<'_>) {
    let branches: Vec<String> = LUT_DEBUG_VALUES
        .iter()
        .map(|name| format!("Output = vec4(vec3({name}), 1.0);"))
        .collect();
    let branches: Vec<&str> = branches.iter().map(String::as_str).collect();
    emit_ladder(ctx, "DebugLut", &branches);
}
