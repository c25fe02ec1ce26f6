use super::source::{constant_expr, resolve_argument, Component};
use super::{lighting, texture, EmitContext};
use crate::material::{CombineMode, CombinerOperand, CombinerSource, CombinerStage};

/// Emit one combiner stage, leaving its committed result in both `Output` and `Previous`.
pub(crate) fn emit_stage(ctx: &mut EmitContext<'_>, index: usize, stage: &CombinerStage) {
    ctx.line(&format!("// stage {index}"));
    let constant = constant_expr(stage.constant);

    if !stage.pass_through_color {
        let args = resolve_arguments(
            ctx,
            &stage.color_sources,
            &stage.color_operands,
            constant,
            Component::Color,
        );
        let expr = color_combine_expr(stage.color_mode, &args);
        ctx.line(&format!("Output.rgb = {expr};"));
    }
    if !stage.pass_through_alpha {
        let args = resolve_arguments(
            ctx,
            &stage.alpha_sources,
            &stage.alpha_operands,
            constant,
            Component::Alpha,
        );
        let expr = alpha_combine_expr(stage.alpha_mode, &args);
        ctx.line(&format!("Output.a = {expr};"));
    }

    // The combiner buffer captures the unscaled result.
    if stage.updates_color_buffer {
        ctx.line("CombBuffer.rgb = Output.rgb;");
    }
    if stage.updates_alpha_buffer {
        ctx.line("CombBuffer.a = Output.a;");
    }

    if !stage.pass_through_color && stage.color_scale != 1 {
        ctx.line(&format!(
            "Output.rgb = min(Output.rgb * {}.0, 1.0);",
            stage.color_scale
        ));
    }
    if !stage.pass_through_alpha && stage.alpha_scale != 1 {
        ctx.line(&format!("Output.a = min(Output.a * {}.0, 1.0);", stage.alpha_scale));
    }

    ctx.line("Previous = Output;");
}

/// Resolve all three argument slots, even those the combine mode ignores, so texture and
/// lighting declarations referenced by any slot are still emitted.
fn resolve_arguments(
    ctx: &mut EmitContext<'_>,
    sources: &[CombinerSource; 3],
    operands: &[CombinerOperand; 3],
    constant: &str,
    component: Component,
) -> [String; 3] {
    std::array::from_fn(|slot| {
        let source = sources[slot];
        declare_source(ctx, source);
        resolve_argument(source, operands[slot], constant, component)
    })
}

/// Make sure the locals `source` resolves to exist before its first use.
fn declare_source(ctx: &mut EmitContext<'_>, source: CombinerSource) {
    if let Some(unit) = source.texture_unit() {
        texture::emit_texture_once(ctx, unit);
    } else if source.is_fragment_lighting() {
        lighting::emit_lighting_once(ctx);
    }
}

fn color_combine_expr(mode: CombineMode, args: &[String; 3]) -> String {
    let [a0, a1, a2] = args;
    match mode {
        CombineMode::Replace => format!("({a0}).rgb"),
        CombineMode::Modulate => format!("({a0} * {a1}).rgb"),
        CombineMode::Add => format!("min({a0} + {a1}, 1.0).rgb"),
        CombineMode::AddSigned => format!("clamp({a0} + {a1} - 0.5, 0.0, 1.0).rgb"),
        CombineMode::Interpolate => format!("mix({a1}, {a0}, {a2}).rgb"),
        CombineMode::Subtract => format!("max({a0} - {a1}, 0.0).rgb"),
        CombineMode::Dot3Rgb => format!("vec3(min(dot({a0}.rgb, {a1}.rgb), 1.0))"),
        CombineMode::Dot3Rgba => format!("vec3(min(dot({a0}, {a1}), 1.0))"),
        CombineMode::MultAdd => format!("min({a0} * {a1} + {a2}, 1.0).rgb"),
        CombineMode::AddMult => format!("(min({a0} + {a1}, 1.0) * {a2}).rgb"),
    }
}

/// Scalar form of `mode`. Over scalars both dot-product modes reduce to a clamped product,
/// written as a multiply since some GLSL front ends only accept vector `dot`.
fn alpha_combine_expr(mode: CombineMode, args: &[String; 3]) -> String {
    let [a0, a1, a2] = args;
    match mode {
        CombineMode::Replace => a0.clone(),
        CombineMode::Modulate => format!("{a0} * {a1}"),
        CombineMode::Add => format!("min({a0} + {a1}, 1.0)"),
        CombineMode::AddSigned => format!("clamp({a0} + {a1} - 0.5, 0.0, 1.0)"),
        CombineMode::Interpolate => format!("mix({a1}, {a0}, {a2})"),
        CombineMode::Subtract => format!("max({a0} - {a1}, 0.0)"),
        CombineMode::MultAdd => format!("min({a0} * {a1} + {a2}, 1.0)"),
        CombineMode::AddMult => format!("min({a0} + {a1}, 1.0) * {a2}"),
        CombineMode::Dot3Rgb | CombineMode::Dot3Rgba => format!("min({a0} * {a1}, 1.0)"),
    }
}
