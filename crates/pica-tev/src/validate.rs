//! Structural checks run before any text is emitted.

use crate::error::GenerateError;
use crate::material::{
    CombineMode, CombinerSource, CombinerStage, MaterialDescription, TextureMapping,
    MAX_COMBINER_STAGES, TEXTURE_UNIT_COUNT,
};

/// Reject descriptions the generator cannot translate faithfully.
pub fn validate_material(desc: &MaterialDescription) -> Result<(), GenerateError> {
    if desc.stages.is_empty() {
        return Err(GenerateError::NoStages);
    }
    if desc.stages.len() > MAX_COMBINER_STAGES {
        return Err(GenerateError::TooManyStages {
            count: desc.stages.len(),
            max: MAX_COMBINER_STAGES,
        });
    }

    for (index, stage) in desc.stages.iter().enumerate() {
        validate_stage(index, stage)?;
    }

    for (unit, binding) in desc.textures.iter().enumerate() {
        if binding.mapping == TextureMapping::CameraCubeEnvMap && unit != 0 {
            return Err(GenerateError::unsupported(
                None,
                "textures.mapping",
                format!(
                    "camera cube environment mapping on texture unit {unit} \
                     (only unit 0 has a cube sampler)"
                ),
            ));
        }
    }

    let lighting = &desc.lighting;
    if usize::from(lighting.bump_texture_unit) >= TEXTURE_UNIT_COUNT {
        return Err(GenerateError::invalid(
            None,
            "lighting.bump_texture_unit",
            format!("{} is out of range 0..=2", lighting.bump_texture_unit),
        ));
    }
    if let Some(unit) = lighting.bump_unit() {
        if lighting.fragment_lighting_enabled
            && desc.textures[unit].mapping == TextureMapping::CameraCubeEnvMap
        {
            return Err(GenerateError::unsupported(
                None,
                "lighting.bump_texture_unit",
                "bump map bound to a cube-mapped texture unit",
            ));
        }
    }
    for (name, binding) in lighting.luts.named() {
        if !binding.scale.is_finite() {
            return Err(GenerateError::invalid(
                None,
                "lighting.luts.scale",
                format!("{name} scale {} is not finite", binding.scale),
            ));
        }
    }

    let reference = desc.alpha_test.reference;
    if !(0.0..=1.0).contains(&reference) {
        return Err(GenerateError::invalid(
            None,
            "alpha_test.reference",
            format!("{reference} is outside [0, 1]"),
        ));
    }

    Ok(())
}

fn validate_stage(index: usize, stage: &CombinerStage) -> Result<(), GenerateError> {
    validate_scale(index, "color_scale", stage.color_scale)?;
    validate_scale(index, "alpha_scale", stage.alpha_scale)?;

    if index == 0 {
        if !stage.pass_through_color {
            reject_previous_on_first_stage(
                "color_sources",
                stage.color_mode,
                &stage.color_sources,
            )?;
        }
        if !stage.pass_through_alpha {
            reject_previous_on_first_stage(
                "alpha_sources",
                stage.alpha_mode,
                &stage.alpha_sources,
            )?;
        }
    }

    Ok(())
}

fn validate_scale(index: usize, field: &'static str, scale: u8) -> Result<(), GenerateError> {
    match scale {
        1 | 2 | 4 => Ok(()),
        other => Err(GenerateError::invalid(
            Some(index),
            field,
            format!("{other} is not one of 1, 2, 4"),
        )),
    }
}

/// Stage 0 has no predecessor, so `Previous`/`PreviousBuffer` has nothing to read. Unused slots
/// are still resolved during emission but never reach the output text, so only consumed slots
/// are checked.
fn reject_previous_on_first_stage(
    field: &'static str,
    mode: CombineMode,
    sources: &[CombinerSource; 3],
) -> Result<(), GenerateError> {
    for (slot, source) in sources.iter().enumerate() {
        if mode.uses_slot(slot) && source.reads_previous_stage() {
            return Err(GenerateError::invalid(
                Some(0),
                field,
                format!("slot {slot} reads {source:?} but stage 0 has no previous stage"),
            ));
        }
    }
    Ok(())
}
