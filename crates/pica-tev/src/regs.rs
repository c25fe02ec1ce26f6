//! Decoding of raw PICA200 `GPUREG_TEXENVn_*` register words into [`CombinerStage`]s.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerateError;
use crate::material::{
    ChannelSelect, CombineMode, CombinerOperand, CombinerSource, CombinerStage, ConstantSelector,
    MAX_COMBINER_STAGES,
};

/// Register words for one combiner stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinerRegisters {
    /// `GPUREG_TEXENVn_SOURCE`
    pub source: u32,
    /// `GPUREG_TEXENVn_OPERAND`
    pub operand: u32,
    /// `GPUREG_TEXENVn_COMBINER`
    pub combiner: u32,
    /// `GPUREG_TEXENVn_COLOR`, RGBA8 with red in the low byte.
    pub color: u32,
    /// `GPUREG_TEXENVn_SCALE`
    pub scale: u32,
    /// Copy of the shared `GPUREG_TEXENV_UPDATE_BUFFER` word.
    #[serde(default)]
    pub update_buffer: u32,
}

impl CombinerRegisters {
    /// The stage's constant color as normalized RGBA.
    pub fn constant_color(&self) -> [f32; 4] {
        let bytes = self.color.to_le_bytes();
        bytes.map(|b| f32::from(b) / 255.0)
    }
}

/// Decode stage `index` (0..=5).
///
/// `constant` picks what the stage's `Constant` source reads; the registers only carry the raw
/// color, which hosts upload separately (see [`CombinerRegisters::constant_color`]).
pub fn decode_combiner_stage(
    index: usize,
    regs: &CombinerRegisters,
    constant: ConstantSelector,
) -> Result<CombinerStage, GenerateError> {
    if index >= MAX_COMBINER_STAGES {
        return Err(GenerateError::invalid(
            Some(index),
            "index",
            format!("combiner stage index must be below {MAX_COMBINER_STAGES}"),
        ));
    }

    let color_sources = decode_slots(index, regs.source, [0, 4, 8], 4, source_from_u32)?;
    let alpha_sources = decode_slots(index, regs.source, [16, 20, 24], 4, source_from_u32)?;
    let color_operands =
        decode_slots(index, regs.operand, [0, 4, 8], 4, color_operand_from_u32)?;
    let alpha_operands =
        decode_slots(index, regs.operand, [12, 16, 20], 3, alpha_operand_from_u32)?;

    let color_mode = combine_mode_from_u32(index, "color_mode", extract(regs.combiner, 0, 4))?;
    let alpha_mode = combine_mode_from_u32(index, "alpha_mode", extract(regs.combiner, 16, 4))?;
    let color_scale = scale_from_u32(index, "color_scale", extract(regs.scale, 0, 2))?;
    let alpha_scale = scale_from_u32(index, "alpha_scale", extract(regs.scale, 16, 2))?;

    // Only stages 1..=4 can write the combiner buffer.
    let (updates_color_buffer, updates_alpha_buffer) = match index {
        1..=4 => (
            regs.update_buffer & (1 << (8 + index - 1)) != 0,
            regs.update_buffer & (1 << (12 + index - 1)) != 0,
        ),
        _ => (false, false),
    };

    let pass_through_color = color_mode == CombineMode::Replace
        && color_sources[0] == CombinerSource::Previous
        && color_operands[0] == CombinerOperand::default()
        && color_scale == 1;
    let pass_through_alpha = alpha_mode == CombineMode::Replace
        && alpha_sources[0] == CombinerSource::Previous
        && alpha_operands[0] == CombinerOperand::new(ChannelSelect::Alpha, false)
        && alpha_scale == 1;

    Ok(CombinerStage {
        color_sources,
        alpha_sources,
        color_operands,
        alpha_operands,
        color_mode,
        alpha_mode,
        color_scale,
        alpha_scale,
        constant,
        updates_color_buffer,
        updates_alpha_buffer,
        pass_through_color,
        pass_through_alpha,
    })
}

fn extract(word: u32, shift: u32, bits: u32) -> u32 {
    (word >> shift) & ((1 << bits) - 1)
}

/// Decode the three argument-slot fields of `word` at `shifts`.
fn decode_slots<T>(
    index: usize,
    word: u32,
    shifts: [u32; 3],
    bits: u32,
    decode: fn(usize, u32) -> Result<T, GenerateError>,
) -> Result<[T; 3], GenerateError> {
    let [a, b, c] = shifts;
    Ok([
        decode(index, extract(word, a, bits))?,
        decode(index, extract(word, b, bits))?,
        decode(index, extract(word, c, bits))?,
    ])
}

fn unsupported_encoding(index: usize, field: &'static str, raw: u32) -> GenerateError {
    debug!(stage = index, field, raw, "unsupported TEV register encoding");
    GenerateError::unsupported(Some(index), field, format!("unknown encoding {raw:#x}"))
}

fn source_from_u32(index: usize, raw: u32) -> Result<CombinerSource, GenerateError> {
    Ok(match raw {
        0x0 => CombinerSource::PrimaryColor,
        0x1 => CombinerSource::FragmentPrimaryColor,
        0x2 => CombinerSource::FragmentSecondaryColor,
        0x3 => CombinerSource::Texture0,
        0x4 => CombinerSource::Texture1,
        0x5 => CombinerSource::Texture2,
        0xD => CombinerSource::PreviousBuffer,
        0xE => CombinerSource::Constant,
        0xF => CombinerSource::Previous,
        // 0x6 is texture unit 3 (procedural texture), which materials never bind.
        _ => return Err(unsupported_encoding(index, "source", raw)),
    })
}

fn color_operand_from_u32(index: usize, raw: u32) -> Result<CombinerOperand, GenerateError> {
    let channel = match raw & !1 {
        0x0 => ChannelSelect::None,
        0x2 => ChannelSelect::Alpha,
        0x4 => ChannelSelect::Red,
        0x8 => ChannelSelect::Green,
        0xC => ChannelSelect::Blue,
        _ => return Err(unsupported_encoding(index, "color_operand", raw)),
    };
    Ok(CombinerOperand::new(channel, raw & 1 != 0))
}

fn alpha_operand_from_u32(index: usize, raw: u32) -> Result<CombinerOperand, GenerateError> {
    let channel = match raw >> 1 {
        0 => ChannelSelect::Alpha,
        1 => ChannelSelect::Red,
        2 => ChannelSelect::Green,
        3 => ChannelSelect::Blue,
        _ => return Err(unsupported_encoding(index, "alpha_operand", raw)),
    };
    Ok(CombinerOperand::new(channel, raw & 1 != 0))
}

fn combine_mode_from_u32(
    index: usize,
    field: &'static str,
    raw: u32,
) -> Result<CombineMode, GenerateError> {
    Ok(match raw {
        0 => CombineMode::Replace,
        1 => CombineMode::Modulate,
        2 => CombineMode::Add,
        3 => CombineMode::AddSigned,
        4 => CombineMode::Interpolate,
        5 => CombineMode::Subtract,
        6 => CombineMode::Dot3Rgb,
        7 => CombineMode::Dot3Rgba,
        8 => CombineMode::MultAdd,
        9 => CombineMode::AddMult,
        _ => return Err(unsupported_encoding(index, field, raw)),
    })
}

fn scale_from_u32(index: usize, field: &'static str, raw: u32) -> Result<u8, GenerateError> {
    match raw {
        0 => Ok(1),
        1 => Ok(2),
        2 => Ok(4),
        _ => Err(unsupported_encoding(index, field, raw)),
    }
}
