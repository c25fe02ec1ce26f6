//! Declarative description of one material's fragment pipeline.
//!
//! These types mirror the PICA200 texture environment (TEV) state a model file stores per
//! material. They carry no behavior beyond hashing; validation lives in [`crate::validate`] and
//! shader emission in [`crate::shader_gen`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Hardware limit on the number of texture combiner stages.
pub const MAX_COMBINER_STAGES: usize = 6;

/// Number of 2D texture units a material can sample.
pub const TEXTURE_UNIT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinerSource {
    PrimaryColor,
    FragmentPrimaryColor,
    FragmentSecondaryColor,
    Texture0,
    Texture1,
    Texture2,
    PreviousBuffer,
    Constant,
    Previous,
}

impl CombinerSource {
    /// Texture unit sampled by this source, if any.
    pub fn texture_unit(self) -> Option<usize> {
        match self {
            CombinerSource::Texture0 => Some(0),
            CombinerSource::Texture1 => Some(1),
            CombinerSource::Texture2 => Some(2),
            _ => None,
        }
    }

    pub fn is_fragment_lighting(self) -> bool {
        matches!(
            self,
            CombinerSource::FragmentPrimaryColor | CombinerSource::FragmentSecondaryColor
        )
    }

    /// Sources that read state produced by an earlier stage.
    pub fn reads_previous_stage(self) -> bool {
        matches!(self, CombinerSource::Previous | CombinerSource::PreviousBuffer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelect {
    #[default]
    None,
    Alpha,
    Red,
    Green,
    Blue,
}

/// Channel operand applied to one combiner argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinerOperand {
    #[serde(default)]
    pub channel: ChannelSelect,
    #[serde(default)]
    pub invert: bool,
}

impl CombinerOperand {
    pub const fn new(channel: ChannelSelect, invert: bool) -> Self {
        Self { channel, invert }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    Replace,
    Modulate,
    Add,
    AddSigned,
    Interpolate,
    Subtract,
    Dot3Rgb,
    Dot3Rgba,
    MultAdd,
    AddMult,
}

/// Bitmask of the argument slots a combine mode reads.
const SLOT0: u8 = 1 << 0;
const SLOT1: u8 = 1 << 1;
const SLOT2: u8 = 1 << 2;

impl CombineMode {
    fn slot_mask(self) -> u8 {
        match self {
            CombineMode::Replace => SLOT0,
            CombineMode::Modulate
            | CombineMode::Add
            | CombineMode::AddSigned
            | CombineMode::Subtract
            | CombineMode::Dot3Rgb
            | CombineMode::Dot3Rgba => SLOT0 | SLOT1,
            CombineMode::Interpolate | CombineMode::MultAdd | CombineMode::AddMult => {
                SLOT0 | SLOT1 | SLOT2
            }
        }
    }

    /// Whether argument `slot` (0..=2) contributes to the result.
    pub fn uses_slot(self, slot: usize) -> bool {
        slot < 3 && (self.slot_mask() & (1 << slot)) != 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantSelector {
    #[default]
    Constant0,
    Constant1,
    Constant2,
    Constant3,
    Constant4,
    Constant5,
    Diffuse,
    Ambient,
    Specular0,
    Specular1,
    Emission,
}

/// One texture combiner stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinerStage {
    pub color_sources: [CombinerSource; 3],
    pub alpha_sources: [CombinerSource; 3],
    #[serde(default)]
    pub color_operands: [CombinerOperand; 3],
    #[serde(default)]
    pub alpha_operands: [CombinerOperand; 3],
    pub color_mode: CombineMode,
    pub alpha_mode: CombineMode,
    /// Result multiplier; one of 1, 2, 4.
    #[serde(default = "default_scale")]
    pub color_scale: u8,
    /// Result multiplier; one of 1, 2, 4.
    #[serde(default = "default_scale")]
    pub alpha_scale: u8,
    #[serde(default)]
    pub constant: ConstantSelector,
    #[serde(default)]
    pub updates_color_buffer: bool,
    #[serde(default)]
    pub updates_alpha_buffer: bool,
    #[serde(default)]
    pub pass_through_color: bool,
    #[serde(default)]
    pub pass_through_alpha: bool,
}

fn default_scale() -> u8 {
    1
}

impl CombinerStage {
    /// A stage that forwards the previous stage's result unchanged.
    pub fn pass_through() -> Self {
        Self {
            color_sources: [CombinerSource::Previous; 3],
            alpha_sources: [CombinerSource::Previous; 3],
            color_operands: [CombinerOperand::default(); 3],
            alpha_operands: [CombinerOperand::default(); 3],
            color_mode: CombineMode::Replace,
            alpha_mode: CombineMode::Replace,
            color_scale: 1,
            alpha_scale: 1,
            constant: ConstantSelector::Constant0,
            updates_color_buffer: false,
            updates_alpha_buffer: false,
            pass_through_color: true,
            pass_through_alpha: true,
        }
    }

    /// A stage that replaces color and alpha with a single source.
    pub fn replace(source: CombinerSource) -> Self {
        Self {
            color_sources: [source, CombinerSource::PrimaryColor, CombinerSource::PrimaryColor],
            alpha_sources: [source, CombinerSource::PrimaryColor, CombinerSource::PrimaryColor],
            pass_through_color: false,
            pass_through_alpha: false,
            ..Self::pass_through()
        }
    }

    /// A stage that multiplies two sources for both color and alpha.
    pub fn modulate(a: CombinerSource, b: CombinerSource) -> Self {
        Self {
            color_sources: [a, b, CombinerSource::PrimaryColor],
            alpha_sources: [a, b, CombinerSource::PrimaryColor],
            color_mode: CombineMode::Modulate,
            alpha_mode: CombineMode::Modulate,
            ..Self::replace(a)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpMode {
    #[default]
    None,
    AsBump,
    AsTangent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FresnelSelector {
    #[default]
    None,
    Primary,
    Secondary,
    Both,
}

/// Dot product used as a LUT index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LutInput {
    /// N·H
    #[default]
    NormalHalf,
    /// V·H
    ViewHalf,
    /// N·V
    NormalView,
    /// L·N
    LightNormal,
    /// -L·P (spot direction)
    LightSpot,
    /// cos φ of the half vector projected onto the tangent plane.
    CosPhi,
}

impl LutInput {
    /// Index used by the runtime `LutInput` selector in the shader header.
    pub fn selector(self) -> i32 {
        match self {
            LutInput::NormalHalf => 0,
            LutInput::ViewHalf => 1,
            LutInput::NormalView => 2,
            LutInput::LightNormal => 3,
            LutInput::LightSpot => 4,
            LutInput::CosPhi => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LutBinding {
    #[serde(default)]
    pub input: LutInput,
    #[serde(default = "default_lut_scale")]
    pub scale: f32,
}

fn default_lut_scale() -> f32 {
    1.0
}

impl Default for LutBinding {
    fn default() -> Self {
        Self {
            input: LutInput::NormalHalf,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LutBindings {
    #[serde(default)]
    pub dist0: LutBinding,
    #[serde(default)]
    pub dist1: LutBinding,
    #[serde(default)]
    pub fresnel: LutBinding,
    #[serde(default)]
    pub reflec_r: LutBinding,
    #[serde(default)]
    pub reflec_g: LutBinding,
    #[serde(default)]
    pub reflec_b: LutBinding,
}

impl LutBindings {
    /// Bindings paired with their field names, in LUT-row order.
    pub(crate) fn named(&self) -> [(&'static str, &LutBinding); 6] {
        [
            ("dist0", &self.dist0),
            ("dist1", &self.dist1),
            ("fresnel", &self.fresnel),
            ("reflec_r", &self.reflec_r),
            ("reflec_g", &self.reflec_g),
            ("reflec_b", &self.reflec_b),
        ]
    }
}

bitflags! {
    /// Fragment-lighting LUT terms enabled for a material.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LutFlags: u8 {
        const DIST0 = 1 << 0;
        const DIST1 = 1 << 1;
        const REFLECTION = 1 << 2;
        const GEO_FACTOR0 = 1 << 3;
        const GEO_FACTOR1 = 1 << 4;
        const GEO_FACTOR_GLOBAL = 1 << 5;
    }
}

impl LutFlags {
    pub fn geo_factor0(self) -> bool {
        self.intersects(LutFlags::GEO_FACTOR0 | LutFlags::GEO_FACTOR_GLOBAL)
    }

    pub fn geo_factor1(self) -> bool {
        self.intersects(LutFlags::GEO_FACTOR1 | LutFlags::GEO_FACTOR_GLOBAL)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialLightingConfig {
    #[serde(default)]
    pub fragment_lighting_enabled: bool,
    #[serde(default)]
    pub bump_mode: BumpMode,
    /// Texture unit holding the bump/tangent map; one of 0, 1, 2.
    #[serde(default)]
    pub bump_texture_unit: u8,
    #[serde(default)]
    pub renormalize_z: bool,
    #[serde(default)]
    pub clamp_highlight: bool,
    #[serde(default)]
    pub luts_enabled: LutFlags,
    #[serde(default)]
    pub fresnel: FresnelSelector,
    #[serde(default)]
    pub luts: LutBindings,
}

impl MaterialLightingConfig {
    /// Texture unit the lighting block samples, if bump mapping is active.
    pub fn bump_unit(&self) -> Option<usize> {
        match self.bump_mode {
            BumpMode::None => None,
            BumpMode::AsBump | BumpMode::AsTangent => Some(usize::from(self.bump_texture_unit)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaTestFunction {
    Never,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaTestConfig {
    pub enabled: bool,
    pub function: AlphaTestFunction,
    /// Normalized reference value in `[0, 1]`, uploaded as the `AlphaRef` uniform.
    pub reference: f32,
}

impl Default for AlphaTestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            function: AlphaTestFunction::GreaterEqual,
            reference: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMapping {
    #[default]
    Normal,
    CameraCubeEnvMap,
    ProjectionMap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureCoordBinding {
    #[serde(default)]
    pub mapping: TextureMapping,
}

/// Texture-coordinate routing for units 1 and 2.
///
/// The digits name the coordinate set read by texture units 0 through 3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexCoordConfig {
    #[default]
    Config0120,
    Config0110,
    Config0111,
    Config0112,
}

impl TexCoordConfig {
    /// Coordinate set sampled by `unit`.
    pub fn coord_set(self, unit: usize) -> usize {
        match (unit, self) {
            (0, _) => 0,
            (1, _) => 1,
            (_, TexCoordConfig::Config0120) => 2,
            (_, TexCoordConfig::Config0110)
            | (_, TexCoordConfig::Config0111)
            | (_, TexCoordConfig::Config0112) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Opaque,
    #[default]
    Other,
}

/// Complete, immutable input to fragment shader generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub stages: Vec<CombinerStage>,
    #[serde(default)]
    pub lighting: MaterialLightingConfig,
    #[serde(default)]
    pub alpha_test: AlphaTestConfig,
    #[serde(default)]
    pub textures: [TextureCoordBinding; TEXTURE_UNIT_COUNT],
    #[serde(default)]
    pub tex_coord_config: TexCoordConfig,
    #[serde(default)]
    pub render_layer: RenderLayer,
}

impl MaterialDescription {
    pub fn new(stages: Vec<CombinerStage>) -> Self {
        Self {
            stages,
            lighting: MaterialLightingConfig::default(),
            alpha_test: AlphaTestConfig::default(),
            textures: [TextureCoordBinding::default(); TEXTURE_UNIT_COUNT],
            tex_coord_config: TexCoordConfig::default(),
            render_layer: RenderLayer::default(),
        }
    }

    /// Deterministic hash of every field that can influence generated text.
    ///
    /// Floats are hashed by bit pattern so `0.0` and `-0.0` are distinct keys; the alpha
    /// reference is excluded because it only reaches the shader through the `AlphaRef` uniform.
    pub fn state_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        // Hashed before validation, so the full length is kept.
        hasher.update(&(self.stages.len() as u32).to_le_bytes());
        let mut write_u8 = |v: u8| {
            hasher.update(&[v]);
        };

        for stage in &self.stages {
            for source in stage.color_sources.iter().chain(&stage.alpha_sources) {
                write_u8(*source as u8);
            }
            for operand in stage.color_operands.iter().chain(&stage.alpha_operands) {
                write_u8(operand.channel as u8);
                write_u8(operand.invert as u8);
            }
            write_u8(stage.color_mode as u8);
            write_u8(stage.alpha_mode as u8);
            write_u8(stage.color_scale);
            write_u8(stage.alpha_scale);
            write_u8(stage.constant as u8);
            write_u8(stage.updates_color_buffer as u8);
            write_u8(stage.updates_alpha_buffer as u8);
            write_u8(stage.pass_through_color as u8);
            write_u8(stage.pass_through_alpha as u8);
        }

        let lighting = &self.lighting;
        write_u8(lighting.fragment_lighting_enabled as u8);
        write_u8(lighting.bump_mode as u8);
        write_u8(lighting.bump_texture_unit);
        write_u8(lighting.renormalize_z as u8);
        write_u8(lighting.clamp_highlight as u8);
        write_u8(lighting.luts_enabled.bits());
        write_u8(lighting.fresnel as u8);

        write_u8(self.alpha_test.enabled as u8);
        write_u8(self.alpha_test.function as u8);

        for binding in &self.textures {
            write_u8(binding.mapping as u8);
        }
        write_u8(self.tex_coord_config as u8);
        write_u8(self.render_layer as u8);

        for (_, binding) in lighting.luts.named() {
            hasher.update(&[binding.input as u8]);
            hasher.update(&binding.scale.to_bits().to_le_bytes());
        }

        hasher.finalize()
    }
}
