//! Host-side mirror of the `FragmentUniforms` std140 block declared in the shader header.
//!
//! Field order and padding must match [`crate::shader_gen::FRAGMENT_HEADER`] exactly; the
//! layout tests below pin every offset the GLSL side relies on.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::material::MaterialDescription;

/// Number of entries in the `Lights` uniform array (`MAX_LIGHTS` in GLSL).
pub const MAX_LIGHTS: usize = 3;

/// One entry of `Lights[MAX_LIGHTS]`.
///
/// Integer fields are GLSL `int` booleans (0 or 1), except `angle_lut_input` which holds a
/// [`crate::material::LutInput::selector`] value.
///
/// Total size: 160 bytes (std140 rounds the struct up to 16-byte alignment).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular0: [f32; 4],
    pub specular1: [f32; 4],
    pub constant_color5: [f32; 4],
    pub att_scale: f32,
    pub att_bias: f32,
    pub angle_lut_scale: f32,
    pub angle_lut_input: i32,
    pub spot_att_enabled: i32,
    pub dist_att_enabled: i32,
    pub two_sided_diffuse: i32,
    pub directional: i32,
    pub disable_const5: i32,
    pub _pad: [i32; 3],
}

/// Material colors read by `Constant` combiner sources and the lighting block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialColors {
    #[serde(default)]
    pub constants: [[f32; 4]; 6],
    #[serde(default = "white")]
    pub diffuse: [f32; 4],
    #[serde(default)]
    pub ambient: [f32; 4],
    #[serde(default)]
    pub specular0: [f32; 4],
    #[serde(default)]
    pub specular1: [f32; 4],
    #[serde(default)]
    pub emission: [f32; 4],
}

fn white() -> [f32; 4] {
    [1.0; 4]
}

impl Default for MaterialColors {
    fn default() -> Self {
        Self {
            constants: [[0.0; 4]; 6],
            diffuse: white(),
            ambient: [0.0; 4],
            specular0: [0.0; 4],
            specular1: [0.0; 4],
            emission: [0.0; 4],
        }
    }
}

/// Total size: 720 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FragmentUniforms {
    pub lights: [LightUniform; MAX_LIGHTS],
    pub constant_colors: [[f32; 4]; 6],
    pub diffuse_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub specular0_color: [f32; 4],
    pub specular1_color: [f32; 4],
    pub emission_color: [f32; 4],
    pub selection_color: [f32; 4],
    pub picking_color: [f32; 4],
    pub camera_view: [f32; 3],
    pub alpha_ref: f32,
    pub light_count: i32,
    pub debug_shading: i32,
    pub debug_lut: i32,
    pub _pad: i32,
}

impl Default for FragmentUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FragmentUniforms {
    pub const SIZE_BYTES: u64 = core::mem::size_of::<Self>() as u64;

    /// Uniforms for drawing `desc` with `colors` and no lights.
    pub fn from_material(desc: &MaterialDescription, colors: &MaterialColors) -> Self {
        Self {
            constant_colors: colors.constants,
            diffuse_color: colors.diffuse,
            ambient_color: colors.ambient,
            specular0_color: colors.specular0,
            specular1_color: colors.specular1,
            emission_color: colors.emission,
            alpha_ref: desc.alpha_test.reference,
            ..Self::default()
        }
    }

    /// Copy up to [`MAX_LIGHTS`] lights; extra lights are ignored.
    pub fn set_lights(&mut self, lights: &[LightUniform]) {
        let count = lights.len().min(MAX_LIGHTS);
        self.lights = [LightUniform::default(); MAX_LIGHTS];
        self.lights[..count].copy_from_slice(&lights[..count]);
        self.light_count = count as i32;
    }

    /// View the block as raw bytes for upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
