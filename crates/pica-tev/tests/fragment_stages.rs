use pica_tev::{
    generate_fragment_glsl, generate_fragment_glsl_with_options, generate_fragment_shader,
    AlphaTestFunction, ChannelSelect, CombineMode, CombinerOperand, CombinerSource,
    CombinerStage, ConstantSelector, GenerateError, GlslOptions, MaterialDescription,
    RenderLayer, TextureMapping,
};
use pretty_assertions::assert_eq;

fn main_body(glsl: &str) -> &str {
    let start = glsl
        .find("void main() {")
        .unwrap_or_else(|| panic!("missing main:\n{glsl}"));
    &glsl[start..]
}

#[test]
fn replace_with_texture0_samples_before_first_use() {
    let desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::Texture0)]);
    let glsl = generate_fragment_glsl(&desc).unwrap();

    assert!(
        glsl.contains(
            "    // stage 0\n    vec4 Color0 = texture(Textures[0], TexCoord0.xy);\n    Output.rgb = (Color0).rgb;\n    Output.a = Color0.a;\n    Previous = Output;\n"
        ),
        "{glsl}"
    );
    assert_eq!(glsl.matches("vec4 Color0 =").count(), 1);
    assert!(!glsl.contains("vec4 Color1 ="), "{glsl}");
    assert!(!glsl.contains("vec4 Color2 ="), "{glsl}");
}

#[test]
fn alpha_test_discards_on_the_complement() {
    let mut desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::Texture0)]);
    desc.alpha_test.enabled = true;
    desc.alpha_test.function = AlphaTestFunction::Less;
    desc.alpha_test.reference = 0.5;

    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.contains("    if (Output.a >= AlphaRef) discard;\n"), "{glsl}");

    desc.alpha_test.function = AlphaTestFunction::Never;
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.contains("    discard;\n"), "{glsl}");
    assert!(!glsl.contains("AlphaRef) discard"), "{glsl}");

    desc.alpha_test.enabled = false;
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(!main_body(&glsl).contains("discard"), "{glsl}");
}

#[test]
fn opaque_layer_forces_alpha_last() {
    let mut desc =
        MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::PrimaryColor)]);
    desc.render_layer = RenderLayer::Opaque;
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(
        glsl.ends_with("    Output.rgb += SelectionColor.rgb;\n    Output.a = 1;\n}\n"),
        "{glsl}"
    );

    desc.render_layer = RenderLayer::Other;
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.ends_with("    Output.rgb += SelectionColor.rgb;\n}\n"), "{glsl}");
}

#[test]
fn generation_is_deterministic() {
    let mut desc = MaterialDescription::new(vec![
        CombinerStage::modulate(CombinerSource::Texture0, CombinerSource::PrimaryColor),
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::Texture2),
    ]);
    desc.textures[2].mapping = TextureMapping::ProjectionMap;

    let a = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    let b = generate_fragment_shader(&desc.clone(), GlslOptions::default()).unwrap();
    assert_eq!(a.glsl, b.glsl);
    assert_eq!(a.hash, b.hash);
    assert_eq!(a.texture_units_mask, 0b101);

    let from_threads: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| generate_fragment_glsl(&desc).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for glsl in from_threads {
        assert_eq!(glsl, a.glsl);
    }
}

#[test]
fn each_texture_unit_is_sampled_once() {
    let desc = MaterialDescription::new(vec![
        CombinerStage::modulate(CombinerSource::Texture1, CombinerSource::Texture1),
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::Texture1),
        CombinerStage::replace(CombinerSource::Texture1),
    ]);
    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    assert_eq!(shader.glsl.matches("vec4 Color1 =").count(), 1);
    assert_eq!(shader.texture_units_mask, 0b010);
    assert!(!shader.glsl.contains("vec4 Color0 ="));
}

#[test]
fn unused_third_slot_still_declares_its_texture() {
    let mut stage = CombinerStage::replace(CombinerSource::PrimaryColor);
    stage.color_sources[2] = CombinerSource::Texture2;
    let desc = MaterialDescription::new(vec![stage]);

    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    assert!(shader.glsl.contains("vec4 Color2 = texture(Textures[2], TexCoord2.xy);"));
    assert!(shader.glsl.contains("Output.rgb = (VertexColor).rgb;"));
    assert_eq!(shader.texture_units_mask, 0b100);
}

#[test]
fn six_stages_emit_six_blocks() {
    let desc = MaterialDescription::new(vec![
        CombinerStage::replace(CombinerSource::Texture0);
        6
    ]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert_eq!(glsl.matches("// stage ").count(), 6);
    assert!(glsl.contains("// stage 5\n"));
    assert!(!glsl.contains("// stage 6"));

    let seven = MaterialDescription::new(vec![
        CombinerStage::replace(CombinerSource::Texture0);
        7
    ]);
    assert_eq!(
        generate_fragment_glsl(&seven),
        Err(GenerateError::TooManyStages { count: 7, max: 6 })
    );
}

#[test]
fn pass_through_stage_only_forwards_previous() {
    let desc = MaterialDescription::new(vec![
        CombinerStage::replace(CombinerSource::Texture0),
        CombinerStage::pass_through(),
    ]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.contains("    // stage 1\n    Previous = Output;\n"), "{glsl}");
}

#[test]
fn pass_through_color_keeps_alpha_combine() {
    let mut stage = CombinerStage::replace(CombinerSource::Texture0);
    stage.pass_through_color = true;
    let desc = MaterialDescription::new(vec![
        CombinerStage::replace(CombinerSource::PrimaryColor),
        stage,
    ]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(
        glsl.contains("    // stage 1\n    vec4 Color0 = texture(Textures[0], TexCoord0.xy);\n    Output.a = Color0.a;\n    Previous = Output;\n"),
        "{glsl}"
    );
}

#[test]
fn buffer_update_captures_the_unscaled_result() {
    let mut stage = CombinerStage::replace(CombinerSource::Texture0);
    stage.color_scale = 2;
    stage.alpha_scale = 4;
    stage.updates_color_buffer = true;
    stage.updates_alpha_buffer = true;
    let desc = MaterialDescription::new(vec![stage]);

    let glsl = generate_fragment_glsl(&desc).unwrap();
    let expected = "    Output.a = Color0.a;\n    CombBuffer.rgb = Output.rgb;\n    CombBuffer.a = Output.a;\n    Output.rgb = min(Output.rgb * 2.0, 1.0);\n    Output.a = min(Output.a * 4.0, 1.0);\n    Previous = Output;\n";
    assert!(glsl.contains(expected), "{glsl}");
}

#[test]
fn operands_and_constants_reach_the_combine_expression() {
    let stage = CombinerStage {
        color_sources: [
            CombinerSource::Constant,
            CombinerSource::PrimaryColor,
            CombinerSource::Texture0,
        ],
        alpha_sources: [
            CombinerSource::Constant,
            CombinerSource::PrimaryColor,
            CombinerSource::Texture0,
        ],
        color_operands: [
            CombinerOperand::default(),
            CombinerOperand::new(ChannelSelect::Alpha, true),
            CombinerOperand::new(ChannelSelect::Red, false),
        ],
        alpha_operands: [
            CombinerOperand::default(),
            CombinerOperand::new(ChannelSelect::Blue, true),
            CombinerOperand::default(),
        ],
        color_mode: CombineMode::Interpolate,
        alpha_mode: CombineMode::MultAdd,
        constant: ConstantSelector::Constant5,
        ..CombinerStage::replace(CombinerSource::Constant)
    };
    let desc = MaterialDescription::new(vec![stage]);

    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(
        glsl.contains("Output.rgb = mix((1.0 - VertexColor.aaaa), Constant5, Color0.rrrr).rgb;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("Output.a = min(Constant5.a * (1.0 - VertexColor.b) + Color0.a, 1.0);"),
        "{glsl}"
    );
}

#[test]
fn dot3_color_is_broadcast() {
    let mut stage = CombinerStage::modulate(CombinerSource::Texture0, CombinerSource::PrimaryColor);
    stage.color_mode = CombineMode::Dot3Rgb;
    let desc = MaterialDescription::new(vec![stage]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(
        glsl.contains("Output.rgb = vec3(min(dot(Color0.rgb, VertexColor.rgb), 1.0));"),
        "{glsl}"
    );
}

#[test]
fn dot3_alpha_is_a_clamped_scalar_product() {
    let mut stage = CombinerStage::modulate(CombinerSource::Texture0, CombinerSource::PrimaryColor);
    stage.color_mode = CombineMode::Dot3Rgba;
    stage.alpha_mode = CombineMode::Dot3Rgba;
    let glsl = generate_fragment_glsl(&MaterialDescription::new(vec![stage])).unwrap();
    assert!(
        glsl.contains("Output.rgb = vec3(min(dot(Color0, VertexColor), 1.0));"),
        "{glsl}"
    );
    assert!(glsl.contains("Output.a = min(Color0.a * VertexColor.a, 1.0);"), "{glsl}");

    stage.alpha_mode = CombineMode::Dot3Rgb;
    let glsl = generate_fragment_glsl(&MaterialDescription::new(vec![stage])).unwrap();
    assert!(glsl.contains("Output.a = min(Color0.a * VertexColor.a, 1.0);"), "{glsl}");
}

#[test]
fn stage_limit_truncates_emitted_stages() {
    let desc = MaterialDescription::new(vec![
        CombinerStage::replace(CombinerSource::Texture0),
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::Texture1),
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::Texture2),
    ]);
    let options = GlslOptions {
        stage_limit: Some(1),
    };
    let shader = generate_fragment_shader(&desc, options).unwrap();
    assert_eq!(shader.glsl.matches("// stage ").count(), 1);
    assert_eq!(shader.texture_units_mask, 0b001);

    let unlimited = generate_fragment_glsl_with_options(
        &desc,
        GlslOptions {
            stage_limit: Some(10),
        },
    )
    .unwrap();
    assert_eq!(unlimited, generate_fragment_glsl(&desc).unwrap());
}

#[test]
fn cube_map_reads_the_cube_sampler() {
    let mut desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::Texture0)]);
    desc.textures[0].mapping = TextureMapping::CameraCubeEnvMap;
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.contains("vec4 Color0 = texture(TextureCube, TexCoord0.xyz);"), "{glsl}");
}

#[test]
fn debug_ladder_covers_eight_views() {
    let desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::PrimaryColor)]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(glsl.contains("    if (DebugShading == 1) {\n"), "{glsl}");
    assert!(
        glsl.contains("    } else if (DebugShading == 8) {\n        Output = vec4(CombBuffer.rgb, 1.0);\n    }\n"),
        "{glsl}"
    );
    assert!(!glsl.contains("DebugShading == 9"));
    assert!(!glsl.contains("DebugLut =="), "{glsl}");
}

#[test]
fn picking_and_scratch_declarations_open_main() {
    let desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::PrimaryColor)]);
    let glsl = generate_fragment_glsl(&desc).unwrap();
    assert!(
        main_body(&glsl).starts_with(
            "void main() {\n    PickingOutput = PickingColor;\n    Output = vec4(0.0);\n    vec4 Previous = vec4(0.0);\n    vec4 CombBuffer = vec4(0.0);\n    vec4 Constant5 = ConstantColor5;\n    // stage 0\n"
        ),
        "{glsl}"
    );
}
