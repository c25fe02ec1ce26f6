use pica_tev::{
    generate_fragment_shader, BumpMode, CombineMode, CombinerSource, CombinerStage,
    FresnelSelector, GlslOptions, LutFlags, LutInput, MaterialDescription,
};

fn main_body(glsl: &str) -> &str {
    let start = glsl
        .find("void main() {")
        .unwrap_or_else(|| panic!("missing main:\n{glsl}"));
    &glsl[start..]
}

fn position(glsl: &str, needle: &str) -> usize {
    glsl.find(needle)
        .unwrap_or_else(|| panic!("missing `{needle}`:\n{glsl}"))
}

/// Texture0, then modulate by the primary lighting color, then add the secondary.
fn lit_stages() -> Vec<CombinerStage> {
    let mut add_specular =
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::FragmentSecondaryColor);
    add_specular.color_mode = CombineMode::Add;
    add_specular.alpha_mode = CombineMode::Add;
    vec![
        CombinerStage::replace(CombinerSource::Texture0),
        CombinerStage::modulate(CombinerSource::Previous, CombinerSource::FragmentPrimaryColor),
        add_specular,
    ]
}

#[test]
fn lighting_block_is_emitted_once_at_first_use() {
    let mut desc = MaterialDescription::new(lit_stages());
    desc.lighting.fragment_lighting_enabled = true;

    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    let glsl = &shader.glsl;
    assert!(shader.uses_fragment_lighting);
    assert_eq!(glsl.matches("vec4 FragPriColor =").count(), 1);
    assert_eq!(glsl.matches("Light light = Lights[i];").count(), 1);

    let stage1 = position(glsl, "// stage 1");
    let block = position(glsl, "vec4 FragPriColor = vec4(0.0, 0.0, 0.0, 1.0);");
    let use_site = position(glsl, "Output.rgb = (Previous * FragPriColor).rgb;");
    assert!(stage1 < block && block < use_site, "{glsl}");
    assert!(glsl.contains("Output.rgb = min(Previous + FragSecColor, 1.0).rgb;"), "{glsl}");

    assert!(
        glsl.contains("    for (int i = 0; i < min(LightCount, MAX_LIGHTS); i++) {\n        Light light = Lights[i];\n"),
        "{glsl}"
    );
    assert!(
        glsl.contains("    FragPriColor = clamp(FragPriColor, 0.0, 1.0);\n    FragSecColor = clamp(FragSecColor, 0.0, 1.0);\n"),
        "{glsl}"
    );
    assert!(
        glsl.contains("        if (light.DisableConst5 == 0) Constant5 = light.ConstantColor5;\n    }\n"),
        "{glsl}"
    );
    assert!(glsl.contains("vec3 Specular0 = Specular0Color.rgb * light.Specular0.rgb;"), "{glsl}");
    assert!(
        glsl.contains("FragSecColor.rgb += (Specular0 + Specular1) * SpotAtt * DistAtt;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("} else if (DebugLut == 6) {\n        Output = vec4(vec3(LutReflecB), 1.0);\n"),
        "{glsl}"
    );
}

#[test]
fn disabled_lighting_never_touches_the_light_array() {
    let desc = MaterialDescription::new(lit_stages());
    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    let body = main_body(&shader.glsl);

    assert!(!shader.uses_fragment_lighting);
    assert!(
        body.contains("    vec4 FragPriColor = vec4(0.0);\n    vec4 FragSecColor = vec4(0.0);\n"),
        "{body}"
    );
    assert!(!body.contains("Lights["), "{body}");
    assert!(!body.contains("SampleLut("), "{body}");
    assert!(!body.contains("DebugLut =="), "{body}");
    assert!(!shader.glsl.contains("const float LutScale"), "{}", shader.glsl);
}

#[test]
fn lut_terms_follow_material_flags() {
    let mut desc = MaterialDescription::new(lit_stages());
    let lighting = &mut desc.lighting;
    lighting.fragment_lighting_enabled = true;
    lighting.luts_enabled = LutFlags::DIST0 | LutFlags::GEO_FACTOR_GLOBAL;
    lighting.clamp_highlight = true;
    lighting.fresnel = FresnelSelector::Both;
    lighting.luts.fresnel.input = LutInput::NormalView;
    lighting.luts.fresnel.scale = 0.5;

    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    let glsl = &shader.glsl;

    let constants = position(
        glsl,
        "const float LutScaleDist0 = 1.0;\nconst float LutScaleFresnel = 0.5;\n",
    );
    assert!(constants < position(glsl, "void main() {"), "{glsl}");
    assert!(!glsl.contains("LutScaleDist1"), "{glsl}");

    assert!(
        glsl.contains("        float Dist0 = SampleLut(LUT_DIST0, LutScaleDist0 * dot(Normal, HalfVector));\n        LutDist0 = Dist0;\n"),
        "{glsl}"
    );
    assert!(
        glsl.contains("vec3 Specular0 = Specular0Color.rgb * light.Specular0.rgb * Dist0 * GeoFactor;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("vec3 Specular1 = Specular1Color.rgb * light.Specular1.rgb * GeoFactor;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("FragSecColor.rgb += (Specular0 + Specular1) * SpotAtt * DistAtt * ClampMask;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("float Fresnel = SampleLut(LUT_FRESNEL, LutScaleFresnel * dot(Normal, View));"),
        "{glsl}"
    );
    assert!(glsl.contains("FragPriColor.a = Fresnel;"), "{glsl}");
    assert!(glsl.contains("FragSecColor.a = Fresnel;"), "{glsl}");

    let mut secondary_only = desc.clone();
    secondary_only.lighting.fresnel = FresnelSelector::Secondary;
    let glsl = generate_fragment_shader(&secondary_only, GlslOptions::default())
        .unwrap()
        .glsl;
    assert!(!glsl.contains("FragPriColor.a = Fresnel;"), "{glsl}");
    assert!(glsl.contains("FragSecColor.a = Fresnel;"), "{glsl}");
}

#[test]
fn reflection_and_dist1_scale_the_second_specular_term() {
    let mut desc = MaterialDescription::new(lit_stages());
    desc.lighting.fragment_lighting_enabled = true;
    desc.lighting.luts_enabled = LutFlags::REFLECTION | LutFlags::DIST1 | LutFlags::GEO_FACTOR0;
    desc.lighting.luts.reflec_r.input = LutInput::CosPhi;
    desc.lighting.luts.reflec_r.scale = 2.0;

    let glsl = generate_fragment_shader(&desc, GlslOptions::default())
        .unwrap()
        .glsl;
    assert!(glsl.contains("const float LutScaleReflecR = 2.0;\n"), "{glsl}");
    assert!(
        glsl.contains("float ReflecR = SampleLut(LUT_REFLEC_R, LutScaleReflecR * CosPhi(Normal, HalfVector, Tangent));"),
        "{glsl}"
    );
    assert!(glsl.contains("vec3 Reflection = vec3(ReflecR, ReflecG, ReflecB);"), "{glsl}");
    assert!(
        glsl.contains("vec3 Specular0 = Specular0Color.rgb * light.Specular0.rgb * GeoFactor;"),
        "{glsl}"
    );
    assert!(
        glsl.contains("vec3 Specular1 = Specular1Color.rgb * light.Specular1.rgb * Reflection * Dist1;"),
        "{glsl}"
    );
}

#[test]
fn bump_map_is_sampled_by_the_lighting_block() {
    let mut desc = MaterialDescription::new(lit_stages());
    desc.lighting.fragment_lighting_enabled = true;
    desc.lighting.bump_mode = BumpMode::AsBump;
    desc.lighting.bump_texture_unit = 1;
    desc.lighting.renormalize_z = true;

    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    let glsl = &shader.glsl;
    assert_eq!(shader.texture_units_mask, 0b011);

    let sample = position(glsl, "vec4 Color1 = texture(Textures[1], TexCoord1.xy);");
    let decode = position(glsl, "SurfNormal = Color1.xyz * 2.0 - 1.0;");
    assert!(sample < decode, "{glsl}");
    assert!(
        glsl.contains("SurfNormal.z = sqrt(max(1.0 - dot(SurfNormal.xy, SurfNormal.xy), 0.0));"),
        "{glsl}"
    );

    // A later stage reading the same unit reuses the declaration.
    let mut stages = lit_stages();
    stages.push(CombinerStage::modulate(CombinerSource::Previous, CombinerSource::Texture1));
    desc.stages = stages;
    let glsl = generate_fragment_shader(&desc, GlslOptions::default())
        .unwrap()
        .glsl;
    assert_eq!(glsl.matches("vec4 Color1 =").count(), 1, "{glsl}");
}

#[test]
fn tangent_map_perturbs_the_tangent() {
    let mut desc = MaterialDescription::new(lit_stages());
    desc.lighting.fragment_lighting_enabled = true;
    desc.lighting.bump_mode = BumpMode::AsTangent;
    desc.lighting.bump_texture_unit = 2;

    let glsl = generate_fragment_shader(&desc, GlslOptions::default())
        .unwrap()
        .glsl;
    assert!(glsl.contains("SurfTangent = Color2.xyz * 2.0 - 1.0;"), "{glsl}");
    assert!(!glsl.contains("SurfNormal = Color"), "{glsl}");
    assert!(!glsl.contains(".z = sqrt"), "{glsl}");
    assert!(glsl.contains("vec3 Tangent = QuatRotate(NormalQuat, SurfTangent);"), "{glsl}");
}

#[test]
fn bump_map_is_not_sampled_without_a_lighting_reader() {
    let mut desc = MaterialDescription::new(vec![CombinerStage::replace(CombinerSource::Texture0)]);
    desc.lighting.fragment_lighting_enabled = true;
    desc.lighting.bump_mode = BumpMode::AsBump;
    desc.lighting.bump_texture_unit = 2;

    let shader = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    assert!(!shader.uses_fragment_lighting);
    assert_eq!(shader.texture_units_mask, 0b001);
    assert!(!shader.glsl.contains("vec4 Color2 ="));
}

#[test]
fn lut_scale_changes_text_and_hash() {
    let mut desc = MaterialDescription::new(lit_stages());
    desc.lighting.fragment_lighting_enabled = true;
    desc.lighting.luts_enabled = LutFlags::DIST0;

    let a = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    desc.lighting.luts.dist0.scale = 4.0;
    let b = generate_fragment_shader(&desc, GlslOptions::default()).unwrap();
    assert_ne!(a.hash, b.hash);
    assert_ne!(a.glsl, b.glsl);
    assert!(b.glsl.contains("const float LutScaleDist0 = 4.0;"));
}
