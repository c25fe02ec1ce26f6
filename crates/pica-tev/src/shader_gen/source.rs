use crate::material::{ChannelSelect, CombinerOperand, CombinerSource, ConstantSelector};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Component {
    /// Four-component argument; the stage keeps `.rgb` of the combined value.
    Color,
    /// Scalar argument.
    Alpha,
}

/// Material color read by a stage's `Constant` source.
pub(crate) fn constant_expr(selector: ConstantSelector) -> &'static str {
    match selector {
        ConstantSelector::Constant0 => "ConstantColor0",
        ConstantSelector::Constant1 => "ConstantColor1",
        ConstantSelector::Constant2 => "ConstantColor2",
        ConstantSelector::Constant3 => "ConstantColor3",
        ConstantSelector::Constant4 => "ConstantColor4",
        // Lights may override constant 5, so stages read the local copy.
        ConstantSelector::Constant5 => "Constant5",
        ConstantSelector::Diffuse => "DiffuseColor",
        ConstantSelector::Ambient => "AmbientColor",
        ConstantSelector::Specular0 => "Specular0Color",
        ConstantSelector::Specular1 => "Specular1Color",
        ConstantSelector::Emission => "EmissionColor",
    }
}

fn source_base(source: CombinerSource, constant: &str) -> &str {
    match source {
        CombinerSource::PrimaryColor => "VertexColor",
        CombinerSource::FragmentPrimaryColor => "FragPriColor",
        CombinerSource::FragmentSecondaryColor => "FragSecColor",
        CombinerSource::Texture0 => "Color0",
        CombinerSource::Texture1 => "Color1",
        CombinerSource::Texture2 => "Color2",
        CombinerSource::PreviousBuffer => "CombBuffer",
        CombinerSource::Constant => constant,
        CombinerSource::Previous => "Previous",
    }
}

/// Expression for one combiner argument.
///
/// Pure: declarations the expression depends on (texture samples, lighting accumulators) are
/// the caller's responsibility.
pub(crate) fn resolve_argument(
    source: CombinerSource,
    operand: CombinerOperand,
    constant: &str,
    component: Component,
) -> String {
    let base = source_base(source, constant);
    let swizzle = match component {
        Component::Color => match operand.channel {
            ChannelSelect::None => "",
            ChannelSelect::Alpha => ".aaaa",
            ChannelSelect::Red => ".rrrr",
            ChannelSelect::Green => ".gggg",
            ChannelSelect::Blue => ".bbbb",
        },
        Component::Alpha => match operand.channel {
            ChannelSelect::None | ChannelSelect::Alpha => ".a",
            ChannelSelect::Red => ".r",
            ChannelSelect::Green => ".g",
            ChannelSelect::Blue => ".b",
        },
    };

    if operand.invert {
        format!("(1.0 - {base}{swizzle})")
    } else {
        format!("{base}{swizzle}")
    }
}
