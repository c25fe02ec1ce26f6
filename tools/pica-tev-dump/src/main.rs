use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use pica_tev::{generate_fragment_shader, GeneratedFragmentShader, GlslOptions, MaterialDescription};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PICA_TEV_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "pica-tev-dump",
    about = "Generate GLSL fragment shaders from PICA200 material descriptions (JSON)."
)]
struct Args {
    /// Material description files (JSON)
    #[arg(required = true, value_name = "INPUT.json")]
    inputs: Vec<PathBuf>,

    /// Write `<stem>.frag` files here instead of printing to stdout
    #[arg(long, value_name = "DIR", env = "PICA_TEV_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Only emit the first N combiner stages (for inspecting intermediate results)
    #[arg(long, value_name = "N", env = "PICA_TEV_STAGE_LIMIT")]
    stage_limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let options = GlslOptions {
        stage_limit: args.stage_limit,
    };
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;
    }

    let mut failures = 0usize;
    for input in &args.inputs {
        let result = generate_one(input, options)
            .and_then(|shader| emit(input, &shader, args.out_dir.as_deref()));
        if let Err(err) = result {
            error!(input = %input.display(), "{err:#}");
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} of {} material(s) failed", args.inputs.len());
    }
    Ok(())
}

fn generate_one(input: &Path, options: GlslOptions) -> anyhow::Result<GeneratedFragmentShader> {
    let text = fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let desc: MaterialDescription =
        serde_json::from_str(&text).with_context(|| format!("parse {}", input.display()))?;
    generate_fragment_shader(&desc, options)
        .with_context(|| format!("generate shader for {}", input.display()))
}

fn emit(
    input: &Path,
    shader: &GeneratedFragmentShader,
    out_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(dir) = out_dir else {
        io::stdout()
            .lock()
            .write_all(shader.glsl.as_bytes())
            .context("write stdout")?;
        return Ok(());
    };

    let stem = input
        .file_stem()
        .with_context(|| format!("input {} has no file name", input.display()))?;
    let out_path = dir.join(format!("{}.frag", stem.to_string_lossy()));
    fs::write(&out_path, &shader.glsl).with_context(|| format!("write {}", out_path.display()))?;
    info!(
        input = %input.display(),
        output = %out_path.display(),
        hash = %shader.hash.to_hex(),
        lighting = shader.uses_fragment_lighting,
        "wrote fragment shader"
    );
    Ok(())
}
