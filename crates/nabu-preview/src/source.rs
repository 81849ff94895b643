use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nabu_engine::{GraphicsContext, ProgramBuild, ShaderLanguage};

/// Animated gradient shown when no shader is given on the command line.
pub const DEMO_FRAGMENT: &str = "#version 450

layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;

layout(set = 0, binding = 0) uniform NabuFrame {
    vec2 resolution;
    float time;
};

void main() {
    vec3 col = 0.5 + 0.5 * cos(time + v_uv.xyx + vec3(0.0, 2.0, 4.0));
    o_color = vec4(col, 1.0);
}
";

/// Shader stages to preview.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderSources {
    /// Fragment stage paired with the engine's built-in vertex stage.
    Fragment {
        language: ShaderLanguage,
        fragment: String,
    },
    Pair {
        language: ShaderLanguage,
        vertex: String,
        fragment: String,
    },
}

impl ShaderSources {
    /// Reads `[fragment]` or `[vertex fragment]` paths; no paths gives the demo.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let paths: Vec<PathBuf> = args.into_iter().map(PathBuf::from).collect();

        match paths.as_slice() {
            [] => Ok(Self::Fragment {
                language: ShaderLanguage::Glsl,
                fragment: DEMO_FRAGMENT.to_owned(),
            }),
            [fragment] => Ok(Self::Fragment {
                language: language_for(fragment),
                fragment: read(fragment)?,
            }),
            [vertex, fragment] => {
                let language = language_for(vertex);
                anyhow::ensure!(
                    language == language_for(fragment),
                    "vertex and fragment stages must use the same language"
                );
                Ok(Self::Pair {
                    language,
                    vertex: read(vertex)?,
                    fragment: read(fragment)?,
                })
            }
            _ => anyhow::bail!("usage: nabu-preview [VERTEX] [FRAGMENT]"),
        }
    }

    pub fn compile(&self, ctx: &mut GraphicsContext) -> ProgramBuild {
        match self {
            Self::Fragment { language, fragment } => {
                ctx.compile_fragment_program_with(*language, fragment)
            }
            Self::Pair {
                language,
                vertex,
                fragment,
            } => ctx.compile_program_with(*language, vertex, fragment),
        }
    }
}

/// `.wgsl` files are WGSL, everything else is GLSL.
pub fn language_for(path: &Path) -> ShaderLanguage {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wgsl") => ShaderLanguage::Wgsl,
        _ => ShaderLanguage::Glsl,
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
