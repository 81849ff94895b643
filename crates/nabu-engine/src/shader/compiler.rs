use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::glsl::GlslSource;

/// Pipeline stage a source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        })
    }
}

/// Source language of a shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ShaderLanguage {
    /// GLSL 4.x, Vulkan flavor. `main` is the entry point.
    #[default]
    Glsl,
    /// WGSL. The entry point is the function tagged with the stage attribute.
    Wgsl,
}

/// Result of compiling one stage.
///
/// `success` and `log` are independent: a successful compile may carry
/// warnings, and a failed one always carries at least one error line.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    kind: StageKind,
    module: Option<naga::Module>,
    entry_point: String,
    log: String,
}

impl CompiledStage {
    fn failed(kind: StageKind, log: String) -> Self {
        Self {
            kind,
            module: None,
            entry_point: String::new(),
            log,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Compile status.
    pub fn success(&self) -> bool {
        self.module.is_some()
    }

    /// Diagnostic text. Empty when the compiler had nothing to say.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn has_log(&self) -> bool {
        !self.log.is_empty()
    }

    /// Validated IR; `None` when compilation failed.
    pub fn module(&self) -> Option<&naga::Module> {
        self.module.as_ref()
    }

    /// Name of the entry point used for this stage.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Compiles individual shader stages.
///
/// Parsing and validation run on the CPU through naga, the same front-end wgpu
/// uses internally, so diagnostics are available without a device.
#[derive(Debug, Default, Copy, Clone)]
pub struct ShaderCompiler;

impl ShaderCompiler {
    /// Compiles a GLSL stage.
    pub fn compile(source: &str, kind: StageKind) -> CompiledStage {
        Self::compile_with(ShaderLanguage::Glsl, source, kind)
    }

    /// Compiles a stage written in `language`.
    ///
    /// Diagnostic line numbers refer to `source` as given, even when a GLSL
    /// stage was rewritten before parsing.
    pub fn compile_with(language: ShaderLanguage, source: &str, kind: StageKind) -> CompiledStage {
        let module = match language {
            ShaderLanguage::Glsl => Self::parse_glsl(source, kind),
            ShaderLanguage::Wgsl => Self::parse_wgsl(source),
        };

        let module = match module {
            Ok(module) => module,
            Err(log) => return Self::report(CompiledStage::failed(kind, log)),
        };

        let mut log = String::new();
        let Some(entry_point) = select_entry_point(&module, kind, &mut log) else {
            log.push_str(&format!("error: no {kind} entry point found\n"));
            return Self::report(CompiledStage::failed(kind, log));
        };

        Self::report(CompiledStage {
            kind,
            module: Some(module),
            entry_point,
            log,
        })
    }

    fn parse_glsl(source: &str, kind: StageKind) -> Result<naga::Module, String> {
        let prepared = GlslSource::prepare(source, kind);

        let options = naga::front::glsl::Options::from(kind.naga_stage());
        let module = naga::front::glsl::Frontend::default()
            .parse(&options, prepared.text())
            .map_err(|mut errors| {
                for error in &mut errors.errors {
                    error.meta = prepared.original_span(error.meta);
                }
                errors.emit_to_string(source)
            })?;

        validate(&module).map_err(|err| prepared.remap(err).emit_to_string(source))?;
        Ok(module)
    }

    fn parse_wgsl(source: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
        validate(&module).map_err(|err| err.emit_to_string(source))?;
        Ok(module)
    }

    fn report(stage: CompiledStage) -> CompiledStage {
        if !stage.success() {
            log::warn!("{} stage failed to compile:\n{}", stage.kind, stage.log);
        } else if stage.has_log() {
            log::debug!("{} stage compiled with diagnostics:\n{}", stage.kind, stage.log);
        }
        stage
    }
}

fn validate(
    module: &naga::Module,
) -> Result<naga::valid::ModuleInfo, naga::WithSpan<naga::valid::ValidationError>> {
    Validator::new(ValidationFlags::all(), Capabilities::default()).validate(module)
}

fn select_entry_point(module: &naga::Module, kind: StageKind, log: &mut String) -> Option<String> {
    let stage = kind.naga_stage();
    let mut candidates = module.entry_points.iter().filter(|ep| ep.stage == stage);

    let first = candidates.next()?;
    let extra = candidates.count();
    if extra > 0 {
        log.push_str(&format!(
            "warning: {} {kind} entry points declared, using `{}`\n",
            extra + 1,
            first.name
        ));
    }
    Some(first.name.clone())
}
