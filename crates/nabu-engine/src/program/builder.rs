use std::borrow::Cow;

use crate::device::SURFACE_FORMAT;
use crate::render::QuadVertex;
use crate::shader::reflect::reflect;
use crate::shader::{CompiledStage, ShaderCompiler, ShaderLanguage, StageKind};
use crate::uniform::UniformBinder;

use super::builtin::BUILTIN_VERTEX_SHADER;
use super::link::{link, LinkedBlock};

/// A linked (or failed) pair of shader stages plus its GPU objects.
///
/// Programs are immutable once built. A program whose stages failed to
/// compile or link keeps its log but has no pipeline and cannot be drawn.
pub struct Program {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
    /// One buffer per uniform block, in the binder's block order.
    buffers: Vec<wgpu::Buffer>,
    uniforms: UniformBinder,
    builtin_vertex: bool,
    log: String,
}

impl Program {
    pub(crate) fn unlinked(log: String) -> Self {
        Self {
            pipeline: None,
            bind_group: None,
            buffers: Vec::new(),
            uniforms: UniformBinder::default(),
            builtin_vertex: false,
            log,
        }
    }

    /// Link status.
    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Compile and link diagnostics of both stages.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn uniforms(&self) -> &UniformBinder {
        &self.uniforms
    }

    pub(crate) fn uniforms_mut(&mut self) -> &mut UniformBinder {
        &mut self.uniforms
    }

    /// Returns true if the vertex stage is [`BUILTIN_VERTEX_SHADER`].
    pub fn uses_builtin_vertex(&self) -> bool {
        self.builtin_vertex
    }

    pub(crate) fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub(crate) fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Uploads uniform blocks written since the last flush.
    pub(crate) fn flush_uniforms(&mut self, queue: &wgpu::Queue) {
        let buffers = &self.buffers;
        self.uniforms.flush(|index, bytes| {
            if let Some(buffer) = buffers.get(index) {
                queue.write_buffer(buffer, 0, bytes);
            }
        });
    }
}

/// Compiles, links and creates render pipelines for programs.
pub struct ProgramBuilder<'a> {
    device: &'a wgpu::Device,
    language: ShaderLanguage,
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            language: ShaderLanguage::Glsl,
        }
    }

    /// Source language of the stages passed to `build*`.
    pub fn language(mut self, language: ShaderLanguage) -> Self {
        self.language = language;
        self
    }

    /// Compiles both stages and links them.
    pub fn build(&self, vertex_source: &str, fragment_source: &str) -> Program {
        let vs = ShaderCompiler::compile_with(self.language, vertex_source, StageKind::Vertex);
        let fs = ShaderCompiler::compile_with(self.language, fragment_source, StageKind::Fragment);
        self.link(&vs, &fs)
    }

    /// Links `fragment_source` against [`BUILTIN_VERTEX_SHADER`].
    pub fn build_fragment(&self, fragment_source: &str) -> Program {
        let vs = ShaderCompiler::compile(BUILTIN_VERTEX_SHADER, StageKind::Vertex);
        let fs = ShaderCompiler::compile_with(self.language, fragment_source, StageKind::Fragment);
        let mut program = self.link(&vs, &fs);
        program.builtin_vertex = true;
        program
    }

    /// Links two compiled stages.
    ///
    /// Always returns a program; check [`Program::is_linked`] and
    /// [`Program::log`] for the outcome.
    pub fn link(&self, vs: &CompiledStage, fs: &CompiledStage) -> Program {
        let mut log = String::new();
        for stage in [vs, fs] {
            if stage.has_log() {
                log.push_str(&format!("{} stage:\n{}", stage.kind(), stage.log()));
                if !log.ends_with('\n') {
                    log.push('\n');
                }
            }
        }

        let (Some(vs_module), Some(fs_module)) = (vs.module(), fs.module()) else {
            log.push_str("error: not linked, a stage failed to compile\n");
            return Program::unlinked(log);
        };

        let interfaces = reflect(vs_module, vs.entry_point()).zip(reflect(fs_module, fs.entry_point()));
        let Some((vs_iface, fs_iface)) = interfaces else {
            log.push_str("error: entry point missing from compiled stage\n");
            return Program::unlinked(log);
        };

        let blocks = match link(&vs_iface, &fs_iface) {
            Ok(blocks) => blocks,
            Err(errors) => {
                log.push_str(&errors);
                log::warn!("program failed to link:\n{log}");
                return Program::unlinked(log);
            }
        };

        let uniforms = UniformBinder::new(
            &blocks.iter().map(|b| b.block.clone()).collect::<Vec<_>>(),
        );

        // Anything wgpu still rejects lands in the scope instead of the
        // device's uncaptured error handler.
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let objects = self.create_gpu_objects(
            &blocks,
            (vs_module, vs.entry_point()),
            (fs_module, fs.entry_point()),
        );
        if let Some(err) = pollster::block_on(scope.pop()) {
            log.push_str(&format!("error: {err}\n"));
            log::warn!("program rejected by the device:\n{log}");
            return Program::unlinked(log);
        }

        let (pipeline, bind_group, buffers) = objects;
        Program {
            pipeline: Some(pipeline),
            bind_group,
            buffers,
            uniforms,
            builtin_vertex: false,
            log,
        }
    }

    fn create_gpu_objects(
        &self,
        blocks: &[LinkedBlock],
        (vs_module, vs_entry): (&naga::Module, &str),
        (fs_module, fs_entry): (&naga::Module, &str),
    ) -> (wgpu::RenderPipeline, Option<wgpu::BindGroup>, Vec<wgpu::Buffer>) {
        let buffers = self.create_uniform_buffers(blocks);
        let (layout, bind_group) = self.create_bindings(blocks, &buffers);

        let vs_shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nabu vertex stage"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(vs_module.clone())),
        });
        let fs_shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nabu fragment stage"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(fs_module.clone())),
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = layout.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("nabu program pipeline layout"),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("nabu program pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs_shader,
                entry_point: Some(vs_entry),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs_shader,
                entry_point: Some(fs_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SURFACE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            // Depth is cleared every frame but never tested.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        (pipeline, bind_group, buffers)
    }

    fn create_uniform_buffers(&self, blocks: &[LinkedBlock]) -> Vec<wgpu::Buffer> {
        blocks
            .iter()
            .map(|b| {
                self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("nabu uniform buffer"),
                    size: crate::uniform::buffer_size(b.block.size) as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect()
    }

    fn create_bindings(
        &self,
        blocks: &[LinkedBlock],
        buffers: &[wgpu::Buffer],
    ) -> (Option<wgpu::BindGroupLayout>, Option<wgpu::BindGroup>) {
        if blocks.is_empty() {
            return (None, None);
        }

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
            .iter()
            .map(|b| wgpu::BindGroupLayoutEntry {
                binding: b.block.binding,
                visibility: b.visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("nabu uniform bgl"),
                entries: &layout_entries,
            });

        let group_entries: Vec<wgpu::BindGroupEntry> = blocks
            .iter()
            .zip(buffers)
            .map(|(b, buffer)| wgpu::BindGroupEntry {
                binding: b.block.binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu uniform bind group"),
            layout: &layout,
            entries: &group_entries,
        });

        (Some(layout), Some(bind_group))
    }
}
