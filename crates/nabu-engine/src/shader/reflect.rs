//! Stage interface reflection over validated naga IR.

use naga::{AddressSpace, Binding, Scalar, TypeInner, VectorSize};

use crate::uniform::UniformKind;

/// A location-bound stage input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct IoSlot {
    pub location: u32,
    pub name: Option<String>,
    pub ty: TypeInner,
}

/// One member of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// A uniform buffer binding and its layout.
///
/// GLSL declarations like `uniform float time;` reach here as members of the
/// compiler's per-stage block (see [`crate::shader::loose_uniform_binding`]).
/// A WGSL `var<uniform>` of scalar or vector type is reported as a block with
/// a single member at offset 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub name: Option<String>,
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    /// Returns true if both blocks describe the same memory layout.
    pub fn same_layout(&self, other: &UniformBlock) -> bool {
        self.size == other.size && self.members == other.members
    }
}

/// Everything the linker needs to know about one compiled stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageInterface {
    pub inputs: Vec<IoSlot>,
    pub outputs: Vec<IoSlot>,
    pub uniforms: Vec<UniformBlock>,
    /// Bound resources other than uniform buffers (textures, samplers, storage).
    pub unsupported: Vec<String>,
}

/// Extracts the interface of `entry_point` from `module`.
///
/// Returns `None` if the module has no entry point with that name.
pub fn reflect(module: &naga::Module, entry_point: &str) -> Option<StageInterface> {
    let ep = module.entry_points.iter().find(|ep| ep.name == entry_point)?;
    let mut iface = StageInterface::default();

    for arg in &ep.function.arguments {
        collect_slots(module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut iface.inputs);
    }
    if let Some(result) = &ep.function.result {
        collect_slots(module, result.ty, result.binding.as_ref(), None, &mut iface.outputs);
    }

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = var.binding.as_ref() else { continue };
        match var.space {
            AddressSpace::Uniform => match uniform_block(module, var, rb) {
                Some(block) => iface.uniforms.push(block),
                None => iface.unsupported.push(global_name(var)),
            },
            _ => iface.unsupported.push(global_name(var)),
        }
    }

    iface.inputs.sort_by_key(|s| s.location);
    iface.outputs.sort_by_key(|s| s.location);
    Some(iface)
}

fn collect_slots(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<IoSlot>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(IoSlot {
            location: *location,
            name: name.map(str::to_owned),
            ty: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_slots(module, m.ty, m.binding.as_ref(), m.name.as_deref(), out);
                }
            }
        }
    }
}

fn uniform_block(
    module: &naga::Module,
    var: &naga::GlobalVariable,
    rb: &naga::ResourceBinding,
) -> Option<UniformBlock> {
    let inner = &module.types[var.ty].inner;

    let (size, members) = match inner {
        TypeInner::Struct { members, span } => {
            let members = members
                .iter()
                .filter_map(|m| {
                    Some(UniformMember {
                        name: m.name.clone()?,
                        offset: m.offset,
                        kind: uniform_kind(&module.types[m.ty].inner),
                    })
                })
                .collect();
            (*span, members)
        }
        other => {
            let kind = uniform_kind(other);
            let size = kind.byte_size()?;
            let name = var.name.clone()?;
            (size, vec![UniformMember { name, offset: 0, kind }])
        }
    };

    Some(UniformBlock {
        group: rb.group,
        binding: rb.binding,
        name: var.name.clone().filter(|n| !n.is_empty()),
        size,
        members,
    })
}

/// Maps a naga type to the uniform kinds the binder can write.
pub(crate) fn uniform_kind(inner: &TypeInner) -> UniformKind {
    match *inner {
        TypeInner::Scalar(s) if s == Scalar::F32 => UniformKind::Float,
        TypeInner::Scalar(s) if s == Scalar::I32 => UniformKind::Int,
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => match size {
            VectorSize::Bi => UniformKind::Float2,
            VectorSize::Tri => UniformKind::Float3,
            VectorSize::Quad => UniformKind::Float4,
        },
        _ => UniformKind::Other,
    }
}

/// Returns true for `f32` and any `vecN<f32>`.
pub(crate) fn is_float_scalar_or_vector(inner: &TypeInner) -> bool {
    match *inner {
        TypeInner::Scalar(s) | TypeInner::Vector { scalar: s, .. } => s == Scalar::F32,
        _ => false,
    }
}

/// Returns true for `vec4<f32>`.
pub(crate) fn is_float4(inner: &TypeInner) -> bool {
    uniform_kind(inner) == UniformKind::Float4
}

fn global_name(var: &naga::GlobalVariable) -> String {
    var.name.clone().unwrap_or_else(|| "<unnamed>".to_owned())
}
