//! Interface checks between a vertex and a fragment stage.
//!
//! Everything wgpu would reject at pipeline creation is caught here and turned
//! into link log lines instead.

use crate::render::QuadVertex;
use crate::shader::reflect::{is_float4, is_float_scalar_or_vector, StageInterface, UniformBlock};

/// A uniform block after merging both stages.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkedBlock {
    pub block: UniformBlock,
    pub visibility: wgpu::ShaderStages,
}

/// Checks that `vs` and `fs` form a drawable program.
///
/// On success returns the merged uniform blocks ordered by binding; on failure
/// returns one `error:` line per problem.
pub(crate) fn link(vs: &StageInterface, fs: &StageInterface) -> Result<Vec<LinkedBlock>, String> {
    let mut errors = Vec::new();

    let provided = QuadVertex::layout();
    for input in &vs.inputs {
        let known = provided
            .attributes
            .iter()
            .any(|a| a.shader_location == input.location);
        if !known {
            errors.push(format!(
                "vertex input at location {} is not provided (0 = position, 1 = uv)",
                input.location
            ));
        } else if !is_float_scalar_or_vector(&input.ty) {
            // Components the buffer lacks read as (0, 0, 1).
            errors.push(format!(
                "vertex input at location {} must be an f32 scalar or vector",
                input.location
            ));
        }
    }

    for input in &fs.inputs {
        match vs.outputs.iter().find(|o| o.location == input.location) {
            None => errors.push(format!(
                "fragment input at location {} has no matching vertex output",
                input.location
            )),
            Some(output) if output.ty != input.ty => errors.push(format!(
                "fragment input at location {} does not match the vertex output type",
                input.location
            )),
            Some(_) => {}
        }
    }

    match fs.outputs.as_slice() {
        [] => errors.push("fragment stage writes no color output".to_owned()),
        outputs => {
            for output in outputs {
                if output.location != 0 {
                    errors.push(format!(
                        "fragment output at location {} has no color target",
                        output.location
                    ));
                } else if !is_float4(&output.ty) {
                    errors.push("fragment output at location 0 must be a vec4 of f32".to_owned());
                }
            }
        }
    }

    for name in vs.unsupported.iter().chain(&fs.unsupported) {
        errors.push(format!("resource `{name}` is not a uniform buffer"));
    }

    let blocks = merge_blocks(vs, fs, &mut errors);

    if errors.is_empty() {
        Ok(blocks)
    } else {
        Err(errors
            .iter()
            .map(|e| format!("error: {e}\n"))
            .collect())
    }
}

fn merge_blocks(vs: &StageInterface, fs: &StageInterface, errors: &mut Vec<String>) -> Vec<LinkedBlock> {
    let mut merged: Vec<LinkedBlock> = Vec::new();
    let stages = [
        (wgpu::ShaderStages::VERTEX, &vs.uniforms),
        (wgpu::ShaderStages::FRAGMENT, &fs.uniforms),
    ];

    for (stage, blocks) in stages {
        for block in blocks.iter() {
            if block.group != 0 {
                errors.push(format!(
                    "uniform block at group {} binding {} must be in group 0",
                    block.group, block.binding
                ));
                continue;
            }

            match merged.iter_mut().find(|m| m.block.binding == block.binding) {
                Some(existing) if existing.block.same_layout(block) => {
                    existing.visibility |= stage;
                }
                Some(_) => errors.push(format!(
                    "uniform blocks at binding {} differ between stages",
                    block.binding
                )),
                None => merged.push(LinkedBlock {
                    block: block.clone(),
                    visibility: stage,
                }),
            }
        }
    }

    merged.sort_by_key(|m| m.block.binding);
    merged
}
