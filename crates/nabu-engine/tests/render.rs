//! End-to-end frame tests against a real GPU adapter.
//!
//! Every test skips itself when the machine exposes no adapter.

use nabu_engine::render::frame_len;
use nabu_engine::{ContextConfig, GraphicsContext, RenderError, UniformLocation, UniformValue};

const MAX: u32 = 256;

const UV_VS: &str = "#version 450
layout(location = 0) in vec2 a_pos;
layout(location = 1) in vec2 a_uv;
layout(location = 0) out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_uv.x * 2.0 - 1.0, 1.0 - a_uv.y * 2.0, 0.0, 1.0);
}
";

const RED_FS: &str = "#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(1.0, 0.0, 0.0, 1.0);
}
";

const GRADIENT_FS: &str = "#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(v_uv.x, 0.0, 0.0, 1.0);
}
";

const TINT_FS: &str = "#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
layout(set = 0, binding = 0) uniform Tint {
    vec2 rg;
};
void main() {
    o_color = vec4(rg, 0.0, 1.0);
}
";

fn context_with(config: ContextConfig) -> Option<GraphicsContext> {
    let _ = env_logger::builder().is_test(true).try_init();

    match GraphicsContext::initialize(config) {
        Ok(ctx) => Some(ctx),
        Err(RenderError::NoAdapter(_) | RenderError::Device(_)) => {
            eprintln!("skipping: no usable GPU adapter");
            None
        }
        Err(err) => panic!("context creation failed: {err}"),
    }
}

fn context() -> Option<GraphicsContext> {
    context_with(ContextConfig::default().with_max_size(MAX, MAX))
}

fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let at = ((y * width + x) * 4) as usize;
    [frame[at], frame[at + 1], frame[at + 2], frame[at + 3]]
}

#[test]
fn initialize_and_shutdown() {
    let Some(ctx) = context() else { return };
    assert_eq!(ctx.max_size(), (MAX, MAX));
    assert_eq!(ctx.active_program(), None);
    ctx.shutdown();
}

#[test]
fn zero_surface_bound_is_rejected() {
    let err = GraphicsContext::initialize(ContextConfig::default().with_max_size(0, 64)).err();
    assert!(matches!(err, Some(RenderError::EmptySurface { width: 0, height: 64 })));
}

#[test]
fn solid_red_reads_back_as_bgra() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, RED_FS);
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    let mut out = vec![0u8; frame_len(32, 16)];
    ctx.render_frame(32, 16, &mut out).unwrap();

    for px in out.chunks_exact(4) {
        assert_eq!(px, [0, 0, 255, 255]);
    }
}

#[test]
fn bytes_past_the_frame_are_untouched() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, RED_FS);
    ctx.select_program(build.id).unwrap();

    let len = frame_len(8, 8);
    let mut out = vec![0xAB; len + 100];
    ctx.render_frame(8, 8, &mut out).unwrap();

    assert!(out[..len].chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
    assert!(out[len..].iter().all(|&b| b == 0xAB));
}

#[test]
fn uv_gradient_runs_left_to_right_across_sizes() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, GRADIENT_FS);
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    for (width, height) in [(64, 32), (16, 16), (MAX, 4)] {
        let mut out = vec![0u8; frame_len(width, height)];
        ctx.render_frame(width, height, &mut out).unwrap();

        for y in [0, height - 1] {
            let reds: Vec<u8> = (0..width).map(|x| pixel(&out, width, x, y)[2]).collect();
            assert!(reds.windows(2).all(|w| w[0] <= w[1]), "{width}x{height} row {y}");
            assert!(reds[0] < 16, "{width}x{height} left edge {}", reds[0]);
            assert!(reds[width as usize - 1] > 239, "{width}x{height} right edge");
        }
    }
}

#[test]
fn uniform_float2_drives_the_color() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, TINT_FS);
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    let loc = ctx.locate_uniform(build.id, "rg");
    assert!(loc.is_found());

    let mut out = vec![0u8; frame_len(4, 4)];

    ctx.set_uniform_float2(loc, 1.0, 0.0).unwrap();
    ctx.render_frame(4, 4, &mut out).unwrap();
    assert_eq!(pixel(&out, 4, 2, 2), [0, 0, 255, 255]);

    ctx.set_uniform_float2(loc, 0.0, 1.0).unwrap();
    ctx.render_frame(4, 4, &mut out).unwrap();
    assert_eq!(pixel(&out, 4, 2, 2), [0, 255, 0, 255]);
}

#[test]
fn wrong_uniform_type_is_rejected() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, TINT_FS);
    ctx.select_program(build.id).unwrap();

    let loc = ctx.locate_uniform(build.id, "rg");
    let err = ctx.set_uniform_float(loc, 1.0).unwrap_err();
    assert!(matches!(err, RenderError::UniformTypeMismatch { .. }));
}

#[test]
fn missing_uniform_writes_are_ignored() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, RED_FS);
    let loc = ctx.locate_uniform(build.id, "does_not_exist");
    assert_eq!(loc, UniformLocation::NOT_FOUND);

    // No program selected yet; still a no-op.
    ctx.set_uniform_float(loc, 3.0).unwrap();

    ctx.select_program(build.id).unwrap();
    ctx.set_uniform(loc, UniformValue::Float4([1.0; 4])).unwrap();

    let mut out = vec![0u8; frame_len(2, 2)];
    ctx.render_frame(2, 2, &mut out).unwrap();
    assert_eq!(pixel(&out, 2, 0, 0), [0, 0, 255, 255]);
}

#[test]
fn uniform_from_another_program_is_rejected() {
    let Some(mut ctx) = context() else { return };

    let tint = ctx.compile_program(UV_VS, TINT_FS);
    let red = ctx.compile_program(UV_VS, RED_FS);
    let loc = ctx.locate_uniform(tint.id, "rg");

    ctx.select_program(red.id).unwrap();
    let err = ctx.set_uniform_float2(loc, 1.0, 1.0).unwrap_err();
    assert!(matches!(err, RenderError::ForeignUniform { .. }));
}

#[test]
fn render_without_program_fails() {
    let Some(mut ctx) = context() else { return };

    let mut out = vec![0u8; frame_len(4, 4)];
    let err = ctx.render_frame(4, 4, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::NoProgramSelected));
}

#[test]
fn frame_must_fit_the_surface_and_the_buffer() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, RED_FS);
    ctx.select_program(build.id).unwrap();

    let mut out = vec![0u8; frame_len(MAX + 1, 1)];
    let err = ctx.render_frame(MAX + 1, 1, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::FrameOutOfBounds { .. }));

    let err = ctx.render_frame(0, 4, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::FrameOutOfBounds { .. }));

    let mut short = vec![0u8; frame_len(4, 4) - 1];
    let err = ctx.render_frame(4, 4, &mut short).unwrap_err();
    assert!(matches!(
        err,
        RenderError::BufferTooSmall { required: 64, actual: 63 }
    ));
}

#[test]
fn failed_compile_returns_an_unlinked_handle() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(UV_VS, "#version 450\nvoid main() { oops }\n");
    assert!(!build.linked);
    assert!(build.has_log());
    assert!(build.log.contains("fragment"), "log: {}", build.log);

    ctx.select_program(build.id).unwrap();
    let mut out = vec![0u8; frame_len(4, 4)];
    let err = ctx.render_frame(4, 4, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::ProgramNotLinked(id) if id == build.id));
}

#[test]
fn fragment_program_uses_builtin_vertex_stage() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_fragment_program(
        "layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
layout(set = 0, binding = 0) uniform NabuFrame {
    vec2 resolution;
    float time;
};
void main() {
    o_color = vec4(v_uv.x, time, 0.0, 1.0);
}
",
    );
    assert!(build.linked, "log: {}", build.log);
    assert!(ctx.program(build.id).unwrap().uses_builtin_vertex());
    assert_eq!(ctx.uniform_names(build.id), ["resolution", "time"]);

    ctx.select_program(build.id).unwrap();
    let time = ctx.locate_uniform(build.id, "time");
    ctx.set_uniform_float(time, 1.0).unwrap();

    let (width, height) = (40, 10);
    let mut out = vec![0u8; frame_len(width, height)];
    ctx.render_frame(width, height, &mut out).unwrap();

    let left = pixel(&out, width, 0, 5);
    let right = pixel(&out, width, width - 1, 5);
    assert_eq!(left[1], 255);
    assert!(left[2] < right[2], "left {left:?} right {right:?}");
}

#[test]
fn discarded_fragments_show_the_clear_color() {
    let config = ContextConfig::default()
        .with_max_size(MAX, MAX)
        .with_clear_color(wgpu::Color::GREEN);
    let Some(mut ctx) = context_with(config) else { return };

    let build = ctx.compile_program(
        UV_VS,
        "#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() {
    if (v_uv.x < 0.5) {
        discard;
    }
    o_color = vec4(1.0, 0.0, 0.0, 1.0);
}
",
    );
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    let mut out = vec![0u8; frame_len(8, 2)];
    ctx.render_frame(8, 2, &mut out).unwrap();
    assert_eq!(pixel(&out, 8, 0, 0), [0, 255, 0, 255]);
    assert_eq!(pixel(&out, 8, 7, 1), [0, 0, 255, 255]);
}

fn assert_solid(out: &[u8], expected: [u8; 4], what: &str) {
    for (i, px) in out.chunks_exact(4).enumerate() {
        assert_eq!(px, expected, "{what}: pixel {i}");
    }
}

#[test]
fn builtin_vertex_stage_covers_every_frame_size() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_fragment_program(
        "layout(location = 0) out vec4 o_color;
void main() { o_color = vec4(1.0, 0.0, 0.0, 1.0); }
",
    );
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    for (width, height) in [(64, 32), (16, 48), (MAX, MAX)] {
        let mut out = vec![0u8; frame_len(width, height)];
        ctx.render_frame(width, height, &mut out).unwrap();
        assert_solid(&out, [0, 0, 255, 255], &format!("{width}x{height}"));
    }
}

#[test]
fn pixel_positions_reach_a_custom_vertex_stage() {
    let Some(mut ctx) = context() else { return };

    // vec3 input: the buffer's two components are widened.
    let build = ctx.compile_program(
        "#version 450
layout(location = 0) in vec3 a_pos;
layout(location = 1) in vec2 a_uv;
layout(location = 0) out vec2 v_uv;
layout(set = 0, binding = 0) uniform Frame { vec2 size; };
void main() {
    vec2 ndc = a_pos.xy / size * 2.0 - 1.0;
    gl_Position = vec4(ndc.x, -ndc.y, a_pos.z, 1.0);
    v_uv = a_uv;
}
",
        RED_FS,
    );
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();
    let size = ctx.locate_uniform(build.id, "size");

    for (width, height) in [(64, 32), (16, 48)] {
        ctx.set_uniform_float2(size, width as f32, height as f32).unwrap();
        let mut out = vec![0u8; frame_len(width, height)];
        ctx.render_frame(width, height, &mut out).unwrap();
        assert_solid(&out, [0, 0, 255, 255], &format!("{width}x{height}"));
    }
}

#[test]
fn loose_resolution_uniform_follows_the_frame() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_fragment_program(
        "uniform vec2 resolution;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(step(39.5, resolution.x), 0.0, 0.0, 1.0);
}
",
    );
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    let mut out = vec![0u8; frame_len(40, 4)];
    ctx.render_frame(40, 4, &mut out).unwrap();
    assert_solid(&out, [0, 0, 255, 255], "40 wide");

    let mut out = vec![0u8; frame_len(20, 4)];
    ctx.render_frame(20, 4, &mut out).unwrap();
    assert_solid(&out, [0, 0, 0, 255], "20 wide");
}

#[test]
fn loose_uniform_is_settable_by_name() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(
        UV_VS,
        "#version 450
uniform float level;
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() { o_color = vec4(0.0, level, 0.0, 1.0); }
",
    );
    assert!(build.linked, "log: {}", build.log);
    ctx.select_program(build.id).unwrap();

    let level = ctx.locate_uniform(build.id, "level");
    assert!(level.is_found());
    ctx.set_uniform_float(level, 1.0).unwrap();

    let mut out = vec![0u8; frame_len(4, 4)];
    ctx.render_frame(4, 4, &mut out).unwrap();
    assert_solid(&out, [0, 255, 0, 255], "level 1");
}

#[test]
fn interpolation_mismatch_is_a_link_failure() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(
        UV_VS,
        "#version 450
layout(location = 0) flat in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() { o_color = vec4(v_uv, 0.0, 1.0); }
",
    );
    assert!(!build.linked);
    assert!(build.log.contains("error:"), "log: {}", build.log);

    // The device is still usable afterwards.
    let red = ctx.compile_program(UV_VS, RED_FS);
    assert!(red.linked, "log: {}", red.log);
}

#[test]
fn oversized_uniform_block_is_a_link_failure() {
    let Some(mut ctx) = context() else { return };

    let build = ctx.compile_program(
        UV_VS,
        "#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
layout(set = 0, binding = 0) uniform Big { vec4 data[8192]; };
void main() { o_color = data[0]; }
",
    );
    assert!(!build.linked);
    assert!(build.log.contains("error:"), "log: {}", build.log);

    ctx.select_program(build.id).unwrap();
    let mut out = vec![0u8; frame_len(4, 4)];
    let err = ctx.render_frame(4, 4, &mut out).unwrap_err();
    assert!(matches!(err, RenderError::ProgramNotLinked(_)));
}

#[test]
fn program_ids_are_bound_to_their_context() {
    let Some(mut first) = context() else { return };
    let Some(mut second) = context() else { return };

    let a = first.compile_program(UV_VS, RED_FS);
    let b = second.compile_program(UV_VS, RED_FS);
    assert_eq!(a.id.index(), b.id.index());

    assert!(second.program(a.id).is_none());
    assert!(matches!(second.select_program(a.id), Err(RenderError::UnknownProgram(_))));
    assert!(!second.locate_uniform(a.id, "anything").is_found());
    first.select_program(a.id).unwrap();
}
