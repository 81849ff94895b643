/// Vertex stage paired with fragment-only programs.
///
/// Maps pixel positions to clip space through `resolution` (kept at the frame
/// size by the renderer) and forwards the UV at location 0. Fragment shaders
/// that want `resolution` or `time` redeclare the same block, or declare them
/// as plain `uniform` variables.
pub const BUILTIN_VERTEX_SHADER: &str = "#version 450

layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;

layout(location = 0) out vec2 v_uv;

layout(set = 0, binding = 0) uniform NabuFrame {
    vec2 resolution;
    float time;
};

void main() {
    vec2 ndc = a_position / max(resolution, vec2(1.0)) * 2.0 - 1.0;
    gl_Position = vec4(ndc.x, -ndc.y, 0.0, 1.0);
    v_uv = a_uv;
}
";

/// Uniform the renderer keeps at `(width, height)` for built-in vertex programs.
pub const RESOLUTION_UNIFORM: &str = "resolution";
