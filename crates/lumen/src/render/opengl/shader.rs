//! Default batch shader
//!
//! The vertex stage declares one input per entry of [`VERTEX_ATTRIBUTES`],
//! so the GLSL locations can never drift from the Rust layout. The fragment
//! stage picks a sampler with a `switch` because GLSL 330 only allows
//! constant indices into sampler arrays.

use glow::HasContext;

use crate::render::backend::{RenderError, RenderResult};
use crate::render::batch::TEXTURE_SLOTS;
use crate::render::vertex::VERTEX_ATTRIBUTES;

/// Projection uniform
pub const PROJECTION_UNIFORM: &str = "uProjection";
/// Camera view uniform
pub const VIEW_UNIFORM: &str = "uView";
/// Sampler array uniform, entry `k - 1` reads texture unit `k`
pub const SAMPLER_UNIFORM: &str = "TEX_SAMPLER";

const VERTEX_BODY: &str = r#"
uniform mat4 uProjection;
uniform mat4 uView;

out vec4 fColor;
out vec2 fTexCoords;
flat out int fTexID;
flat out int fIsFont;

vec2 rotateAround(vec2 point, vec2 origin, float angle) {
    float s = sin(angle);
    float c = cos(angle);
    vec2 d = point - origin;
    return origin + vec2(d.x * c - d.y * s, d.x * s + d.y * c);
}

void main() {
    vec2 local = rotateAround(aPosition.xy, aRotationOrigin, aRotation);
    vec2 placed = rotateAround(local, aTransformOrigin, aTransformRotation) + aTransformTranslate;

    // Depth grows away from the viewer.
    vec4 world = vec4(placed, -aPosition.z, 1.0);
    if (aUseCamera > 0.5) {
        world = uView * world;
    }
    gl_Position = uProjection * world;

    fColor = aColor;
    fTexCoords = aTexCoords;
    fTexID = int(aTexID + 0.5);
    fIsFont = int(aIsFont + 0.5);
}
"#;

fn glsl_type(size: usize) -> &'static str {
    match size {
        1 => "float",
        2 => "vec2",
        3 => "vec3",
        _ => "vec4",
    }
}

/// GLSL source of the batch vertex stage
pub fn vertex_source() -> String {
    let mut source = String::from("#version 330 core\n\n");
    for attribute in &VERTEX_ATTRIBUTES {
        source.push_str(&format!(
            "layout (location = {}) in {} {};\n",
            attribute.location,
            glsl_type(attribute.size),
            attribute.name
        ));
    }
    source.push_str(VERTEX_BODY);
    source
}

/// GLSL source of the batch fragment stage
pub fn fragment_source() -> String {
    let mut source = format!(
        "#version 330 core\n\n\
         in vec4 fColor;\n\
         in vec2 fTexCoords;\n\
         flat in int fTexID;\n\
         flat in int fIsFont;\n\n\
         uniform sampler2D {SAMPLER_UNIFORM}[{TEXTURE_SLOTS}];\n\n\
         out vec4 outColor;\n\n\
         void main() {{\n\
         \x20   if (fTexID <= 0) {{\n\
         \x20       outColor = fColor;\n\
         \x20       return;\n\
         \x20   }}\n\n\
         \x20   vec4 texel = vec4(1.0);\n\
         \x20   switch (fTexID) {{\n"
    );
    for slot in 1..=TEXTURE_SLOTS {
        source.push_str(&format!(
            "        case {slot}: texel = texture({SAMPLER_UNIFORM}[{}], fTexCoords); break;\n",
            slot - 1
        ));
    }
    source.push_str(
        "    }\n\n\
         \x20   if (fIsFont == 1) {\n\
         \x20       outColor = vec4(fColor.rgb, fColor.a * texel.a);\n\
         \x20   } else {\n\
         \x20       outColor = texel * fColor;\n\
         \x20   }\n\
         }\n",
    );
    source
}

/// Texture unit bound to each sampler entry
pub fn sampler_units() -> Vec<i32> {
    (1..=TEXTURE_SLOTS as i32).collect()
}

/// Compile and link a program from vertex and fragment sources
///
/// # Safety
///
/// `gl` must be current on the calling thread.
pub unsafe fn link_program(gl: &glow::Context, vertex: &str, fragment: &str) -> RenderResult<glow::Program> {
    let program = gl
        .create_program()
        .map_err(|reason| RenderError::Creation { what: "program", reason })?;

    let mut stages = Vec::with_capacity(2);
    for (kind, source) in [(glow::VERTEX_SHADER, vertex), (glow::FRAGMENT_SHADER, fragment)] {
        let shader = gl
            .create_shader(kind)
            .map_err(|reason| RenderError::Creation { what: "shader", reason })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            for stage in stages {
                gl.delete_shader(stage);
            }
            gl.delete_program(program);
            return Err(RenderError::Shader(log));
        }
        gl.attach_shader(program, shader);
        stages.push(shader);
    }

    gl.link_program(program);
    let linked = gl.get_program_link_status(program);
    for shader in stages {
        gl.detach_shader(program, shader);
        gl.delete_shader(shader);
    }
    if !linked {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(RenderError::Shader(log));
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_source_declares_every_attribute() {
        let source = vertex_source();
        for attribute in &VERTEX_ATTRIBUTES {
            let declaration = format!(
                "layout (location = {}) in {} {};",
                attribute.location,
                glsl_type(attribute.size),
                attribute.name
            );
            assert!(source.contains(&declaration), "missing {declaration}");
        }
        assert!(source.starts_with("#version 330 core"));
    }

    #[test]
    fn test_fragment_source_covers_every_slot() {
        let source = fragment_source();
        assert!(source.contains("uniform sampler2D TEX_SAMPLER[16];"));
        assert!(source.contains("case 1: texel = texture(TEX_SAMPLER[0], fTexCoords);"));
        assert!(source.contains("case 16: texel = texture(TEX_SAMPLER[15], fTexCoords);"));
        assert!(!source.contains("case 17"));
    }

    #[test]
    fn test_sampler_units_skip_unit_zero() {
        let units = sampler_units();
        assert_eq!(units.len(), TEXTURE_SLOTS);
        assert_eq!(units[0], 1);
        assert_eq!(units[15], 16);
    }
}
