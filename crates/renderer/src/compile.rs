use std::borrow::Cow;

use wgpu::naga;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{RenderError, ShaderStage};
use crate::gpu::scope;

/// One GLSL translation unit and the stage it targets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShaderSpec {
    pub label: &'static str,
    pub stage: ShaderStage,
    pub source: &'static str,
}

pub(crate) const QUAD_VERTEX: ShaderSpec = ShaderSpec {
    label: "quad vertex",
    stage: ShaderStage::Vertex,
    source: QUAD_VERTEX_GLSL,
};

pub(crate) const COLOR_FRAGMENT: ShaderSpec = ShaderSpec {
    label: "color pass fragment",
    stage: ShaderStage::Fragment,
    source: COLOR_FRAGMENT_GLSL,
};

pub(crate) const NOISE_FRAGMENT: ShaderSpec = ShaderSpec {
    label: "noise pass fragment",
    stage: ShaderStage::Fragment,
    source: NOISE_FRAGMENT_GLSL,
};

/// Parses and validates GLSL into naga IR without touching the GPU.
///
/// The diagnostic log carried by [`RenderError::Compile`] is naga's rendered
/// report, including the offending source span.
pub(crate) fn compile(shader: &ShaderSpec) -> Result<naga::Module, RenderError> {
    let stage = match shader.stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let module = Frontend::default()
        .parse(&Options::from(stage), shader.source)
        .map_err(|errors| RenderError::Compile {
            stage: shader.stage,
            label: shader.label,
            log: errors.emit_to_string(shader.source),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|error| RenderError::Compile {
            stage: shader.stage,
            label: shader.label,
            log: error.emit_to_string(shader.source),
        })?;

    Ok(module)
}

/// Compiles `shader` and uploads it as a shader module.
pub(crate) fn create_shader_module(
    device: &wgpu::Device,
    shader: &ShaderSpec,
) -> Result<wgpu::ShaderModule, RenderError> {
    let ir = compile(shader)?;
    let (module, error) = scope::capture(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(ir)),
        })
    });
    if let Some(error) = error {
        return Err(RenderError::Compile {
            stage: shader.stage,
            label: shader.label,
            log: error.to_string(),
        });
    }
    tracing::debug!(label = shader.label, stage = %shader.stage, "compiled shader");
    Ok(module)
}

/// Full-surface quad vertex shader. UVs span `[0, 1]` with `y` pointing up.
const QUAD_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = (a_position + 1.0) * 0.5;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Color pass: warped, border-aware three-stop gradient.
///
/// The uniform block layout must match [`ColorUniforms`] in `gpu/uniforms.rs`.
/// Colors occupy full vec4 slots so std140 padding stays explicit.
///
/// [`ColorUniforms`]: crate::gpu::ColorUniforms
const COLOR_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform ColorParams {
    vec2 u_mouse;
    vec2 u_resolution;
    vec4 u_darkColor;
    vec4 u_middleColor;
    vec4 u_lightColor;
    float u_warpValue;
    float u_borderRadius;
    float u_borderThickness;
    float u_gradientWidth;
    float u_gradientAngle;
    float u_gradientRepeating;
    vec2 u_padding;
} params;

const float PI_APPROX = 3.14159;
const vec2 CENTER = vec2(0.5, 0.5);

float gradientAt(vec2 uv) {
    float curve = sin(distance(uv, CENTER) * PI_APPROX * 2.0) * 0.1;
    float gradient = abs(uv.x * 1.0 / params.u_gradientWidth - uv.y + curve);
    if (params.u_gradientRepeating > 0.5) {
        gradient = mod(gradient * 2.0, 2.0);
        return 1.0 - abs(gradient - 1.0);
    }
    return 1.0 - gradient;
}

vec3 threeStop(float gradient) {
    if (gradient < 0.5) {
        return mix(params.u_darkColor.rgb, params.u_middleColor.rgb, gradient * 2.0);
    }
    return mix(params.u_middleColor.rgb, params.u_lightColor.rgb, (gradient - 0.5) * 2.0);
}

float borderStrength(vec2 pixel) {
    vec2 resolution = params.u_resolution;
    float radius = params.u_borderRadius;

    float left = pixel.x;
    float right = resolution.x - pixel.x;
    float top = pixel.y;
    float bottom = resolution.y - pixel.y;

    bool nearLeft = left < radius;
    bool nearRight = right < radius;
    bool nearTop = top < radius;
    bool nearBottom = bottom < radius;

    float minDistToEdge;
    if ((nearLeft && nearTop) || (nearRight && nearTop) || (nearLeft && nearBottom) || (nearRight && nearBottom)) {
        vec2 corner;
        if (nearLeft && nearTop) {
            corner = vec2(radius, radius);
        } else if (nearRight && nearTop) {
            corner = vec2(resolution.x - radius, radius);
        } else if (nearLeft && nearBottom) {
            corner = vec2(radius, resolution.y - radius);
        } else {
            corner = vec2(resolution.x - radius, resolution.y - radius);
        }
        minDistToEdge = radius - distance(pixel, corner);
    } else {
        minDistToEdge = min(min(left, right), min(top, bottom));
    }

    if (minDistToEdge < params.u_borderThickness) {
        return 1.0 - minDistToEdge / params.u_borderThickness;
    }
    return 0.0;
}

// pow() is undefined for negative bases in GLSL, so the bell term squares explicitly.
float customBorder(float border) {
    float x = 1.0 - border;
    float bell = 7.0 * x - 4.2;
    return 0.5 * exp(-7.0 * x / 0.3) + 0.5
        + 0.5 * exp(-(bell * bell) / (2.0 * 0.35 * 0.35))
        - 1.0 / (1.98 + exp(-(7.0 * x - 5.5) / 0.4));
}

void main() {
    vec2 shifted = v_uv - params.u_mouse;

    float angle = params.u_gradientAngle * PI_APPROX / 180.0;
    float cosA = cos(angle);
    float sinA = sin(angle);
    vec2 fromCenter = shifted - CENTER;
    vec2 rotated = CENTER + vec2(
        fromCenter.x * cosA - fromCenter.y * sinA,
        fromCenter.x * sinA + fromCenter.y * cosA
    );

    float gradient = gradientAt(rotated);

    float border = borderStrength(v_uv * params.u_resolution);
    float warpStrength = customBorder(border) * params.u_warpValue;
    vec2 centerToUv = rotated - CENTER;
    vec2 warped = rotated + vec2(warpStrength * centerToUv.x, -warpStrength * centerToUv.y);
    float warpedGradient = gradientAt(warped);

    vec3 finalColor;
    if (border > 0.0) {
        finalColor = threeStop(warpedGradient);
    } else {
        finalColor = threeStop(gradient);
    }
    outColor = vec4(finalColor, 1.0);
}
";

/// Noise pass: value-noise grain over the color pass output.
///
/// The uniform block layout must match [`NoiseUniforms`] in `gpu/uniforms.rs`.
///
/// [`NoiseUniforms`]: crate::gpu::NoiseUniforms
const NOISE_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform NoiseParams {
    float u_noiseIntensity;
    float u_noiseScale;
    vec2 u_padding;
} params;

layout(set = 1, binding = 0) uniform texture2D u_colorTexture;
layout(set = 1, binding = 1) uniform sampler u_colorSampler;

float random(vec2 st) {
    return fract(sin(dot(st, vec2(12.9898, 78.233))) * 43758.5453123);
}

float valueNoise(vec2 st) {
    vec2 i = floor(st);
    vec2 f = fract(st);

    float a = random(i);
    float b = random(i + vec2(1.0, 0.0));
    float c = random(i + vec2(0.0, 1.0));
    float d = random(i + vec2(1.0, 1.0));

    vec2 u = f * f * (vec2(3.0) - 2.0 * f);
    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

void main() {
    // Texture rows are stored top-down while v_uv.y points up.
    vec4 original = texture(sampler2D(u_colorTexture, u_colorSampler), vec2(v_uv.x, 1.0 - v_uv.y));

    float noiseValue = valueNoise(v_uv * params.u_noiseScale);
    vec3 grain = vec3((noiseValue - 0.5) * params.u_noiseIntensity);
    vec3 noiseColor = clamp(original.rgb + grain, vec3(0.0), vec3(1.0));

    outColor = vec4(noiseColor, original.a);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_shaders_compile_and_validate() {
        for shader in [QUAD_VERTEX, COLOR_FRAGMENT, NOISE_FRAGMENT] {
            if let Err(err) = compile(&shader) {
                panic!("{} failed to compile: {err}", shader.label);
            }
        }
    }

    #[test]
    fn syntax_error_reports_stage_and_log() {
        let broken = ShaderSpec {
            label: "broken fragment",
            stage: ShaderStage::Fragment,
            source: "#version 450\nlayout(location = 0) out vec4 outColor;\nvoid main() { outColor = vec4(1.0 }\n",
        };
        match compile(&broken) {
            Err(RenderError::Compile { stage, label, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(label, "broken fragment");
                assert!(!log.trim().is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_identifier_is_a_vertex_compile_error() {
        let broken = ShaderSpec {
            label: "broken vertex",
            stage: ShaderStage::Vertex,
            source: "#version 450\nvoid main() { gl_Position = vec4(missing, 0.0, 1.0); }\n",
        };
        let err = compile(&broken).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
    }

    #[test]
    fn color_pass_keeps_the_border_curve_constants() {
        for constant in ["7.0 * x / 0.3", "4.2", "0.35 * 0.35", "1.98", "5.5) / 0.4"] {
            assert!(
                COLOR_FRAGMENT_GLSL.contains(constant),
                "missing constant {constant}"
            );
        }
    }

    #[test]
    fn shader_modules_upload_on_a_device() {
        let Some((device, _queue)) = crate::gpu::headless::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        for shader in [QUAD_VERTEX, COLOR_FRAGMENT, NOISE_FRAGMENT] {
            if let Err(err) = create_shader_module(&device, &shader) {
                panic!("{} failed to upload: {err}", shader.label);
            }
        }

        let broken = ShaderSpec {
            label: "broken upload",
            stage: ShaderStage::Fragment,
            source: "#version 450\nvoid main() { undefined_call(); }\n",
        };
        match create_shader_module(&device, &broken) {
            Err(RenderError::Compile { stage, label, .. }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(label, "broken upload");
            }
            Err(other) => panic!("expected compile error, got {other:?}"),
            Ok(_) => panic!("broken shader uploaded"),
        }
    }
}
