use bytemuck::{Pod, Zeroable};
use gradientconfig::RenderConfiguration;

use crate::error::RenderError;
use crate::types::SurfaceSize;

use super::scope;

/// std140 mirror of the color pass `ColorParams` block.
///
/// Colors travel as vec4 so every field lands on the offset GLSL expects
/// without implicit padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ColorUniforms {
    pub mouse: [f32; 2],
    pub resolution: [f32; 2],
    pub dark_color: [f32; 4],
    pub middle_color: [f32; 4],
    pub light_color: [f32; 4],
    pub warp_value: f32,
    pub border_radius: f32,
    pub border_thickness: f32,
    pub gradient_width: f32,
    pub gradient_angle: f32,
    pub gradient_repeating: f32,
    pub _padding: [f32; 2],
}

impl ColorUniforms {
    pub fn new(configuration: &RenderConfiguration, mouse: [f32; 2], size: SurfaceSize) -> Self {
        let rgba = |color: gradientconfig::Rgb| {
            let [r, g, b] = color.to_array();
            [r, g, b, 1.0]
        };
        Self {
            mouse,
            resolution: size.as_vec2(),
            dark_color: rgba(configuration.dark_color),
            middle_color: rgba(configuration.middle_color),
            light_color: rgba(configuration.light_color),
            warp_value: configuration.warp_value,
            border_radius: configuration.border_radius,
            border_thickness: configuration.border_thickness,
            gradient_width: configuration.gradient_width,
            gradient_angle: configuration.gradient_angle,
            gradient_repeating: if configuration.gradient_repeating {
                1.0
            } else {
                0.0
            },
            _padding: [0.0; 2],
        }
    }
}

/// std140 mirror of the noise pass `NoiseParams` block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct NoiseUniforms {
    pub noise_intensity: f32,
    pub noise_scale: f32,
    pub _padding: [f32; 2],
}

impl NoiseUniforms {
    pub fn new(configuration: &RenderConfiguration) -> Self {
        Self {
            noise_intensity: configuration.noise_intensity,
            noise_scale: configuration.noise_scale,
            _padding: [0.0; 2],
        }
    }
}

/// A uniform buffer and the bind group that exposes it at `set = 0`.
///
/// Handles are resolved once at setup. Each frame only rewrites the buffer,
/// and only when the record actually changed.
pub(crate) struct UniformSlot<T: Pod + PartialEq> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    last: Option<T>,
}

impl<T: Pod + PartialEq> UniformSlot<T> {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
    ) -> Result<Self, RenderError> {
        let ((buffer, bind_group), error) = scope::capture(device, || {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<T>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (buffer, bind_group)
        });
        if let Some(error) = error {
            return Err(RenderError::ResourceAllocation {
                resource: label,
                log: error.to_string(),
            });
        }
        Ok(Self {
            buffer,
            bind_group,
            last: None,
        })
    }

    /// Uploads `value` unless it matches what the buffer already holds.
    pub fn write(&mut self, queue: &wgpu::Queue, value: &T) -> bool {
        if self.last.as_ref() == Some(value) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
        self.last = Some(*value);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn color_block_matches_std140_layout() {
        assert_eq!(size_of::<ColorUniforms>(), 96);
        assert_eq!(offset_of!(ColorUniforms, resolution), 8);
        assert_eq!(offset_of!(ColorUniforms, dark_color), 16);
        assert_eq!(offset_of!(ColorUniforms, middle_color), 32);
        assert_eq!(offset_of!(ColorUniforms, light_color), 48);
        assert_eq!(offset_of!(ColorUniforms, warp_value), 64);
        assert_eq!(offset_of!(ColorUniforms, gradient_repeating), 84);
    }

    #[test]
    fn noise_block_is_one_vec4() {
        assert_eq!(size_of::<NoiseUniforms>(), 16);
    }

    #[test]
    fn color_uniforms_carry_configuration() {
        let mut configuration = RenderConfiguration::default();
        configuration.gradient_repeating = true;
        configuration.warp_value = 2.5;
        let uniforms = ColorUniforms::new(&configuration, [0.4, -0.4], SurfaceSize::new(640, 480));
        assert_eq!(uniforms.mouse, [0.4, -0.4]);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert_eq!(uniforms.gradient_repeating, 1.0);
        assert_eq!(uniforms.warp_value, 2.5);
        assert_eq!(uniforms.dark_color[3], 1.0);
        assert_eq!(&uniforms.light_color[..3], &configuration.light_color.to_array());

        configuration.gradient_repeating = false;
        let uniforms = ColorUniforms::new(&configuration, [0.0, 0.0], SurfaceSize::new(1, 1));
        assert_eq!(uniforms.gradient_repeating, 0.0);
    }

    #[test]
    fn noise_uniforms_carry_configuration() {
        let configuration = RenderConfiguration::default();
        let uniforms = NoiseUniforms::new(&configuration);
        assert_eq!(uniforms.noise_intensity, configuration.noise_intensity);
        assert_eq!(uniforms.noise_scale, configuration.noise_scale);
    }
}
