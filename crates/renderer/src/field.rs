//! CPU evaluation of both render passes.
//!
//! These functions follow the GLSL in `compile.rs` operation for operation so
//! the effect can be exported without a GPU and so its math can be tested.
//! UVs use the shader convention: `[0, 1]²` with `v` pointing up.

use gradientconfig::{RenderConfiguration, Rgb};
use image::{Rgba, RgbaImage};

use crate::types::SurfaceSize;

/// The approximation of π baked into the shaders.
pub const PI_APPROX: f32 = 3.14159;
const CENTER: [f32; 2] = [0.5, 0.5];

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// GLSL `mod`: the result takes the sign of `y`.
fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Rotates `uv` about the surface center by `degrees`.
pub fn rotate_about_center(uv: [f32; 2], degrees: f32) -> [f32; 2] {
    let angle = degrees * PI_APPROX / 180.0;
    let (sin_a, cos_a) = angle.sin_cos();
    let from_center = [uv[0] - CENTER[0], uv[1] - CENTER[1]];
    [
        CENTER[0] + from_center[0] * cos_a - from_center[1] * sin_a,
        CENTER[1] + from_center[0] * sin_a + from_center[1] * cos_a,
    ]
}

/// Folds an unbounded gradient value into a triangle wave over `[0, 1]`.
pub fn fold_repeating(gradient: f32) -> f32 {
    let folded = glsl_mod(gradient * 2.0, 2.0);
    1.0 - (folded - 1.0).abs()
}

/// Scalar gradient at a rotated UV.
///
/// The non-repeating branch is left unclamped: values outside `[0, 1]`
/// extrapolate past the dark and light stops, as the shader does.
pub fn gradient_scalar(uv: [f32; 2], width: f32, repeating: bool) -> f32 {
    let curve = (distance(uv, CENTER) * PI_APPROX * 2.0).sin() * 0.1;
    let gradient = (uv[0] * 1.0 / width - uv[1] + curve).abs();
    if repeating {
        fold_repeating(gradient)
    } else {
        1.0 - gradient
    }
}

/// Piecewise-linear dark → middle → light ramp with the break at 0.5.
pub fn three_stop(gradient: f32, dark: Rgb, middle: Rgb, light: Rgb) -> [f32; 3] {
    let (from, to, t) = if gradient < 0.5 {
        (dark.to_array(), middle.to_array(), gradient * 2.0)
    } else {
        (middle.to_array(), light.to_array(), (gradient - 0.5) * 2.0)
    };
    [
        mix(from[0], to[0], t),
        mix(from[1], to[1], t),
        mix(from[2], to[2], t),
    ]
}

/// Border intensity at a pixel: 1 at the edge fading to 0 at `thickness`
/// pixels inward. Corners within `radius` measure distance to the rounded arc.
pub fn border_strength(pixel: [f32; 2], resolution: [f32; 2], radius: f32, thickness: f32) -> f32 {
    let left = pixel[0];
    let right = resolution[0] - pixel[0];
    let top = pixel[1];
    let bottom = resolution[1] - pixel[1];

    let near_left = left < radius;
    let near_right = right < radius;
    let near_top = top < radius;
    let near_bottom = bottom < radius;

    let corner = if near_left && near_top {
        Some([radius, radius])
    } else if near_right && near_top {
        Some([resolution[0] - radius, radius])
    } else if near_left && near_bottom {
        Some([radius, resolution[1] - radius])
    } else if near_right && near_bottom {
        Some([resolution[0] - radius, resolution[1] - radius])
    } else {
        None
    };

    let min_dist_to_edge = match corner {
        Some(center) => radius - distance(pixel, center),
        None => left.min(right).min(top.min(bottom)),
    };

    if min_dist_to_edge < thickness {
        1.0 - min_dist_to_edge / thickness
    } else {
        0.0
    }
}

/// Response curve that turns border intensity into warp strength.
pub fn custom_border(border: f32) -> f32 {
    let x = 1.0 - border;
    let bell = 7.0 * x - 4.2;
    0.5 * (-7.0 * x / 0.3).exp() + 0.5 + 0.5 * (-(bell * bell) / (2.0 * 0.35 * 0.35)).exp()
        - 1.0 / (1.98 + (-(7.0 * x - 5.5) / 0.4).exp())
}

/// Color pass output at `uv`.
///
/// `pointer` is the value the color pass receives as its mouse uniform, see
/// [`PointerTracker::color_pass_position`](crate::PointerTracker::color_pass_position).
pub fn color_pass(
    uv: [f32; 2],
    configuration: &RenderConfiguration,
    pointer: [f32; 2],
    resolution: [f32; 2],
) -> [f32; 3] {
    let shifted = [uv[0] - pointer[0], uv[1] - pointer[1]];
    let rotated = rotate_about_center(shifted, configuration.gradient_angle);
    let width = configuration.gradient_width;
    let repeating = configuration.gradient_repeating;

    let gradient = gradient_scalar(rotated, width, repeating);

    let pixel = [uv[0] * resolution[0], uv[1] * resolution[1]];
    let border = border_strength(
        pixel,
        resolution,
        configuration.border_radius,
        configuration.border_thickness,
    );
    let warp_strength = custom_border(border) * configuration.warp_value;
    let to_uv = [rotated[0] - CENTER[0], rotated[1] - CENTER[1]];
    let warped = [
        rotated[0] + warp_strength * to_uv[0],
        rotated[1] - warp_strength * to_uv[1],
    ];
    let warped_gradient = gradient_scalar(warped, width, repeating);

    let selected = if border > 0.0 {
        warped_gradient
    } else {
        gradient
    };
    three_stop(
        selected,
        configuration.dark_color,
        configuration.middle_color,
        configuration.light_color,
    )
}

/// Hash used by the noise pass, in `[0, 1)`.
pub fn random(st: [f32; 2]) -> f32 {
    fract((st[0] * 12.9898 + st[1] * 78.233).sin() * 43758.5453123)
}

/// 2D value noise with Hermite blending between lattice hashes.
pub fn value_noise(st: [f32; 2]) -> f32 {
    let i = [st[0].floor(), st[1].floor()];
    let f = [fract(st[0]), fract(st[1])];

    let a = random(i);
    let b = random([i[0] + 1.0, i[1]]);
    let c = random([i[0], i[1] + 1.0]);
    let d = random([i[0] + 1.0, i[1] + 1.0]);

    let u = [
        f[0] * f[0] * (3.0 - 2.0 * f[0]),
        f[1] * f[1] * (3.0 - 2.0 * f[1]),
    ];
    mix(a, b, u[0]) + (c - a) * u[1] * (1.0 - u[0]) + (d - b) * u[0] * u[1]
}

/// Noise pass output for a sampled color at `uv`. Alpha is passed through.
pub fn noise_pass(color: [f32; 4], uv: [f32; 2], intensity: f32, scale: f32) -> [f32; 4] {
    let n = value_noise([uv[0] * scale, uv[1] * scale]);
    let grain = (n - 0.5) * intensity;
    [
        (color[0] + grain).clamp(0.0, 1.0),
        (color[1] + grain).clamp(0.0, 1.0),
        (color[2] + grain).clamp(0.0, 1.0),
        color[3],
    ]
}

fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Renders both passes for every pixel center of a `size` image.
///
/// The intermediate color is quantized to 8 bits between the passes, matching
/// the `Rgba8Unorm` offscreen texture. Rows are emitted top-down.
pub fn render_still(
    configuration: &RenderConfiguration,
    pointer: [f32; 2],
    size: SurfaceSize,
) -> RgbaImage {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let resolution = [width as f32, height as f32];

    RgbaImage::from_fn(width, height, |x, y| {
        let uv = [
            (x as f32 + 0.5) / resolution[0],
            1.0 - (y as f32 + 0.5) / resolution[1],
        ];
        let [r, g, b] = color_pass(uv, configuration, pointer, resolution);
        let stored = [r, g, b, 1.0].map(|channel| f32::from(to_unorm8(channel)) / 255.0);
        let shaded = noise_pass(
            stored,
            uv,
            configuration.noise_intensity,
            configuration.noise_scale,
        );
        Rgba(shaded.map(to_unorm8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grayscale() -> RenderConfiguration {
        RenderConfiguration {
            dark_color: Rgb::new(0.0, 0.0, 0.0),
            middle_color: Rgb::new(0.5, 0.5, 0.5),
            light_color: Rgb::new(1.0, 1.0, 1.0),
            warp_value: 0.0,
            border_radius: 0.0,
            border_thickness: 0.0,
            gradient_width: 1.0,
            gradient_angle: 0.0,
            gradient_repeating: false,
            noise_intensity: 0.0,
            noise_scale: 800.0,
        }
    }

    fn close(a: [f32; 3], b: [f32; 3], tolerance: f32) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tolerance)
    }

    #[test]
    fn three_stop_hits_each_stop_exactly() {
        let dark = Rgb::new(0.1, 0.2, 0.3);
        let middle = Rgb::new(0.4, 0.5, 0.6);
        let light = Rgb::new(0.7, 0.8, 0.9);
        assert_eq!(three_stop(0.0, dark, middle, light), dark.to_array());
        assert_eq!(three_stop(0.5, dark, middle, light), middle.to_array());
        assert!(close(three_stop(1.0, dark, middle, light), light.to_array(), 1e-6));
    }

    #[test]
    fn repeating_fold_is_periodic_and_bounded() {
        for step in 0..200 {
            let g = step as f32 * 0.037;
            let folded = fold_repeating(g);
            assert!((0.0..=1.0).contains(&folded), "{g} folded to {folded}");
            assert!((folded - fold_repeating(g + 1.0)).abs() < 1e-4);
        }
        assert!(fold_repeating(0.0).abs() < 1e-6);
        assert!((fold_repeating(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn non_repeating_gradient_is_not_clamped() {
        let below = gradient_scalar([0.0, 1.0], 1.0, false);
        assert!(below < 0.0, "expected extrapolation, got {below}");
        let config = grayscale();
        let color = three_stop(
            below,
            config.dark_color,
            config.middle_color,
            config.light_color,
        );
        assert!(color[0] < 0.0);
    }

    #[test]
    fn gradient_midpoint_is_middle_color() {
        let config = grayscale();
        let color = color_pass([0.5, 0.0], &config, [0.0, 0.0], [100.0, 100.0]);
        assert!(close(color, [0.5, 0.5, 0.5], 1e-4), "{color:?}");
    }

    #[test]
    fn gradient_extremes_approach_dark_and_light() {
        let config = grayscale();
        let towards_light = color_pass([0.0, 0.0], &config, [0.0, 0.0], [100.0, 100.0]);
        let towards_dark = color_pass([1.0, 0.0], &config, [0.0, 0.0], [100.0, 100.0]);
        assert!(close(towards_light, [1.0, 1.0, 1.0], 0.15), "{towards_light:?}");
        assert!(close(towards_dark, [0.0, 0.0, 0.0], 0.15), "{towards_dark:?}");
    }

    #[test]
    fn border_is_full_at_edge_and_zero_inside() {
        let resolution = [200.0, 100.0];
        assert!((border_strength([0.0, 50.0], resolution, 0.0, 20.0) - 1.0).abs() < 1e-6);
        assert!((border_strength([10.0, 50.0], resolution, 0.0, 20.0) - 0.5).abs() < 1e-6);
        assert_eq!(border_strength([100.0, 50.0], resolution, 0.0, 20.0), 0.0);
    }

    #[test]
    fn rounded_corner_measures_distance_to_arc() {
        let resolution = [200.0, 100.0];
        // Inside the corner square, on the diagonal, 5 px inside the arc.
        let offset = (20.0 - 5.0) / 2.0_f32.sqrt();
        let pixel = [20.0 - offset, 20.0 - offset];
        let border = border_strength(pixel, resolution, 20.0, 10.0);
        assert!((border - 0.5).abs() < 1e-4, "{border}");
    }

    #[test]
    fn zero_thickness_disables_border() {
        let resolution = [100.0, 100.0];
        assert_eq!(border_strength([0.0, 50.0], resolution, 0.0, 0.0), 0.0);
        assert_eq!(border_strength([50.0, 50.0], resolution, 0.0, 0.0), 0.0);
    }

    #[test]
    fn custom_border_is_finite_over_unit_interval() {
        for step in 0..=100 {
            let value = custom_border(step as f32 / 100.0);
            assert!(value.is_finite());
        }
    }

    #[test]
    fn warp_only_applies_inside_border() {
        let mut config = grayscale();
        config.warp_value = 3.0;
        config.border_thickness = 10.0;
        let plain = grayscale();
        let inner = color_pass([0.5, 0.3], &config, [0.0, 0.0], [100.0, 100.0]);
        let inner_plain = color_pass([0.5, 0.3], &plain, [0.0, 0.0], [100.0, 100.0]);
        assert!(close(inner, inner_plain, 1e-6));
        let edge = color_pass([0.02, 0.5], &config, [0.0, 0.0], [100.0, 100.0]);
        let unwarped = color_pass([0.02, 0.5], &plain, [0.0, 0.0], [100.0, 100.0]);
        assert!(!close(edge, unwarped, 1e-4));
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        for x in 0..40 {
            for y in 0..40 {
                let n = value_noise([x as f32 * 0.37, y as f32 * 0.53]);
                assert!((0.0..=1.0).contains(&n), "noise {n}");
            }
        }
    }

    #[test]
    fn value_noise_is_continuous_across_cells() {
        for cell in 1..10 {
            let edge = cell as f32;
            let before = value_noise([edge - 1e-3, 2.25]);
            let after = value_noise([edge, 2.25]);
            assert!((before - after).abs() < 1e-2);
        }
    }

    #[test]
    fn noise_pass_keeps_alpha_and_clamps() {
        let out = noise_pass([1.0, 0.0, 0.5, 0.25], [0.3, 0.7], 10.0, 800.0);
        assert!(out.iter().take(3).all(|channel| (0.0..=1.0).contains(channel)));
        assert_eq!(out[3], 0.25);

        let untouched = noise_pass([0.2, 0.4, 0.6, 1.0], [0.3, 0.7], 0.0, 800.0);
        assert_eq!(untouched, [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn still_render_matches_pass_math() {
        let config = grayscale();
        let image = render_still(&config, [0.0, 0.0], SurfaceSize::new(100, 100));
        assert_eq!(image.dimensions(), (100, 100));

        // Bottom row, horizontal center: uv ≈ (0.505, 0.005).
        let pixel = image.get_pixel(50, 99);
        assert!((i32::from(pixel[0]) - 128).abs() <= 2, "{pixel:?}");
        assert_eq!(pixel[3], 255);

        let bottom_left = image.get_pixel(0, 99)[0];
        let bottom_right = image.get_pixel(99, 99)[0];
        assert!(bottom_left > 200, "{bottom_left}");
        assert!(bottom_right < 50, "{bottom_right}");
    }
}
