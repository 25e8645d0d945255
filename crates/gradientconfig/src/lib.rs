use std::fmt;

use serde::de::{self, Deserializer, SeqAccess};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Linear channel intensities in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(format!(
                "'{trimmed}' is not a #rrggbb hex color"
            )));
        }
        let channel = |range: std::ops::Range<usize>| -> Result<f32, ConfigError> {
            u8::from_str_radix(&digits[range], 16)
                .map(|byte| byte as f32 / 255.0)
                .map_err(|err| ConfigError::InvalidColor(format!("'{trimmed}': {err}")))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        let byte = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    fn channels(&self) -> [(&'static str, f32); 3] {
        [("red", self.r), ("green", self.g), ("blue", self.b)]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Rgb;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a #rrggbb hex string or an [r, g, b] array of floats")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Rgb::from_hex(v).map_err(E::custom)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut channels = [0.0_f32; 3];
                for (index, slot) in channels.iter_mut().enumerate() {
                    *slot = seq
                        .next_element::<f64>()?
                        .ok_or_else(|| de::Error::invalid_length(index, &self))?
                        as f32;
                }
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::custom("color arrays must have exactly 3 channels"));
                }
                Ok(Rgb::from(channels))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Everything the renderer reads each frame besides pointer state.
///
/// Values are replaced whole by the controls collaborator; changing any field
/// only updates uniforms on the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfiguration {
    pub dark_color: Rgb,
    pub middle_color: Rgb,
    pub light_color: Rgb,
    pub warp_value: f32,
    /// Corner radius in pixels.
    pub border_radius: f32,
    /// Border band thickness in pixels.
    pub border_thickness: f32,
    pub gradient_width: f32,
    /// Degrees in `[0, 360)`.
    pub gradient_angle: f32,
    pub gradient_repeating: bool,
    pub noise_intensity: f32,
    pub noise_scale: f32,
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        Self {
            dark_color: Rgb::new(11.0 / 255.0, 29.0 / 255.0, 58.0 / 255.0),
            middle_color: Rgb::new(63.0 / 255.0, 111.0 / 255.0, 216.0 / 255.0),
            light_color: Rgb::new(207.0 / 255.0, 227.0 / 255.0, 1.0),
            warp_value: 1.0,
            border_radius: 32.0,
            border_thickness: 32.0,
            gradient_width: 1.0,
            gradient_angle: 0.0,
            gradient_repeating: false,
            noise_intensity: 0.08,
            noise_scale: 800.0,
        }
    }
}

/// Slider ranges exposed by the interactive controls. Values outside them
/// still render, they just were never reachable from the control panel.
pub const WARP_RANGE: (f32, f32) = (0.0, 5.0);
pub const BORDER_RADIUS_RANGE: (f32, f32) = (0.0, 128.0);
pub const BORDER_THICKNESS_RANGE: (f32, f32) = (0.0, 64.0);
pub const GRADIENT_WIDTH_RANGE: (f32, f32) = (0.0, 2.0);
pub const NOISE_INTENSITY_RANGE: (f32, f32) = (0.0, 0.5);
pub const NOISE_SCALE_RANGE: (f32, f32) = (100.0, 2000.0);

impl RenderConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, color) in [
            ("dark", &self.dark_color),
            ("middle", &self.middle_color),
            ("light", &self.light_color),
        ] {
            for (channel, value) in color.channels() {
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::InvalidColor(format!(
                        "{name} color {channel} channel {value} is outside [0, 1]"
                    )));
                }
            }
        }

        let scalars = [
            ("warp", self.warp_value),
            ("border radius", self.border_radius),
            ("border thickness", self.border_thickness),
            ("gradient width", self.gradient_width),
            ("gradient angle", self.gradient_angle),
            ("noise intensity", self.noise_intensity),
            ("noise scale", self.noise_scale),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
        }

        if self.gradient_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gradient width must be greater than zero, got {}",
                self.gradient_width
            )));
        }
        if self.noise_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "noise scale must be greater than zero, got {}",
                self.noise_scale
            )));
        }
        if self.border_radius < 0.0 {
            return Err(ConfigError::Invalid("border radius must be >= 0".into()));
        }
        if self.border_thickness < 0.0 {
            return Err(ConfigError::Invalid("border thickness must be >= 0".into()));
        }
        if self.noise_intensity < 0.0 {
            return Err(ConfigError::Invalid("noise intensity must be >= 0".into()));
        }

        Ok(())
    }

    /// Wraps the gradient angle into `[0, 360)`.
    pub fn normalized(mut self) -> Self {
        self.gradient_angle = self.gradient_angle.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if self.gradient_angle >= 360.0 {
            self.gradient_angle = 0.0;
        }
        self
    }

    /// Lists fields that sit outside the interactive control ranges.
    pub fn out_of_range_fields(&self) -> Vec<String> {
        let checks = [
            ("warp", self.warp_value, WARP_RANGE),
            ("border radius", self.border_radius, BORDER_RADIUS_RANGE),
            ("border thickness", self.border_thickness, BORDER_THICKNESS_RANGE),
            ("gradient width", self.gradient_width, GRADIENT_WIDTH_RANGE),
            ("noise intensity", self.noise_intensity, NOISE_INTENSITY_RANGE),
            ("noise scale", self.noise_scale, NOISE_SCALE_RANGE),
        ];
        checks
            .iter()
            .filter(|(_, value, (min, max))| value < min || value > max)
            .map(|(name, value, (min, max))| format!("{name}={value} (expected {min}..={max})"))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ColorSection {
    pub dark: Rgb,
    pub middle: Rgb,
    pub light: Rgb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GradientSection {
    pub width: f32,
    pub angle: f32,
    pub repeating: bool,
    pub warp: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BorderSection {
    pub radius: f32,
    pub thickness: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseSection {
    pub intensity: f32,
    pub scale: f32,
}

impl Default for ColorSection {
    fn default() -> Self {
        let defaults = RenderConfiguration::default();
        Self {
            dark: defaults.dark_color,
            middle: defaults.middle_color,
            light: defaults.light_color,
        }
    }
}

impl Default for GradientSection {
    fn default() -> Self {
        let defaults = RenderConfiguration::default();
        Self {
            width: defaults.gradient_width,
            angle: defaults.gradient_angle,
            repeating: defaults.gradient_repeating,
            warp: defaults.warp_value,
        }
    }
}

impl Default for BorderSection {
    fn default() -> Self {
        let defaults = RenderConfiguration::default();
        Self {
            radius: defaults.border_radius,
            thickness: defaults.border_thickness,
        }
    }
}

impl Default for NoiseSection {
    fn default() -> Self {
        let defaults = RenderConfiguration::default();
        Self {
            intensity: defaults.noise_intensity,
            scale: defaults.noise_scale,
        }
    }
}

/// On-disk preset layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub colors: ColorSection,
    #[serde(default)]
    pub gradient: GradientSection,
    #[serde(default)]
    pub border: BorderSection,
    #[serde(default)]
    pub noise: NoiseSection,
}

fn default_version() -> u32 {
    1
}

impl Default for PresetFile {
    fn default() -> Self {
        Self::from_configuration(&RenderConfiguration::default())
    }
}

impl PresetFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PresetFile = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_configuration(configuration: &RenderConfiguration) -> Self {
        Self {
            version: default_version(),
            colors: ColorSection {
                dark: configuration.dark_color,
                middle: configuration.middle_color,
                light: configuration.light_color,
            },
            gradient: GradientSection {
                width: configuration.gradient_width,
                angle: configuration.gradient_angle,
                repeating: configuration.gradient_repeating,
                warp: configuration.warp_value,
            },
            border: BorderSection {
                radius: configuration.border_radius,
                thickness: configuration.border_thickness,
            },
            noise: NoiseSection {
                intensity: configuration.noise_intensity,
                scale: configuration.noise_scale,
            },
        }
    }

    /// Flattens the sections into a configuration. The result is validated
    /// and normalized.
    pub fn configuration(&self) -> Result<RenderConfiguration, ConfigError> {
        let configuration = RenderConfiguration {
            dark_color: self.colors.dark,
            middle_color: self.colors.middle,
            light_color: self.colors.light,
            warp_value: self.gradient.warp,
            border_radius: self.border.radius,
            border_thickness: self.border.thickness,
            gradient_width: self.gradient.width,
            gradient_angle: self.gradient.angle,
            gradient_repeating: self.gradient.repeating,
            noise_intensity: self.noise.intensity,
            noise_scale: self.noise.scale,
        };
        configuration.validate()?;
        Ok(configuration.normalized())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported preset version {}; expected 1",
                self.version
            )));
        }
        self.configuration().map(|_| ())
    }
}
