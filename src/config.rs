use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use rand::Rng;
use serde::Deserialize;

use crate::easing::Easing;
use crate::error::Error;
use crate::shading::ActiveEffect;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Ordered, non-empty list of image files to cycle through.
    pub images: Vec<PathBuf>,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Total time per image before the next transition completes, in ms.
    pub dwell_ms: u64,
    /// Duration of the transition itself, in ms.
    pub transition_ms: u64,
    /// Transition effect configuration.
    pub effect: EffectConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            width: 960,
            height: 540,
            dwell_ms: 4000,
            transition_ms: 1000,
            effect: EffectConfig::default(),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(!self.images.is_empty(), "images must list at least one file");
        ensure!(self.width > 0 && self.height > 0, "viewport size must be positive");
        ensure!(self.dwell_ms > 0, "dwell-ms must be greater than zero");
        ensure!(self.transition_ms > 0, "transition-ms must be greater than zero");
        ensure!(
            self.transition_ms <= self.dwell_ms,
            "transition-ms must not exceed dwell-ms"
        );
        self.effect
            .normalize()
            .context("invalid effect configuration")?;
        Ok(self)
    }

    pub fn container_aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    /// Effective transition duration. The displacement variant may stretch
    /// it via its speed overrides; the slower of the two sweeps bounds the
    /// duration so neither direction is cut short.
    pub fn transition(&self) -> Duration {
        let ms = match &self.effect {
            EffectConfig::Displacement {
                speed_in_ms,
                speed_out_ms,
                ..
            } => self
                .transition_ms
                .max(speed_in_ms.unwrap_or(0))
                .max(speed_out_ms.unwrap_or(0)),
            _ => self.transition_ms,
        };
        Duration::from_millis(ms.min(self.dwell_ms))
    }

    /// Displacement map source, if the active effect needs one. Defaults to
    /// the first slide image when unset.
    pub fn displacement_map(&self) -> Option<PathBuf> {
        match &self.effect {
            EffectConfig::Displacement { map, .. } => Some(
                map.clone()
                    .or_else(|| self.images.first().cloned())
                    .expect("validated configuration has at least one image"),
            ),
            // Random selection may land on displacement, so the map must be
            // resident as well.
            EffectConfig::Random => self.images.first().cloned(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum EffectConfig {
    /// Plain smoothstep crossfade; no distortion.
    #[default]
    Crossfade,
    /// Directional displacement-map warp.
    Displacement {
        /// Displacement map image; defaults to the first slide.
        #[serde(default)]
        map: Option<PathBuf>,
        #[serde(default = "EffectConfig::default_intensity")]
        intensity1: f32,
        #[serde(default = "EffectConfig::default_intensity")]
        intensity2: f32,
        #[serde(default = "EffectConfig::default_angle1_deg")]
        angle1_deg: f32,
        /// Defaults to −3 × angle1.
        #[serde(default)]
        angle2_deg: Option<f32>,
        #[serde(default)]
        easing: Easing,
        #[serde(default)]
        speed_in_ms: Option<u64>,
        #[serde(default)]
        speed_out_ms: Option<u64>,
    },
    /// Fractal-noise fluid warp.
    NoiseWarp {
        #[serde(default = "EffectConfig::default_noise_scale")]
        noise_scale: f32,
        #[serde(default = "EffectConfig::default_noise_intensity")]
        noise_intensity: f32,
        #[serde(default = "EffectConfig::default_max_strength")]
        max_strength: f32,
        #[serde(default)]
        easing: Easing,
    },
    /// Pick one of the three variants (with default options) per transition.
    Random,
}

impl EffectConfig {
    const fn default_intensity() -> f32 {
        1.0
    }

    const fn default_angle1_deg() -> f32 {
        45.0
    }

    const fn default_noise_scale() -> f32 {
        3.0
    }

    const fn default_noise_intensity() -> f32 {
        0.1
    }

    const fn default_max_strength() -> f32 {
        1.0
    }

    fn normalize(&mut self) -> Result<()> {
        match self {
            Self::Crossfade | Self::Random => {}
            Self::Displacement {
                intensity1,
                intensity2,
                angle1_deg,
                angle2_deg,
                ..
            } => {
                ensure!(
                    intensity1.is_finite() && intensity2.is_finite(),
                    "displacement intensities must be finite"
                );
                ensure!(
                    angle1_deg.is_finite(),
                    "displacement angle1-deg must be finite"
                );
                if let Some(angle2) = angle2_deg {
                    ensure!(angle2.is_finite(), "displacement angle2-deg must be finite");
                } else {
                    *angle2_deg = Some(-3.0 * *angle1_deg);
                }
            }
            Self::NoiseWarp {
                noise_scale,
                noise_intensity,
                max_strength,
                ..
            } => {
                ensure!(
                    *noise_scale > 0.0 && noise_scale.is_finite(),
                    "noise-scale must be positive"
                );
                ensure!(
                    *noise_intensity > 0.0 && noise_intensity.is_finite(),
                    "noise-intensity must be positive"
                );
                ensure!(
                    *max_strength > 0.0 && max_strength.is_finite(),
                    "max-strength must be positive"
                );
            }
        }
        Ok(())
    }

    /// Resolves the effect for the upcoming transition. `Random` draws a
    /// fresh variant with default options each time; fixed configurations
    /// always resolve to the same [`ActiveEffect`].
    pub fn select_active<R: Rng + ?Sized>(&self, rng: &mut R) -> ActiveEffect {
        match self {
            Self::Crossfade => ActiveEffect::Crossfade,
            Self::Displacement {
                intensity1,
                intensity2,
                angle1_deg,
                angle2_deg,
                easing,
                ..
            } => ActiveEffect::Displacement {
                intensity1: *intensity1,
                intensity2: *intensity2,
                angle1: angle1_deg.to_radians(),
                angle2: angle2_deg
                    .unwrap_or(-3.0 * *angle1_deg)
                    .to_radians(),
                easing: *easing,
            },
            Self::NoiseWarp {
                noise_scale,
                noise_intensity,
                max_strength,
                easing,
            } => ActiveEffect::NoiseWarp {
                noise_scale: *noise_scale,
                noise_intensity: *noise_intensity,
                max_strength: *max_strength,
                easing: *easing,
            },
            Self::Random => {
                let mut defaults = match rng.random_range(0..3) {
                    0 => Self::Crossfade,
                    1 => Self::Displacement {
                        map: None,
                        intensity1: Self::default_intensity(),
                        intensity2: Self::default_intensity(),
                        angle1_deg: Self::default_angle1_deg(),
                        angle2_deg: None,
                        easing: Easing::default(),
                        speed_in_ms: None,
                        speed_out_ms: None,
                    },
                    _ => Self::NoiseWarp {
                        noise_scale: Self::default_noise_scale(),
                        noise_intensity: Self::default_noise_intensity(),
                        max_strength: Self::default_max_strength(),
                        easing: Easing::default(),
                    },
                };
                defaults
                    .normalize()
                    .expect("default effect options are valid");
                defaults.select_active(rng)
            }
        }
    }
}
