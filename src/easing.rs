use std::fmt;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Named easing curve applied to displacement-strength shaping.
///
/// Easing never touches the scheduler's raw linear progress; it only shapes
/// the auxiliary strength curves inside the shading model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    SineInOut,
    CubicInOut,
    ExpoInOut,
}

impl Easing {
    const ALL: &'static [Self] = &[
        Self::Linear,
        Self::SineInOut,
        Self::CubicInOut,
        Self::ExpoInOut,
    ];
    const NAMES: &'static [&'static str] =
        &["linear", "sine-in-out", "cubic-in-out", "expo-in-out"];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::SineInOut => "sine-in-out",
            Self::CubicInOut => "cubic-in-out",
            Self::ExpoInOut => "expo-in-out",
        }
    }

    /// Evaluates the curve at `t`, clamped to [0, 1]. All curves map 0 to 0
    /// and 1 to 1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SineInOut => 0.5 - 0.5 * (std::f32::consts::PI * t).cos(),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::ExpoInOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    (2.0_f32).powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - (2.0_f32).powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        for easing in Self::ALL {
            if raw == easing.as_str() {
                return Ok(*easing);
            }
        }
        Err(de::Error::unknown_variant(&raw, Self::NAMES))
    }
}
