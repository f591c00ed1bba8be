//! Scalar core of the shading model plus the uniform block shared with the
//! WGSL shader.
//!
//! The fragment shader in `render/shaders/slider.wgsl` is a pure function of
//! these uniforms; everything with testable structure (mix weights, strength
//! curves, easing) is computed here on the CPU and uploaded once per frame.

use bytemuck::{Pod, Zeroable};

use crate::easing::Easing;
use crate::fit::FitParams;

/// Effect variant index as seen by the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Crossfade,
    Displacement,
    NoiseWarp,
}

impl EffectKind {
    pub const fn as_index(&self) -> u32 {
        match self {
            Self::Crossfade => 1,
            Self::Displacement => 2,
            Self::NoiseWarp => 3,
        }
    }
}

/// Hermite smoothstep over [0, 1], the crossfade mix weight.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Complementary displacement strengths for the directional variant: the
/// current image is displaced by `eased`, the next by `1 − eased`, so the
/// two halves of the wipe move in independent directions with opposite
/// weight.
pub fn displacement_strengths(eased: f32) -> (f32, f32) {
    let eased = eased.clamp(0.0, 1.0);
    (eased, 1.0 - eased)
}

/// Shaped warp strength for the noise variant: a bump that rises from 0 at
/// progress 0, peaks at 0.5 and returns to 0 at 1, so the warp is strongest
/// mid-transition and both endpoints render undistorted.
pub fn warp_strength(progress: f32, easing: Easing, max_strength: f32) -> f32 {
    let bump = (progress.clamp(0.0, 1.0) * std::f32::consts::PI).sin();
    easing.apply(bump) * max_strength
}

/// Uniform block uploaded once per frame. Layout matches `Uniforms` in
/// `slider.wgsl`: three vec4 fit blocks followed by two vec4-sized scalar
/// groups, 96 bytes total.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EffectUniforms {
    /// `[sx, sy, ox, oy]` for the current image.
    pub fit_current: [f32; 4],
    /// `[sx, sy, ox, oy]` for the next image.
    pub fit_next: [f32; 4],
    /// `[sx, sy, ox, oy]` for the displacement map.
    pub fit_map: [f32; 4],
    /// Raw linear transition progress.
    pub progress: f32,
    /// Progress shaped by the configured easing curve.
    pub eased: f32,
    /// Seconds since session start; animates the idle noise field.
    pub time: f32,
    /// Effect variant index, see [`EffectKind::as_index`].
    pub effect: u32,
    pub angle1: f32,
    pub angle2: f32,
    pub intensity1: f32,
    pub intensity2: f32,
    pub noise_scale: f32,
    pub noise_intensity: f32,
    pub warp_strength: f32,
    pub _pad: f32,
}

/// Per-frame inputs supplied by the controller.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub progress: f32,
    pub time: f32,
    pub fit_current: FitParams,
    pub fit_next: FitParams,
    pub fit_map: FitParams,
}

/// A fully resolved effect: configuration defaults applied, angles in
/// radians, displacement map path pinned down.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveEffect {
    Crossfade,
    Displacement {
        intensity1: f32,
        intensity2: f32,
        angle1: f32,
        angle2: f32,
        easing: Easing,
    },
    NoiseWarp {
        noise_scale: f32,
        noise_intensity: f32,
        max_strength: f32,
        easing: Easing,
    },
}

impl ActiveEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Crossfade => EffectKind::Crossfade,
            Self::Displacement { .. } => EffectKind::Displacement,
            Self::NoiseWarp { .. } => EffectKind::NoiseWarp,
        }
    }

    /// Packs the uniform block for one frame.
    pub fn pack(&self, frame: &FrameInputs) -> EffectUniforms {
        let progress = frame.progress.clamp(0.0, 1.0);
        let mut u = EffectUniforms {
            fit_current: frame.fit_current.as_vec4(),
            fit_next: frame.fit_next.as_vec4(),
            fit_map: frame.fit_map.as_vec4(),
            progress,
            eased: progress,
            time: frame.time,
            effect: self.kind().as_index(),
            angle1: 0.0,
            angle2: 0.0,
            intensity1: 0.0,
            intensity2: 0.0,
            noise_scale: 0.0,
            noise_intensity: 0.0,
            warp_strength: 0.0,
            _pad: 0.0,
        };
        match self {
            Self::Crossfade => {}
            Self::Displacement {
                intensity1,
                intensity2,
                angle1,
                angle2,
                easing,
            } => {
                u.eased = easing.apply(progress);
                u.angle1 = *angle1;
                u.angle2 = *angle2;
                u.intensity1 = *intensity1;
                u.intensity2 = *intensity2;
            }
            Self::NoiseWarp {
                noise_scale,
                noise_intensity,
                max_strength,
                easing,
            } => {
                u.noise_scale = *noise_scale;
                u.noise_intensity = *noise_intensity;
                u.warp_strength = warp_strength(progress, *easing, *max_strength);
            }
        }
        u
    }
}
