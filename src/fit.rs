//! Aspect-ratio-aware UV fitting.
//!
//! A slide of arbitrary aspect ratio is shown inside a fixed-aspect viewport
//! by remapping the fragment UV instead of stretching the quad. The remap is
//! `(uv - 0.5) * scale + 0.5 + offset`: the constrained axis keeps its scale
//! at 1.0 while the other shrinks, so the image always fills its available
//! axis without distortion.

/// Per-image UV scale/offset produced by [`fit`].
///
/// Exactly one of `scale_x`/`scale_y` is 1.0 (the unconstrained axis); the
/// other is in (0, 1]. Offsets are reserved for a pan/crop feature and stay
/// at 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitParams {
    /// Identity fit: sampling covers the full texture.
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Packed `[sx, sy, ox, oy]` as uploaded into the uniform block.
    pub fn as_vec4(&self) -> [f32; 4] {
        [self.scale_x, self.scale_y, self.offset_x, self.offset_y]
    }
}

impl Default for FitParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Computes fit parameters for an image of `image_ar` (width/height) shown in
/// a viewport of `container_ar`.
///
/// Deterministic, total and side-effect-free. Both ratios must be positive
/// and finite by contract; a failed image load substitutes 1.0 upstream, so
/// no sanitizing happens here.
pub fn fit(image_ar: f32, container_ar: f32) -> FitParams {
    if image_ar > container_ar {
        // Image relatively wider than the container: height is constrained.
        FitParams {
            scale_x: container_ar / image_ar,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    } else {
        // Image relatively taller (or equal): width is constrained.
        FitParams {
            scale_x: 1.0,
            scale_y: image_ar / container_ar,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// CPU mirror of the shader-side UV remap, used to pin the contract in tests.
pub fn remap_uv(uv: [f32; 2], fit: &FitParams) -> [f32; 2] {
    [
        (uv[0] - 0.5) * fit.scale_x + 0.5 + fit.offset_x,
        (uv[1] - 0.5) * fit.scale_y + 0.5 + fit.offset_y,
    ]
}
