//! Shared geometry and timing primitives used across the crate.

pub use kurbo::{Affine, Point, Vec2};

use crate::error::{HoverfxError, HoverfxResult};

/// A point on the animation timeline, in whole milliseconds since the
/// compositor started.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct TimeMs(pub u64);

impl TimeMs {
    /// Milliseconds elapsed since `earlier`. Saturates to zero when
    /// `earlier` lies in the future.
    pub fn elapsed_since(self, earlier: TimeMs) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Pixel dimensions of a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// The zero-area sentinel, used where "no explicit size" is meaningful.
    pub const EMPTY: SurfaceSize = SurfaceSize {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> HoverfxResult<Self> {
        if width == 0 || height == 0 {
            return Err(HoverfxError::validation(format!(
                "surface size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both dimensions by `factor`, flooring the result. A factor
    /// small enough to floor a dimension to zero yields [`Self::EMPTY`].
    pub fn scaled(self, factor: f64) -> SurfaceSize {
        let width = (f64::from(self.width) * factor).floor() as u32;
        let height = (f64::from(self.height) * factor).floor() as u32;
        if width == 0 || height == 0 {
            return Self::EMPTY;
        }
        SurfaceSize { width, height }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Memory layout of surface pixels. Only one layout exists today; the
/// enum keeps the layout explicit at surface boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, color channels premultiplied by alpha.
    Rgba8Premul,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8Premul => 4,
        }
    }
}
