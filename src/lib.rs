#![forbid(unsafe_code)]

pub mod anim;
pub mod anim_ease;
pub mod assets;
pub mod blur_cpu;
pub mod brush;
pub mod compositor;
pub mod core;
pub mod error;
pub mod expr;
pub mod graph;
pub mod params;
pub mod surface;
pub mod technique;
pub mod techniques;

pub use anim::{Keyframe, KeyframeAnimation, Repeat};
pub use anim_ease::Ease;
pub use assets::{AssetLoader, FsAssetLoader};
pub use brush::{Brush, EffectFactory};
pub use compositor::Compositor;
pub use crate::core::{Affine, PixelFormat, Point, SurfaceSize, TimeMs, Vec2};
pub use error::{HoverfxError, HoverfxResult};
pub use expr::TransformExpression;
pub use graph::{EffectGraph, EffectNode};
pub use params::{ParamSetHandle, ParamValue};
pub use surface::{DrawingSession, DrawingSurface};
pub use technique::{EffectTechnique, ImageTarget, LoadParams, TechniqueState};
pub use techniques::{
    BlurTechnique, DesaturationTechnique, ExposureTechnique, PointLightFollowTechnique,
    SpotLightTechnique,
};
