//! The five built-in pointer-reactive techniques.

pub mod blur;
pub mod desaturation;
pub mod exposure;
pub mod point_light;
pub mod spot_light;

pub use blur::BlurTechnique;
pub use desaturation::DesaturationTechnique;
pub use exposure::ExposureTechnique;
pub use point_light::PointLightFollowTechnique;
pub use spot_light::SpotLightTechnique;

use crate::{
    core::{Point, Vec2},
    technique::ImageTarget,
};

/// Maps raw pointer coordinates to an offset normalized against the image
/// dimensions, with (0,0) at the image center: `(px/w - 0.5, py/h - 0.5)`.
pub(crate) fn normalized_offset(position: Point, target: &ImageTarget) -> Vec2 {
    Vec2::new(
        position.x / target.width - 0.5,
        position.y / target.height - 0.5,
    )
}
