use crate::{
    core::{Affine, TimeMs, Vec2},
    error::{HoverfxError, HoverfxResult},
    params::{ParamSetHandle, ParamValue},
};

/// Expression animation over a live parameter set, producing a 2D matrix.
///
/// Re-evaluated on every read while bound:
///
/// ```text
/// M = translate(center + translate) ∘ rotate(rotation) ∘ scale(scale) ∘ translate(-center)
/// ```
///
/// i.e. the input is first moved by `-center`, rotated and uniformly
/// scaled about the origin, then moved to `center + translate`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransformExpression {
    pub translate_key: String,
    pub rotation_key: String,
    pub scale_key: String,
    pub center_key: String,
}

impl TransformExpression {
    /// Conventional key names used by the built-in light techniques.
    pub fn standard() -> Self {
        Self {
            translate_key: "Translate".to_string(),
            rotation_key: "Rotation".to_string(),
            scale_key: "Scale".to_string(),
            center_key: "CenterOffset".to_string(),
        }
    }

    pub fn evaluate(&self, params: &ParamSetHandle, now: TimeMs) -> HoverfxResult<Affine> {
        let translate = expect_vector2(&self.translate_key, params, now)?;
        let rotation = expect_scalar(&self.rotation_key, params, now)?;
        let scale = expect_scalar(&self.scale_key, params, now)?;
        let center = expect_vector2(&self.center_key, params, now)?;

        Ok(Affine::translate(center + translate)
            * Affine::rotate(rotation)
            * Affine::scale(scale)
            * Affine::translate(-center))
    }
}

fn expect_scalar(key: &str, params: &ParamSetHandle, now: TimeMs) -> HoverfxResult<f64> {
    match params.get(key, now)? {
        ParamValue::Scalar(v) => Ok(v),
        other => Err(HoverfxError::effect(format!(
            "parameter '{key}' must be a scalar, got {:?}",
            other.kind()
        ))),
    }
}

fn expect_vector2(key: &str, params: &ParamSetHandle, now: TimeMs) -> HoverfxResult<Vec2> {
    match params.get(key, now)? {
        ParamValue::Vector2(v) => Ok(v),
        other => Err(HoverfxError::effect(format!(
            "parameter '{key}' must be a 2D vector, got {:?}",
            other.kind()
        ))),
    }
}
