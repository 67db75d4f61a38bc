use std::collections::BTreeSet;

use crate::{
    core::Affine,
    error::{HoverfxError, HoverfxResult},
    params::ParamValue,
};

/// Declarative effect graph: a tree of image-processing nodes. Every
/// processing node carries a name so its parameters can be targeted by
/// animations via the dotted `NodeName.ParamName` convention.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectGraph {
    pub root: EffectNode,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EffectNode {
    /// Named image input, bound per brush instance.
    Source { name: String },
    /// Saturation in [0,1]; 0 is grayscale.
    Saturation {
        name: String,
        saturation: f64,
        source: Box<EffectNode>,
    },
    /// Exposure stops; typical range [-2,2], values outside are accepted.
    Exposure {
        name: String,
        exposure: f64,
        source: Box<EffectNode>,
    },
    /// `m·s1·s2 + a·s1 + b·s2 + offset` per channel.
    Arithmetic {
        name: String,
        multiply_amount: f64,
        source1_amount: f64,
        source2_amount: f64,
        offset: f64,
        source1: Box<EffectNode>,
        source2: Box<EffectNode>,
    },
    Transform2D {
        name: String,
        matrix: Affine,
        source: Box<EffectNode>,
    },
    GaussianBlur {
        name: String,
        blur_amount: f64,
        source: Box<EffectNode>,
    },
}

impl EffectNode {
    fn name(&self) -> &str {
        match self {
            Self::Source { name }
            | Self::Saturation { name, .. }
            | Self::Exposure { name, .. }
            | Self::Arithmetic { name, .. }
            | Self::Transform2D { name, .. }
            | Self::GaussianBlur { name, .. } => name,
        }
    }

    fn children(&self) -> Vec<&EffectNode> {
        match self {
            Self::Source { .. } => vec![],
            Self::Saturation { source, .. }
            | Self::Exposure { source, .. }
            | Self::Transform2D { source, .. }
            | Self::GaussianBlur { source, .. } => vec![source],
            Self::Arithmetic {
                source1, source2, ..
            } => vec![source1, source2],
        }
    }

    fn validate(&self) -> HoverfxResult<()> {
        let name = self.name();
        if name.trim().is_empty() {
            return Err(HoverfxError::validation("effect node name must be non-empty"));
        }
        if name.contains('.') {
            return Err(HoverfxError::validation(format!(
                "effect node name '{name}' must not contain '.'"
            )));
        }
        match self {
            Self::Source { .. } => {}
            Self::Saturation { saturation, .. } => {
                if !saturation.is_finite() || !(0.0..=1.0).contains(saturation) {
                    return Err(HoverfxError::validation(
                        "Saturation.Saturation must lie in [0,1]",
                    ));
                }
            }
            Self::Exposure { exposure, .. } => {
                if !exposure.is_finite() {
                    return Err(HoverfxError::validation("Exposure.Exposure must be finite"));
                }
            }
            Self::Arithmetic {
                multiply_amount,
                source1_amount,
                source2_amount,
                offset,
                ..
            } => {
                for (param, v) in [
                    ("MultiplyAmount", multiply_amount),
                    ("Source1Amount", source1_amount),
                    ("Source2Amount", source2_amount),
                    ("Offset", offset),
                ] {
                    if !v.is_finite() {
                        return Err(HoverfxError::validation(format!(
                            "Arithmetic.{param} must be finite"
                        )));
                    }
                }
            }
            Self::Transform2D { .. } => {}
            Self::GaussianBlur { blur_amount, .. } => {
                if !blur_amount.is_finite() || *blur_amount < 0.0 {
                    return Err(HoverfxError::validation(
                        "GaussianBlur.BlurAmount must be finite and >= 0",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Default value of one of this node's animatable parameters, or None
    /// if the node has no parameter by that name.
    fn param_default(&self, param: &str) -> Option<ParamValue> {
        match (self, param) {
            (Self::Saturation { saturation, .. }, "Saturation") => {
                Some(ParamValue::Scalar(*saturation))
            }
            (Self::Exposure { exposure, .. }, "Exposure") => Some(ParamValue::Scalar(*exposure)),
            (Self::Arithmetic { multiply_amount, .. }, "MultiplyAmount") => {
                Some(ParamValue::Scalar(*multiply_amount))
            }
            (Self::Arithmetic { source1_amount, .. }, "Source1Amount") => {
                Some(ParamValue::Scalar(*source1_amount))
            }
            (Self::Arithmetic { source2_amount, .. }, "Source2Amount") => {
                Some(ParamValue::Scalar(*source2_amount))
            }
            (Self::Arithmetic { offset, .. }, "Offset") => Some(ParamValue::Scalar(*offset)),
            (Self::Transform2D { matrix, .. }, "TransformMatrix") => {
                Some(ParamValue::Matrix(*matrix))
            }
            (Self::GaussianBlur { blur_amount, .. }, "BlurAmount") => {
                Some(ParamValue::Scalar(*blur_amount))
            }
            _ => None,
        }
    }
}

impl EffectGraph {
    pub fn validate(&self) -> HoverfxResult<()> {
        let mut names = BTreeSet::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            node.validate()?;
            if !names.insert(node.name().to_string()) {
                return Err(HoverfxError::validation(format!(
                    "duplicate effect node name '{}'",
                    node.name()
                )));
            }
            stack.extend(node.children());
        }
        Ok(())
    }

    /// Resolves a dotted `NodeName.ParamName` path to the parameter's
    /// default value. A mismatched path is a configuration error.
    pub fn resolve_path(&self, path: &str) -> HoverfxResult<ParamValue> {
        let Some((node_name, param)) = path.split_once('.') else {
            return Err(HoverfxError::validation(format!(
                "property path '{path}' must have the form Node.Param"
            )));
        };

        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.name() == node_name {
                return node.param_default(param).ok_or_else(|| {
                    HoverfxError::validation(format!(
                        "effect node '{node_name}' has no parameter '{param}'"
                    ))
                });
            }
            stack.extend(node.children());
        }
        Err(HoverfxError::validation(format!(
            "no effect node named '{node_name}' in graph"
        )))
    }

    /// Names of all `Source` inputs, in depth-first order.
    pub fn source_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let EffectNode::Source { name } = node {
                out.push(name.clone());
            }
            stack.extend(node.children());
        }
        out
    }
}
