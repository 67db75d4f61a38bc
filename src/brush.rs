use std::{collections::BTreeMap, sync::Arc};

use crate::{
    anim::KeyframeAnimation,
    core::TimeMs,
    error::{HoverfxError, HoverfxResult},
    expr::TransformExpression,
    graph::EffectGraph,
    params::{AnimatableSlot, ParamSetHandle, ParamValue},
    surface::DrawingSurface,
};

/// Compiled, immutable representation of an effect graph plus the dotted
/// animatable property paths exposed on brush instances created from it.
/// One factory produces many independent brushes.
#[derive(Clone, Debug)]
pub struct EffectFactory {
    compiled: Arc<CompiledEffect>,
}

#[derive(Debug)]
struct CompiledEffect {
    graph: EffectGraph,
    paths: Vec<String>,
    defaults: BTreeMap<String, ParamValue>,
    sources: Vec<String>,
}

impl EffectFactory {
    /// Validates the graph and resolves every declared animatable path to
    /// its default value. A path that does not name an existing node
    /// parameter is a configuration error.
    #[tracing::instrument(skip(graph), fields(paths = animatable.len()))]
    pub(crate) fn compile(graph: EffectGraph, animatable: &[&str]) -> HoverfxResult<Self> {
        graph.validate()?;

        let mut defaults = BTreeMap::new();
        let mut paths = Vec::with_capacity(animatable.len());
        for &path in animatable {
            let default = graph.resolve_path(path)?;
            if defaults.insert(path.to_string(), default).is_some() {
                return Err(HoverfxError::validation(format!(
                    "animatable path '{path}' declared twice"
                )));
            }
            paths.push(path.to_string());
        }

        let sources = graph.source_names();
        Ok(Self {
            compiled: Arc::new(CompiledEffect {
                graph,
                paths,
                defaults,
                sources,
            }),
        })
    }

    pub fn animatable_paths(&self) -> &[String] {
        &self.compiled.paths
    }

    pub fn graph(&self) -> &EffectGraph {
        &self.compiled.graph
    }

    /// Instantiates an independent brush sharing this compiled factory.
    pub fn create_brush(&self) -> Brush {
        let slots = self
            .compiled
            .defaults
            .iter()
            .map(|(path, default)| (path.clone(), AnimatableSlot::new(default.clone())))
            .collect();
        Brush {
            compiled: Arc::clone(&self.compiled),
            slots,
            expressions: BTreeMap::new(),
            sources: BTreeMap::new(),
        }
    }
}

/// A renderable instance of a compiled effect graph: per-path animatable
/// values, expression bindings, and named source surface bindings.
#[derive(Debug)]
pub struct Brush {
    compiled: Arc<CompiledEffect>,
    slots: BTreeMap<String, AnimatableSlot>,
    expressions: BTreeMap<String, ExpressionBinding>,
    sources: BTreeMap<String, Arc<DrawingSurface>>,
}

#[derive(Debug)]
struct ExpressionBinding {
    expr: TransformExpression,
    params: ParamSetHandle,
}

impl Brush {
    pub fn has_path(&self, path: &str) -> bool {
        self.slots.contains_key(path)
    }

    /// Starts `anim` on the property at `path`, superseding any animation
    /// currently running there.
    pub fn start_animation(
        &mut self,
        path: &str,
        anim: &KeyframeAnimation,
        now: TimeMs,
    ) -> HoverfxResult<()> {
        tracing::debug!(path, now = now.0, "start animation");
        let slot = self.slots.get_mut(path).ok_or_else(|| {
            HoverfxError::validation(format!("'{path}' is not an animatable path of this brush"))
        })?;
        slot.start(anim, now)
    }

    /// Stops the animation at `path`, freezing its last-sampled value.
    pub fn stop_animation(&mut self, path: &str, now: TimeMs) -> HoverfxResult<()> {
        tracing::debug!(path, now = now.0, "stop animation");
        let slot = self.slots.get_mut(path).ok_or_else(|| {
            HoverfxError::validation(format!("'{path}' is not an animatable path of this brush"))
        })?;
        slot.stop(now)
    }

    /// Binds a standing expression animation to `path`. While bound, the
    /// expression is re-evaluated against the live parameter set on every
    /// read and takes precedence over keyframe animations on the path.
    pub fn bind_expression(
        &mut self,
        path: &str,
        expr: TransformExpression,
        params: ParamSetHandle,
    ) -> HoverfxResult<()> {
        if !self.slots.contains_key(path) {
            return Err(HoverfxError::validation(format!(
                "'{path}' is not an animatable path of this brush"
            )));
        }
        self.expressions
            .insert(path.to_string(), ExpressionBinding { expr, params });
        Ok(())
    }

    /// Binds a surface to a named source parameter declared by the graph.
    pub fn set_source(&mut self, name: &str, surface: Arc<DrawingSurface>) -> HoverfxResult<()> {
        if !self.compiled.sources.iter().any(|s| s == name) {
            return Err(HoverfxError::validation(format!(
                "'{name}' is not a source parameter of this effect"
            )));
        }
        self.sources.insert(name.to_string(), surface);
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&Arc<DrawingSurface>> {
        self.sources.get(name)
    }

    /// Samples the property at `path` at timeline instant `now`.
    pub fn value(&self, path: &str, now: TimeMs) -> HoverfxResult<ParamValue> {
        if let Some(binding) = self.expressions.get(path) {
            let m = binding.expr.evaluate(&binding.params, now)?;
            return Ok(ParamValue::Matrix(m));
        }
        let slot = self.slots.get(path).ok_or_else(|| {
            HoverfxError::validation(format!("'{path}' is not an animatable path of this brush"))
        })?;
        slot.value_at(now)
    }
}
