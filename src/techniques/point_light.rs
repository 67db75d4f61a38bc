use std::{rc::Rc, sync::Arc};

use crate::{
    anim::{Keyframe, KeyframeAnimation, Repeat},
    anim_ease::Ease,
    brush::{Brush, EffectFactory},
    compositor::Compositor,
    core::{Point, TimeMs, Vec2},
    error::HoverfxResult,
    expr::TransformExpression,
    graph::{EffectGraph, EffectNode},
    params::{ParamSetHandle, ParamValue},
    surface::DrawingSurface,
    technique::{EffectTechnique, ImageTarget, LoadParams, TechniqueState, ensure_state},
    techniques::normalized_offset,
};

/// A pulsing point-light map that follows the pointer in real time while
/// the pointer is over the image.
pub struct PointLightFollowTechnique {
    compositor: Rc<Compositor>,
    state: TechniqueState,
    factory: Option<EffectFactory>,
    light_map: Option<Arc<DrawingSurface>>,
    pulse_anim: Option<KeyframeAnimation>,
    params: Option<ParamSetHandle>,
}

impl PointLightFollowTechnique {
    pub const TRANSFORM: &'static str = "LightMapTransform.TransformMatrix";
    pub const LIGHT_MAP: &'static str = "LightMap";
    pub const LIGHT_MAP_URI: &'static str = "assets/point_light_map.png";

    const PULSE_MS: u64 = 5000;
    const EXIT_MS: u64 = 750;
    const CENTER: Vec2 = Vec2::new(128.0, 128.0);

    pub fn new(compositor: Rc<Compositor>) -> Self {
        Self {
            compositor,
            state: TechniqueState::Unloaded,
            factory: None,
            light_map: None,
            pulse_anim: None,
            params: None,
        }
    }

    /// Forever-repeating eased pulse: 1.25 → 0.75 → 1.0 per cycle.
    fn scale_pulse() -> KeyframeAnimation {
        let ease = Ease::CubicBezier {
            x1: 0.5,
            y1: 0.0,
            x2: 0.5,
            y2: 1.0,
        };
        let key = |t: f64, v: f64| Keyframe {
            t,
            value: ParamValue::Scalar(v),
            ease,
        };
        KeyframeAnimation {
            keys: vec![
                key(1.0 / 3.0, 1.25),
                key(2.0 / 3.0, 0.75),
                key(1.0, 1.0),
            ],
            duration: TimeMs(Self::PULSE_MS),
            repeat: Repeat::Forever,
        }
    }
}

impl EffectTechnique for PointLightFollowTechnique {
    #[tracing::instrument(skip_all)]
    fn load_resources(
        &mut self,
        params: &LoadParams<'_>,
    ) -> HoverfxResult<Option<Arc<DrawingSurface>>> {
        ensure_state(self.state, &[TechniqueState::Unloaded], "load_resources")?;

        let light_map = params.loader.load_from_uri(Self::LIGHT_MAP_URI)?;

        let graph = EffectGraph {
            root: EffectNode::Arithmetic {
                name: "Mix".to_string(),
                multiply_amount: 1.0,
                source1_amount: 0.1,
                source2_amount: 0.0,
                offset: 0.0,
                source1: Box::new(EffectNode::Source {
                    name: "Source".to_string(),
                }),
                source2: Box::new(EffectNode::Transform2D {
                    name: "LightMapTransform".to_string(),
                    matrix: kurbo::Affine::IDENTITY,
                    source: Box::new(EffectNode::Source {
                        name: Self::LIGHT_MAP.to_string(),
                    }),
                }),
            },
        };
        self.factory = Some(self.compositor.compile_effect(graph, &[Self::TRANSFORM])?);
        self.light_map = Some(Arc::new(light_map));
        self.pulse_anim = Some(Self::scale_pulse());
        self.state = TechniqueState::Loaded;
        Ok(None)
    }

    fn release_resources(&mut self) {
        self.factory = None;
        self.light_map = None;
        self.pulse_anim = None;
        self.params = None;
        self.state = TechniqueState::Released;
    }

    fn create_brush(&self) -> HoverfxResult<Brush> {
        ensure_state(
            self.state,
            &[TechniqueState::Loaded, TechniqueState::Active],
            "create_brush",
        )?;
        let (Some(factory), Some(light_map)) = (&self.factory, &self.light_map) else {
            unreachable!("resources present in Loaded/Active");
        };
        let mut brush = factory.create_brush();
        brush.set_source(Self::LIGHT_MAP, Arc::clone(light_map))?;
        Ok(brush)
    }

    fn on_pointer_enter(
        &mut self,
        position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Loaded], "on_pointer_enter")?;
        tracing::debug!("point light enter");
        let Some(pulse_anim) = &self.pulse_anim else {
            unreachable!("animations present in Loaded");
        };

        let params = self.compositor.create_param_set();
        params.set("Scale", ParamValue::Scalar(1.0));
        params.set("Rotation", ParamValue::Scalar(0.0));
        params.set(
            "Translate",
            ParamValue::Vector2(normalized_offset(position, target)),
        );
        params.set("CenterOffset", ParamValue::Vector2(Self::CENTER));

        target
            .brush
            .bind_expression(Self::TRANSFORM, TransformExpression::standard(), params.clone())?;
        params.animate("Scale", pulse_anim, self.compositor.now())?;

        self.params = Some(params);
        self.state = TechniqueState::Active;
        Ok(())
    }

    fn on_pointer_exit(
        &mut self,
        _position: Point,
        _target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Active], "on_pointer_exit")?;
        tracing::debug!("point light exit");
        let Some(params) = &self.params else {
            unreachable!("parameter set present in Active");
        };
        let now = self.compositor.now();
        // A Forever pulse would otherwise keep overriding the property;
        // stop it before starting the one-shot exit transition.
        params.stop("Scale", now)?;
        params.animate(
            "Translate",
            &KeyframeAnimation::to_value(ParamValue::Vector2(Vec2::ZERO), TimeMs(Self::EXIT_MS)),
            now,
        )?;
        self.state = TechniqueState::Loaded;
        Ok(())
    }

    fn on_pointer_moved(
        &mut self,
        position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Active], "on_pointer_moved")?;
        let Some(params) = &self.params else {
            unreachable!("parameter set present in Active");
        };
        // Immediate value set, no animation: continuous tracking.
        params.set(
            "Translate",
            ParamValue::Vector2(normalized_offset(position, target)),
        );
        Ok(())
    }
}
