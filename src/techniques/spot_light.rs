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
};

/// Sweeps a rotating light-map texture across the image on pointer enter.
/// The sweep is identical regardless of the pointer position.
pub struct SpotLightTechnique {
    compositor: Rc<Compositor>,
    state: TechniqueState,
    factory: Option<EffectFactory>,
    light_map: Option<Arc<DrawingSurface>>,
    rotation_anim: Option<KeyframeAnimation>,
    params: Option<ParamSetHandle>,
}

impl SpotLightTechnique {
    pub const TRANSFORM: &'static str = "LightMapTransform.TransformMatrix";
    pub const LIGHT_MAP: &'static str = "LightMap";
    pub const LIGHT_MAP_URI: &'static str = "assets/spot_light_map.png";

    const SWEEP_MS: u64 = 4500;
    const EXIT_MS: u64 = 1000;

    pub fn new(compositor: Rc<Compositor>) -> Self {
        Self {
            compositor,
            state: TechniqueState::Unloaded,
            factory: None,
            light_map: None,
            rotation_anim: None,
            params: None,
        }
    }

    /// Nearly-full negative rotation with an overshoot past -2π and a
    /// settle on the final key.
    fn rotation_sweep() -> KeyframeAnimation {
        let key = |t: f64, v: f64| Keyframe {
            t,
            value: ParamValue::Scalar(v),
            ease: Ease::Linear,
        };
        KeyframeAnimation {
            keys: vec![
                key(0.1, -0.2),
                key(0.4, -2.6),
                key(0.8, -6.6),
                key(1.0, -6.0),
            ],
            duration: TimeMs(Self::SWEEP_MS),
            repeat: Repeat::Count(1),
        }
    }
}

impl EffectTechnique for SpotLightTechnique {
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
                source1_amount: 0.25,
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
        self.rotation_anim = Some(Self::rotation_sweep());
        self.state = TechniqueState::Loaded;
        Ok(None)
    }

    fn release_resources(&mut self) {
        self.factory = None;
        self.light_map = None;
        self.rotation_anim = None;
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
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Loaded], "on_pointer_enter")?;
        tracing::debug!("spot light enter");
        let (Some(light_map), Some(rotation_anim)) = (&self.light_map, &self.rotation_anim)
        else {
            unreachable!("resources present in Loaded");
        };

        // Fresh per-session parameter set; the previous one is dropped.
        let params = self.compositor.create_param_set();
        params.set("Scale", ParamValue::Scalar(1.25));
        params.set("Rotation", ParamValue::Scalar(0.0));
        params.set("Translate", ParamValue::Vector2(Vec2::ZERO));
        params.set(
            "CenterOffset",
            ParamValue::Vector2(Vec2::new(f64::from(light_map.width()) / 2.0, 0.0)),
        );

        target
            .brush
            .bind_expression(Self::TRANSFORM, TransformExpression::standard(), params.clone())?;
        params.animate("Rotation", rotation_anim, self.compositor.now())?;

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
        tracing::debug!("spot light exit");
        let Some(params) = &self.params else {
            unreachable!("parameter set present in Active");
        };
        params.animate(
            "Rotation",
            &KeyframeAnimation::to_value(ParamValue::Scalar(0.0), TimeMs(Self::EXIT_MS)),
            self.compositor.now(),
        )?;
        self.state = TechniqueState::Loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::AssetLoader,
        core::{PixelFormat, SurfaceSize},
    };

    struct LightMapLoader;

    impl AssetLoader for LightMapLoader {
        fn load_from_uri(&self, _uri: &str) -> HoverfxResult<DrawingSurface> {
            DrawingSurface::new(
                SurfaceSize::new(256, 256).unwrap(),
                PixelFormat::Rgba8Premul,
            )
        }
    }

    fn loaded(comp: &Rc<Compositor>) -> SpotLightTechnique {
        let mut tech = SpotLightTechnique::new(Rc::clone(comp));
        let source = DrawingSurface::new(
            SurfaceSize::new(64, 64).unwrap(),
            PixelFormat::Rgba8Premul,
        )
        .unwrap();
        tech.load_resources(&LoadParams {
            loader: &LightMapLoader,
            source: &source,
            target_size: SurfaceSize::EMPTY,
        })
        .unwrap();
        tech
    }

    #[test]
    fn brush_binds_light_map_source() {
        let comp = Compositor::new();
        let tech = loaded(&comp);
        let brush = tech.create_brush().unwrap();
        assert!(brush.source(SpotLightTechnique::LIGHT_MAP).is_some());
        assert!(brush.has_path(SpotLightTechnique::TRANSFORM));
    }

    #[test]
    fn enter_is_position_independent() {
        let comp = Compositor::new();

        let mut tech_a = loaded(&comp);
        let mut target_a = ImageTarget::new(tech_a.create_brush().unwrap(), 64.0, 64.0);
        tech_a
            .on_pointer_enter(Point::new(3.0, 5.0), &mut target_a)
            .unwrap();

        let mut tech_b = loaded(&comp);
        let mut target_b = ImageTarget::new(tech_b.create_brush().unwrap(), 64.0, 64.0);
        tech_b
            .on_pointer_enter(Point::new(61.0, 14.0), &mut target_b)
            .unwrap();

        comp.advance_to(TimeMs(2000));
        let a = target_a
            .brush
            .value(SpotLightTechnique::TRANSFORM, comp.now())
            .unwrap();
        let b = target_b
            .brush
            .value(SpotLightTechnique::TRANSFORM, comp.now())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sweep_rotates_then_exit_returns_to_zero() {
        let comp = Compositor::new();
        let mut tech = loaded(&comp);
        let mut target = ImageTarget::new(tech.create_brush().unwrap(), 64.0, 64.0);
        tech.on_pointer_enter(Point::ZERO, &mut target).unwrap();

        let params = tech.params.clone().unwrap();
        comp.advance_to(TimeMs(4500));
        assert_eq!(
            params.get("Rotation", comp.now()).unwrap(),
            ParamValue::Scalar(-6.0)
        );

        tech.on_pointer_exit(Point::ZERO, &mut target).unwrap();
        comp.advance_to(TimeMs(5500));
        assert_eq!(
            params.get("Rotation", comp.now()).unwrap(),
            ParamValue::Scalar(0.0)
        );
    }

    #[test]
    fn center_offset_follows_light_map_width() {
        let comp = Compositor::new();
        let mut tech = loaded(&comp);
        let mut target = ImageTarget::new(tech.create_brush().unwrap(), 64.0, 64.0);
        tech.on_pointer_enter(Point::ZERO, &mut target).unwrap();
        let params = tech.params.clone().unwrap();
        assert_eq!(
            params.get("CenterOffset", comp.now()).unwrap(),
            ParamValue::Vector2(Vec2::new(128.0, 0.0))
        );
    }
}
