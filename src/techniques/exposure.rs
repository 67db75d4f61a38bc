use std::{rc::Rc, sync::Arc};

use crate::{
    anim::KeyframeAnimation,
    brush::{Brush, EffectFactory},
    compositor::Compositor,
    core::{Point, TimeMs},
    error::HoverfxResult,
    graph::{EffectGraph, EffectNode},
    params::ParamValue,
    surface::DrawingSurface,
    technique::{EffectTechnique, ImageTarget, LoadParams, TechniqueState, ensure_state},
};

/// Brightens the image by two exposure stops on pointer enter.
pub struct ExposureTechnique {
    compositor: Rc<Compositor>,
    state: TechniqueState,
    factory: Option<EffectFactory>,
    enter_anim: Option<KeyframeAnimation>,
    exit_anim: Option<KeyframeAnimation>,
}

impl ExposureTechnique {
    pub const EXPOSURE: &'static str = "ExposureEffect.Exposure";
    const TRANSITION_MS: u64 = 1000;
    const ACTIVE_EXPOSURE: f64 = 2.0;

    pub fn new(compositor: Rc<Compositor>) -> Self {
        Self {
            compositor,
            state: TechniqueState::Unloaded,
            factory: None,
            enter_anim: None,
            exit_anim: None,
        }
    }
}

impl EffectTechnique for ExposureTechnique {
    #[tracing::instrument(skip_all)]
    fn load_resources(
        &mut self,
        _params: &LoadParams<'_>,
    ) -> HoverfxResult<Option<Arc<DrawingSurface>>> {
        ensure_state(self.state, &[TechniqueState::Unloaded], "load_resources")?;

        let graph = EffectGraph {
            root: EffectNode::Exposure {
                name: "ExposureEffect".to_string(),
                exposure: 0.0,
                source: Box::new(EffectNode::Source {
                    name: "Source".to_string(),
                }),
            },
        };
        self.factory = Some(self.compositor.compile_effect(graph, &[Self::EXPOSURE])?);
        self.enter_anim = Some(KeyframeAnimation::to_value(
            ParamValue::Scalar(Self::ACTIVE_EXPOSURE),
            TimeMs(Self::TRANSITION_MS),
        ));
        self.exit_anim = Some(KeyframeAnimation::to_value(
            ParamValue::Scalar(0.0),
            TimeMs(Self::TRANSITION_MS),
        ));
        self.state = TechniqueState::Loaded;
        Ok(None)
    }

    fn release_resources(&mut self) {
        self.factory = None;
        self.enter_anim = None;
        self.exit_anim = None;
        self.state = TechniqueState::Released;
    }

    fn create_brush(&self) -> HoverfxResult<Brush> {
        ensure_state(
            self.state,
            &[TechniqueState::Loaded, TechniqueState::Active],
            "create_brush",
        )?;
        let Some(factory) = &self.factory else {
            unreachable!("factory present in Loaded/Active");
        };
        Ok(factory.create_brush())
    }

    fn on_pointer_enter(
        &mut self,
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Loaded], "on_pointer_enter")?;
        tracing::debug!("exposure enter");
        let Some(anim) = &self.enter_anim else {
            unreachable!("animations present in Loaded");
        };
        target
            .brush
            .start_animation(Self::EXPOSURE, anim, self.compositor.now())?;
        self.state = TechniqueState::Active;
        Ok(())
    }

    fn on_pointer_exit(
        &mut self,
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Active], "on_pointer_exit")?;
        tracing::debug!("exposure exit");
        let Some(anim) = &self.exit_anim else {
            unreachable!("animations present in Active");
        };
        target
            .brush
            .start_animation(Self::EXPOSURE, anim, self.compositor.now())?;
        self.state = TechniqueState::Loaded;
        Ok(())
    }
}
