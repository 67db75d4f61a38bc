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

/// Fades the image to grayscale on pointer enter, back to full color on
/// exit.
pub struct DesaturationTechnique {
    compositor: Rc<Compositor>,
    state: TechniqueState,
    factory: Option<EffectFactory>,
    enter_anim: Option<KeyframeAnimation>,
    exit_anim: Option<KeyframeAnimation>,
}

impl DesaturationTechnique {
    pub const SATURATION: &'static str = "SaturationEffect.Saturation";
    const TRANSITION_MS: u64 = 1000;

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

impl EffectTechnique for DesaturationTechnique {
    #[tracing::instrument(skip_all)]
    fn load_resources(
        &mut self,
        _params: &LoadParams<'_>,
    ) -> HoverfxResult<Option<Arc<DrawingSurface>>> {
        ensure_state(self.state, &[TechniqueState::Unloaded], "load_resources")?;

        let graph = EffectGraph {
            root: EffectNode::Saturation {
                name: "SaturationEffect".to_string(),
                saturation: 1.0,
                source: Box::new(EffectNode::Source {
                    name: "Source".to_string(),
                }),
            },
        };
        self.factory = Some(self.compositor.compile_effect(graph, &[Self::SATURATION])?);
        self.enter_anim = Some(KeyframeAnimation::to_value(
            ParamValue::Scalar(0.0),
            TimeMs(Self::TRANSITION_MS),
        ));
        self.exit_anim = Some(KeyframeAnimation::to_value(
            ParamValue::Scalar(1.0),
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
        tracing::debug!("desaturation enter");
        let Some(anim) = &self.enter_anim else {
            unreachable!("animations present in Loaded");
        };
        target
            .brush
            .start_animation(Self::SATURATION, anim, self.compositor.now())?;
        self.state = TechniqueState::Active;
        Ok(())
    }

    fn on_pointer_exit(
        &mut self,
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Active], "on_pointer_exit")?;
        tracing::debug!("desaturation exit");
        let Some(anim) = &self.exit_anim else {
            unreachable!("animations present in Active");
        };
        target
            .brush
            .start_animation(Self::SATURATION, anim, self.compositor.now())?;
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
        error::HoverfxError,
    };

    struct NoAssets;

    impl AssetLoader for NoAssets {
        fn load_from_uri(&self, uri: &str) -> HoverfxResult<DrawingSurface> {
            Err(HoverfxError::resource(format!("no asset '{uri}'")))
        }
    }

    fn load_ctx() -> (DrawingSurface, NoAssets) {
        let source = DrawingSurface::new(
            SurfaceSize::new(64, 64).unwrap(),
            PixelFormat::Rgba8Premul,
        )
        .unwrap();
        (source, NoAssets)
    }

    #[test]
    fn enter_then_exit_animates_saturation_round_trip() {
        let comp = Compositor::new();
        let mut tech = DesaturationTechnique::new(Rc::clone(&comp));
        let (source, loader) = load_ctx();
        let derived = tech
            .load_resources(&LoadParams {
                loader: &loader,
                source: &source,
                target_size: SurfaceSize::EMPTY,
            })
            .unwrap();
        assert!(derived.is_none());

        let mut target = ImageTarget::new(tech.create_brush().unwrap(), 64.0, 64.0);
        tech.on_pointer_enter(Point::new(1.0, 1.0), &mut target)
            .unwrap();

        comp.advance_to(TimeMs(500));
        assert_eq!(
            target
                .brush
                .value(DesaturationTechnique::SATURATION, comp.now())
                .unwrap(),
            ParamValue::Scalar(0.5)
        );

        comp.advance_to(TimeMs(1000));
        tech.on_pointer_exit(Point::new(1.0, 1.0), &mut target)
            .unwrap();
        comp.advance_to(TimeMs(2000));
        assert_eq!(
            target
                .brush
                .value(DesaturationTechnique::SATURATION, comp.now())
                .unwrap(),
            ParamValue::Scalar(1.0)
        );
    }

    #[test]
    fn load_twice_is_a_state_error() {
        let comp = Compositor::new();
        let mut tech = DesaturationTechnique::new(comp);
        let (source, loader) = load_ctx();
        let params = LoadParams {
            loader: &loader,
            source: &source,
            target_size: SurfaceSize::EMPTY,
        };
        tech.load_resources(&params).unwrap();
        assert!(matches!(
            tech.load_resources(&params),
            Err(HoverfxError::State(_))
        ));
    }
}
