use std::{rc::Rc, sync::Arc};

use crate::{
    anim::KeyframeAnimation,
    blur_cpu::blur_surface,
    brush::{Brush, EffectFactory},
    compositor::Compositor,
    core::{PixelFormat, Point, SurfaceSize, TimeMs},
    error::HoverfxResult,
    graph::{EffectGraph, EffectNode},
    params::ParamValue,
    surface::DrawingSurface,
    technique::{EffectTechnique, ImageTarget, LoadParams, TechniqueState, ensure_state},
};

/// Crossfades between the original image and a pre-blurred, downsampled,
/// darkened copy generated once at load time.
pub struct BlurTechnique {
    compositor: Rc<Compositor>,
    state: TechniqueState,
    factory: Option<EffectFactory>,
    blurred: Option<Arc<DrawingSurface>>,
}

impl BlurTechnique {
    pub const SOURCE1_AMOUNT: &'static str = "Mix.Source1Amount";
    pub const SOURCE2_AMOUNT: &'static str = "Mix.Source2Amount";
    pub const BLURRED_SOURCE: &'static str = "BlurredSource";

    const TRANSITION_MS: u64 = 1000;
    const BLUR_RADIUS: u32 = 10;
    const DOWNSAMPLE: f64 = 0.3;
    const DARKEN: [u8; 4] = [0, 0, 0, 60];

    pub fn new(compositor: Rc<Compositor>) -> Self {
        Self {
            compositor,
            state: TechniqueState::Unloaded,
            factory: None,
            blurred: None,
        }
    }

    /// Custom surface generation: blur the source, draw it downsampled by
    /// [`Self::DOWNSAMPLE`], then composite a translucent black overlay.
    /// The output size follows the target size, falling back to the
    /// source size when the target is empty.
    fn generate_blurred_surface(
        &self,
        source: &DrawingSurface,
        target_size: SurfaceSize,
    ) -> HoverfxResult<DrawingSurface> {
        let base = if target_size.is_empty() {
            source.size()
        } else {
            target_size
        };
        let scaled = base.scaled(Self::DOWNSAMPLE);

        let blurred = blur_surface(source, Self::BLUR_RADIUS)?;
        let mut out = self
            .compositor
            .create_surface(scaled, PixelFormat::Rgba8Premul)?;
        out.draw(|session| {
            session.draw_image(&blurred)?;
            session.fill(Self::DARKEN)
        })?;
        Ok(out)
    }

    fn crossfade(to_source1: f64, to_source2: f64) -> (KeyframeAnimation, KeyframeAnimation) {
        (
            KeyframeAnimation::to_value(
                ParamValue::Scalar(to_source1),
                TimeMs(Self::TRANSITION_MS),
            ),
            KeyframeAnimation::to_value(
                ParamValue::Scalar(to_source2),
                TimeMs(Self::TRANSITION_MS),
            ),
        )
    }
}

impl EffectTechnique for BlurTechnique {
    #[tracing::instrument(skip_all)]
    fn load_resources(
        &mut self,
        params: &LoadParams<'_>,
    ) -> HoverfxResult<Option<Arc<DrawingSurface>>> {
        ensure_state(self.state, &[TechniqueState::Unloaded], "load_resources")?;

        let graph = EffectGraph {
            root: EffectNode::Arithmetic {
                name: "Mix".to_string(),
                multiply_amount: 0.0,
                source1_amount: 1.0,
                source2_amount: 0.0,
                offset: 0.0,
                source1: Box::new(EffectNode::Source {
                    name: "Source".to_string(),
                }),
                source2: Box::new(EffectNode::Source {
                    name: Self::BLURRED_SOURCE.to_string(),
                }),
            },
        };
        self.factory = Some(
            self.compositor
                .compile_effect(graph, &[Self::SOURCE1_AMOUNT, Self::SOURCE2_AMOUNT])?,
        );

        let surface = Arc::new(self.generate_blurred_surface(params.source, params.target_size)?);
        self.blurred = Some(Arc::clone(&surface));
        self.state = TechniqueState::Loaded;
        Ok(Some(surface))
    }

    fn release_resources(&mut self) {
        self.factory = None;
        self.blurred = None;
        self.state = TechniqueState::Released;
    }

    fn create_brush(&self) -> HoverfxResult<Brush> {
        ensure_state(
            self.state,
            &[TechniqueState::Loaded, TechniqueState::Active],
            "create_brush",
        )?;
        let (Some(factory), Some(blurred)) = (&self.factory, &self.blurred) else {
            unreachable!("resources present in Loaded/Active");
        };
        let mut brush = factory.create_brush();
        brush.set_source(Self::BLURRED_SOURCE, Arc::clone(blurred))?;
        Ok(brush)
    }

    fn on_pointer_enter(
        &mut self,
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Loaded], "on_pointer_enter")?;
        tracing::debug!("blur enter");
        let now = self.compositor.now();
        let (a, b) = Self::crossfade(0.0, 1.0);
        target.brush.start_animation(Self::SOURCE1_AMOUNT, &a, now)?;
        target.brush.start_animation(Self::SOURCE2_AMOUNT, &b, now)?;
        self.state = TechniqueState::Active;
        Ok(())
    }

    fn on_pointer_exit(
        &mut self,
        _position: Point,
        target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        ensure_state(self.state, &[TechniqueState::Active], "on_pointer_exit")?;
        tracing::debug!("blur exit");
        let now = self.compositor.now();
        let (a, b) = Self::crossfade(1.0, 0.0);
        target.brush.start_animation(Self::SOURCE1_AMOUNT, &a, now)?;
        target.brush.start_animation(Self::SOURCE2_AMOUNT, &b, now)?;
        self.state = TechniqueState::Loaded;
        Ok(())
    }
}
