use std::{cell::Cell, rc::Rc};

use crate::{
    brush::EffectFactory,
    core::{PixelFormat, SurfaceSize, TimeMs},
    error::HoverfxResult,
    graph::EffectGraph,
    params::ParamSetHandle,
    surface::DrawingSurface,
};

/// The shared compositing context: factory for compiled effects, drawing
/// surfaces and parameter sets, and owner of the single animation
/// timeline. Shared read-only by `Rc` handle; outlives every technique
/// constructed against it.
#[derive(Debug)]
pub struct Compositor {
    clock: Cell<TimeMs>,
}

impl Compositor {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            clock: Cell::new(TimeMs(0)),
        })
    }

    /// Current instant on the animation timeline.
    pub fn now(&self) -> TimeMs {
        self.clock.get()
    }

    /// Advances the timeline. Driven by the host (or by tests); the clock
    /// never moves backwards.
    pub fn advance_to(&self, t: TimeMs) {
        if t > self.clock.get() {
            self.clock.set(t);
        }
    }

    pub fn compile_effect(
        &self,
        graph: EffectGraph,
        animatable: &[&str],
    ) -> HoverfxResult<EffectFactory> {
        EffectFactory::compile(graph, animatable)
    }

    pub fn create_surface(
        &self,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> HoverfxResult<DrawingSurface> {
        DrawingSurface::new(size, format)
    }

    pub fn create_param_set(&self) -> ParamSetHandle {
        ParamSetHandle::new()
    }
}
