use std::sync::Arc;

use crate::{
    assets::AssetLoader,
    brush::Brush,
    core::{Point, SurfaceSize},
    error::{HoverfxError, HoverfxResult},
    surface::DrawingSurface,
};

/// Inputs to [`EffectTechnique::load_resources`]: the asset loader for
/// external bitmaps, the image the technique decorates, and the display
/// size (may be [`SurfaceSize::EMPTY`] when unknown).
pub struct LoadParams<'a> {
    pub loader: &'a dyn AssetLoader,
    pub source: &'a DrawingSurface,
    pub target_size: SurfaceSize,
}

/// The consumed image/brush target: a brush plus the displayed image
/// dimensions used to normalize pointer coordinates.
#[derive(Debug)]
pub struct ImageTarget {
    pub brush: Brush,
    pub width: f64,
    pub height: f64,
}

impl ImageTarget {
    pub fn new(brush: Brush, width: f64, height: f64) -> Self {
        Self {
            brush,
            width,
            height,
        }
    }
}

/// Lifecycle state of a technique instance. `Released` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TechniqueState {
    Unloaded,
    Loaded,
    Active,
    Released,
}

/// A self-contained pointer-reactive visual effect.
///
/// Lifecycle: `load_resources` exactly once, then any number of brush
/// creations and serialized enter/exit/moved cycles, then
/// `release_resources` (idempotent, callable in any state). Pointer
/// callbacks before a successful load or after release are contract
/// violations and fail fast with a state error.
pub trait EffectTechnique {
    /// Builds the effect factory, animations and any derived surfaces.
    /// Returns the derived surface for variants that precompute one.
    /// This is the only I/O point of a technique; on failure the
    /// technique is unusable and must not be bound or displayed.
    fn load_resources(
        &mut self,
        params: &LoadParams<'_>,
    ) -> HoverfxResult<Option<Arc<DrawingSurface>>>;

    /// Releases every owned resource. Safe to call zero, one or many
    /// times, in any state, including before `load_resources`.
    fn release_resources(&mut self);

    /// Instantiates a renderable brush from the owned effect factory.
    /// Callable multiple times; brushes share the compiled factory but
    /// are otherwise independent.
    fn create_brush(&self) -> HoverfxResult<Brush>;

    fn on_pointer_enter(&mut self, position: Point, target: &mut ImageTarget)
    -> HoverfxResult<()>;

    fn on_pointer_exit(&mut self, position: Point, target: &mut ImageTarget)
    -> HoverfxResult<()>;

    /// Continuous tracking while active. Default: no-op.
    fn on_pointer_moved(
        &mut self,
        _position: Point,
        _target: &mut ImageTarget,
    ) -> HoverfxResult<()> {
        Ok(())
    }
}

/// Fail-fast guard for the technique state machine.
pub(crate) fn ensure_state(
    state: TechniqueState,
    expected: &[TechniqueState],
    op: &str,
) -> HoverfxResult<()> {
    if expected.contains(&state) {
        Ok(())
    } else {
        Err(HoverfxError::state(format!(
            "{op} is not valid in state {state:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_state_reports_operation_and_state() {
        let err = ensure_state(
            TechniqueState::Released,
            &[TechniqueState::Loaded],
            "on_pointer_enter",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("on_pointer_enter"));
        assert!(msg.contains("Released"));

        assert!(
            ensure_state(
                TechniqueState::Loaded,
                &[TechniqueState::Loaded, TechniqueState::Active],
                "create_brush"
            )
            .is_ok()
        );
    }
}
