use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{
    anim::KeyframeAnimation,
    core::{Affine, TimeMs, Vec2},
    error::{HoverfxError, HoverfxResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParamValue {
    Scalar(f64),
    Vector2(Vec2),
    Matrix(Affine),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Scalar,
    Vector2,
    Matrix,
}

impl ParamKind {
    pub fn is_interpolable(self) -> bool {
        !matches!(self, Self::Matrix)
    }
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Scalar(_) => ParamKind::Scalar,
            Self::Vector2(_) => ParamKind::Vector2,
            Self::Matrix(_) => ParamKind::Matrix,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector2(&self) -> Option<Vec2> {
        match self {
            Self::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<Affine> {
        match self {
            Self::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    pub fn lerp(a: &Self, b: &Self, t: f64) -> HoverfxResult<Self> {
        match (a, b) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(a + (b - a) * t)),
            (Self::Vector2(a), Self::Vector2(b)) => Ok(Self::Vector2(Vec2::new(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
            ))),
            _ => Err(HoverfxError::animation(
                "cannot interpolate between mismatched or matrix values",
            )),
        }
    }
}

/// One animatable value: a base value plus an optional running animation.
/// Starting a new animation supersedes the running one; an explicit stop
/// freezes the currently sampled value as the new base.
#[derive(Clone, Debug)]
pub(crate) struct AnimatableSlot {
    base: ParamValue,
    active: Option<ActiveAnimation>,
}

#[derive(Clone, Debug)]
struct ActiveAnimation {
    anim: KeyframeAnimation,
    from: ParamValue,
    started_at: TimeMs,
}

impl AnimatableSlot {
    pub fn new(base: ParamValue) -> Self {
        Self { base, active: None }
    }

    /// Immediate write; cancels any running animation.
    pub fn set(&mut self, value: ParamValue) {
        self.base = value;
        self.active = None;
    }

    pub fn start(&mut self, anim: &KeyframeAnimation, now: TimeMs) -> HoverfxResult<()> {
        anim.validate()?;
        let from = self.value_at(now)?;
        if anim.keys[0].value.kind() != from.kind() {
            return Err(HoverfxError::animation(
                "animation value kind does not match the animated property",
            ));
        }
        self.active = Some(ActiveAnimation {
            anim: anim.clone(),
            from,
            started_at: now,
        });
        Ok(())
    }

    pub fn stop(&mut self, now: TimeMs) -> HoverfxResult<()> {
        self.base = self.value_at(now)?;
        self.active = None;
        Ok(())
    }

    pub fn value_at(&self, now: TimeMs) -> HoverfxResult<ParamValue> {
        match &self.active {
            None => Ok(self.base.clone()),
            Some(active) => active
                .anim
                .sample(&active.from, now.elapsed_since(active.started_at)),
        }
    }
}

/// Named parameter set read by expression bindings and mutated by pointer
/// handlers, behind a cheap clonable handle. Recreated per pointer-enter
/// session by the techniques that need one; expression bindings hold a
/// clone alongside the owning technique. The model is single-timeline, so
/// `Rc<RefCell<_>>` is sufficient.
#[derive(Clone, Debug, Default)]
pub struct ParamSetHandle {
    inner: Rc<RefCell<BTreeMap<String, AnimatableSlot>>>,
}

impl ParamSetHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Immediate write; creates the key if absent and cancels any running
    /// animation on it.
    pub fn set(&self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        let mut slots = self.inner.borrow_mut();
        match slots.get_mut(&key) {
            Some(slot) => slot.set(value),
            None => {
                slots.insert(key, AnimatableSlot::new(value));
            }
        }
    }

    pub fn animate(
        &self,
        key: &str,
        anim: &KeyframeAnimation,
        now: TimeMs,
    ) -> HoverfxResult<()> {
        let mut slots = self.inner.borrow_mut();
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| HoverfxError::effect(format!("unknown parameter '{key}'")))?;
        slot.start(anim, now)
    }

    pub fn stop(&self, key: &str, now: TimeMs) -> HoverfxResult<()> {
        let mut slots = self.inner.borrow_mut();
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| HoverfxError::effect(format!("unknown parameter '{key}'")))?;
        slot.stop(now)
    }

    pub fn get(&self, key: &str, now: TimeMs) -> HoverfxResult<ParamValue> {
        let slots = self.inner.borrow();
        let slot = slots
            .get(key)
            .ok_or_else(|| HoverfxError::effect(format!("unknown parameter '{key}'")))?;
        slot.value_at(now)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Repeat;

    fn ramp_to(v: f64, duration: u64) -> KeyframeAnimation {
        KeyframeAnimation::to_value(ParamValue::Scalar(v), TimeMs(duration))
    }

    #[test]
    fn slot_samples_running_animation() {
        let mut slot = AnimatableSlot::new(ParamValue::Scalar(1.0));
        slot.start(&ramp_to(0.0, 1000), TimeMs(100)).unwrap();
        assert_eq!(slot.value_at(TimeMs(600)).unwrap(), ParamValue::Scalar(0.5));
        assert_eq!(slot.value_at(TimeMs(1100)).unwrap(), ParamValue::Scalar(0.0));
    }

    #[test]
    fn start_supersedes_running_animation() {
        let mut slot = AnimatableSlot::new(ParamValue::Scalar(0.0));
        slot.start(&ramp_to(10.0, 1000), TimeMs(0)).unwrap();
        // Halfway through, start a new animation toward 2.0.
        slot.start(&ramp_to(2.0, 1000), TimeMs(500)).unwrap();
        // The superseding animation starts from the sampled value 5.0.
        assert_eq!(slot.value_at(TimeMs(500)).unwrap(), ParamValue::Scalar(5.0));
        assert_eq!(slot.value_at(TimeMs(1500)).unwrap(), ParamValue::Scalar(2.0));
        assert_eq!(slot.value_at(TimeMs(9000)).unwrap(), ParamValue::Scalar(2.0));
    }

    #[test]
    fn stop_freezes_current_value() {
        let mut slot = AnimatableSlot::new(ParamValue::Scalar(0.0));
        slot.start(&ramp_to(10.0, 1000), TimeMs(0)).unwrap();
        slot.stop(TimeMs(250)).unwrap();
        assert_eq!(slot.value_at(TimeMs(250)).unwrap(), ParamValue::Scalar(2.5));
        assert_eq!(slot.value_at(TimeMs(999)).unwrap(), ParamValue::Scalar(2.5));
    }

    #[test]
    fn set_cancels_running_animation() {
        let mut slot = AnimatableSlot::new(ParamValue::Scalar(0.0));
        slot.start(&ramp_to(10.0, 1000), TimeMs(0)).unwrap();
        slot.set(ParamValue::Scalar(7.0));
        assert_eq!(slot.value_at(TimeMs(400)).unwrap(), ParamValue::Scalar(7.0));
    }

    #[test]
    fn start_rejects_kind_mismatch() {
        let mut slot = AnimatableSlot::new(ParamValue::Vector2(Vec2::ZERO));
        assert!(slot.start(&ramp_to(1.0, 1000), TimeMs(0)).is_err());
    }

    #[test]
    fn handle_round_trips_values_and_errors_on_unknown_keys() {
        let params = ParamSetHandle::new();
        params.set("Scale", ParamValue::Scalar(1.25));
        params.set("Translate", ParamValue::Vector2(Vec2::new(0.1, -0.2)));

        assert_eq!(
            params.get("Scale", TimeMs(0)).unwrap(),
            ParamValue::Scalar(1.25)
        );
        assert!(params.get("Rotation", TimeMs(0)).is_err());
        assert!(params.stop("Rotation", TimeMs(0)).is_err());
    }

    #[test]
    fn forever_animation_on_parameter_keeps_running_until_stopped() {
        let params = ParamSetHandle::new();
        params.set("Scale", ParamValue::Scalar(1.0));
        let pulse = KeyframeAnimation {
            keys: vec![crate::anim::Keyframe {
                t: 1.0,
                value: ParamValue::Scalar(2.0),
                ease: crate::anim_ease::Ease::Linear,
            }],
            duration: TimeMs(1000),
            repeat: Repeat::Forever,
        };
        params.animate("Scale", &pulse, TimeMs(0)).unwrap();
        let early = params.get("Scale", TimeMs(300)).unwrap();
        let wrapped = params.get("Scale", TimeMs(2300)).unwrap();
        assert_eq!(early, wrapped);

        params.stop("Scale", TimeMs(2500)).unwrap();
        let frozen = params.get("Scale", TimeMs(2500)).unwrap();
        assert_eq!(params.get("Scale", TimeMs(9999)).unwrap(), frozen);
    }
}
