use crate::{
    anim_ease::Ease,
    core::TimeMs,
    error::{HoverfxError, HoverfxResult},
    params::ParamValue,
};

/// Timed parameter animation over normalized key times.
///
/// Keys live in (0, 1] of `duration`; the starting keyframe at t = 0 is
/// implicit and takes the animated property's value at start time. Each
/// key's ease shapes the interpolation arriving at that key.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeAnimation {
    pub keys: Vec<Keyframe>,
    pub duration: TimeMs,
    pub repeat: Repeat,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Normalized time in (0, 1].
    pub t: f64,
    pub value: ParamValue,
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Repeat {
    Count(u32),
    Forever,
}

impl KeyframeAnimation {
    /// One linear key at t = 1: animate from the current value to `value`.
    pub fn to_value(value: ParamValue, duration: TimeMs) -> Self {
        Self {
            keys: vec![Keyframe {
                t: 1.0,
                value,
                ease: Ease::Linear,
            }],
            duration,
            repeat: Repeat::Count(1),
        }
    }

    pub fn validate(&self) -> HoverfxResult<()> {
        if self.keys.is_empty() {
            return Err(HoverfxError::animation(
                "keyframe animation must have at least one key",
            ));
        }
        if self.duration.0 == 0 {
            return Err(HoverfxError::animation("animation duration must be > 0"));
        }
        if let Repeat::Count(0) = self.repeat {
            return Err(HoverfxError::animation("repeat count must be > 0"));
        }

        let mut prev = 0.0f64;
        for key in &self.keys {
            if !key.t.is_finite() || key.t <= 0.0 || key.t > 1.0 {
                return Err(HoverfxError::animation(
                    "keyframe times must lie in (0, 1]",
                ));
            }
            if key.t <= prev {
                return Err(HoverfxError::animation(
                    "keyframe times must be strictly increasing",
                ));
            }
            prev = key.t;
        }

        let kind = self.keys[0].value.kind();
        if !self.keys.iter().all(|k| k.value.kind() == kind) {
            return Err(HoverfxError::animation(
                "keyframe values must all be of the same kind",
            ));
        }
        if !kind.is_interpolable() {
            return Err(HoverfxError::animation(
                "matrix values cannot be keyframe-animated",
            ));
        }
        Ok(())
    }

    /// True once a `Count` animation has played out all its iterations.
    /// `Forever` animations never finish on their own.
    pub fn is_finished(&self, elapsed_ms: u64) -> bool {
        match self.repeat {
            Repeat::Forever => false,
            Repeat::Count(n) => elapsed_ms >= self.duration.0.saturating_mul(u64::from(n)),
        }
    }

    /// Samples the animation `elapsed_ms` after its start; `from` is the
    /// implicit t = 0 value. A finished animation holds its final key.
    pub fn sample(&self, from: &ParamValue, elapsed_ms: u64) -> HoverfxResult<ParamValue> {
        let Some(last) = self.keys.last() else {
            return Err(HoverfxError::animation("keyframe animation has no keys"));
        };
        if self.duration.0 == 0 {
            return Err(HoverfxError::animation("animation duration must be > 0"));
        }
        if self.is_finished(elapsed_ms) {
            return Ok(last.value.clone());
        }

        let u = ((elapsed_ms % self.duration.0) as f64) / (self.duration.0 as f64);
        if u >= last.t {
            return Ok(last.value.clone());
        }

        let idx = self.keys.partition_point(|k| k.t <= u);
        let (t0, v0) = if idx == 0 {
            (0.0, from)
        } else {
            let prev = &self.keys[idx - 1];
            (prev.t, &prev.value)
        };
        let next = &self.keys[idx];

        let span = next.t - t0;
        if span <= 0.0 {
            return Ok(next.value.clone());
        }
        let local = (u - t0) / span;
        ParamValue::lerp(v0, &next.value, next.ease.apply(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_keys(pairs: &[(f64, f64)]) -> Vec<Keyframe> {
        pairs
            .iter()
            .map(|&(t, v)| Keyframe {
                t,
                value: ParamValue::Scalar(v),
                ease: Ease::Linear,
            })
            .collect()
    }

    #[test]
    fn validate_rejects_bad_key_times() {
        let mut anim = KeyframeAnimation {
            keys: scalar_keys(&[(0.5, 1.0), (0.5, 2.0)]),
            duration: TimeMs(1000),
            repeat: Repeat::Count(1),
        };
        assert!(anim.validate().is_err());

        anim.keys = scalar_keys(&[(0.0, 1.0)]);
        assert!(anim.validate().is_err());

        anim.keys = scalar_keys(&[(0.4, 1.0), (1.1, 2.0)]);
        assert!(anim.validate().is_err());

        anim.keys = scalar_keys(&[(0.4, 1.0), (1.0, 2.0)]);
        assert!(anim.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_and_zero_duration() {
        let anim = KeyframeAnimation {
            keys: vec![],
            duration: TimeMs(1000),
            repeat: Repeat::Count(1),
        };
        assert!(anim.validate().is_err());

        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(1.0, 2.0)]),
            duration: TimeMs(0),
            repeat: Repeat::Count(1),
        };
        assert!(anim.validate().is_err());

        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(1.0, 2.0)]),
            duration: TimeMs(1000),
            repeat: Repeat::Count(0),
        };
        assert!(anim.validate().is_err());
    }

    #[test]
    fn sample_interpolates_from_implicit_start() {
        let anim = KeyframeAnimation::to_value(ParamValue::Scalar(0.0), TimeMs(1000));
        let from = ParamValue::Scalar(1.0);
        assert_eq!(anim.sample(&from, 0).unwrap(), ParamValue::Scalar(1.0));
        assert_eq!(anim.sample(&from, 500).unwrap(), ParamValue::Scalar(0.5));
        assert_eq!(anim.sample(&from, 1000).unwrap(), ParamValue::Scalar(0.0));
        assert_eq!(anim.sample(&from, 5000).unwrap(), ParamValue::Scalar(0.0));
    }

    #[test]
    fn sample_holds_value_past_last_key_within_iteration() {
        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(0.5, 4.0)]),
            duration: TimeMs(1000),
            repeat: Repeat::Count(1),
        };
        let from = ParamValue::Scalar(0.0);
        assert_eq!(anim.sample(&from, 750).unwrap(), ParamValue::Scalar(4.0));
    }

    #[test]
    fn forever_wraps_modulo_duration() {
        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(0.5, 2.0), (1.0, 0.0)]),
            duration: TimeMs(1000),
            repeat: Repeat::Forever,
        };
        let from = ParamValue::Scalar(0.0);
        assert!(!anim.is_finished(1_000_000));
        assert_eq!(anim.sample(&from, 250).unwrap(), anim.sample(&from, 1250).unwrap());
    }

    #[test]
    fn count_finishes_at_total_duration() {
        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(1.0, 3.0)]),
            duration: TimeMs(400),
            repeat: Repeat::Count(2),
        };
        assert!(!anim.is_finished(799));
        assert!(anim.is_finished(800));
        let from = ParamValue::Scalar(0.0);
        assert_eq!(anim.sample(&from, 800).unwrap(), ParamValue::Scalar(3.0));
    }

    #[test]
    fn descriptor_json_roundtrip() {
        let anim = KeyframeAnimation {
            keys: scalar_keys(&[(0.1, -0.2), (0.4, -2.6), (0.8, -6.6), (1.0, -6.0)]),
            duration: TimeMs(4500),
            repeat: Repeat::Count(1),
        };
        let s = serde_json::to_string(&anim).unwrap();
        let de: KeyframeAnimation = serde_json::from_str(&s).unwrap();
        assert_eq!(de, anim);
    }
}
