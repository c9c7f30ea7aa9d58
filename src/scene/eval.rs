use super::types::{Channel, Interpolation, Keyframe};
use nalgebra::{Unit, UnitQuaternion};
use nalgebra_glm as glm;

/// Values that can be read off an animation curve
pub trait Interpolate: Copy {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;

    /// Cubic Hermite spline between `p0` and `p1`. The tangents are already
    /// scaled by the key interval.
    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f64) -> Self;

    #[must_use]
    fn scale(&self, s: f64) -> Self;
}

/// Hermite basis functions for parameter `t`
fn hermite_basis(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    ]
}

impl Interpolate for glm::DVec3 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        glm::lerp(a, b, t)
    }

    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f64) -> Self {
        let [h00, h10, h01, h11] = hermite_basis(t);
        *p0 * h00 + *m0 * h10 + *p1 * h01 + *m1 * h11
    }

    fn scale(&self, s: f64) -> Self {
        *self * s
    }
}

impl Interpolate for glm::DQuat {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let ua = UnitQuaternion::new_normalize(*a);
        let ub = UnitQuaternion::new_normalize(*b);
        // Opposite rotations have no unique arc, so fall back to a
        // normalized lerp in that case
        ua.try_slerp(&ub, t, 1.0e-9).map_or_else(
            || glm::quat_normalize(&glm::quat_lerp(a, b, t)),
            Unit::into_inner,
        )
    }

    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f64) -> Self {
        let [h00, h10, h01, h11] = hermite_basis(t);
        let q = *p0 * h00 + *m0 * h10 + *p1 * h01 + *m1 * h11;
        glm::quat_normalize(&q)
    }

    fn scale(&self, s: f64) -> Self {
        *self * s
    }
}

/// Helper to calculate the parameter used for interpolation
fn weight(start: f64, end: f64, current: f64) -> f64 {
    const EPSILON: f64 = 0.0005;
    ((current - start) / (end - start).max(EPSILON)).clamp(0.0, 1.0)
}

/// Value between two neighbouring keys
fn between<T: Interpolate>(
    interpolation: Interpolation,
    frame: &Keyframe<T>,
    next: &Keyframe<T>,
    current_time: f64,
) -> T {
    let t = weight(frame.time, next.time, current_time);
    match (interpolation, &frame.tangents, &next.tangents) {
        (Interpolation::Step, _, _) => frame.value,
        (Interpolation::CubicSpline, Some((_, out_t)), Some((in_t, _))) => {
            let dt = next.time - frame.time;
            T::hermite(
                &frame.value,
                &out_t.scale(dt),
                &next.value,
                &in_t.scale(dt),
                t,
            )
        }
        // Cubic spline without tangents is treated as linear
        _ => T::lerp(&frame.value, &next.value, t),
    }
}

/// Evaluates a channel at an arbitrary timestamp. Before the first key the
/// first value holds and after the last key the last value holds. Returns
/// `None` for a channel with no keys.
#[must_use]
pub fn sample<T: Interpolate>(
    channel: &Channel<T>,
    current_time: f64,
) -> Option<T> {
    let first = channel.keys.first()?;
    if current_time <= first.time {
        return Some(first.value);
    }
    let mut frame = first;
    for f in &channel.keys {
        if f.time <= current_time {
            // This frame has a time at or before the current time, so make
            // it the new candidate frame. (Note that `frame` and `f` are
            // both references.)
            frame = f;
        } else {
            // This frame has a time after the desired time, so stop looping
            return Some(between(
                channel.interpolation,
                frame,
                f,
                current_time,
            ));
        }
    }
    // Fall through past the end of the channel so return data from the
    // candidate frame
    Some(frame.value)
}
