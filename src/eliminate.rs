use crate::types::Track;
use log::debug;
use nalgebra_glm as glm;

/// Identity value of each channel and the tolerance used to compare samples
/// against it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Defaults {
    pub rotation: glm::DQuat,
    pub translation: glm::DVec3,
    pub scale: glm::DVec3,
    pub tolerance: f64,
}

/// Per component tolerance used when none is configured
pub const DEFAULT_TOLERANCE: f64 = 1.0e-6;

impl Default for Defaults {
    fn default() -> Self {
        Self::with_tolerance(DEFAULT_TOLERANCE)
    }
}

impl Defaults {
    #[must_use]
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            rotation: glm::quat(0.0, 0.0, 0.0, 1.0),
            translation: glm::vec3(0.0, 0.0, 0.0),
            scale: glm::vec3(1.0, 1.0, 1.0),
            tolerance,
        }
    }
}

/// Flat view of a channel value, `[x, y, z, w]` for quaternions
pub trait Components {
    #[must_use]
    fn components(&self) -> &[f64];
}

impl Components for glm::DQuat {
    fn components(&self) -> &[f64] {
        self.coords.as_slice()
    }
}

impl Components for glm::DVec3 {
    fn components(&self) -> &[f64] {
        self.as_slice()
    }
}

/// True if every component is within `tolerance` of the default. A NaN
/// component is never default. Quaternions are compared as stored, so `-q`
/// does not match `q`.
#[must_use]
pub fn is_key_default<T: Components>(key: &T, default: &T, tolerance: f64) -> bool {
    key.components()
        .iter()
        .zip(default.components())
        .all(|(a, b)| (a - b).abs() <= tolerance)
}

/// An empty sequence is default
#[must_use]
pub fn is_track_default<T: Components>(
    samples: &[T],
    default: &T,
    tolerance: f64,
) -> bool {
    samples
        .iter()
        .all(|key| is_key_default(key, default, tolerance))
}

/// Clears `samples` if it carries no information
pub fn eliminate<T: Components>(samples: &mut Vec<T>, default: &T, tolerance: f64) {
    if is_track_default(samples, default, tolerance) {
        samples.clear();
    }
}

/// Clears every channel of `track` that is constant and equal to its default
#[must_use]
pub fn eliminate_track(mut track: Track, defaults: &Defaults) -> Track {
    let tol = defaults.tolerance;
    eliminate(&mut track.rotations, &defaults.rotation, tol);
    eliminate(&mut track.translations, &defaults.translation, tol);
    eliminate(&mut track.scales, &defaults.scale, tol);
    debug!(
        "{:?} rotation={} translation={} scale={}",
        track.bone_name,
        track.has_rotation(),
        track.has_translation(),
        track.has_scale()
    );
    track
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_track(
        rotation: glm::DQuat,
        translation: glm::DVec3,
        scale: glm::DVec3,
        samples: usize,
    ) -> Track {
        Track {
            bone_name: "bone".to_string(),
            rotations: vec![rotation; samples],
            translations: vec![translation; samples],
            scales: vec![scale; samples],
        }
    }

    #[test]
    fn identity_is_eliminated() {
        let d = Defaults::default();
        let track = eliminate_track(
            constant_track(d.rotation, d.translation, d.scale, 31),
            &d,
        );
        assert!(track.is_empty());
        assert_eq!(track.bone_name, "bone");
    }

    #[test]
    fn single_deviation_is_kept() {
        let d = Defaults::default();
        let mut track = constant_track(d.rotation, d.translation, d.scale, 31);
        track.translations[17].y = 2.0e-6;
        let track = eliminate_track(track, &d);
        assert!(!track.has_rotation());
        assert!(track.has_translation());
        assert_eq!(track.translations.len(), 31);
        assert!(!track.has_scale());
    }

    #[test]
    fn within_tolerance() {
        let d = Defaults::default();
        let mut samples = vec![glm::vec3(0.5e-6, -1.0e-6, 0.0); 4];
        eliminate(&mut samples, &d.translation, d.tolerance);
        assert!(samples.is_empty());
    }

    #[test]
    fn empty_is_default() {
        let d = Defaults::default();
        let mut samples: Vec<glm::DVec3> = Vec::new();
        assert!(is_track_default(&samples, &d.scale, d.tolerance));
        eliminate(&mut samples, &d.scale, d.tolerance);
        assert!(samples.is_empty());
    }

    #[test]
    fn negated_identity_is_kept() {
        let d = Defaults::default();
        let q = glm::quat(0.0, 0.0, 0.0, -1.0);
        assert!(!is_key_default(&q, &d.rotation, d.tolerance));
    }

    #[test]
    fn nan_is_kept() {
        let d = Defaults::default();
        let v = glm::vec3(f64::NAN, 0.0, 0.0);
        assert!(!is_key_default(&v, &d.translation, d.tolerance));
    }

    #[test]
    fn constant_scale() {
        let d = Defaults::default();
        let track = eliminate_track(
            constant_track(d.rotation, d.translation, glm::vec3(2.0, 2.0, 2.0), 3),
            &d,
        );
        assert!(track.has_scale());
        assert!(!track.has_rotation());
        assert!(!track.has_translation());
    }

    #[test]
    fn idempotent() {
        let d = Defaults::default();
        let mut track = constant_track(d.rotation, d.translation, d.scale, 5);
        track.rotations[2] = glm::quat(0.0, 0.7071, 0.0, 0.7071);
        let once = eliminate_track(track, &d);
        let twice = eliminate_track(once.clone(), &d);
        assert_eq!(once, twice);
    }
}
