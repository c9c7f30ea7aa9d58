use crate::cb_error::CbError;
use nalgebra_glm as glm;

/// Default number of samples per second of clip
pub const DEFAULT_SAMPLE_RATE: u32 = 30;

/// Default error threshold handed to the compressor, in scene units
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.01;

/// Default virtual vertex distance for every bone
pub const DEFAULT_VERTEX_DISTANCE: f64 = 0.1;

/// Parent index written for a root bone
pub const NO_PARENT: u16 = 0xFFFF;

/// Durations this close to a whole frame count are snapped to it, so key
/// times stored as `f32` do not lose their last frame
pub const FRAME_SNAP: f64 = 1.0e-4;

/// Uniformly sampled clip
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub name: String,
    pub num_samples: usize,
    pub sample_rate: u32,
    pub error_threshold: f64,
    /// Seconds
    pub duration: f64,
}

impl Clip {
    /// Creates the clip and its sample count. A zero duration gives a single
    /// sample.
    ///
    /// # Errors
    /// Returns `CbError::DegenerateClip` for a negative or non-finite
    /// duration or a sample rate that is zero or above `u16::MAX`, and `CbError::TooManySamples` if the
    /// sample count does not fit in 16 bits.
    pub fn new(
        name: &str,
        duration: f64,
        sample_rate: u32,
        error_threshold: f64,
    ) -> Result<Self, CbError> {
        let num_samples = sample_count(duration, sample_rate)?;
        Ok(Self {
            name: name.to_string(),
            num_samples,
            sample_rate,
            error_threshold,
            duration,
        })
    }

    /// Time in seconds of sample `index`
    #[must_use]
    pub fn sample_time(&self, index: usize) -> f64 {
        // Sample counts fit in 16 bits so this is exact
        f64::from(u32::try_from(index).unwrap_or(u32::MAX))
            / f64::from(self.sample_rate)
    }
}

/// `floor(duration * sample_rate) + 1`, with `duration * sample_rate`
/// first snapped to the nearest integer when within `FRAME_SNAP` of it
///
/// # Errors
/// See `Clip::new`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_count(duration: f64, sample_rate: u32) -> Result<usize, CbError> {
    if !duration.is_finite()
        || duration < 0.0
        || sample_rate == 0
        || sample_rate > u32::from(u16::MAX)
    {
        return Err(CbError::DegenerateClip {
            duration,
            sample_rate,
        });
    }
    let exact = duration * f64::from(sample_rate);
    let nearest = exact.round();
    let frames = if (exact - nearest).abs() <= FRAME_SNAP {
        nearest
    } else {
        exact.floor()
    };
    if frames >= f64::from(u16::MAX) {
        return Err(CbError::TooManySamples(frames as usize + 1));
    }
    // In range [0, u16::MAX) here
    Ok(frames as usize + 1)
}

/// Bone with its bind (rest) pose relative to its parent
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Empty for a root bone
    pub parent_name: String,
    pub vertex_distance: f64,
    pub bind_rotation: glm::DQuat,
    pub bind_translation: glm::DVec3,
    pub bind_scale: glm::DVec3,
}

impl Bone {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_name.is_empty()
    }
}

/// Sampled local transforms of one bone. Each sequence is either empty,
/// meaning constant and equal to the default, or holds one value per clip
/// sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub bone_name: String,
    pub rotations: Vec<glm::DQuat>,
    pub translations: Vec<glm::DVec3>,
    pub scales: Vec<glm::DVec3>,
}

impl Track {
    #[must_use]
    pub fn has_rotation(&self) -> bool {
        !self.rotations.is_empty()
    }

    #[must_use]
    pub fn has_translation(&self) -> bool {
        !self.translations.is_empty()
    }

    #[must_use]
    pub fn has_scale(&self) -> bool {
        !self.scales.is_empty()
    }

    /// True when every channel was eliminated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.has_rotation() || self.has_translation() || self.has_scale())
    }
}
