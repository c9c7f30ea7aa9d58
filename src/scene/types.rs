use crate::transform::Transform;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

/// A single key of an animation curve. `tangents` holds the in and out
/// tangents (per second) for cubic spline curves and is `None` otherwise.
#[derive(Clone, Debug)]
pub struct Keyframe<T> {
    pub time: f64,
    pub value: T,
    pub tangents: Option<(T, T)>,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f64, value: T) -> Self {
        Self {
            time,
            value,
            tangents: None,
        }
    }
}

/// Keyframes for one property of one node, sorted by time
#[derive(Clone, Debug)]
pub struct Channel<T> {
    pub interpolation: Interpolation,
    pub keys: Vec<Keyframe<T>>,
}

impl<T> Channel<T> {
    #[must_use]
    pub fn max_time(&self) -> f64 {
        self.keys.last().map_or(0.0, |k| k.time)
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    pub children: SmallVec<[usize; 4]>,
    /// Local transform used for any property without a channel
    pub rest: Transform,
    pub rotation: Option<Channel<glm::DQuat>>,
    pub translation: Option<Channel<glm::DVec3>>,
    pub scale: Option<Channel<glm::DVec3>>,
}

impl SceneNode {
    #[must_use]
    pub fn new(name: &str, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: SmallVec::new(),
            rest: Transform::default(),
            rotation: None,
            translation: None,
            scale: None,
        }
    }

    /// Largest keyframe time of any channel on this node
    #[must_use]
    pub fn max_time(&self) -> f64 {
        let r = self.rotation.as_ref().map_or(0.0, Channel::max_time);
        let t = self.translation.as_ref().map_or(0.0, Channel::max_time);
        let s = self.scale.as_ref().map_or(0.0, Channel::max_time);
        r.max(t).max(s)
    }
}

/// Named transform of a pose. `matrix` is in object (model) space.
#[derive(Clone, Debug)]
pub struct PoseEntry {
    pub name: String,
    pub matrix: glm::DMat4,
}

#[derive(Clone, Debug)]
pub struct Pose {
    pub name: String,
    pub is_bind_pose: bool,
    pub entries: Vec<PoseEntry>,
}

/// The single animation clip of a scene
#[derive(Clone, Debug, PartialEq)]
pub struct AnimStack {
    pub name: String,
    /// Seconds
    pub duration: f64,
}

/// Errors specific to reading scene files. `CbError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoInverseBind(usize),
    SingularInverseBind(usize),
    SparseAnimation,
    NoSampler,
    CountMismatch,
    ComponentCount { expected: usize, found: usize },
    NoNodeInfo(usize),
    UnknownChild(String),
    MultipleParents(String),
    NoPoseTransform(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoInverseBind(a) => {
                write!(f, "skin {a} has no inverse bind matrices")
            }
            Self::SingularInverseBind(a) => {
                write!(f, "inverse bind matrix of node {a} is singular")
            }
            Self::SparseAnimation => {
                write!(f, "sparse animation data is not supported")
            }
            Self::NoSampler => {
                write!(f, "a sampler is required for animation")
            }
            Self::CountMismatch => {
                write!(f, "keyframe times and values have different counts")
            }
            Self::ComponentCount { expected, found } => {
                write!(f, "expected {expected} components, found {found}")
            }
            Self::NoNodeInfo(a) => write!(f, "node {a} has missing info"),
            Self::UnknownChild(a) => write!(f, "child {a:?} is not a node"),
            Self::MultipleParents(a) => {
                write!(f, "node {a:?} has more than one parent")
            }
            Self::NoPoseTransform(a) => {
                write!(f, "pose entry {a:?} has no transform")
            }
        }
    }
}
