use std::{error, fmt, path::PathBuf};

/// Broad error category. Decides the process exit code of the command line
/// tool.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad command line input. No scene was touched.
    Usage,
    /// The input scene could not be opened or parsed.
    Load,
    /// The scene loaded but could not be converted or written.
    Conversion,
}

impl ErrorKind {
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Usage => 1,
            Self::Load => 2,
            Self::Conversion => 3,
        }
    }
}

/// Unified error type
///
/// Every error is fatal to the conversion in progress. Nothing is written
/// unless all output units were rendered successfully.
#[derive(Debug)]
pub enum CbError {
    MissingInput,
    InputNotFound(PathBuf),
    UnknownOption(String),
    InvalidAclFilename(PathBuf),
    InvalidConfig(String),
    UnsupportedFormat(PathBuf),
    BoneNotInHierarchy(String),
    ParentNotInPose { bone: String, parent: String },
    ParentNotInBones { bone: String, parent: String },
    SingularBindMatrix(String),
    NoBones,
    NoAnimation,
    DegenerateClip { duration: f64, sample_rate: u32 },
    TooManyBones(usize),
    TooManySamples(usize),
    TrackWithoutBone(String),
    FormatError,
    OutputError(PathBuf, std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
    StdIoError(std::io::Error),
    GltfError(Box<gltf::Error>),
    ImportError(crate::scene::ImportError),
}

impl CbError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput
            | Self::InputNotFound(_)
            | Self::UnknownOption(_)
            | Self::InvalidAclFilename(_)
            | Self::InvalidConfig(_) => ErrorKind::Usage,
            Self::UnsupportedFormat(_)
            | Self::SerdeYamlError(_)
            | Self::StdIoError(_)
            | Self::GltfError(_)
            | Self::ImportError(_) => ErrorKind::Load,
            Self::BoneNotInHierarchy(_)
            | Self::ParentNotInPose { .. }
            | Self::ParentNotInBones { .. }
            | Self::SingularBindMatrix(_)
            | Self::NoBones
            | Self::NoAnimation
            | Self::DegenerateClip { .. }
            | Self::TooManyBones(_)
            | Self::TooManySamples(_)
            | Self::TrackWithoutBone(_)
            | Self::FormatError
            | Self::OutputError(..) => ErrorKind::Conversion,
        }
    }
}

impl error::Error for CbError {}

impl fmt::Display for CbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingInput => write!(f, "an input scene is required"),
            Self::InputNotFound(p) => {
                write!(f, "input not found: {}", p.display())
            }
            Self::UnknownOption(a) => write!(f, "unrecognized option {a}"),
            Self::InvalidAclFilename(p) => write!(
                f,
                "invalid ACL filename {}, it should be of the form *.acl.js",
                p.display()
            ),
            Self::InvalidConfig(e) => write!(f, "invalid config: {e}"),
            Self::UnsupportedFormat(p) => {
                write!(f, "no scene reader for {}", p.display())
            }
            Self::BoneNotInHierarchy(a) => {
                write!(f, "bone {a:?} not found in hierarchy")
            }
            Self::ParentNotInPose { bone, parent } => write!(
                f,
                "bone {bone:?} has parent {parent:?} which is not in the bind pose"
            ),
            Self::ParentNotInBones { bone, parent } => write!(
                f,
                "bone {bone:?} has parent {parent:?} which is not a bone"
            ),
            Self::SingularBindMatrix(a) => {
                write!(f, "bind matrix of {a:?} can not be inverted")
            }
            Self::NoBones => write!(f, "scene has no bind pose bones"),
            Self::NoAnimation => write!(f, "scene has no animation"),
            Self::DegenerateClip {
                duration,
                sample_rate,
            } => write!(
                f,
                "degenerate clip: duration={duration} sample_rate={sample_rate}"
            ),
            Self::TooManyBones(n) => {
                write!(f, "bone count {n} does not fit in 16 bits")
            }
            Self::TooManySamples(n) => {
                write!(f, "sample count {n} does not fit in 16 bits")
            }
            Self::TrackWithoutBone(a) => {
                write!(f, "track {a:?} does not belong to any bone")
            }
            Self::FormatError => write!(f, "text formatting failed"),
            Self::OutputError(p, e) => {
                write!(f, "could not write {}: {e}", p.display())
            }
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::GltfError(e) => {
                write!(f, "gltf Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<serde_yaml::Error> for CbError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for CbError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<gltf::Error> for CbError {
    fn from(e: gltf::Error) -> Self {
        Self::GltfError(Box::new(e))
    }
}

impl From<fmt::Error> for CbError {
    fn from(_: fmt::Error) -> Self {
        Self::FormatError
    }
}

impl From<crate::scene::ImportError> for CbError {
    fn from(e: crate::scene::ImportError) -> Self {
        Self::ImportError(e)
    }
}
