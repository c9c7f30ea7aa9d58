pub mod eval;
pub mod gltf_file;
mod graph;
mod types;
pub mod yaml_file;

// Re-exports
pub use {
    graph::{Scene, SceneProvider, ROOT_NODE_NAME},
    types::{
        AnimStack, Channel, ImportError, Interpolation, Keyframe, Pose,
        PoseEntry, SceneNode,
    },
};
