//! Bakes the skeletal animation of a scene into static C++ tables for the
//! Animation Compression Library.
//!
//! The pipeline runs in stages over a [`scene::SceneProvider`]:
//! [`hierarchy`] flattens the node graph, [`bind_pose`] builds the bone
//! list, [`sampler`] evaluates local transforms at a fixed rate and
//! [`eliminate`] drops channels that never leave their identity value.
//! [`emit`] then renders the text units and [`convert`] writes them.

pub mod bind_pose;
pub mod cb_error;
pub mod convert;
pub mod eliminate;
pub mod emit;
pub mod hierarchy;
pub mod options;
pub mod sampler;
pub mod scene;
pub mod transform;
pub mod types;
