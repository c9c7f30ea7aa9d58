//! Plain text scene description. Handy for hand-authored rigs and tests.
//!
//! ```yaml
//! animation: wave
//! nodes:
//!   - name: hips
//!     children: [spine]
//!   - name: spine
//!     translation: [0.0, 1.0, 0.0]
//!     channels:
//!       rotation:
//!         interpolation: linear
//!         times: [0.0, 1.0]
//!         values: [[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.7071, 0.7071]]
//! poses:
//!   - name: bind
//!     entries:
//!       - { name: hips }
//!       - { name: spine, translation: [0.0, 1.0, 0.0] }
//! ```
//!
//! Nodes that are nobody's child hang off the implicit root in the order
//! they are listed. Pose entries are object space and take either a column
//! major `matrix` or any of `rotation`, `translation` and `scale`.

use super::{
    graph::Scene,
    types::{
        Channel, ImportError, Interpolation, Keyframe, Pose, PoseEntry,
    },
};
use crate::{
    cb_error::CbError,
    transform::{self, Transform},
};
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use log::{info, warn};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct SceneDesc {
    pub animation: Option<String>,
    pub nodes: Vec<NodeDesc>,
    pub poses: Vec<PoseDesc>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct NodeDesc {
    pub name: String,
    pub children: Vec<String>,
    pub rotation: Option<[f64; 4]>,
    pub translation: Option<[f64; 3]>,
    pub scale: Option<[f64; 3]>,
    pub channels: ChannelsDesc,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ChannelsDesc {
    pub rotation: Option<ChannelDesc>,
    pub translation: Option<ChannelDesc>,
    pub scale: Option<ChannelDesc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChannelDesc {
    pub interpolation: Interpolation,
    pub times: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    #[serde(default)]
    pub in_tangents: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub out_tangents: Option<Vec<Vec<f64>>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PoseDesc {
    pub name: String,
    #[serde(default = "default_bind_pose")]
    pub bind_pose: bool,
    pub entries: Vec<PoseEntryDesc>,
}

const fn default_bind_pose() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct PoseEntryDesc {
    pub name: String,
    pub matrix: Option<Vec<f64>>,
    pub rotation: Option<[f64; 4]>,
    pub translation: Option<[f64; 3]>,
    pub scale: Option<[f64; 3]>,
}

fn components<const N: usize>(v: &[f64]) -> Result<[f64; N], ImportError> {
    <[f64; N]>::try_from(v).map_err(|_| ImportError::ComponentCount {
        expected: N,
        found: v.len(),
    })
}

fn to_quat(q: [f64; 4]) -> glm::DQuat {
    glm::quat(q[0], q[1], q[2], q[3])
}

fn to_vec3(v: [f64; 3]) -> glm::DVec3 {
    glm::vec3(v[0], v[1], v[2])
}

fn read_quat(v: &[f64]) -> Result<glm::DQuat, ImportError> {
    components::<4>(v).map(to_quat)
}

fn read_vec3(v: &[f64]) -> Result<glm::DVec3, ImportError> {
    components::<3>(v).map(to_vec3)
}

fn make_channel<T: Copy>(
    desc: &ChannelDesc,
    read: fn(&[f64]) -> Result<T, ImportError>,
) -> Result<Channel<T>, ImportError> {
    let count = desc.times.len();
    if desc.values.len() != count {
        return Err(ImportError::CountMismatch);
    }
    let tangents = match (&desc.in_tangents, &desc.out_tangents) {
        (Some(i), Some(o)) => {
            if i.len() != count || o.len() != count {
                return Err(ImportError::CountMismatch);
            }
            Some((i, o))
        }
        _ => None,
    };

    let mut keys = Vec::with_capacity(count);
    for (k, (&time, value)) in desc.times.iter().zip(&desc.values).enumerate()
    {
        let tangents = match tangents {
            Some((i, o)) => Some((read(&i[k])?, read(&o[k])?)),
            None => None,
        };
        keys.push(Keyframe {
            time,
            value: read(value)?,
            tangents,
        });
    }
    Ok(Channel {
        interpolation: desc.interpolation,
        keys,
    })
}

fn pose_matrix(entry: &PoseEntryDesc) -> Result<glm::DMat4, ImportError> {
    if let Some(m) = &entry.matrix {
        if m.len() != 16 {
            return Err(ImportError::NoPoseTransform(entry.name.clone()));
        }
        return Ok(glm::DMat4::from_column_slice(m));
    }
    let mut t = Transform::default();
    if let Some(r) = entry.rotation {
        t.rotation = to_quat(r);
    }
    if let Some(v) = entry.translation {
        t.translation = to_vec3(v);
    }
    if let Some(s) = entry.scale {
        t.scale = to_vec3(s);
    }
    Ok(transform::compose(&t))
}

fn add_subtree(
    desc: &SceneDesc,
    by_name: &HashMap<&str, usize>,
    desc_index: usize,
    parent: usize,
    scene: &mut Scene,
) -> Result<(), ImportError> {
    let node_desc = &desc.nodes[desc_index];
    let index = scene.add_node(parent, &node_desc.name);
    let Some(node) = scene.node_mut(index) else {
        return Err(ImportError::NoNodeInfo(index));
    };
    if let Some(r) = node_desc.rotation {
        node.rest.rotation = to_quat(r);
    }
    if let Some(t) = node_desc.translation {
        node.rest.translation = to_vec3(t);
    }
    if let Some(s) = node_desc.scale {
        node.rest.scale = to_vec3(s);
    }
    let channels = &node_desc.channels;
    if let Some(c) = &channels.rotation {
        node.rotation = Some(make_channel(c, read_quat)?);
    }
    if let Some(c) = &channels.translation {
        node.translation = Some(make_channel(c, read_vec3)?);
    }
    if let Some(c) = &channels.scale {
        node.scale = Some(make_channel(c, read_vec3)?);
    }

    for child in &node_desc.children {
        let Some(&child_index) = by_name.get(child.as_str()) else {
            return Err(ImportError::UnknownChild(child.clone()));
        };
        add_subtree(desc, by_name, child_index, index, scene)?;
    }
    Ok(())
}

/// Builds a scene from a description
///
/// # Errors
/// May return `ImportError`
pub fn build(desc: &SceneDesc) -> Result<Scene, ImportError> {
    let mut by_name = HashMap::<&str, usize>::new();
    for (i, n) in desc.nodes.iter().enumerate() {
        by_name.entry(n.name.as_str()).or_insert(i);
    }

    let mut is_child = HashSet::<&str>::new();
    for n in &desc.nodes {
        for child in &n.children {
            if !is_child.insert(child.as_str()) {
                return Err(ImportError::MultipleParents(child.clone()));
            }
        }
    }

    let mut scene = Scene::new();
    for (i, n) in desc.nodes.iter().enumerate() {
        if !is_child.contains(n.name.as_str()) {
            add_subtree(desc, &by_name, i, 0, &mut scene)?;
        }
    }
    let reached = scene.node_count() - 1;
    if reached < desc.nodes.len() {
        warn!(
            "{} nodes are not reachable from a top level node",
            desc.nodes.len() - reached
        );
    }

    for pose in &desc.poses {
        let entries = pose
            .entries
            .iter()
            .map(|e| -> Result<PoseEntry, ImportError> {
                Ok(PoseEntry {
                    name: e.name.clone(),
                    matrix: pose_matrix(e)?,
                })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;
        scene.add_pose(Pose {
            name: pose.name.clone(),
            is_bind_pose: pose.bind_pose,
            entries,
        });
    }

    if let Some(name) = &desc.animation {
        scene.set_animation(name);
    }
    Ok(scene)
}

/// Loads a YAML scene description
///
/// # Errors
/// May return `CbError`
pub fn load(path: &Path) -> Result<Scene, CbError> {
    let file = fs::File::open(path).map_err(CbError::StdIoError)?;
    let reader = io::BufReader::new(file);
    let desc: SceneDesc = serde_yaml::from_reader(reader)?;
    info!(
        "{:?}, nodes={}, poses={}",
        path,
        desc.nodes.len(),
        desc.poses.len()
    );
    Ok(build(&desc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneProvider;

    const RIG: &str = "
animation: wave
nodes:
  - name: hips
    children: [spine]
  - name: spine
    translation: [0.0, 1.0, 0.0]
    channels:
      translation:
        interpolation: linear
        times: [0.0, 2.0]
        values: [[0.0, 1.0, 0.0], [0.0, 3.0, 0.0]]
poses:
  - name: bind
    entries:
      - { name: hips }
      - { name: spine, translation: [0.0, 1.0, 0.0] }
";

    #[test]
    fn parse_rig() {
        let desc: SceneDesc = serde_yaml::from_str(RIG).unwrap();
        let scene = build(&desc).unwrap();
        assert_eq!(scene.node_count(), 3);
        assert_eq!(scene.node_name(1), "hips");
        assert_eq!(scene.children(1), &[2]);
        assert_eq!(scene.poses().len(), 1);
        assert!(scene.poses()[0].is_bind_pose);
        let stack = scene.anim_stack().unwrap();
        assert_eq!(stack.name, "wave");
        assert!((stack.duration - 2.0).abs() < 1.0e-12);
        let t = scene.local_transform(2, 1.0);
        assert!((t.translation.y - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn unknown_child() {
        let desc: SceneDesc =
            serde_yaml::from_str("nodes:\n  - { name: a, children: [b] }\n")
                .unwrap();
        assert!(matches!(
            build(&desc),
            Err(ImportError::UnknownChild(ref c)) if c == "b"
        ));
    }

    #[test]
    fn two_parents() {
        let desc: SceneDesc = serde_yaml::from_str(
            "nodes:\n  - { name: a, children: [c] }\n  - { name: b, children: [c] }\n  - { name: c }\n",
        )
        .unwrap();
        assert!(matches!(
            build(&desc),
            Err(ImportError::MultipleParents(_))
        ));
    }

    #[test]
    fn count_mismatch() {
        let desc: SceneDesc = serde_yaml::from_str(
            "nodes:\n  - name: a\n    channels:\n      scale:\n        interpolation: step\n        times: [0.0, 1.0]\n        values: [[1.0, 1.0, 1.0]]\n",
        )
        .unwrap();
        assert!(matches!(build(&desc), Err(ImportError::CountMismatch)));
    }

    #[test]
    fn wrong_component_count() {
        let desc: SceneDesc = serde_yaml::from_str(
            "nodes:\n  - name: a\n    channels:\n      scale:\n        interpolation: step\n        times: [0.0]\n        values: [[1.0, 1.0]]\n",
        )
        .unwrap();
        assert!(matches!(
            build(&desc),
            Err(ImportError::ComponentCount {
                expected: 3,
                found: 2
            })
        ));
    }
}
