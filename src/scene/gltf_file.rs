// Some code inspired by
// https://github.com/KhronosGroup/glTF-Tutorials/

use super::{
    graph::Scene,
    types::{
        Channel, ImportError, Interpolation, Keyframe, Pose, PoseEntry,
    },
};
use crate::{cb_error::CbError, transform::Transform};
use ahash::{HashMap, HashMapExt};
use gltf::{
    accessor::Iter, animation::util::ReadOutputs, buffer::Data, Document,
    Gltf, Node,
};
use log::{debug, error, info, trace, warn};
use nalgebra_glm as glm;
use std::{fs, io, path::Path};

fn load_impl(path: &Path) -> Result<(Document, Vec<Data>), CbError> {
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path).map_err(CbError::StdIoError)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)?;

    // Some info
    info!(
        "{:?}, base path={:?}, buffer count={}",
        path,
        base,
        buffers.len(),
    );

    Ok((gltf.document, buffers))
}

fn vec3(v: [f32; 3]) -> glm::DVec3 {
    glm::vec3(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]))
}

fn quat(q: [f32; 4]) -> glm::DQuat {
    glm::quat(
        f64::from(q[0]),
        f64::from(q[1]),
        f64::from(q[2]),
        f64::from(q[3]),
    )
}

/// Column major glTF matrix to double precision
fn mat4(m: [[f32; 4]; 4]) -> glm::DMat4 {
    glm::DMat4::from_fn(|row, col| f64::from(m[col][row]))
}

/// Recursive node tree traversal. Scene nodes are created in pre-order, so
/// scene indices follow the hierarchy order. `node_map` maps glTF node
/// indices to scene node indices.
fn traverse_tree(
    node: &Node,
    scene: &mut Scene,
    parent: usize,
    node_map: &mut HashMap<usize, usize>,
) {
    let name = node
        .name()
        .map_or_else(|| format!("node.{}", node.index()), ToString::to_string);
    let index = scene.add_node(parent, &name);
    node_map.insert(node.index(), index);

    let (t, r, s) = node.transform().decomposed();
    if let Some(scene_node) = scene.node_mut(index) {
        scene_node.rest = Transform::new(quat(r), vec3(t), vec3(s));
    }

    // Walk children of this node
    for child in node.children() {
        traverse_tree(&child, scene, index, node_map);
    }
}

/// Each skin becomes a bind pose. Entries are sorted into hierarchy order
/// so the first entry is the topmost joint.
fn load_poses(
    document: &Document,
    buffers: &[Data],
    scene: &mut Scene,
    node_map: &HashMap<usize, usize>,
) -> Result<(), CbError> {
    for skin in document.skins() {
        let reader = skin.reader(|x| Some(&buffers[x.index()]));
        let Some(iter) = reader.read_inverse_bind_matrices() else {
            error!("Missing inverse bind matrices");
            return Err(ImportError::NoInverseBind(skin.index()).into());
        };

        let mut joints = Vec::new();
        for (ibm, node) in iter.zip(skin.joints()) {
            let Some(&scene_index) = node_map.get(&node.index()) else {
                error!(
                    "skin {} has no node info for node index {}",
                    skin.index(),
                    node.index(),
                );
                return Err(ImportError::NoNodeInfo(node.index()).into());
            };
            let Some(bind) = mat4(ibm).try_inverse() else {
                error!("node {} inverse bind is singular", node.index());
                return Err(
                    ImportError::SingularInverseBind(node.index()).into()
                );
            };
            joints.push((scene_index, bind));
        }
        joints.sort_by_key(|(scene_index, _)| *scene_index);

        let entries = joints
            .into_iter()
            .filter_map(|(scene_index, matrix)| {
                scene.node(scene_index).map(|n| PoseEntry {
                    name: n.name.clone(),
                    matrix,
                })
            })
            .collect::<Vec<_>>();

        let name = skin.name().map_or_else(
            || format!("skin.{}", skin.index()),
            ToString::to_string,
        );
        info!("Bind pose {} joints={}", name, entries.len());
        scene.add_pose(Pose {
            name,
            is_bind_pose: true,
            entries,
        });
    }
    Ok(())
}

/// Splits cubic spline output into in-tangent, value, out-tangent triples
fn make_keys<T: Copy>(
    interpolation: Interpolation,
    times: &[f64],
    values: &[T],
) -> Result<Vec<Keyframe<T>>, ImportError> {
    if interpolation == Interpolation::CubicSpline {
        if values.len() != times.len() * 3 {
            return Err(ImportError::CountMismatch);
        }
        Ok(times
            .iter()
            .zip(values.chunks_exact(3))
            .map(|(&time, v)| Keyframe {
                time,
                value: v[1],
                tangents: Some((v[0], v[2])),
            })
            .collect())
    } else {
        if values.len() != times.len() {
            return Err(ImportError::CountMismatch);
        }
        Ok(times
            .iter()
            .zip(values)
            .map(|(&time, &value)| Keyframe::new(time, value))
            .collect())
    }
}

fn load_animation(
    document: &Document,
    buffers: &[Data],
    scene: &mut Scene,
    node_map: &HashMap<usize, usize>,
) -> Result<(), CbError> {
    let mut animations = document.animations();
    let Some(animation) = animations.next() else {
        info!("No animations");
        return Ok(());
    };
    for extra in animations {
        warn!(
            "animation {} {:?} ignored, only one clip is converted",
            extra.index(),
            extra.name()
        );
    }
    debug!("animation name={:?}", animation.name());

    for channel in animation.channels() {
        let node = channel.target().node();
        let Some(&scene_index) = node_map.get(&node.index()) else {
            warn!("animation targets node {} not in scene", node.index());
            continue;
        };
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => {
                Interpolation::CubicSpline
            }
        };
        let reader = channel.reader(|x| Some(&buffers[x.index()]));
        let times: Vec<f64> = if let Some(inputs) = reader.read_inputs() {
            match inputs {
                Iter::Standard(times) => times.map(f64::from).collect(),
                Iter::Sparse(_) => {
                    error!("Unsupported sparse animation format");
                    return Err(ImportError::SparseAnimation.into());
                }
            }
        } else {
            error!("Animation does not contain a sampler");
            return Err(ImportError::NoSampler.into());
        };

        let Some(outputs) = reader.read_outputs() else {
            error!("Animation does not contain a sampler output");
            return Err(ImportError::NoSampler.into());
        };
        let Some(scene_node) = scene.node_mut(scene_index) else {
            return Err(ImportError::NoNodeInfo(node.index()).into());
        };
        match outputs {
            ReadOutputs::Rotations(x) => {
                let values: Vec<glm::DQuat> = x.into_f32().map(quat).collect();
                scene_node.rotation = Some(Channel {
                    interpolation,
                    keys: make_keys(interpolation, &times, &values)?,
                });
            }
            ReadOutputs::Translations(x) => {
                let values: Vec<glm::DVec3> = x.map(vec3).collect();
                scene_node.translation = Some(Channel {
                    interpolation,
                    keys: make_keys(interpolation, &times, &values)?,
                });
            }
            ReadOutputs::Scales(x) => {
                let values: Vec<glm::DVec3> = x.map(vec3).collect();
                scene_node.scale = Some(Channel {
                    interpolation,
                    keys: make_keys(interpolation, &times, &values)?,
                });
            }
            ReadOutputs::MorphTargetWeights(_) => {
                // Not part of a skeleton
                warn!("node {} morph target weights ignored", node.index());
            }
        }
        trace!("node {} channel keys={}", node.index(), times.len());
    }

    let name = animation.name().map_or_else(
        || format!("animation.{}", animation.index()),
        ToString::to_string,
    );
    scene.set_animation(&name);
    Ok(())
}

/// Loads the node tree, skins and the first animation from a glTF file.
/// The top level nodes of the default scene (or the first scene) become
/// children of the implicit root node.
///
/// # Errors
/// May return `CbError`
pub fn load(path: &Path) -> Result<Scene, CbError> {
    let (document, buffers) = load_impl(path)?;

    let mut scene = Scene::new();
    let mut node_map = HashMap::<usize, usize>::new();
    if let Some(gltf_scene) =
        document.default_scene().or_else(|| document.scenes().next())
    {
        for node in gltf_scene.nodes() {
            traverse_tree(&node, &mut scene, 0, &mut node_map);
        }
    } else {
        warn!("{:?} has no scene", path);
    }
    info!("Nodes={}", scene.node_count());

    load_poses(&document, &buffers, &mut scene, &node_map)?;
    load_animation(&document, &buffers, &mut scene, &node_map)?;
    Ok(scene)
}
