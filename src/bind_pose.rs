use crate::{
    cb_error::CbError,
    hierarchy::Hierarchy,
    scene::{Pose, SceneProvider},
    transform,
    types::Bone,
};
use ahash::{HashMap, HashMapExt};
use log::{debug, info, warn};
use nalgebra_glm as glm;

/// Local bind transform of one pose entry. The root decomposes its object
/// space matrix directly. Other entries are made relative to the object
/// space matrix of their parent in the same pose.
fn local_matrix(
    name: &str,
    parent_name: &str,
    matrix: &glm::DMat4,
    pose_matrices: &HashMap<&str, &glm::DMat4>,
) -> Result<glm::DMat4, CbError> {
    if parent_name.is_empty() {
        return Ok(*matrix);
    }
    let Some(parent) = pose_matrices.get(parent_name) else {
        return Err(CbError::ParentNotInPose {
            bone: name.to_string(),
            parent: parent_name.to_string(),
        });
    };
    let inverse = parent
        .try_inverse()
        .ok_or_else(|| CbError::SingularBindMatrix(parent_name.to_string()))?;
    Ok(inverse * matrix)
}

fn resolve_pose(
    pose: &Pose,
    hierarchy: &Hierarchy,
    vertex_distance: f64,
    bones: &mut Vec<Bone>,
) -> Result<(), CbError> {
    let mut pose_matrices = HashMap::with_capacity(pose.entries.len());
    for entry in &pose.entries {
        pose_matrices.entry(entry.name.as_str()).or_insert(&entry.matrix);
    }

    for (bone_index, entry) in pose.entries.iter().enumerate() {
        // Pose data has no parent links, so they come from the hierarchy
        let parent_name = if bone_index == 0 {
            String::new()
        } else {
            hierarchy.lookup(&entry.name)?.parent_name.clone()
        };

        let local = local_matrix(
            &entry.name,
            &parent_name,
            &entry.matrix,
            &pose_matrices,
        )?;
        // Shear is dropped here
        let t = transform::decompose(&local);
        debug!(
            "bone {:?} parent={:?} rotation={:?} translation={:?} scale={:?}",
            entry.name,
            parent_name,
            transform::quat_to_array(&t.rotation),
            transform::vec_to_array(&t.translation),
            transform::vec_to_array(&t.scale),
        );

        bones.push(Bone {
            name: entry.name.clone(),
            parent_name,
            vertex_distance,
            bind_rotation: t.rotation,
            bind_translation: t.translation,
            bind_scale: t.scale,
        });
    }
    Ok(())
}

/// Builds the bone list from every bind pose in the scene. Poses that are
/// not bind poses are skipped. The first entry of each bind pose is a root.
///
/// # Errors
/// Returns `CbError::BoneNotInHierarchy` if a pose names a node that is not
/// in the hierarchy, `CbError::ParentNotInPose` if a bone's parent has no
/// entry in the same pose, and `CbError::NoBones` if no bind pose has any
/// entries.
pub fn resolve<S: SceneProvider + ?Sized>(
    scene: &S,
    hierarchy: &Hierarchy,
    vertex_distance: f64,
) -> Result<Vec<Bone>, CbError> {
    let mut bones = Vec::new();
    let mut bind_poses = 0;
    for pose in scene.poses() {
        if !pose.is_bind_pose {
            debug!("pose {:?} is not a bind pose", pose.name);
            continue;
        }
        bind_poses += 1;
        resolve_pose(pose, hierarchy, vertex_distance, &mut bones)?;
    }
    if bind_poses > 1 {
        warn!("{} bind poses found, each one adds a root", bind_poses);
    }
    if bones.is_empty() {
        return Err(CbError::NoBones);
    }
    info!("Bones={}", bones.len());
    Ok(bones)
}
