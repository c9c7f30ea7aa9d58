pub mod acl;
pub mod cpp;

use crate::{
    cb_error::CbError,
    types::{Bone, NO_PARENT},
};
use ahash::{HashMap, HashMapExt};

/// One rendered text file. Nothing touches the disk until every unit of a
/// run has been rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputUnit {
    pub filename: String,
    pub contents: String,
}

/// Bone name to index map. The first bone wins if names repeat.
///
/// # Errors
/// Returns `CbError::TooManyBones` if an index would reach the root
/// sentinel
pub fn bone_map(bones: &[Bone]) -> Result<HashMap<&str, u16>, CbError> {
    if bones.len() >= usize::from(NO_PARENT) {
        return Err(CbError::TooManyBones(bones.len()));
    }
    let mut map = HashMap::with_capacity(bones.len());
    for (i, bone) in bones.iter().enumerate() {
        let index =
            u16::try_from(i).map_err(|_| CbError::TooManyBones(bones.len()))?;
        map.entry(bone.name.as_str()).or_insert(index);
    }
    Ok(map)
}

/// Parent index of every bone, `NO_PARENT` for roots
///
/// # Errors
/// Returns `CbError::ParentNotInBones` if a parent is not itself a bone
pub fn parent_indices(
    bones: &[Bone],
    map: &HashMap<&str, u16>,
) -> Result<Vec<u16>, CbError> {
    bones
        .iter()
        .map(|bone| {
            if bone.is_root() {
                return Ok(NO_PARENT);
            }
            map.get(bone.parent_name.as_str()).copied().ok_or_else(|| {
                CbError::ParentNotInBones {
                    bone: bone.name.clone(),
                    parent: bone.parent_name.clone(),
                }
            })
        })
        .collect()
}

/// Makes `name` usable inside a C identifier
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Escapes `s` for use inside a double quoted C string literal
#[must_use]
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\{:03o}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use nalgebra_glm as glm;

    pub fn bone(name: &str, parent: &str) -> Bone {
        Bone {
            name: name.to_string(),
            parent_name: parent.to_string(),
            vertex_distance: 0.1,
            bind_rotation: glm::quat(0.0, 0.0, 0.0, 1.0),
            bind_translation: glm::vec3(0.0, 0.0, 0.0),
            bind_scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn parents_before_children() {
        let bones = [
            bone("hips", ""),
            bone("spine", "hips"),
            bone("head", "spine"),
            bone("leg", "hips"),
        ];
        let map = bone_map(&bones).unwrap();
        let parents = parent_indices(&bones, &map).unwrap();
        assert_eq!(parents, [NO_PARENT, 0, 1, 0]);
        for (i, &p) in parents.iter().enumerate().skip(1) {
            assert!(usize::from(p) < i);
        }
    }

    #[test]
    fn parent_not_a_bone() {
        let bones = [bone("hips", ""), bone("spine", "RootNode")];
        let map = bone_map(&bones).unwrap();
        assert!(matches!(
            parent_indices(&bones, &map),
            Err(CbError::ParentNotInBones { ref parent, .. }) if parent == "RootNode"
        ));
    }

    #[test]
    fn too_many_bones() {
        let bones = vec![bone("b", ""); usize::from(NO_PARENT)];
        assert!(matches!(
            bone_map(&bones),
            Err(CbError::TooManyBones(0xFFFF))
        ));
    }

    #[test]
    fn identifiers() {
        assert_eq!(sanitize_identifier("run_01"), "run_01");
        assert_eq!(sanitize_identifier("Armature|Walk Cycle"), "Armature_Walk_Cycle");
        assert_eq!(sanitize_identifier("héllo"), "h_llo");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_string("x\u{1}"), "x\\001");
    }
}
