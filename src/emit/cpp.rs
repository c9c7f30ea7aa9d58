//! C++ source emission. Each clip becomes four files inside namespace
//! `clip_<name>`: a header, the bone table, and one file each for the
//! rotation and translation tracks. The tables initialize statically so the
//! clip can be linked straight into a test harness for the compressor.
//!
//! Scale tracks have no table and are dropped with a warning.

use super::{bone_map, escape_string, parent_indices, sanitize_identifier, OutputUnit};
use crate::{
    cb_error::CbError,
    transform::{quat_to_array, vec_to_array},
    types::{Bone, Clip, Track, NO_PARENT},
};
use ahash::HashMap;
use itertools::Itertools;
use log::{debug, warn};
use nalgebra_glm as glm;
use std::fmt::Write;

const SKELETON_INCLUDE: &str = "#include \"acl/compression/skeleton.h\"";
const MATH_INCLUDES: &str =
    "#include \"acl/math/quat_64.h\"\n#include \"acl/math/vector4_64.h\"";

fn float_list(values: &[f64]) -> String {
    values.iter().map(|v| format!("{v:?}")).join(", ")
}

#[must_use]
pub fn quat_literal(q: &glm::DQuat) -> String {
    format!("acl::quat_set({})", float_list(&quat_to_array(q)))
}

#[must_use]
pub fn vector_literal(v: &glm::DVec3) -> String {
    format!("acl::vector_set({})", float_list(&vec_to_array(v)))
}

fn header(namespace: &str, clip: &Clip) -> Result<String, CbError> {
    let n = clip.num_samples;
    let mut s = String::new();
    writeln!(s, "#pragma once")?;
    writeln!(s, "{SKELETON_INCLUDE}")?;
    writeln!(s, "{MATH_INCLUDES}")?;
    writeln!(s)?;
    writeln!(s, "namespace {namespace}")?;
    writeln!(s, "{{")?;
    writeln!(s, "\textern acl::RigidBone bones[];")?;
    writeln!(s, "\textern uint16_t num_bones;")?;
    writeln!(s, "\tstatic constexpr uint16_t num_samples = {n};")?;
    writeln!(
        s,
        "\tstatic constexpr uint16_t sample_rate = {};",
        clip.sample_rate
    )?;
    writeln!(s)?;
    writeln!(s, "\textern uint16_t rotation_track_bone_index[];")?;
    writeln!(s, "\textern uint32_t num_rotation_tracks;")?;
    writeln!(s, "\textern acl::Quat_64 rotation_tracks[][{n}];")?;
    writeln!(s)?;
    writeln!(s, "\textern uint16_t translation_track_bone_index[];")?;
    writeln!(s, "\textern uint32_t num_translation_tracks;")?;
    writeln!(s, "\textern acl::Vector4_64 translation_tracks[][{n}];")?;
    writeln!(s, "}}")?;
    writeln!(s)?;
    Ok(s)
}

fn skeleton(
    namespace: &str,
    bones: &[Bone],
    parents: &[u16],
) -> Result<String, CbError> {
    let mut s = String::new();
    writeln!(s, "{SKELETON_INCLUDE}")?;
    writeln!(s, "{MATH_INCLUDES}")?;
    writeln!(s)?;
    writeln!(s, "namespace {namespace}")?;
    writeln!(s, "{{")?;
    writeln!(s, "\tacl::RigidBone bones[] =")?;
    writeln!(s, "\t{{")?;
    for (i, (bone, &parent)) in bones.iter().zip(parents).enumerate() {
        let parent = if parent == NO_PARENT {
            "0xFFFF".to_string()
        } else {
            parent.to_string()
        };
        writeln!(
            s,
            "\t\t/* {i} */\t{{ \"{}\", {parent}, {}, {}, {:?} }},",
            escape_string(&bone.name),
            quat_literal(&bone.bind_rotation),
            vector_literal(&bone.bind_translation),
            bone.vertex_distance
        )?;
    }
    writeln!(s, "\t}};")?;
    writeln!(s)?;
    writeln!(
        s,
        "\tuint16_t num_bones = sizeof(bones) / sizeof(acl::RigidBone);"
    )?;
    writeln!(s, "}}")?;
    writeln!(s)?;
    Ok(s)
}

/// Layout of one per-channel track file
struct TrackTable<T> {
    /// `rotation` or `translation`
    channel: &'static str,
    /// Element type of the sample table
    element: &'static str,
    samples: fn(&Track) -> &[T],
    literal: fn(&T) -> String,
}

fn track_index(
    map: &HashMap<&str, u16>,
    track: &Track,
) -> Result<u16, CbError> {
    map.get(track.bone_name.as_str())
        .copied()
        .ok_or_else(|| CbError::TrackWithoutBone(track.bone_name.clone()))
}

fn track_file<T>(
    table: &TrackTable<T>,
    namespace: &str,
    clip: &Clip,
    map: &HashMap<&str, u16>,
    tracks: &[Track],
) -> Result<String, CbError> {
    let channel = table.channel;
    let kept = tracks
        .iter()
        .filter(|t| !(table.samples)(t).is_empty())
        .collect::<Vec<_>>();
    debug!("{} {channel} tracks", kept.len());

    let mut s = String::new();
    writeln!(s, "{MATH_INCLUDES}")?;
    writeln!(s)?;
    writeln!(s, "namespace {namespace}")?;
    writeln!(s, "{{")?;
    writeln!(s, "\tuint16_t {channel}_track_bone_index[] =")?;
    writeln!(s, "\t{{")?;
    for track in &kept {
        writeln!(
            s,
            "\t\t{},\t\t// \"{}\"",
            track_index(map, track)?,
            escape_string(&track.bone_name)
        )?;
    }
    writeln!(s, "\t}};")?;
    writeln!(s)?;
    writeln!(
        s,
        "\tuint32_t num_{channel}_tracks = sizeof({channel}_track_bone_index) / sizeof(uint16_t);"
    )?;
    writeln!(s)?;
    writeln!(
        s,
        "\t{} {channel}_tracks[][{}] =",
        table.element, clip.num_samples
    )?;
    writeln!(s, "\t{{")?;
    for track in &kept {
        writeln!(s, "\t\t{{")?;
        for sample in (table.samples)(track) {
            writeln!(s, "\t\t\t{},", (table.literal)(sample))?;
        }
        writeln!(s, "\t\t}},")?;
    }
    writeln!(s, "\t}};")?;
    writeln!(s, "}}")?;
    writeln!(s)?;
    Ok(s)
}

fn rotations(t: &Track) -> &[glm::DQuat] {
    &t.rotations
}

fn translations(t: &Track) -> &[glm::DVec3] {
    &t.translations
}

const ROTATIONS: TrackTable<glm::DQuat> = TrackTable {
    channel: "rotation",
    element: "acl::Quat_64",
    samples: rotations,
    literal: quat_literal,
};

const TRANSLATIONS: TrackTable<glm::DVec3> = TrackTable {
    channel: "translation",
    element: "acl::Vector4_64",
    samples: translations,
    literal: vector_literal,
};

/// Renders the four C++ units of a clip. `clip_name` names the files and
/// the namespace and is reduced to identifier characters.
///
/// # Errors
/// Returns `CbError::ParentNotInBones` for a parent that is not a bone,
/// `CbError::TooManyBones` or `CbError::TooManySamples` if the tables can
/// not be indexed with 16 bits, and `CbError::TrackWithoutBone` for a track
/// that matches no bone.
pub fn render(
    clip_name: &str,
    clip: &Clip,
    bones: &[Bone],
    tracks: &[Track],
) -> Result<Vec<OutputUnit>, CbError> {
    if u16::try_from(clip.num_samples).is_err() {
        return Err(CbError::TooManySamples(clip.num_samples));
    }
    let map = bone_map(bones)?;
    let parents = parent_indices(bones, &map)?;

    for track in tracks.iter().filter(|t| t.has_scale()) {
        warn!(
            "Scale track of {:?} is not written to C++ output",
            track.bone_name
        );
    }

    let stem = format!("clip_{}", sanitize_identifier(clip_name));
    Ok(vec![
        OutputUnit {
            filename: format!("{stem}.h"),
            contents: header(&stem, clip)?,
        },
        OutputUnit {
            filename: format!("{stem}_skeleton.cpp"),
            contents: skeleton(&stem, bones, &parents)?,
        },
        OutputUnit {
            filename: format!("{stem}_rotations.cpp"),
            contents: track_file(&ROTATIONS, &stem, clip, &map, tracks)?,
        },
        OutputUnit {
            filename: format!("{stem}_translations.cpp"),
            contents: track_file(&TRANSLATIONS, &stem, clip, &map, tracks)?,
        },
    ])
}
