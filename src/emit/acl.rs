//! ACL text clip format (`*.acl.js`), version 1. Unlike the C++ tables this
//! format carries scale tracks and the bind scale.

use super::{escape_string, OutputUnit};
use crate::{
    cb_error::CbError,
    eliminate::{is_key_default, Defaults},
    transform::{quat_to_array, vec_to_array},
    types::{Bone, Clip, Track},
};
use itertools::Itertools;
use log::debug;
use nalgebra_glm as glm;
use std::fmt::Write;

pub const FILE_FORMAT_VERSION: u32 = 1;

/// `[ x, y, z ]`
fn array(values: &[f64]) -> String {
    format!("[ {} ]", values.iter().map(|v| format!("{v:?}")).join(", "))
}

fn quat(q: &glm::DQuat) -> String {
    array(&quat_to_array(q))
}

fn vec3(v: &glm::DVec3) -> String {
    array(&vec_to_array(v))
}

fn write_clip(s: &mut String, clip: &Clip) -> Result<(), CbError> {
    writeln!(s, "clip =")?;
    writeln!(s, "{{")?;
    writeln!(s, "\tname = \"{}\"", escape_string(&clip.name))?;
    writeln!(s, "\tnum_samples = {}", clip.num_samples)?;
    writeln!(s, "\tsample_rate = {}", clip.sample_rate)?;
    writeln!(s, "\terror_threshold = {:?}", clip.error_threshold)?;
    writeln!(s, "}}")?;
    writeln!(s)?;
    Ok(())
}

fn write_bones(
    s: &mut String,
    bones: &[Bone],
    defaults: &Defaults,
) -> Result<(), CbError> {
    let tol = defaults.tolerance;
    writeln!(s, "bones =")?;
    writeln!(s, "[")?;
    for bone in bones {
        writeln!(s, "\t{{")?;
        writeln!(s, "\t\tname = \"{}\"", escape_string(&bone.name))?;
        writeln!(s, "\t\tparent = \"{}\"", escape_string(&bone.parent_name))?;
        writeln!(s, "\t\tvertex_distance = {:?}", bone.vertex_distance)?;
        if !is_key_default(&bone.bind_rotation, &defaults.rotation, tol) {
            writeln!(s, "\t\tbind_rotation = {}", quat(&bone.bind_rotation))?;
        }
        if !is_key_default(&bone.bind_translation, &defaults.translation, tol)
        {
            writeln!(
                s,
                "\t\tbind_translation = {}",
                vec3(&bone.bind_translation)
            )?;
        }
        if !is_key_default(&bone.bind_scale, &defaults.scale, tol) {
            writeln!(s, "\t\tbind_scale = {}", vec3(&bone.bind_scale))?;
        }
        writeln!(s, "\t}}")?;
    }
    writeln!(s, "]")?;
    writeln!(s)?;
    Ok(())
}

fn write_samples<T>(
    s: &mut String,
    label: &str,
    samples: &[T],
    format: fn(&T) -> String,
) -> Result<(), CbError> {
    if samples.is_empty() {
        return Ok(());
    }
    writeln!(s, "\t\t{label} =")?;
    writeln!(s, "\t\t[")?;
    for sample in samples {
        writeln!(s, "\t\t\t{}", format(sample))?;
    }
    writeln!(s, "\t\t]")?;
    Ok(())
}

fn write_tracks(s: &mut String, tracks: &[Track]) -> Result<(), CbError> {
    writeln!(s, "tracks =")?;
    writeln!(s, "[")?;
    for track in tracks.iter().filter(|t| !t.is_empty()) {
        writeln!(s, "\t{{")?;
        writeln!(s, "\t\tname = \"{}\"", escape_string(&track.bone_name))?;
        write_samples(s, "rotations", &track.rotations, quat)?;
        write_samples(s, "translations", &track.translations, vec3)?;
        write_samples(s, "scales", &track.scales, vec3)?;
        writeln!(s, "\t}}")?;
    }
    writeln!(s, "]")?;
    writeln!(s)?;
    Ok(())
}

/// Renders a whole clip in the ACL text format. Bind values equal to their
/// default are left out, as are tracks with no channels.
///
/// # Errors
/// Only fails if formatting fails
pub fn render(
    filename: &str,
    clip: &Clip,
    bones: &[Bone],
    tracks: &[Track],
    defaults: &Defaults,
) -> Result<OutputUnit, CbError> {
    let mut s = String::new();
    writeln!(s, "version = {FILE_FORMAT_VERSION}")?;
    writeln!(s)?;
    write_clip(&mut s, clip)?;
    write_bones(&mut s, bones, defaults)?;
    write_tracks(&mut s, tracks)?;
    debug!("{filename} is {} bytes", s.len());
    Ok(OutputUnit {
        filename: filename.to_string(),
        contents: s,
    })
}
