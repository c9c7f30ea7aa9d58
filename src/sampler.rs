use crate::{
    cb_error::CbError,
    hierarchy::Hierarchy,
    scene::SceneProvider,
    types::{Bone, Clip, Track},
};
use log::{info, trace};

/// Samples one bone at every clip time
fn sample_bone<S: SceneProvider + ?Sized>(
    scene: &S,
    clip: &Clip,
    bone_name: &str,
    node: usize,
) -> Track {
    let mut track = Track {
        bone_name: bone_name.to_string(),
        rotations: Vec::with_capacity(clip.num_samples),
        translations: Vec::with_capacity(clip.num_samples),
        scales: Vec::with_capacity(clip.num_samples),
    };
    for i in 0..clip.num_samples {
        let t = scene.local_transform(node, clip.sample_time(i));
        track.rotations.push(t.rotation);
        track.translations.push(t.translation);
        track.scales.push(t.scale);
    }
    trace!("{:?} samples={}", bone_name, clip.num_samples);
    track
}

/// Produces one track per bone, in bone order, each holding exactly
/// `clip.num_samples` values per channel.
///
/// # Errors
/// Returns `CbError::BoneNotInHierarchy` if a bone has no scene node
pub fn sample_tracks<S: SceneProvider + ?Sized>(
    scene: &S,
    clip: &Clip,
    bones: &[Bone],
    hierarchy: &Hierarchy,
) -> Result<Vec<Track>, CbError> {
    let tracks = bones
        .iter()
        .map(|bone| -> Result<Track, CbError> {
            let node = hierarchy.lookup(&bone.name)?.node;
            Ok(sample_bone(scene, clip, &bone.name, node))
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "Sampled tracks={} samples={} rate={}",
        tracks.len(),
        clip.num_samples,
        clip.sample_rate
    );
    Ok(tracks)
}
