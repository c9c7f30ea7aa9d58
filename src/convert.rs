use crate::{
    bind_pose,
    cb_error::CbError,
    eliminate,
    emit::{acl, cpp},
    hierarchy::Hierarchy,
    options::{CliArgs, ConvertOptions},
    sampler,
    scene::{gltf_file, yaml_file, Scene, SceneProvider},
    types::{Bone, Clip, Track},
};
use log::{error, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Everything extracted from one scene
#[derive(Clone, Debug)]
pub struct Conversion {
    pub clip: Clip,
    pub hierarchy: Hierarchy,
    pub bones: Vec<Bone>,
    /// One per bone, in bone order, defaults already eliminated
    pub tracks: Vec<Track>,
}

/// Picks a reader by file extension
///
/// # Errors
/// Returns a load error if the file can not be read
pub fn load_scene(path: &Path) -> Result<Scene, CbError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    info!("Loading {:?}", path);
    let result = match extension.as_deref() {
        Some("gltf" | "glb") => gltf_file::load(path),
        Some("yaml" | "yml") => yaml_file::load(path),
        _ => Err(CbError::UnsupportedFormat(path.to_path_buf())),
    };
    if let Err(e) = &result {
        error!("Loading {:?} failed: {e}", path);
    }
    result
}

/// The scene's animation as a sampled clip
///
/// # Errors
/// Returns `CbError::NoAnimation` if there is none, otherwise see
/// `Clip::new`
pub fn parse_clip<S: SceneProvider + ?Sized>(
    scene: &S,
    options: &ConvertOptions,
) -> Result<Clip, CbError> {
    let stack = scene.anim_stack().ok_or(CbError::NoAnimation)?;
    let clip = Clip::new(
        &stack.name,
        stack.duration,
        options.sample_rate,
        options.error_threshold,
    )?;
    info!(
        "Clip {:?} duration={} samples={}",
        clip.name, clip.duration, clip.num_samples
    );
    Ok(clip)
}

/// Runs hierarchy, bind pose, sampling and elimination on a loaded scene
///
/// # Errors
/// Any failure of the stages is returned unchanged
pub fn process<S: SceneProvider + ?Sized>(
    scene: &S,
    options: &ConvertOptions,
) -> Result<Conversion, CbError> {
    let clip = parse_clip(scene, options)?;
    let hierarchy = Hierarchy::build(scene);
    let bones = bind_pose::resolve(scene, &hierarchy, options.vertex_distance)?;
    let defaults = options.defaults();
    let tracks = sampler::sample_tracks(scene, &clip, &bones, &hierarchy)?
        .into_iter()
        .map(|t| eliminate::eliminate_track(t, &defaults))
        .collect::<Vec<_>>();
    info!(
        "Rotation tracks={} translation tracks={} scale tracks={}",
        tracks.iter().filter(|t| t.has_rotation()).count(),
        tracks.iter().filter(|t| t.has_translation()).count(),
        tracks.iter().filter(|t| t.has_scale()).count()
    );
    Ok(Conversion {
        clip,
        hierarchy,
        bones,
        tracks,
    })
}

/// `path` with `.partial` appended to its file name
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Removes files left by an unfinished `write_all`
fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove {:?}: {e}", path);
        }
    }
}

/// Writes every file or none. Each file is written next to its target
/// with a `.partial` suffix and renamed once all writes succeed, so a
/// failed write leaves earlier outputs at those paths untouched.
///
/// # Errors
/// Returns `CbError::OutputError` for the first failed write or rename
pub fn write_all(files: &[(PathBuf, String)]) -> Result<(), CbError> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let partial = partial_path(path);
        if let Err(e) = fs::write(&partial, contents) {
            error!("Writing {:?} failed: {e}", partial);
            discard(&staged);
            return Err(CbError::OutputError(path.clone(), e));
        }
        staged.push(partial);
    }
    for (i, ((path, _), partial)) in files.iter().zip(&staged).enumerate() {
        if let Err(e) = fs::rename(partial, path) {
            error!("Renaming {:?} failed: {e}", partial);
            discard(&staged[i..]);
            return Err(CbError::OutputError(path.clone(), e));
        }
        info!("Wrote {:?}", path);
    }
    Ok(())
}

/// Name used for the C++ files, the input file name without extension
#[must_use]
pub fn clip_file_name(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned())
}

/// Converts the input named on the command line and returns the paths
/// written
///
/// # Errors
/// Returns the first error of any stage. Nothing is written on error.
pub fn convert_file(
    cli: &CliArgs,
    options: &ConvertOptions,
) -> Result<Vec<PathBuf>, CbError> {
    let scene = load_scene(&cli.input)?;
    let conversion = process(&scene, options)?;

    let name = clip_file_name(&cli.input);
    let mut files = cpp::render(
        &name,
        &conversion.clip,
        &conversion.bones,
        &conversion.tracks,
    )?
    .into_iter()
    .map(|u| (cli.output_dir.join(u.filename), u.contents))
    .collect::<Vec<_>>();
    if let Some(acl_path) = &cli.acl {
        let unit = acl::render(
            &acl_path.to_string_lossy(),
            &conversion.clip,
            &conversion.bones,
            &conversion.tracks,
            &options.defaults(),
        )?;
        files.push((acl_path.clone(), unit.contents));
    }

    fs::create_dir_all(&cli.output_dir)
        .map_err(|e| CbError::OutputError(cli.output_dir.clone(), e))?;
    write_all(&files)?;
    Ok(files.into_iter().map(|(path, _)| path).collect())
}
