//! End to end conversions of small YAML rigs
//!
//! Each test writes its input into a fresh directory under the system temp
//! directory and runs the same path the command line tool does.

use clipbake::{
    cb_error::{CbError, ErrorKind},
    convert,
    options::{parse_args, ConvertOptions},
};
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Once,
};

static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// Empty directory unique to this process and test
fn work_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("clipbake_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Root with one child. The child keeps an identity rotation and moves
/// linearly for one second.
const TWO_BONE_RIG: &str = "
animation: lift
nodes:
  - name: root
    children: [child]
  - name: child
    translation: [0.0, 1.0, 0.0]
    channels:
      rotation:
        interpolation: linear
        times: [0.0, 1.0]
        values: [[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0]]
      translation:
        interpolation: linear
        times: [0.0, 1.0]
        values: [[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]]
poses:
  - name: bind
    entries:
      - { name: root }
      - { name: child, translation: [0.0, 1.0, 0.0] }
";

fn run(
    dir: &Path,
    input: &str,
    extra: &[String],
) -> Result<Vec<PathBuf>, CbError> {
    let mut args = vec![
        format!("-fbx={}", dir.join(input).display()),
        format!("-out={}", dir.join("out").display()),
    ];
    args.extend_from_slice(extra);
    let cli = parse_args(&args)?;
    cli.validate()?;
    let options = cli.options()?;
    convert::convert_file(&cli, &options)
}

/// Number of entries in a `*_track_bone_index` array
fn index_entries(source: &str) -> usize {
    source.lines().filter(|l| l.contains("\t\t// \"")).count()
}

#[test]
fn two_bone_round_trip() {
    init_tests();
    let dir = work_dir("round_trip");
    fs::write(dir.join("lift.yaml"), TWO_BONE_RIG).unwrap();

    let written = run(&dir, "lift.yaml", &[]).unwrap();
    info!("{:?}", written);
    assert_eq!(written.len(), 4);

    let out = dir.join("out");
    let header = fs::read_to_string(out.join("clip_lift.h")).unwrap();
    assert!(header.contains("num_samples = 31;"));
    assert!(header.contains("sample_rate = 30;"));

    let skeleton = fs::read_to_string(out.join("clip_lift_skeleton.cpp")).unwrap();
    assert_eq!(skeleton.matches("\t\t/* ").count(), 2);
    assert!(skeleton.contains("/* 0 */\t{ \"root\", 0xFFFF, "));
    assert!(skeleton.contains(
        "/* 1 */\t{ \"child\", 0, acl::quat_set(0.0, 0.0, 0.0, 1.0), acl::vector_set(0.0, 1.0, 0.0), 0.1 },"
    ));

    let rotations = fs::read_to_string(out.join("clip_lift_rotations.cpp")).unwrap();
    assert_eq!(index_entries(&rotations), 0);
    assert!(!rotations.contains("acl::quat_set"));

    let translations =
        fs::read_to_string(out.join("clip_lift_translations.cpp")).unwrap();
    assert_eq!(index_entries(&translations), 1);
    assert!(translations.contains("\t\t1,\t\t// \"child\""));
    assert!(translations.contains("translation_tracks[][31] ="));
    assert_eq!(translations.matches("acl::vector_set").count(), 31);
    assert!(translations.contains("acl::vector_set(0.0, 1.0, 0.0),"));
    assert!(translations.contains("acl::vector_set(0.0, 1.5, 0.0),"));
    assert!(translations.contains("acl::vector_set(0.0, 2.0, 0.0),"));
}

#[test]
fn acl_text_and_config() {
    init_tests();
    let dir = work_dir("acl_text");
    fs::write(dir.join("lift.yaml"), TWO_BONE_RIG).unwrap();
    fs::write(
        dir.join("options.yaml"),
        "sample_rate: 10\nvertex_distance: 3.0\n",
    )
    .unwrap();
    let acl = dir.join("lift.acl.js");

    let written = run(
        &dir,
        "lift.yaml",
        &[
            format!("-acl={}", acl.display()),
            format!("-config={}", dir.join("options.yaml").display()),
        ],
    )
    .unwrap();
    assert_eq!(written.len(), 5);

    let text = fs::read_to_string(&acl).unwrap();
    assert!(text.starts_with("version = 1\n"));
    assert!(text.contains("\tname = \"lift\"\n"));
    assert!(text.contains("\tnum_samples = 11\n"));
    assert!(text.contains("\tsample_rate = 10\n"));
    assert!(text.contains("\t\tvertex_distance = 3.0\n"));
    assert!(text.contains("\t\tbind_translation = [ 0.0, 1.0, 0.0 ]\n"));
    assert!(text.contains("\t\ttranslations =\n"));
    assert!(!text.contains("\t\trotations =\n"));
}

#[test]
fn scale_is_sampled_not_emitted() {
    init_tests();
    let dir = work_dir("scale");
    let rig = TWO_BONE_RIG.replace(
        "    translation: [0.0, 1.0, 0.0]\n    channels:\n",
        "    translation: [0.0, 1.0, 0.0]\n    channels:\n      scale:\n        interpolation: step\n        times: [0.0, 0.5]\n        values: [[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]\n",
    );
    fs::write(dir.join("grow.yaml"), rig).unwrap();

    let options = ConvertOptions::default();
    let scene = convert::load_scene(&dir.join("grow.yaml")).unwrap();
    let conversion = convert::process(&scene, &options).unwrap();
    assert!(!conversion.tracks[0].has_scale());
    assert!(conversion.tracks[1].has_scale());
    assert_eq!(conversion.tracks[1].scales.len(), 31);

    run(&dir, "grow.yaml", &[]).unwrap();
    let out = dir.join("out");
    for entry in fs::read_dir(&out).unwrap() {
        let text = fs::read_to_string(entry.unwrap().path()).unwrap();
        assert!(!text.contains("2.0, 2.0, 2.0"));
    }
}

#[test]
fn error_kinds() {
    init_tests();
    let dir = work_dir("errors");

    // Usage
    let e = run(&dir, "missing.yaml", &[]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Usage);

    // Load
    fs::write(dir.join("broken.yaml"), "nodes: [[[").unwrap();
    let e = run(&dir, "broken.yaml", &[]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Load);
    assert_eq!(e.kind().exit_code(), 2);

    // Conversion, the bind pose names a node that does not exist
    let ghost = TWO_BONE_RIG.replace("- { name: child,", "- { name: ghost,");
    fs::write(dir.join("ghost.yaml"), ghost).unwrap();
    let e = run(&dir, "ghost.yaml", &[]).unwrap_err();
    assert!(matches!(e, CbError::BoneNotInHierarchy(ref n) if n == "ghost"));
    assert_eq!(e.kind().exit_code(), 3);
    // Nothing was written
    assert!(!dir.join("out").join("clip_ghost.h").exists());
}

#[test]
fn zero_length_clip() {
    init_tests();
    let dir = work_dir("still");
    let still = "
animation: still
nodes:
  - name: root
poses:
  - name: bind
    entries:
      - { name: root }
";
    fs::write(dir.join("still.yaml"), still).unwrap();
    run(&dir, "still.yaml", &[]).unwrap();
    let header = fs::read_to_string(dir.join("out").join("clip_still.h")).unwrap();
    assert!(header.contains("num_samples = 1;"));
}

#[test]
fn failed_write_leaves_nothing() {
    init_tests();
    let dir = work_dir("rollback");
    let first = dir.join("first.txt");
    // No such directory, so the second write fails
    let blocked = dir.join("missing").join("second.txt");

    let e = convert::write_all(&[
        (first.clone(), "one".to_string()),
        (blocked, "two".to_string()),
    ])
    .unwrap_err();
    assert!(matches!(e, CbError::OutputError(..)));
    assert_eq!(e.kind(), ErrorKind::Conversion);
    assert!(!first.exists());
    assert!(!dir.join("first.txt.partial").exists());
}

#[test]
fn failed_write_keeps_earlier_output() {
    init_tests();
    let dir = work_dir("keep_earlier");
    let first = dir.join("first.txt");
    fs::write(&first, "earlier").unwrap();
    let blocked = dir.join("missing").join("second.txt");

    convert::write_all(&[
        (first.clone(), "later".to_string()),
        (blocked, "two".to_string()),
    ])
    .unwrap_err();
    assert_eq!(fs::read_to_string(&first).unwrap(), "earlier");
    assert!(!dir.join("first.txt.partial").exists());

    convert::write_all(&[(first.clone(), "later".to_string())]).unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), "later");
}
