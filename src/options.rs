use crate::{
    cb_error::CbError,
    eliminate::{Defaults, DEFAULT_TOLERANCE},
    types::{DEFAULT_ERROR_THRESHOLD, DEFAULT_SAMPLE_RATE, DEFAULT_VERTEX_DISTANCE},
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Conversion settings. Read from YAML with `-config=`; absent fields keep
/// their defaults.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct ConvertOptions {
    /// Samples per second
    pub sample_rate: u32,
    /// Handed to the compressor through the ACL text format
    pub error_threshold: f64,
    /// Virtual vertex distance given to every bone
    pub vertex_distance: f64,
    /// Per component tolerance for default track elimination
    pub default_tolerance: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            vertex_distance: DEFAULT_VERTEX_DISTANCE,
            default_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ConvertOptions {
    /// Reads options from a YAML file
    ///
    /// # Errors
    /// Returns `CbError::InvalidConfig` if the file can not be read or parsed
    pub fn load(path: &Path) -> Result<Self, CbError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CbError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        let options: Self = serde_yaml::from_str(&text).map_err(|e| {
            CbError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        info!("Options from {:?}: {:?}", path, options);
        Ok(options)
    }

    #[must_use]
    pub fn defaults(&self) -> Defaults {
        Defaults::with_tolerance(self.default_tolerance)
    }
}

/// Parsed command line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub input: PathBuf,
    /// Directory for the C++ files
    pub output_dir: PathBuf,
    /// Also write the ACL text format here
    pub acl: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub const USAGE: &str = "Usage: clipbake -fbx=<scene file> [-out=<directory>] \
[-acl=<ACL file name>.acl.js] [-config=<options file>]";

/// Option value with any double quotes removed
fn option_value(arg: &str, prefix: &str) -> Option<PathBuf> {
    arg.strip_prefix(prefix)
        .map(|v| PathBuf::from(v.replace('"', "")))
}

/// Parses `-name=value` arguments, program name excluded. Later values
/// replace earlier ones.
///
/// # Errors
/// Returns `CbError::UnknownOption` for anything unrecognized,
/// `CbError::InvalidAclFilename` if the `-acl=` path does not end with
/// `.acl.js`, and `CbError::MissingInput` without an input path.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, CbError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut input = None;
    let mut cli = CliArgs {
        output_dir: PathBuf::from("."),
        ..CliArgs::default()
    };
    for arg in args {
        let arg = arg.as_ref();
        if let Some(v) = option_value(arg, "-fbx=") {
            input = Some(v);
        } else if let Some(v) = option_value(arg, "-out=") {
            cli.output_dir = v;
        } else if let Some(v) = option_value(arg, "-acl=") {
            if !v.to_string_lossy().ends_with(".acl.js") {
                return Err(CbError::InvalidAclFilename(v));
            }
            cli.acl = Some(v);
        } else if let Some(v) = option_value(arg, "-config=") {
            cli.config = Some(v);
        } else {
            return Err(CbError::UnknownOption(arg.to_string()));
        }
    }
    match input {
        Some(p) if !p.as_os_str().is_empty() => cli.input = p,
        _ => return Err(CbError::MissingInput),
    }
    debug!("{:?}", cli);
    Ok(cli)
}

impl CliArgs {
    /// Checks the input exists before any scene is touched
    ///
    /// # Errors
    /// Returns `CbError::InputNotFound` if it does not
    pub fn validate(&self) -> Result<(), CbError> {
        if self.input.exists() {
            Ok(())
        } else {
            Err(CbError::InputNotFound(self.input.clone()))
        }
    }

    /// Options from `-config=` or the defaults
    ///
    /// # Errors
    /// Returns `CbError::InvalidConfig` if the file is bad
    pub fn options(&self) -> Result<ConvertOptions, CbError> {
        self.config
            .as_deref()
            .map_or_else(|| Ok(ConvertOptions::default()), ConvertOptions::load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cb_error::ErrorKind;

    #[test]
    fn input_only() {
        let cli = parse_args(["-fbx=\"run.gltf\""]).unwrap();
        assert_eq!(cli.input, PathBuf::from("run.gltf"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.acl.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn all_options() {
        let cli = parse_args([
            "-fbx=a.yaml",
            "-out=gen",
            "-acl=a.acl.js",
            "-config=opts.yaml",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("gen"));
        assert_eq!(cli.acl, Some(PathBuf::from("a.acl.js")));
        assert_eq!(cli.config, Some(PathBuf::from("opts.yaml")));
    }

    #[test]
    fn usage_errors() {
        let none: [&str; 0] = [];
        assert!(matches!(parse_args(none), Err(CbError::MissingInput)));
        assert!(matches!(parse_args(["-fbx="]), Err(CbError::MissingInput)));
        let e = parse_args(["-fbx=a.gltf", "--verbose"]).unwrap_err();
        assert!(matches!(e, CbError::UnknownOption(ref a) if a == "--verbose"));
        assert_eq!(e.kind(), ErrorKind::Usage);
        assert!(matches!(
            parse_args(["-fbx=a.gltf", "-acl=a.js"]),
            Err(CbError::InvalidAclFilename(_))
        ));
    }

    #[test]
    fn missing_input_file() {
        let cli = parse_args(["-fbx=/nonexistent/clipbake/x.gltf"]).unwrap();
        let e = cli.validate().unwrap_err();
        assert!(matches!(e, CbError::InputNotFound(_)));
        assert_eq!(e.kind().exit_code(), 1);
    }

    #[test]
    fn partial_yaml() {
        let options: ConvertOptions =
            serde_yaml::from_str("sample_rate: 60\n").unwrap();
        assert_eq!(options.sample_rate, 60);
        assert_eq!(options.vertex_distance, DEFAULT_VERTEX_DISTANCE);
        assert_eq!(options.defaults(), Defaults::default());
    }
}
