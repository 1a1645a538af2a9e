//! Model artifact location.
//!
//! Search order, in full:
//! 1. `project_root` from configuration, when set, is used as-is.
//! 2. Otherwise walk upward from the start directory, probing at most
//!    [`MAX_ROOT_SEARCH_DEPTH`] directories (itself, then its parents, so at
//!    most four levels up) and take the first one containing a `src`
//!    directory or a `package.json` file.
//! 3. Otherwise the start directory itself.
//!
//! Artifacts are then resolved relative to that root. For the classifier the
//! candidate directories are tried in configured order and the first existing
//! file wins.

use std::path::{Path, PathBuf};

use crate::config::{AppConfig, ClassifierConfig, EatingPatternConfig};
use crate::error::{Result, SmartfoodError};

/// Directories probed during root discovery, the start directory included.
pub const MAX_ROOT_SEARCH_DEPTH: usize = 5;

const ROOT_MARKER_DIR: &str = "src";
const ROOT_MARKER_FILE: &str = "package.json";

/// Walk upward from `start` looking for a project root marker.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut current = start;
    for _ in 0..MAX_ROOT_SEARCH_DEPTH {
        if is_project_root(current) {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }
    start.to_path_buf()
}

fn is_project_root(dir: &Path) -> bool {
    dir.join(ROOT_MARKER_DIR).is_dir() || dir.join(ROOT_MARKER_FILE).is_file()
}

/// Project root for this process: configured value, else discovery from `cwd`.
pub fn resolve_project_root(config: &AppConfig, cwd: &Path) -> PathBuf {
    match &config.project_root {
        Some(root) if root.is_absolute() => root.clone(),
        Some(root) => cwd.join(root),
        None => find_project_root(cwd),
    }
}

/// Where the classifier model lives, or is expected to live.
///
/// Candidates are probed on every call, so an artifact dropped in after
/// startup is picked up by the next health check or first load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    candidates: Vec<PathBuf>,
}

impl ArtifactLocation {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Every candidate in search order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that currently exists.
    pub fn find(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|p| p.is_file()).cloned()
    }

    /// The path to report to operators: the one found, else the first candidate.
    pub fn expected(&self) -> Option<PathBuf> {
        self.find().or_else(|| self.candidates.first().cloned())
    }

    pub fn is_available(&self) -> bool {
        self.find().is_some()
    }
}

pub fn classifier_artifact(root: &Path, config: &ClassifierConfig) -> ArtifactLocation {
    ArtifactLocation::new(
        config
            .model_dirs
            .iter()
            .map(|dir| root.join(dir).join(&config.model_file))
            .collect(),
    )
}

/// The three co-located files of the eating-pattern model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EatingPatternArtifacts {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub config: PathBuf,
}

impl EatingPatternArtifacts {
    pub fn resolve(root: &Path, config: &EatingPatternConfig) -> Self {
        let dir = root.join(&config.model_dir);
        Self {
            model: dir.join(&config.model_file),
            scaler: dir.join(&config.scaler_file),
            config: dir.join(&config.config_file),
        }
    }

    /// Fails naming the first missing file.
    pub fn ensure_present(&self) -> Result<()> {
        for (kind, path) in [
            ("Model", &self.model),
            ("Scaler params", &self.scaler),
            ("Model config", &self.config),
        ] {
            if !path.is_file() {
                return Err(SmartfoodError::Configuration(format!(
                    "{kind} not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn root_is_found_by_src_marker_in_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        let nested = tmp.path().join("services/python");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), tmp.path());
    }

    #[test]
    fn root_is_found_by_package_json() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        let nested = tmp.path().join("scripts");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), tmp.path());
    }

    #[test]
    fn nearest_marker_wins() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        let inner = tmp.path().join("app");
        fs::create_dir_all(inner.join("src")).unwrap();

        assert_eq!(find_project_root(&inner), inner);
    }

    fn nested(base: &Path, levels: usize) -> PathBuf {
        let mut dir = base.to_path_buf();
        for level in 0..levels {
            dir = dir.join(format!("l{level}"));
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn marker_four_levels_up_is_found() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        let start = nested(tmp.path(), MAX_ROOT_SEARCH_DEPTH - 1);

        assert_eq!(find_project_root(&start), tmp.path());
    }

    #[test]
    fn marker_five_levels_up_is_out_of_reach() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        let start = nested(tmp.path(), MAX_ROOT_SEARCH_DEPTH);

        assert_eq!(find_project_root(&start), start);
    }

    #[test]
    fn configured_root_wins_over_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default_config();
        config.project_root = Some(PathBuf::from("deploy"));

        assert_eq!(
            resolve_project_root(&config, tmp.path()),
            tmp.path().join("deploy")
        );
    }

    #[test]
    fn classifier_prefers_first_existing_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::default_config().classifier;
        let alt = tmp.path().join("notebooks/data/models/cnn");
        fs::create_dir_all(&alt).unwrap();
        fs::write(alt.join(&config.model_file), b"onnx").unwrap();

        let location = classifier_artifact(tmp.path(), &config);
        assert_eq!(location.find(), Some(alt.join(&config.model_file)));
        assert!(location.is_available());

        let primary = tmp.path().join("data/models/cnn");
        fs::create_dir_all(&primary).unwrap();
        fs::write(primary.join(&config.model_file), b"onnx").unwrap();

        assert_eq!(location.find(), Some(primary.join(&config.model_file)));
    }

    #[test]
    fn missing_classifier_reports_first_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::default_config().classifier;

        let location = classifier_artifact(tmp.path(), &config);
        assert!(location.find().is_none());
        assert!(!location.is_available());
        assert_eq!(location.candidates().len(), 2);
        assert_eq!(
            location.expected(),
            Some(tmp.path().join("data/models/cnn/food_classifier_best.onnx"))
        );
    }

    #[test]
    fn missing_companion_file_is_named() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::default_config().eating_pattern;
        let artifacts = EatingPatternArtifacts::resolve(tmp.path(), &config);
        fs::create_dir_all(artifacts.model.parent().unwrap()).unwrap();
        fs::write(&artifacts.model, b"onnx").unwrap();
        fs::write(&artifacts.config, b"{}").unwrap();

        let err = artifacts.ensure_present().unwrap_err();
        assert!(matches!(err, SmartfoodError::Configuration(_)));
        assert!(err.to_string().contains("scaler_params.json"));
    }
}
