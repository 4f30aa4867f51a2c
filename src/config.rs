use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::undistort::CalibrationFiles;

const TIMES_FILE_NAME: &str = "times.txt";

#[derive(Debug, Deserialize, Default)]
struct ReaderConfigFile {
    main_path: Option<PathBuf>,
    depth_path: Option<PathBuf>,
    times_path: Option<PathBuf>,
    calibration: Option<CalibrationConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CalibrationConfigFile {
    camera: Option<PathBuf>,
    gamma: Option<PathBuf>,
    vignette: Option<PathBuf>,
}

/// Inputs of a `FolderReader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Image directory or `.zip` archive.
    pub main_path: PathBuf,
    /// Depth directory or `.zip` archive; `None` reads without depth.
    pub depth_path: Option<PathBuf>,
    pub calibration: CalibrationFiles,
    /// Overrides the `times.txt` next to the main source.
    pub times_path: Option<PathBuf>,
}

impl ReaderConfig {
    pub fn new(main_path: impl Into<PathBuf>, calibration: impl Into<PathBuf>) -> Self {
        Self {
            main_path: main_path.into(),
            depth_path: None,
            calibration: CalibrationFiles::new(calibration),
            times_path: None,
        }
    }

    pub fn with_depth(mut self, depth_path: impl Into<PathBuf>) -> Self {
        self.depth_path = Some(depth_path.into());
        self
    }

    pub fn with_gamma(mut self, gamma: impl Into<PathBuf>) -> Self {
        self.calibration.gamma = Some(gamma.into());
        self
    }

    pub fn with_vignette(mut self, vignette: impl Into<PathBuf>) -> Self {
        self.calibration.vignette = Some(vignette.into());
        self
    }

    pub fn with_times(mut self, times_path: impl Into<PathBuf>) -> Self {
        self.times_path = Some(times_path.into());
        self
    }

    /// Load from the file named by `DATASET_READER_CONFIG` (TOML, or JSON for
    /// `.json`), then apply `DATASET_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DATASET_READER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => read_config_file(Path::new(path))?,
            _ => ReaderConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Location of the frame metadata file.
    pub fn times_file(&self) -> PathBuf {
        if let Some(path) = &self.times_path {
            return path.clone();
        }
        match self.main_path.parent() {
            Some(parent) => parent.join(TIMES_FILE_NAME),
            None => PathBuf::from(TIMES_FILE_NAME),
        }
    }

    fn from_file(file: ReaderConfigFile) -> Self {
        let calibration = file.calibration.unwrap_or_default();
        Self {
            main_path: file.main_path.unwrap_or_default(),
            depth_path: file.depth_path,
            calibration: CalibrationFiles {
                calibration: calibration.camera.unwrap_or_default(),
                gamma: calibration.gamma,
                vignette: calibration.vignette,
            },
            times_path: file.times_path,
        }
    }

    fn apply_env(&mut self) {
        if let Some(path) = env_path("DATASET_MAIN_PATH") {
            self.main_path = path;
        }
        if let Some(path) = env_path("DATASET_DEPTH_PATH") {
            self.depth_path = Some(path);
        }
        if let Some(path) = env_path("DATASET_CALIB_PATH") {
            self.calibration.calibration = path;
        }
        if let Some(path) = env_path("DATASET_GAMMA_PATH") {
            self.calibration.gamma = Some(path);
        }
        if let Some(path) = env_path("DATASET_VIGNETTE_PATH") {
            self.calibration.vignette = Some(path);
        }
        if let Some(path) = env_path("DATASET_TIMES_PATH") {
            self.times_path = Some(path);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.main_path.as_os_str().is_empty() {
            return Err(anyhow!(
                "main_path must be set (config file or DATASET_MAIN_PATH)"
            ));
        }
        if self.calibration.calibration.as_os_str().is_empty() {
            return Err(anyhow!(
                "calibration.camera must be set (config file or DATASET_CALIB_PATH)"
            ));
        }
        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn read_config_file(path: &Path) -> Result<ReaderConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg: ReaderConfigFile = if path.extension().map(|ext| ext == "json").unwrap_or(false) {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
