//! Geometric-correction collaborator.
//!
//! The reader never interprets calibration files itself. It builds an
//! `Undistort` implementation from the calibration inputs, sizes decode
//! buffers from its original dimensions, and hands every raw raster to it.
//!
//! `PassthroughUndistort` is the stock implementation: it reads the camera
//! file and optional photometric files, keeps the geometry as-is and maps raw
//! intensities through the photometric response.

use std::path::{Path, PathBuf};

use crate::error::CorrectionError;
use crate::frame::{AssembledFrame, RawRaster};

const GAMMA_ENTRIES: usize = 256;

/// Calibration inputs handed to the collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CalibrationFiles {
    /// Camera calibration file.
    pub calibration: PathBuf,
    /// Photometric inverse-response file.
    pub gamma: Option<PathBuf>,
    /// Vignette image.
    pub vignette: Option<PathBuf>,
}

impl CalibrationFiles {
    pub fn new(calibration: impl Into<PathBuf>) -> Self {
        Self {
            calibration: calibration.into(),
            gamma: None,
            vignette: None,
        }
    }
}

/// Camera matrix and output size of the corrected frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonoCalibration {
    pub k: [[f32; 3]; 3],
    pub width: u32,
    pub height: u32,
}

/// Lens/photometric correction of raw rasters.
pub trait Undistort {
    /// Build the collaborator from its calibration inputs.
    fn load(files: &CalibrationFiles) -> Result<Self, CorrectionError>
    where
        Self: Sized;

    /// Size of the raw, uncorrected frames.
    fn original_size(&self) -> (u32, u32);

    /// Size of the corrected frames.
    fn size(&self) -> (u32, u32);

    /// Camera parameters as calibrated for the raw frames.
    fn original_parameters(&self) -> &[f64];

    /// Camera matrix of the corrected frames.
    fn intrinsics(&self) -> [[f64; 3]; 3];

    /// Photometric response curve, when one was calibrated.
    fn photometric_gamma(&self) -> Option<&[f32]> {
        None
    }

    fn undistort(
        &self,
        raw: &RawRaster,
        exposure: f32,
        timestamp: f64,
    ) -> Result<AssembledFrame, CorrectionError>;
}

// ----------------------------------------------------------------------------
// PassthroughUndistort
// ----------------------------------------------------------------------------

/// Geometry-preserving correction for undistorted pinhole cameras.
///
/// Camera file layout:
///
/// ```text
/// Pinhole fx fy cx cy 0
/// in_width in_height
/// none
/// out_width out_height
/// ```
///
/// The model name is optional. Intrinsics with `cx < 1 && cy < 1` are relative
/// to the image size.
#[derive(Clone, Debug)]
pub struct PassthroughUndistort {
    parameters: Vec<f64>,
    width: u32,
    height: u32,
    photometric: Option<Photometric>,
}

#[derive(Clone, Debug)]
struct Photometric {
    response: Vec<f32>,
    vignette_inv: Vec<f32>,
}

impl Undistort for PassthroughUndistort {
    fn load(files: &CalibrationFiles) -> Result<Self, CorrectionError> {
        let path = files.calibration.as_path();
        let text = read_text(path)?;
        let (parameters, width, height) = parse_camera(path, &text)?;

        let photometric = match (&files.gamma, &files.vignette) {
            (Some(gamma), Some(vignette)) => Some(Photometric {
                response: load_response(gamma)?,
                vignette_inv: load_vignette(vignette, width, height)?,
            }),
            (None, None) => None,
            _ => {
                log::warn!("photometric calibration needs both gamma and vignette; ignoring it");
                None
            }
        };
        if photometric.is_none() {
            log::info!("no photometric calibration");
        }

        Ok(Self {
            parameters,
            width,
            height,
            photometric,
        })
    }

    fn original_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn original_parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn intrinsics(&self) -> [[f64; 3]; 3] {
        let p = &self.parameters;
        [[p[0], 0.0, p[2]], [0.0, p[1], p[3]], [0.0, 0.0, 1.0]]
    }

    fn photometric_gamma(&self) -> Option<&[f32]> {
        self.photometric.as_ref().map(|p| p.response.as_slice())
    }

    fn undistort(
        &self,
        raw: &RawRaster,
        exposure: f32,
        timestamp: f64,
    ) -> Result<AssembledFrame, CorrectionError> {
        if (raw.width, raw.height) != (self.width, self.height) {
            return Err(CorrectionError::WrongSize {
                width: raw.width,
                height: raw.height,
                expected_width: self.width,
                expected_height: self.height,
            });
        }

        let image = match &self.photometric {
            Some(photometric) => raw
                .pixels()
                .iter()
                .zip(&photometric.vignette_inv)
                .map(|(&v, &inv)| photometric.response[v as usize] * inv)
                .collect(),
            None => raw.pixels().iter().map(|&v| v as f32).collect(),
        };
        Ok(AssembledFrame::new(
            self.width,
            self.height,
            image,
            exposure,
            timestamp,
        ))
    }
}

fn read_text(path: &Path) -> Result<String, CorrectionError> {
    std::fs::read_to_string(path).map_err(|source| CorrectionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_camera(path: &Path, text: &str) -> Result<(Vec<f64>, u32, u32), CorrectionError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut next_line = |what: &str| {
        lines
            .next()
            .ok_or_else(|| CorrectionError::invalid(path, format!("missing {what} line")))
    };

    let intrinsics = next_line("intrinsics")?;
    let mut tokens = intrinsics.split_whitespace().peekable();
    let first = tokens.peek().copied();
    if let Some(model) = first.filter(|t| t.parse::<f64>().is_err()) {
        if model != "Pinhole" {
            return Err(CorrectionError::invalid(
                path,
                format!("camera model {model} needs lens undistortion; only Pinhole passes through"),
            ));
        }
        tokens.next();
    }
    let mut parameters = tokens
        .map(|t| t.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CorrectionError::invalid(path, format!("bad intrinsics: {e}")))?;
    match parameters.len() {
        4 => {}
        5 if parameters[4] == 0.0 => {
            parameters.pop();
        }
        n => {
            return Err(CorrectionError::invalid(
                path,
                format!("expected fx fy cx cy [0], got {n} parameters"),
            ))
        }
    }

    let (width, height) = parse_size(path, next_line("input size")?)?;

    let mode = next_line("rectification")?;
    if mode != "none" {
        return Err(CorrectionError::invalid(
            path,
            format!("rectification '{mode}' is not supported; use 'none'"),
        ));
    }

    let output = parse_size(path, next_line("output size")?)?;
    if output != (width, height) {
        return Err(CorrectionError::invalid(
            path,
            format!(
                "output size {}x{} differs from input size {}x{}",
                output.0, output.1, width, height
            ),
        ));
    }

    if parameters[2] < 1.0 && parameters[3] < 1.0 {
        log::info!("relative intrinsics; scaling by {width}x{height}");
        parameters[0] *= width as f64;
        parameters[1] *= height as f64;
        parameters[2] = parameters[2] * width as f64 - 0.5;
        parameters[3] = parameters[3] * height as f64 - 0.5;
    }

    Ok((parameters, width, height))
}

fn parse_size(path: &Path, line: &str) -> Result<(u32, u32), CorrectionError> {
    let mut tokens = line.split_whitespace().map(|t| t.parse::<u32>());
    match (tokens.next(), tokens.next()) {
        (Some(Ok(w)), Some(Ok(h))) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(CorrectionError::invalid(
            path,
            format!("bad image size line '{line}'"),
        )),
    }
}

/// Inverse response: 256 strictly increasing values, rescaled to 0..255.
fn load_response(path: &Path) -> Result<Vec<f32>, CorrectionError> {
    let text = read_text(path)?;
    let first = text.lines().next().unwrap_or_default();
    let mut values = first
        .split_whitespace()
        .map(|t| t.parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CorrectionError::invalid(path, format!("bad response value: {e}")))?;
    if values.len() != GAMMA_ENTRIES {
        return Err(CorrectionError::invalid(
            path,
            format!("got {} response entries, expected {GAMMA_ENTRIES}", values.len()),
        ));
    }
    if values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CorrectionError::invalid(
            path,
            "response has to be strictly increasing",
        ));
    }

    let min = values[0];
    let max = values[GAMMA_ENTRIES - 1];
    for v in values.iter_mut() {
        *v = 255.0 * (*v - min) / (max - min);
    }
    Ok(values)
}

/// Vignette image normalised by its maximum, stored inverted.
fn load_vignette(path: &Path, width: u32, height: u32) -> Result<Vec<f32>, CorrectionError> {
    let image = image::open(path)
        .map_err(|source| CorrectionError::Vignette {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma16();
    if image.dimensions() != (width, height) {
        return Err(CorrectionError::invalid(
            path,
            format!(
                "vignette is {}x{}, frames are {width}x{height}",
                image.width(),
                image.height()
            ),
        ));
    }
    let max = image.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if image.pixels().any(|p| p.0[0] == 0) {
        return Err(CorrectionError::invalid(path, "vignette has zero pixels"));
    }
    Ok(image
        .pixels()
        .map(|p| max as f32 / p.0[0] as f32)
        .collect())
}
