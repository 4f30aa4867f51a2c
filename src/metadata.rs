//! Sidecar frame metadata (`times.txt`).
//!
//! One frame per line, either `<id> <timestamp> <exposure>` or
//! `<id> <timestamp>`. Lines matching neither shape are skipped.
//!
//! An exposure of exactly 0 is a placeholder. Placeholders are repaired by
//! averaging the positive neighbours; an unrepairable placeholder invalidates
//! the whole exposure set. Discarding is two-tier: a timestamp count that
//! disagrees with the frame count drops everything, while bad exposures only
//! drop exposures. Nothing here fails; problems degrade to fallbacks.

use std::io::BufRead;
use std::path::Path;

/// Which metadata survived loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataStatus {
    /// Timestamps and exposures for every frame.
    Complete,
    /// Timestamps only; exposures default to 1.0.
    TimestampsOnly,
    /// Nothing usable; timestamps are synthesised as `id * 0.1`.
    Synthetic,
}

/// Per-frame timestamps and exposures.
///
/// Invariant: each sequence is either empty or exactly one entry per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMetadata {
    timestamps: Vec<f64>,
    exposures: Vec<f32>,
}

impl FrameMetadata {
    /// Load `path`, expecting `expected_count` frames. A missing or unreadable
    /// file yields empty metadata.
    pub fn load(path: &Path, expected_count: usize) -> Self {
        let metadata = match std::fs::File::open(path) {
            Ok(file) => Self::parse(std::io::BufReader::new(file), expected_count),
            Err(e) => {
                log::warn!("no frame metadata at {}: {}", path.display(), e);
                Self::default()
            }
        };
        log::info!(
            "got {} images and {} timestamps and {} exposures",
            expected_count,
            metadata.timestamps.len(),
            metadata.exposures.len()
        );
        metadata
    }

    /// Parse metadata lines and apply the repair and discard policy.
    pub fn parse<R: BufRead>(reader: R, expected_count: usize) -> Self {
        let mut timestamps = Vec::new();
        let mut exposures = Vec::new();
        for line in reader.split(b'\n') {
            let Ok(line) = line else {
                break;
            };
            if let Some((timestamp, exposure)) = parse_line(&String::from_utf8_lossy(&line)) {
                timestamps.push(timestamp);
                exposures.push(exposure);
            }
        }

        let mut exposures_good = exposures.len() == expected_count;
        if !repair_exposures(&mut exposures) {
            exposures_good = false;
        }

        if timestamps.len() != expected_count {
            log::warn!(
                "got {} timestamps for {} images. set timestamps and exposures to zero!",
                timestamps.len(),
                expected_count
            );
            timestamps.clear();
            exposures.clear();
        }
        if exposures.len() != expected_count || !exposures_good {
            if !exposures.is_empty() {
                log::warn!("exposures incomplete or unrepairable. set EXPOSURES to zero!");
            }
            exposures.clear();
        }

        Self {
            timestamps,
            exposures,
        }
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn exposures(&self) -> &[f32] {
        &self.exposures
    }

    pub fn status(&self) -> MetadataStatus {
        match (self.timestamps.is_empty(), self.exposures.is_empty()) {
            (false, false) => MetadataStatus::Complete,
            (false, true) => MetadataStatus::TimestampsOnly,
            _ => MetadataStatus::Synthetic,
        }
    }

    /// Exposure handed to correction: 1.0 when no exposures survived.
    pub fn exposure_or_default(&self, id: usize) -> f32 {
        if self.exposures.is_empty() {
            1.0
        } else {
            self.exposures.get(id).copied().unwrap_or(1.0)
        }
    }

    /// Timestamp handed to correction: 0.0 when no timestamps survived.
    pub fn timestamp_or_default(&self, id: usize) -> f64 {
        self.timestamps.get(id).copied().unwrap_or(0.0)
    }
}

/// `<id> <timestamp> [<exposure>]`; a missing or malformed exposure reads as 0.
fn parse_line(line: &str) -> Option<(f64, f32)> {
    let mut fields = line.split_whitespace();
    fields.next()?.parse::<i64>().ok()?;
    let timestamp = fields.next()?.parse::<f64>().ok()?;
    let exposure = fields
        .next()
        .and_then(|field| field.parse::<f32>().ok())
        .unwrap_or(0.0);
    Some((timestamp, exposure))
}

/// Fill zero exposures in place from their positive neighbours. Returns false
/// when a zero could not be repaired.
fn repair_exposures(exposures: &mut [f32]) -> bool {
    let mut all_repaired = true;
    for i in 0..exposures.len() {
        if exposures[i] == 0.0 {
            let mut sum = 0.0;
            let mut num = 0.0;
            if i > 0 && exposures[i - 1] > 0.0 {
                sum += exposures[i - 1];
                num += 1.0;
            }
            if i + 1 < exposures.len() && exposures[i + 1] > 0.0 {
                sum += exposures[i + 1];
                num += 1.0;
            }
            if num > 0.0 {
                exposures[i] = sum / num;
            }
        }
        if exposures[i] == 0.0 {
            all_repaired = false;
        }
    }
    all_repaired
}
