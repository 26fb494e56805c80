//! The sequential conversion pipeline and its end-of-run summary.

use std::path::{Path, PathBuf};

use itertools::Itertools as _;
use tracing::{error, info, warn};

use crate::{
    encoder::Encoder,
    files::{get_file_stem, get_filename, natural_sort},
    frames,
    settings::Settings,
    Error, Result,
};

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Every video written, in the order it was produced.
    pub outputs: Vec<PathBuf>,
    /// Inputs (or the combine target) that failed, with the reason.
    pub failures: Vec<(PathBuf, Error)>,
    /// The combined video, when requested and successful.
    pub combined: Option<PathBuf>,
}

impl RunSummary {
    pub fn report(&self) {
        info!("{} video(s) written.", self.outputs.len());
        if let Some(combined) = &self.combined {
            info!("Combined into {}.", combined.display());
        }
        if !self.failures.is_empty() {
            // Failure paths come straight from the user and may have no file
            // name component, so don't assume one.
            let details = self
                .failures
                .iter()
                .map(|(path, err)| format!("{}: {}", path.display(), err))
                .join("; ");
            warn!("{} file(s) failed: {}", self.failures.len(), details);
        }
    }
}

/// Converts one input into one or two videos: extract, apply the reverse and
/// ping-pong transforms, then split by percent and encode each segment.
fn convert_one<E: Encoder>(
    settings: &Settings,
    encoder: &E,
    path: &Path,
) -> Result<Vec<PathBuf>> {
    let mut sequence = frames::extract(path, settings.fps())?;
    if settings.reverse() {
        sequence = sequence.reversed();
    }
    if settings.ping_pong() {
        sequence = sequence.ping_pong();
    }
    let segments = match settings.percent() {
        Some(percent) => sequence.split_percent(percent),
        None => vec![sequence],
    };
    let stem = get_file_stem(&path);
    let mut outputs = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let out_path = settings
            .out_dir()
            .join(format!("{}_part{}.mp4", stem, index + 1));
        info!(
            "Writing {} ({} frame(s) at {} fps)",
            get_filename(&out_path),
            segment.len(),
            segment.fps()
        );
        encoder.encode(segment, &out_path)?;
        outputs.push(out_path);
    }
    Ok(outputs)
}

fn combine_target(settings: &Settings, name: &str) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        path
    } else {
        settings.out_dir().join(path)
    }
}

/// Processes every input in order, one at a time. A failure is recorded and
/// the run moves on; the combine step, if requested, runs last over the
/// natural-sorted outputs and never disturbs them on failure.
pub fn convert_all<E: Encoder>(
    settings: &Settings,
    encoder: &E,
    inputs: Vec<PathBuf>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for path in &inputs {
        info!("Converting {}", path.display());
        match convert_one(settings, encoder, path) {
            Ok(outputs) => summary.outputs.extend(outputs),
            Err(err) => {
                error!("{} failed: {}", path.display(), err);
                summary.failures.push((path.clone(), err));
            }
        }
    }
    if let Some(name) = settings.combine() {
        if summary.outputs.is_empty() {
            warn!("No videos were produced; nothing to combine.");
        } else {
            let mut to_combine = summary.outputs.clone();
            natural_sort(&mut to_combine);
            let target = combine_target(settings, name);
            info!(
                "Combining {} video(s) into {}",
                to_combine.len(),
                target.display()
            );
            match encoder.concatenate(&to_combine, &target) {
                Ok(()) => summary.combined = Some(target),
                Err(err) => {
                    error!("Combine failed: {}", err);
                    summary.failures.push((target, err));
                }
            }
        }
    }
    Ok(summary)
}
