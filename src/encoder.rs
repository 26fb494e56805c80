//! Video encoding and concatenation, delegated to the `ffmpeg` binary.

use std::{
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use image::ImageFormat;
use snafu::whatever;
use tracing::debug;

use crate::{
    files::get_filename,
    sequence::{Dimensions, FrameSequence},
    Error, Result,
};

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

/// The capability the pipeline needs from a video backend. Narrow on purpose,
/// so discovery, extraction, and sequencing stay testable without running a
/// real encoder.
pub trait Encoder {
    /// Writes the sequence as one video file at the sequence's frame rate.
    fn encode(&self, sequence: &FrameSequence, path: &Path) -> Result<()>;
    /// Concatenates already-encoded videos in the given order by stream copy.
    /// All inputs must share codec parameters; on failure no output file is
    /// left behind.
    fn concatenate(&self, inputs: &[PathBuf], path: &Path) -> Result<()>;
}

/// Encodes by staging frames as PNGs in a scratch directory and handing them
/// to the external `ffmpeg` binary (libx264 in an MP4 container).
#[derive(Debug, Default)]
pub struct FfmpegCli;

#[derive(Debug, PartialEq)]
struct StreamParams {
    codec: String,
    dimensions: Dimensions,
}

impl Display for StreamParams {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {}", self.codec, self.dimensions)
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn parse_stream_params(text: &str) -> Option<StreamParams> {
    // ffprobe csv=p=0 output: "h264,640,480"
    let mut fields = text.trim().split(',');
    let codec = fields.next()?.to_string();
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;
    Some(StreamParams {
        codec,
        dimensions: Dimensions::new(width, height),
    })
}

fn probe(path: &Path) -> Result<StreamParams> {
    let output = Command::new(FFPROBE)
        .args(["-v", "error", "-select_streams", "v:0"])
        .args(["-show_entries", "stream=codec_name,width,height"])
        .args(["-of", "csv=p=0"])
        .arg(path)
        .stdin(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(Error::Probe {
            path: path.into(),
            detail: stderr_text(&output),
        });
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_stream_params(&text).ok_or_else(|| Error::Probe {
        path: path.into(),
        detail: format!("unexpected probe output: {}", text.trim()),
    })
}

/// Every input must match the first one's codec and resolution; the first
/// mismatch is reported by name.
fn check_compatible(inputs: &[PathBuf]) -> Result<()> {
    let mut reference: Option<(&PathBuf, StreamParams)> = None;
    for input in inputs {
        let params = probe(input)?;
        if let Some((first, expected)) = &reference {
            if *expected != params {
                return Err(Error::CombineIncompatible {
                    detail: format!(
                        "{} is {}, but {} is {}",
                        get_filename(first),
                        expected,
                        get_filename(input),
                        params
                    ),
                });
            }
        } else {
            reference = Some((input, params));
        }
    }
    Ok(())
}

/// Builds the concat demuxer manifest, one `file '...'` line per input.
fn concat_manifest(inputs: &[PathBuf]) -> Result<String> {
    let mut manifest = String::new();
    for input in inputs {
        let absolute = input.canonicalize()?;
        // A single quote inside a quoted demuxer path must be closed,
        // escaped, and reopened.
        let escaped = absolute.to_string_lossy().replace('\'', r"'\''");
        manifest.push_str(&format!("file '{}'\n", escaped));
    }
    Ok(manifest)
}

impl Encoder for FfmpegCli {
    fn encode(&self, sequence: &FrameSequence, path: &Path) -> Result<()> {
        let staging = tempfile::tempdir()?;
        for (index, frame) in sequence.frames().iter().enumerate() {
            let frame_path = staging.path().join(format!("frame-{:05}.png", index));
            frame.save_with_format(frame_path, ImageFormat::Png)?;
        }
        let pattern = staging.path().join("frame-%05d.png");
        debug!(
            "Encoding {} frame(s) at {} fps into {}",
            sequence.len(),
            sequence.fps(),
            path.display()
        );
        let output = Command::new(FFMPEG)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-framerate")
            .arg(sequence.fps().to_string())
            .arg("-i")
            .arg(&pattern)
            .args(["-c:v", "libx264", "-preset", "ultrafast", "-crf", "23"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(Error::Encode {
                path: path.into(),
                detail: stderr_text(&output),
            });
        }
        Ok(())
    }

    fn concatenate(&self, inputs: &[PathBuf], path: &Path) -> Result<()> {
        if inputs.is_empty() {
            whatever!("No videos to combine.");
        }
        check_compatible(inputs)?;
        let staging = tempfile::tempdir()?;
        let manifest_path = staging.path().join("concat.txt");
        fs::write(&manifest_path, concat_manifest(inputs)?)?;
        debug!(
            "Concatenating {} video(s) into {}",
            inputs.len(),
            path.display()
        );
        let output = Command::new(FFMPEG)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest_path)
            .args(["-c", "copy"])
            .arg(path)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            // Never leave a partial combined file behind.
            let _ = fs::remove_file(path);
            return Err(Error::Combine {
                path: path.into(),
                detail: stderr_text(&output),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_parse_stream_params() {
        let params = parse_stream_params("h264,640,480\n").unwrap();
        assert_eq!(params.codec, "h264");
        assert_eq!(params.dimensions, Dimensions::new(640, 480));
        assert_eq!(params.to_string(), "h264 640x480");

        assert!(parse_stream_params("").is_none());
        assert!(parse_stream_params("h264,wide,480").is_none());
        assert!(parse_stream_params("h264,640").is_none());
    }

    #[test]
    fn stream_params_equality_is_codec_and_resolution() {
        let a = parse_stream_params("h264,640,480").unwrap();
        let b = parse_stream_params("h264,640,480").unwrap();
        let c = parse_stream_params("h264,1280,720").unwrap();
        let d = parse_stream_params("hevc,640,480").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn manifest_lists_inputs_in_order_and_escapes_quotes() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("clip_part1.mp4");
        let quoted = dir.path().join("it's.mp4");
        File::create(&plain).unwrap();
        File::create(&quoted).unwrap();

        let manifest = concat_manifest(&[plain.clone(), quoted.clone()]).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].contains("clip_part1.mp4"));
        assert!(lines[1].contains(r"it'\''s.mp4"));
    }

    #[test]
    fn manifest_requires_existing_inputs() {
        assert!(concat_manifest(&[PathBuf::from("missing.mp4")]).is_err());
    }
}
