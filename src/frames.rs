//! Decoding animated inputs into frame sequences.

use std::{fs::File, io::BufReader, path::Path};

use image::{
    codecs::gif::GifDecoder, codecs::webp::WebPDecoder, AnimationDecoder, ImageResult, RgbaImage,
};
use tracing::debug;

use crate::{
    files::get_filename,
    sequence::{stride_indices, FrameSequence},
    Error, Result,
};

const MS_PER_SEC: f64 = 1000.0;
/// Per-frame delay assumed when the source stores none, matching what most
/// viewers do with zero-delay animations.
const FALLBACK_DELAY_MS: f64 = 100.0;

fn collect_animation<'a, D: AnimationDecoder<'a>>(
    decoder: D,
) -> ImageResult<(Vec<RgbaImage>, Vec<f64>)> {
    let mut images = Vec::new();
    let mut delays_ms = Vec::new();
    for frame in decoder.into_frames().collect_frames()? {
        let (numer, denom) = frame.delay().numer_denom_ms();
        delays_ms.push(f64::from(numer) / f64::from(denom.max(1)));
        images.push(frame.into_buffer());
    }
    Ok((images, delays_ms))
}

/// Resamples the native frames to the count the target rate calls for, by
/// uniform stride: dropped when the source timing implies more frames than
/// needed, duplicated when fewer.
fn resample(frames: Vec<RgbaImage>, delays_ms: &[f64], fps: u32) -> Vec<RgbaImage> {
    let total_ms: f64 = delays_ms
        .iter()
        .map(|&d| if d > 0.0 { d } else { FALLBACK_DELAY_MS })
        .sum();
    let target = ((total_ms / MS_PER_SEC) * f64::from(fps)).round() as usize;
    let target = target.max(1);
    if target == frames.len() {
        return frames;
    }
    stride_indices(frames.len(), target)
        .into_iter()
        .map(|i| frames[i].clone())
        .collect()
}

/// Decodes all frames of one animated image in original order and resamples
/// them to the desired rate.
pub fn extract(path: &Path, fps: u32) -> Result<FrameSequence> {
    if !path.is_file() {
        return Err(Error::NotAFile { path: path.into() });
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let decode_err = |source| Error::Decode {
        path: path.into(),
        source,
    };
    let (frames, delays_ms) = match extension.as_str() {
        "gif" => {
            let reader = BufReader::new(File::open(path)?);
            let decoder = GifDecoder::new(reader).map_err(decode_err)?;
            collect_animation(decoder).map_err(decode_err)?
        }
        "webp" => {
            let reader = BufReader::new(File::open(path)?);
            let decoder = WebPDecoder::new(reader).map_err(decode_err)?;
            collect_animation(decoder).map_err(decode_err)?
        }
        _ => return Err(Error::UnsupportedFormat { path: path.into() }),
    };
    if frames.len() < 2 {
        return Err(Error::NotAnimated { path: path.into() });
    }
    let native = frames.len();
    let resampled = resample(frames, &delays_ms, fps);
    debug!(
        "{}: {} native frame(s) resampled to {} at {} fps",
        get_filename(&path),
        native,
        resampled.len(),
        fps
    );
    FrameSequence::new(resampled, fps)
}
