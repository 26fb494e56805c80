//! Frame sequences and the pure transforms applied to them before encoding.

use crate::{Error, Result};
use derivative::Derivative;
use image::RgbaImage;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone)]
pub struct Dimensions(pub u32, pub u32);

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self(width, height)
    }
    pub fn width(&self) -> u32 {
        self.0
    }
    pub fn height(&self) -> u32 {
        self.1
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

impl PartialEq for Dimensions {
    fn eq(&self, other: &Dimensions) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }
}

/// An ordered, non-empty list of decoded frames that all share one size, plus
/// the rate they should play back at.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct FrameSequence {
    #[derivative(Debug = "ignore")]
    frames: Vec<RgbaImage>,
    fps: u32,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbaImage>, fps: u32) -> Result<Self> {
        let first = match frames.first() {
            Some(frame) => Dimensions::new(frame.width(), frame.height()),
            None => return Err(Error::EmptySequence),
        };
        for frame in &frames {
            let dimensions = Dimensions::new(frame.width(), frame.height());
            if dimensions != first {
                return Err(Error::MixedFrameSizes {
                    expected: first.to_string(),
                    got: dimensions.to_string(),
                });
            }
        }
        Ok(Self { frames, fps })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        // Invariant: never empty. Kept so clippy's len-without-is_empty holds.
        self.frames.is_empty()
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.frames[0].width(), self.frames[0].height())
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// The same sequence with the frame order inverted.
    pub fn reversed(&self) -> Self {
        Self {
            frames: self.frames.iter().rev().cloned().collect(),
            fps: self.fps,
        }
    }

    /// The sequence followed by its reverse, playing forward then backward.
    ///
    /// The turnaround frame is not played twice, so the result holds
    /// `2 * len - 1` frames and its first `len` frames equal the input.
    pub fn ping_pong(&self) -> Self {
        let mut frames = self.frames.clone();
        frames.extend(self.frames[..self.len() - 1].iter().rev().cloned());
        Self {
            frames,
            fps: self.fps,
        }
    }

    /// Splits at `round(len * percent / 100)` into two sequences whose
    /// concatenation reconstructs the input. A split landing at either end
    /// degenerates to a single segment.
    pub fn split_percent(&self, percent: u32) -> Vec<Self> {
        let index = (self.len() as f64 * f64::from(percent) / 100.0).round() as usize;
        if index == 0 || index >= self.len() {
            return vec![self.clone()];
        }
        let (first, second) = self.frames.split_at(index);
        vec![
            Self {
                frames: first.to_vec(),
                fps: self.fps,
            },
            Self {
                frames: second.to_vec(),
                fps: self.fps,
            },
        ]
    }
}

/// Source indices for stride-resampling `source` frames down or up to
/// `target` frames: index `i` of the output maps to `i * source / target`.
pub fn stride_indices(source: usize, target: usize) -> Vec<usize> {
    (0..target).map(|i| i * source / target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 2, Rgba([value, value, value, 255]))
    }

    fn sequence(len: u8) -> FrameSequence {
        FrameSequence::new((0..len).map(solid).collect(), 20).unwrap()
    }

    #[test]
    fn new_rejects_empty() {
        assert!(matches!(
            FrameSequence::new(vec![], 20),
            Err(Error::EmptySequence)
        ));
    }

    #[test]
    fn new_rejects_mixed_sizes() {
        let frames = vec![solid(0), RgbaImage::new(2, 2)];
        assert!(matches!(
            FrameSequence::new(frames, 20),
            Err(Error::MixedFrameSizes { .. })
        ));
    }

    #[test]
    fn reverse_is_an_involution() {
        let seq = sequence(7);
        let back = seq.reversed().reversed();
        assert_eq!(seq.frames(), back.frames());
    }

    #[test]
    fn reverse_inverts_order() {
        let seq = sequence(3).reversed();
        assert_eq!(seq.frames()[0], solid(2));
        assert_eq!(seq.frames()[2], solid(0));
    }

    #[test]
    fn ping_pong_pins_length() {
        let seq = sequence(5);
        let looped = seq.ping_pong();
        assert_eq!(looped.len(), 2 * seq.len() - 1);
        assert_eq!(&looped.frames()[..seq.len()], seq.frames());
        // Turnaround frame appears once, then the walk back down.
        assert_eq!(looped.frames()[5], solid(3));
        assert_eq!(looped.frames()[8], solid(0));
    }

    #[test]
    fn ping_pong_of_one_frame_is_one_frame() {
        assert_eq!(sequence(1).ping_pong().len(), 1);
    }

    #[test]
    fn split_percent_reconstructs_input() {
        let seq = sequence(10);
        let segments = seq.split_percent(25);
        assert_eq!(segments.len(), 2);
        // round(10 * 25 / 100) = round(2.5) = 3
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1].len(), 7);
        let rejoined: Vec<_> = segments
            .iter()
            .flat_map(|s| s.frames().iter().cloned())
            .collect();
        assert_eq!(&rejoined[..], seq.frames());
    }

    #[test]
    fn split_percent_at_either_end_is_one_segment() {
        let seq = sequence(4);
        // round(4 * 10 / 100) = 0
        assert_eq!(seq.split_percent(10).len(), 1);
        // round(4 * 95 / 100) = 4
        assert_eq!(seq.split_percent(95).len(), 1);
    }

    #[test]
    fn stride_drops_every_other_frame() {
        let indices = stride_indices(40, 20);
        let expected: Vec<usize> = (0..40).step_by(2).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn stride_duplicates_uniformly() {
        assert_eq!(stride_indices(3, 6), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn stride_is_identity_when_counts_match() {
        assert_eq!(stride_indices(5, 5), vec![0, 1, 2, 3, 4]);
    }
}
