use clap::Error as ClapError;
use config::ConfigError;
use eyre::Report as ReportError;
use image::ImageError;
use serde_yaml::Error as YamlError;
use snafu::Snafu;
use std::{io::Error as IoError, path::PathBuf};

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(transparent)]
    Io { source: IoError },
    #[snafu(transparent)]
    Yaml { source: YamlError },
    #[snafu(transparent)]
    Image { source: ImageError },
    #[snafu(display("{} is not a file!", path.display()))]
    NotAFile { path: PathBuf },
    #[snafu(display("{} is not an animated image.", path.display()))]
    NotAnimated { path: PathBuf },
    #[snafu(display("{} is not a supported animated image format.", path.display()))]
    UnsupportedFormat { path: PathBuf },
    #[snafu(display("Could not decode {}: {source}", path.display()))]
    Decode { path: PathBuf, source: ImageError },
    #[snafu(display("Decoded to an empty frame sequence."))]
    EmptySequence,
    #[snafu(display("Frame sizes differ: expected {expected}, got {got}."))]
    MixedFrameSizes { expected: String, got: String },
    #[snafu(display("ffmpeg failed writing {}: {detail}", path.display()))]
    Encode { path: PathBuf, detail: String },
    #[snafu(display("ffprobe could not read {}: {detail}", path.display()))]
    Probe { path: PathBuf, detail: String },
    #[snafu(display("Cannot combine incompatible streams: {detail}"))]
    CombineIncompatible { detail: String },
    #[snafu(display("ffmpeg failed combining into {}: {detail}", path.display()))]
    Combine { path: PathBuf, detail: String },
    #[snafu(transparent)]
    Report { source: ReportError },
    #[snafu(transparent)]
    Clap { source: ClapError },
    #[snafu(transparent)]
    Config { source: ConfigError },
    #[snafu(whatever, display("{message}"))]
    Other { message: String },
}

pub type Result<V> = std::result::Result<V, Error>;
