//! Settings layered from config files and command-line arguments, the
//! command line winning.

use clap::Parser;
use config::{builder::DefaultState, Config, ConfigBuilder, File as ConfigFile};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Result;

const LOCAL_CONFIG_FILE: &str = ".mk-videos.yaml";
const BASE_CONFIG_FILE: &str = "mk-videos.yaml";

#[derive(Debug, Parser, Clone)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = env!("CARGO_PKG_DESCRIPTION")
)]
struct Cli {
    /// Animated image files to convert. When omitted, every animated
    /// .gif/.webp in the current directory is processed in natural order.
    #[arg(value_name = "FILE")]
    input: Vec<PathBuf>,
    /// Frames per second of the output video
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps: Option<u32>,
    /// Split each converted video in two at this percentage of its frame count
    #[arg(long, value_name = "1-99", value_parser = clap::value_parser!(u32).range(1..=99))]
    percent: Option<u32>,
    /// Directory for output files, created if absent
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// After converting, concatenate all outputs into this file
    #[arg(long, value_name = "NAME")]
    combine: Option<String>,
    /// Reverse the frame order before encoding
    #[arg(long)]
    reverse: bool,
    /// Append the reversed sequence so the video plays forward then backward
    #[arg(long = "loop")]
    ping_pong: bool,
    /// Also write log output to mk-videos.log
    #[arg(long)]
    log: bool,
    #[arg(short, long)]
    verbose: bool,
    /// The configuration file to use. If provided, no other config files will
    /// be loaded.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Settings {
    fps: u32,
    #[serde(default)]
    percent: Option<u32>,
    reverse: bool,
    ping_pong: bool,
    #[serde(default)]
    combine: Option<String>,
    log_to_file: bool,
    verbose: bool,
    out_dir: PathBuf,
    #[serde(skip)]
    input: Vec<PathBuf>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let args = Cli::try_parse()?;
        let mut builder = Self::default_config()?;
        if let Some(config_file) = &args.config {
            builder = builder.add_source(ConfigFile::from(config_file.as_path()));
        } else {
            builder = Self::add_base_file(builder)?;
            let local = Path::new(LOCAL_CONFIG_FILE);
            if local.exists() {
                builder = builder.add_source(ConfigFile::from(local));
            }
        }
        let mut settings: Self = builder.build()?.try_deserialize()?;
        settings.merge_cli_args(args);
        Ok(settings)
    }

    fn default_config() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("fps", 20)?
            .set_default("reverse", false)?
            .set_default("ping_pong", false)?
            .set_default("log_to_file", false)?
            .set_default("verbose", false)?
            .set_default("out_dir", ".")?)
    }

    /// Loads the per-user config file, writing one with the defaults first if
    /// it doesn't exist yet.
    fn add_base_file(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>> {
        let dirs = match BaseDirs::new() {
            Some(dirs) => dirs,
            None => return Ok(builder),
        };
        let config_dir = dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }
        let config_path = config_dir.join(BASE_CONFIG_FILE);
        if !config_path.exists() {
            let defaults: Self = Self::default_config()?.build()?.try_deserialize()?;
            fs::write(&config_path, serde_yaml::to_vec(&defaults)?)?;
            Ok(builder)
        } else {
            Ok(builder.add_source(ConfigFile::from(config_path)))
        }
    }

    fn merge_cli_args(&mut self, args: Cli) {
        if let Some(fps) = args.fps {
            self.fps = fps;
        }
        if args.percent.is_some() {
            self.percent = args.percent;
        }
        if let Some(output) = args.output {
            self.out_dir = output;
        }
        if args.combine.is_some() {
            self.combine = args.combine;
        }
        if args.reverse {
            self.reverse = true;
        }
        if args.ping_pong {
            self.ping_pong = true;
        }
        if args.log {
            self.log_to_file = true;
        }
        if args.verbose {
            self.verbose = true;
        }
        self.input = args.input;
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn percent(&self) -> Option<u32> {
        self.percent
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn ping_pong(&self) -> bool {
        self.ping_pong
    }

    pub fn combine(&self) -> Option<&str> {
        self.combine.as_deref()
    }

    pub fn log_to_file(&self) -> bool {
        self.log_to_file
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn out_dir(&self) -> &Path {
        self.out_dir.as_ref()
    }

    pub fn input(&self) -> &[PathBuf] {
        &self.input
    }
}

#[cfg(test)]
impl Settings {
    pub(crate) fn for_tests(out_dir: PathBuf) -> Self {
        Self {
            fps: 20,
            percent: None,
            reverse: false,
            ping_pong: false,
            combine: None,
            log_to_file: false,
            verbose: false,
            out_dir,
            input: vec![],
        }
    }

    pub(crate) fn with_percent(mut self, percent: u32) -> Self {
        self.percent = Some(percent);
        self
    }

    pub(crate) fn with_combine(mut self, name: &str) -> Self {
        self.combine = Some(name.into());
        self
    }

    pub(crate) fn with_reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub(crate) fn with_ping_pong(mut self) -> Self {
        self.ping_pong = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Settings {
        Settings::default_config()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = defaults();
        assert_eq!(settings.fps(), 20);
        assert_eq!(settings.percent(), None);
        assert!(!settings.reverse());
        assert!(!settings.ping_pong());
        assert_eq!(settings.combine(), None);
        assert!(!settings.log_to_file());
        assert_eq!(settings.out_dir(), Path::new("."));
        assert!(settings.input().is_empty());
    }

    #[test]
    fn cli_args_override_defaults() {
        let args = Cli::parse_from([
            "mk-videos",
            "--fps",
            "24",
            "--percent",
            "50",
            "--output",
            "videos",
            "--combine",
            "all.mp4",
            "--reverse",
            "--loop",
            "--log",
            "a.webp",
            "b.gif",
        ]);
        let mut settings = defaults();
        settings.merge_cli_args(args);
        assert_eq!(settings.fps(), 24);
        assert_eq!(settings.percent(), Some(50));
        assert_eq!(settings.out_dir(), Path::new("videos"));
        assert_eq!(settings.combine(), Some("all.mp4"));
        assert!(settings.reverse());
        assert!(settings.ping_pong());
        assert!(settings.log_to_file());
        assert_eq!(
            settings.input(),
            &[PathBuf::from("a.webp"), PathBuf::from("b.gif")]
        );
    }

    #[test]
    fn unset_cli_args_keep_config_values() {
        let args = Cli::parse_from(["mk-videos"]);
        let mut settings = defaults().with_percent(30).with_combine("joined.mp4");
        settings.merge_cli_args(args);
        assert_eq!(settings.percent(), Some(30));
        assert_eq!(settings.combine(), Some("joined.mp4"));
    }

    #[test]
    fn percent_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["mk-videos", "--percent", "0"]).is_err());
        assert!(Cli::try_parse_from(["mk-videos", "--percent", "100"]).is_err());
        assert!(Cli::try_parse_from(["mk-videos", "--percent", "99"]).is_ok());
    }

    #[test]
    fn fps_of_zero_is_rejected() {
        assert!(Cli::try_parse_from(["mk-videos", "--fps", "0"]).is_err());
    }
}
