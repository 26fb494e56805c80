use mk_videos::{encoder::FfmpegCli, files, process, settings::Settings, Error, Result};
use std::fs::DirBuilder;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

const LOG_FILE: &str = "mk-videos.log";

#[cfg(all(debug_assertions, feature = "pretty-errors"))]
fn _init_pretty_errors() -> Result<()> {
    if let Err(std::env::VarError::NotPresent) = std::env::var("RUST_BACKTRACE") {
        color_backtrace::BacktracePrinter::new()
            .verbosity(color_backtrace::Verbosity::Full)
            .install(color_backtrace::default_output_stream())
    } else {
        color_backtrace::install();
    }
    color_eyre::install()?;
    Ok(())
}

#[cfg(all(not(debug_assertions), feature = "pretty-errors"))]
fn _init_pretty_errors() -> Result<()> {
    color_backtrace::install();
    color_eyre::install()?;
    Ok(())
}

#[cfg(not(feature = "pretty-errors"))]
fn _init_pretty_errors() -> Result<()> {
    Ok(())
}

fn init() -> Result<()> {
    dotenv::dotenv().ok();
    _init_pretty_errors()?;
    Ok(())
}

fn init_logging(settings: &Settings) -> Result<()> {
    let default_directive = if settings.verbose() {
        "mk_videos=debug"
    } else {
        "mk_videos=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);
    if settings.log_to_file() {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)?;
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Arc::new(log_file)),
            )
            .init();
    } else {
        registry.init();
    }
    Ok(())
}

fn run(settings: &Settings) -> Result<()> {
    if !settings.out_dir().exists() {
        info!(
            "Out directory {} doesn't exist. Creating...",
            settings.out_dir().display()
        );
        DirBuilder::new()
            .recursive(true)
            .create(settings.out_dir())?;
    }
    debug!("Settings: {:#?}", settings);
    let inputs = files::get_inputs_to_process(settings)?;
    if inputs.is_empty() {
        info!("No animated image files found. Nothing to do.");
        return Ok(());
    }
    let summary = process::convert_all(settings, &FfmpegCli, inputs)?;
    summary.report();
    Ok(())
}

fn main() -> Result<()> {
    init()?;
    match Settings::load() {
        Ok(settings) => {
            init_logging(&settings)?;
            run(&settings)
        }
        Err(error) => {
            if let Error::Clap { source: e } = error {
                if matches!(
                    e.kind(),
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
                ) {
                    e.print()?;
                    Ok(())
                } else {
                    Err(e.into())
                }
            } else {
                Err(error)
            }
        }
    }
}
