#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod encoder;
pub mod files;
pub mod frames;
pub mod process;
pub mod sequence;
pub mod settings;

mod error;
pub use error::{Error, Result};
