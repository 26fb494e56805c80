//! Items dealing with files: input discovery and name ordering.
use std::{
    cmp::Ordering,
    fs::read_dir,
    path::{Path, PathBuf},
};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use itertools::Itertools as _;

use crate::{settings::Settings, Result};

lazy_static::lazy_static! {
    static ref ANIMATED_GLOBS: GlobSet = {
        let mut builder = GlobSetBuilder::new();
        for pattern in ["*.gif", "*.webp"] {
            builder.add(
                GlobBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap(),
            );
        }
        builder.build().unwrap()
    };
}

/// A convenience function to get the file name from a path as a string.
pub fn get_filename<P: AsRef<Path>>(path: &P) -> &str {
    path.as_ref().file_name().unwrap().to_str().unwrap()
}

/// A convenience function to get the file stem from a path as a string.
pub fn get_file_stem<P: AsRef<Path>>(path: &P) -> &str {
    path.as_ref().file_stem().unwrap().to_str().unwrap()
}

pub fn mime_filter(mime_type: &'static mime::Name<'static>) -> Box<dyn Fn(&PathBuf) -> bool> {
    let mime_type = *mime_type;
    Box::new(move |path| {
        mime_guess::from_path(path)
            .into_iter()
            .any(|g| g.type_() == mime_type)
    })
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    // Variant order matters: digit runs sort before everything else.
    Number(u128),
    Text(String),
}

fn natural_key(name: &str) -> Vec<KeyPart> {
    // itertools 0.12 name; 0.13 renames this to chunk_by.
    let runs = name.chars().group_by(|c| c.is_ascii_digit());
    let mut parts = Vec::new();
    for (is_digit, run) in &runs {
        let run: String = run.collect();
        parts.push(if is_digit {
            KeyPart::Number(run.parse().unwrap_or(u128::MAX))
        } else {
            KeyPart::Text(run.to_lowercase())
        });
    }
    parts
}

/// Compares file names so that numbered sequences order the way a human
/// expects: `part2` before `part10`.
pub fn natural_cmp<P: AsRef<Path>>(left: &P, right: &P) -> Ordering {
    natural_key(get_filename(left)).cmp(&natural_key(get_filename(right)))
}

pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by(natural_cmp);
}

fn animated_images_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let image_filter = mime_filter(&mime::IMAGE);
    let mut candidates: Vec<PathBuf> = read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(&image_filter)
        .filter(|p| ANIMATED_GLOBS.is_match(get_filename(p)))
        .collect();
    natural_sort(&mut candidates);
    Ok(candidates)
}

/// The inputs for this run: the explicitly named files in their given order,
/// or every animated image in the current directory, natural-sorted.
pub fn get_inputs_to_process(settings: &Settings) -> Result<Vec<PathBuf>> {
    if !settings.input().is_empty() {
        return Ok(settings.input().to_vec());
    }
    animated_images_in(Path::new("."))
}
