//! Resolution filtering and renumbering of an attraction directory.
//!
//! After [`filter_and_normalize`] a directory holds either nothing or
//! `1.jpg`..`k.jpg` with `k <= MAX_IMAGES` and no gaps.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::{info_time, warn_time, Result, MAX_IMAGES, MIN_WIDTH};

const CANDIDATE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];
const STAGING_PREFIX: &str = "temp_kept";
const TEMP_NAME_PREFIX: &str = "__tmp_norm_";

/// Case sensitive: `X.JPG` is not filtered, the clear step sweeps it away.
#[inline]
fn is_candidate(name: &str) -> bool {
    CANDIDATE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

#[inline]
fn is_jpg(name: &str) -> bool {
    name.to_lowercase().ends_with(".jpg")
}

/// Names of regular files in `dir` accepted by `keep`, sorted by raw name.
fn file_names(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if keep(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Number of `.jpg` files directly in `dir`, 0 when it does not exist.
pub fn count_images(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    Ok(file_names(dir, is_jpg)?.len())
}

/// Candidate images at least `min_width` pixels wide, in filename order,
/// capped at `max`. Unreadable files are reported and left out.
pub fn select_images(dir: &Path, min_width: u32, max: usize) -> Result<Vec<PathBuf>> {
    let mut valid = Vec::new();
    for name in file_names(dir, is_candidate)? {
        let path = dir.join(&name);
        match pixel_dimensions(&path) {
            Ok((width, _)) if width >= min_width => valid.push(path),
            Ok(_) => {}
            Err(e) => warn_time!("Error reading {}: {}", name, e),
        }
    }
    valid.truncate(max);
    Ok(valid)
}

/// Width and height read from the file header. The format is sniffed from the
/// content, kept PNGs live on under a `.jpg` name.
pub fn pixel_dimensions(path: &Path) -> Result<(u32, u32)> {
    let dimensions = ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(dimensions)
}

/// Keeps the first wide-enough images of a freshly crawled directory and
/// leaves them as `1.jpg`..`k.jpg`. Everything else in the directory is
/// removed, including subdirectories. Returns the number of images kept.
pub fn filter_and_normalize(dir: &Path) -> Result<usize> {
    let keep = select_images(dir, MIN_WIDTH, MAX_IMAGES)?;
    if keep.is_empty() {
        warn_time!("No valid high-res images found in {}", dir.display());
    }

    // Removed on drop, whichever way we leave this function.
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(dir)?;

    info_time!("Keeping {} images in {}", keep.len(), dir.display());
    for (idx, src) in keep.iter().enumerate() {
        let dst = staging.path().join(format!("{}.jpg", idx + 1));
        if let Err(e) = fs::copy(src, &dst) {
            warn_time!("Error copying {} to staging: {}", src.display(), e);
        }
    }

    clear_dir_except(dir, staging.path())?;

    for entry in fs::read_dir(staging.path())? {
        let entry = entry?;
        let dst = dir.join(entry.file_name());
        if let Err(e) = fs::rename(entry.path(), &dst) {
            warn_time!("Error moving {} back: {}", entry.path().display(), e);
        }
    }
    if let Err(e) = staging.close() {
        warn_time!("Error removing staging dir: {}", e);
    }

    normalize_output_dir_images(dir)
}

/// Removes every entry of `dir` other than `keep`. Failures are reported per
/// entry and do not stop the sweep.
fn clear_dir_except(dir: &Path, keep: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path == keep {
            continue;
        }
        let removed = match entry.file_type() {
            Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) => Err(e),
        };
        if let Err(e) = removed {
            warn_time!("Error deleting {}: {}", path.display(), e);
        }
    }
    Ok(())
}

/// Pure integer stems sort numerically, anything else after them.
fn image_sort_key(name: &str) -> (u64, &str) {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let numeric = !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit());
    let key = if numeric {
        stem.parse().unwrap_or(u64::MAX)
    } else {
        u64::MAX
    };
    (key, name)
}

/// Keeps at most `MAX_IMAGES` `.jpg` files and renames them to `1.jpg`..`k.jpg`.
///
/// Files go through temporary names first so that e.g. `2.jpg -> 1.jpg` never
/// lands on a file that is still waiting to be renamed.
pub fn normalize_output_dir_images(dir: &Path) -> Result<usize> {
    let mut files = file_names(dir, is_jpg)?;
    files.sort_by(|a, b| image_sort_key(a).cmp(&image_sort_key(b)));

    let extra = files.split_off(files.len().min(MAX_IMAGES));
    for name in extra {
        if let Err(e) = fs::remove_file(dir.join(&name)) {
            warn_time!("Error removing surplus image {}: {}", name, e);
        }
    }

    let mut temp_paths = Vec::with_capacity(files.len());
    for (idx, name) in files.iter().enumerate() {
        let src = dir.join(name);
        let tmp = unused_temp_path(dir, idx + 1);
        match fs::rename(&src, &tmp) {
            Ok(()) => temp_paths.push(tmp),
            Err(e) => warn_time!("Error renaming {}: {}", name, e),
        }
    }

    let mut kept = 0;
    for tmp in temp_paths {
        let dst = dir.join(format!("{}.jpg", kept + 1));
        match fs::rename(&tmp, &dst) {
            Ok(()) => kept += 1,
            Err(e) => warn_time!("Error renaming {}: {}", tmp.display(), e),
        }
    }
    Ok(kept)
}

/// `__tmp_norm_{idx}.jpg`, or a suffixed variant if a stale one is lying around.
fn unused_temp_path(dir: &Path, idx: usize) -> PathBuf {
    let path = dir.join(format!("{TEMP_NAME_PREFIX}{idx}.jpg"));
    if !path.exists() {
        return path;
    }
    (1..)
        .map(|n| dir.join(format!("{TEMP_NAME_PREFIX}{idx}_{n}.jpg")))
        .find(|p| !p.exists())
        .unwrap_or(path)
}
