use std::path::Path;
use walkdir::WalkDir;

use crate::core::ImageAsset;

/// Extensions picked up when scanning an image directory
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Read a JSON array of image paths. Missing or malformed lists yield no images.
pub fn load_image_list(path: &Path) -> Vec<ImageAsset> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Image list {} unavailable, using 0 images: {}", path.display(), e);
            return Vec::new();
        }
    };

    parse_image_list(&text, path)
}

fn parse_image_list(text: &str, origin: &Path) -> Vec<ImageAsset> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Image list {} is not a JSON array: {}", origin.display(), e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            serde_json::Value::String(p) if !p.trim().is_empty() => Some(ImageAsset::new(p)),
            other => {
                tracing::warn!("Image list entry {} skipped: {}", index, other);
                None
            }
        })
        .collect()
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Walk `root` for image files and expose them as `url_prefix/relative/path`
///
/// Hidden files (`.gitkeep` and friends) are skipped. Results are sorted.
pub fn scan_image_dir(root: &Path, url_prefix: &str) -> Vec<ImageAsset> {
    if !root.is_dir() {
        tracing::warn!("Image directory {} not found, using 0 images", root.display());
        return Vec::new();
    }

    let prefix = url_prefix.trim_end_matches('/');
    let mut paths: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter(|entry| is_image_file(entry.path()))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(if prefix.is_empty() {
                relative
            } else {
                format!("{}/{}", prefix, relative)
            })
        })
        .collect();

    paths.sort();
    paths.into_iter().map(ImageAsset::new).collect()
}
