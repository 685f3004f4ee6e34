use std::path::Path;

/// Lower-cased extension of `path`, without the dot
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Check the extension of `path` against `ext`, ignoring case
pub fn has_extension(path: &Path, ext: &str) -> bool {
    lowercase_extension(path).is_some_and(|e| e == ext.to_lowercase())
}
