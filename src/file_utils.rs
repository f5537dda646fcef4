use crate::config::{DETECTABLE_IMAGE_EXTENSIONS, SUPPORTED_DATA_EXTENSIONS};
use std::path::Path;

/// Returns true if the path has a data file extension the reader accepts.
pub fn is_supported_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext_str| SUPPORTED_DATA_EXTENSIONS.contains(&ext_str.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns true if a string value looks like a path to an image file.
pub fn has_image_extension(value: &str) -> bool {
    let lower = value.to_lowercase();
    DETECTABLE_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Formatting helpers for paths in log output.
pub trait PathExt {
    fn format_for_log(&self) -> String;
}

impl PathExt for Path {
    fn format_for_log(&self) -> String {
        match self.file_name() {
            Some(name) => format!("{} ({})", name.to_string_lossy(), self.display()),
            None => self.display().to_string(),
        }
    }
}
