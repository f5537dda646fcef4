//! Image column detection.

use log::{debug, info};
use std::fmt;

use super::{Dataset, Value};
use crate::config::FALLBACK_IMAGE_COLUMN;
use crate::error::{AppError, Result};
use crate::file_utils::has_image_extension;

/// How image data is encoded in the image column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// String file path on disk
    Path,
    /// Inline binary, possibly wrapped in a record with a `bytes` field
    Bytes,
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageMode::Path => write!(f, "path"),
            ImageMode::Bytes => write!(f, "bytes"),
        }
    }
}

/// The column holding image references and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageColumn {
    pub name: String,
    pub mode: ImageMode,
}

impl ImageColumn {
    pub fn new(name: impl Into<String>, mode: ImageMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// Picks the image column of a dataset.
///
/// Order of preference:
/// 1. a column named like `*path*`/`*file*` whose first non-null value is a
///    string with an image extension (path mode)
/// 2. the first column whose first-row value is binary (bytes mode)
/// 3. a column literally named `image_path` (path mode)
pub fn detect_image_column(dataset: &Dataset) -> Result<ImageColumn> {
    for (index, name) in dataset.columns().iter().enumerate() {
        let lower = name.to_lowercase();
        if !(lower.contains("path") || lower.contains("file")) {
            continue;
        }

        let first = dataset
            .column_values(index)
            .find(|value| !value.is_missing());
        if let Some(Value::Str(s)) = first {
            if has_image_extension(s) {
                info!("Image column '{}' detected by file extension", name);
                return Ok(ImageColumn::new(name.clone(), ImageMode::Path));
            }
        }
    }

    if let Some(first_row) = dataset.row(0) {
        for (name, value) in first_row.iter() {
            if value.is_binary_like() {
                info!("Image column '{}' detected by binary content", name);
                return Ok(ImageColumn::new(name, ImageMode::Bytes));
            }
        }
    }

    if dataset.column_index(FALLBACK_IMAGE_COLUMN).is_some() {
        info!("Falling back to image column '{}'", FALLBACK_IMAGE_COLUMN);
        return Ok(ImageColumn::new(FALLBACK_IMAGE_COLUMN, ImageMode::Path));
    }

    debug!("No image column among {:?}", dataset.columns());
    Err(AppError::NoImageColumnFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn prefers_path_column_with_image_extension() {
        let dataset = Dataset::new(
            columns(&["blob", "file_name", "image_file"]),
            vec![
                vec![Value::Bytes(vec![1]), Value::from("notes.txt"), Value::Null],
                vec![Value::Bytes(vec![2]), Value::from("b.txt"), Value::from("/img/B.PNG")],
            ],
        );
        let column = detect_image_column(&dataset).unwrap();
        assert_eq!(column, ImageColumn::new("image_file", ImageMode::Path));
    }

    #[test]
    fn falls_back_to_binary_column() {
        let record = Value::Record(vec![("bytes".to_string(), Value::Bytes(vec![0xff]))]);
        let dataset = Dataset::new(
            columns(&["caption", "image"]),
            vec![vec![Value::from("a cat"), record]],
        );
        let column = detect_image_column(&dataset).unwrap();
        assert_eq!(column, ImageColumn::new("image", ImageMode::Bytes));
    }

    #[test]
    fn binary_detection_only_looks_at_first_row() {
        let dataset = Dataset::new(
            columns(&["caption", "image"]),
            vec![
                vec![Value::from("a"), Value::Null],
                vec![Value::from("b"), Value::Bytes(vec![1])],
            ],
        );
        assert!(matches!(
            detect_image_column(&dataset),
            Err(AppError::NoImageColumnFound)
        ));
    }

    #[test]
    fn uses_image_path_column_as_last_resort() {
        let dataset = Dataset::new(
            columns(&["id", "image_path"]),
            vec![vec![Value::Int(1), Value::from("photo.tiff")]],
        );
        let column = detect_image_column(&dataset).unwrap();
        assert_eq!(column, ImageColumn::new("image_path", ImageMode::Path));
    }

    #[test]
    fn empty_dataset_without_fallback_fails() {
        let dataset = Dataset::new(columns(&["id", "label"]), vec![]);
        assert!(matches!(
            detect_image_column(&dataset),
            Err(AppError::NoImageColumnFound)
        ));
    }
}
