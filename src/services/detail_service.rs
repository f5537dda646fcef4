//! Detail view and drag-export support for a single row.
//!
//! The detail view re-resolves the row's image at a larger size than the grid
//! thumbnail and can hand the image to other applications as a file: the
//! original file for path datasets, or a temporary copy of the embedded bytes.

use image::DynamicImage;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

use crate::config::{DESCRIPTION_COLUMNS, DETAIL_MAX_SIZE};
use crate::dataset::{ImageColumn, ImageMode, Row};
use crate::error::{AppError, Result};
use crate::image_loader::{self, Bitmap};

/// One line of the detail field listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub name: String,
    pub value: String,
    /// Set for the column the image comes from, so it can be highlighted.
    pub is_image_column: bool,
}

/// A file that can be dropped onto other applications.
#[derive(Debug)]
pub enum DragSource {
    /// An existing image file referenced by the dataset.
    File(PathBuf),
    /// Embedded bytes written to a temporary file, removed on drop.
    Temporary(TempPath),
}

impl DragSource {
    pub fn path(&self) -> &Path {
        match self {
            DragSource::File(path) => path.as_path(),
            DragSource::Temporary(path) => &**path,
        }
    }
}

/// Everything the detail view needs for one clicked row.
#[derive(Debug, Clone)]
pub struct RowDetail {
    row: Arc<Row>,
    column: ImageColumn,
}

impl RowDetail {
    pub fn new(row: Arc<Row>, column: ImageColumn) -> Self {
        Self { row, column }
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn image_column(&self) -> &ImageColumn {
        &self.column
    }

    /// All columns of the row, stringified.
    pub fn fields(&self) -> Vec<DetailField> {
        self.row
            .iter()
            .map(|(name, value)| DetailField {
                name: name.to_string(),
                value: value.to_string(),
                is_image_column: name == self.column.name,
            })
            .collect()
    }

    /// Text copied by "copy path": the stringified image column value.
    pub fn image_reference(&self) -> String {
        self.row.get_or_null(&self.column.name).to_string()
    }

    /// Text copied by "copy description": the first descriptive column
    /// present, or the whole row when there is none.
    pub fn description(&self) -> String {
        for name in DESCRIPTION_COLUMNS {
            if let Some(value) = self.row.get(name) {
                return value.to_string();
            }
        }

        let fields: Vec<String> = self
            .row
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    /// Image at detail-view size.
    pub fn preview(&self) -> Bitmap {
        image_loader::resolve_with_bound(&self.row, &self.column, Some(DETAIL_MAX_SIZE))
    }

    /// Full-resolution image, with the reason when it cannot be loaded.
    pub fn full_image(&self) -> Result<DynamicImage> {
        image_loader::load_source(&self.row, &self.column)
    }

    /// Produces a file for drag-and-drop export.
    pub fn drag_source(&self) -> Result<DragSource> {
        let value = self.row.get_or_null(&self.column.name);

        match self.column.mode {
            ImageMode::Path => {
                let path = value
                    .as_str()
                    .map(PathBuf::from)
                    .filter(|path| path.is_file())
                    .ok_or_else(|| AppError::Export(format!("File missing: {}", value)))?;
                let path = std::fs::canonicalize(&path).unwrap_or(path);
                debug!("Drag source is existing file {}", path.display());
                Ok(DragSource::File(path))
            }
            ImageMode::Bytes => {
                let bytes = value
                    .image_bytes()
                    .ok_or_else(|| AppError::Export("Row has no image data".to_string()))?;
                let format =
                    image::guess_format(bytes).map_err(|e| AppError::Export(e.to_string()))?;
                let extension = format.extensions_str().first().copied().unwrap_or("img");

                let mut file = tempfile::Builder::new()
                    .prefix("dragged_image_")
                    .suffix(&format!(".{}", extension))
                    .tempfile()
                    .map_err(|e| AppError::Export(e.to_string()))?;
                file.write_all(bytes)
                    .map_err(|e| AppError::Export(e.to_string()))?;

                let path = file.into_temp_path();
                info!("Materialized {} bytes for drag export at {}", bytes.len(), path.display());
                Ok(DragSource::Temporary(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Value};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([1, 2, 3]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn detail(columns: &[&str], values: Vec<Value>, column: ImageColumn) -> RowDetail {
        let dataset = Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            vec![values],
        );
        RowDetail::new(dataset.row(0).unwrap().clone(), column)
    }

    #[test]
    fn bytes_rows_export_to_a_temporary_png() {
        let detail = detail(
            &["image"],
            vec![Value::Record(vec![("bytes".to_string(), Value::Bytes(png_bytes(900, 10)))])],
            ImageColumn::new("image", ImageMode::Bytes),
        );

        let source = detail.drag_source().unwrap();
        let path = source.path().to_path_buf();
        assert!(matches!(source, DragSource::Temporary(_)));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(std::fs::read(&path).unwrap(), png_bytes(900, 10));

        drop(source);
        assert!(!path.exists());
    }

    #[test]
    fn path_rows_export_the_original_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, png_bytes(4, 4)).unwrap();

        let detail = detail(
            &["file_path"],
            vec![Value::from(file.to_str().unwrap())],
            ImageColumn::new("file_path", ImageMode::Path),
        );
        let source = detail.drag_source().unwrap();
        assert!(matches!(source, DragSource::File(_)));
        assert_eq!(source.path(), std::fs::canonicalize(&file).unwrap());
    }

    #[test]
    fn missing_files_cannot_be_exported() {
        let detail = detail(
            &["file_path"],
            vec![Value::from("/nonexistent/x.jpg")],
            ImageColumn::new("file_path", ImageMode::Path),
        );
        assert!(matches!(detail.drag_source(), Err(AppError::Export(_))));
        assert!(matches!(detail.full_image(), Err(AppError::FileMissing(_))));
        assert!(detail.preview().is_placeholder());
    }

    #[test]
    fn full_image_is_not_downscaled() {
        let detail = detail(
            &["image"],
            vec![Value::Bytes(png_bytes(1200, 600))],
            ImageColumn::new("image", ImageMode::Bytes),
        );
        assert_eq!(detail.full_image().unwrap().width(), 1200);
        assert_eq!(detail.preview().width(), DETAIL_MAX_SIZE);
    }

    #[test]
    fn description_prefers_caption_like_columns() {
        let column = ImageColumn::new("image_path", ImageMode::Path);
        let with_prompt = detail(
            &["image_path", "prompt", "text"],
            vec![Value::from("a.png"), Value::from("a red fox"), Value::from("other")],
            column.clone(),
        );
        assert_eq!(with_prompt.description(), "a red fox");
        assert_eq!(with_prompt.image_reference(), "a.png");

        let plain = detail(
            &["image_path", "id"],
            vec![Value::from("a.png"), Value::Int(3)],
            column,
        );
        assert_eq!(plain.description(), "{image_path: a.png, id: 3}");
    }

    #[test]
    fn fields_flag_the_image_column() {
        let detail = detail(
            &["id", "image_path"],
            vec![Value::Int(1), Value::from("a.png")],
            ImageColumn::new("image_path", ImageMode::Path),
        );
        let fields = detail.fields();
        assert_eq!(fields.len(), 2);
        assert!(!fields[0].is_image_column);
        assert!(fields[1].is_image_column);
        assert_eq!(fields[1].value, "a.png");
    }
}
