//! Resolves the image of a row into a bounded bitmap.
//!
//! Every function here is free of shared mutable state and may be called from
//! any number of worker threads at once. [`resolve`] never fails: rows whose
//! image is missing or broken come back as a [`Placeholder`] bitmap so the grid
//! never receives an empty slot.

use image::{DynamicImage, ImageReader, RgbaImage};
use log::debug;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::THUMBNAIL_MAX_SIZE;
use crate::dataset::{ImageColumn, ImageMode, Row};
use crate::error::{AppError, Result};
use crate::placeholder::Placeholder;

/// Decoded RGBA pixels, or a placeholder standing in for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
    placeholder: Option<Placeholder>,
}

impl Bitmap {
    pub fn decoded(image: DynamicImage) -> Self {
        Self {
            pixels: Arc::new(image.to_rgba8()),
            placeholder: None,
        }
    }

    pub fn placeholder(kind: Placeholder) -> Self {
        Self {
            pixels: kind.pixels(),
            placeholder: Some(kind),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn placeholder_kind(&self) -> Option<Placeholder> {
        self.placeholder
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

/// Resolves a grid thumbnail for the row.
pub fn resolve(row: &Row, column: &ImageColumn) -> Bitmap {
    resolve_with_bound(row, column, Some(THUMBNAIL_MAX_SIZE))
}

/// Resolves the row's image, downscaled to fit `bound` when one is given.
pub fn resolve_with_bound(row: &Row, column: &ImageColumn, bound: Option<u32>) -> Bitmap {
    match load_source(row, column) {
        Ok(image) => Bitmap::decoded(fit_within(image, bound)),
        Err(AppError::FileMissing(msg)) => {
            debug!("Image file missing: {}", msg);
            Bitmap::placeholder(Placeholder::FileMissing)
        }
        Err(e) => {
            debug!("Image data unusable in column '{}': {}", column.name, e);
            Bitmap::placeholder(Placeholder::DataError)
        }
    }
}

/// Loads the full-resolution image referenced by the row.
pub fn load_source(row: &Row, column: &ImageColumn) -> Result<DynamicImage> {
    let value = row.get_or_null(&column.name);

    match column.mode {
        ImageMode::Path => {
            let path = value
                .as_str()
                .ok_or_else(|| AppError::FileMissing(format!("not a path: {}", value)))?;
            let data = std::fs::read(path)
                .map_err(|e| AppError::FileMissing(format!("{}: {}", path, e)))?;
            decode_bytes(&data)
        }
        ImageMode::Bytes => {
            let data = value.image_bytes().ok_or_else(|| {
                AppError::Decode(format!(
                    "expected binary image data, found {}",
                    value.type_name()
                ))
            })?;
            decode_bytes(data)
        }
    }
}

/// Decodes an encoded image, guessing the format from its header.
pub fn decode_bytes(data: &[u8]) -> Result<DynamicImage> {
    // A decoder panic must not unwind into the worker pool.
    let decoded = panic::catch_unwind(AssertUnwindSafe(|| {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::Decode(e.to_string()))?
            .decode()
            .map_err(AppError::from)
    }));

    decoded.unwrap_or_else(|_| Err(AppError::Decode("decoder panicked".to_string())))
}

/// Shrinks the image to fit a square bound, preserving aspect ratio.
/// Images already within the bound are returned unchanged.
pub fn fit_within(image: DynamicImage, bound: Option<u32>) -> DynamicImage {
    match bound {
        Some(max) if image.width() > max || image.height() > max => image.thumbnail(max, max),
        _ => image,
    }
}
