//! Paged thumbnail browsing for image datasets stored in Parquet files.
//!
//! Rows are read into memory, one column is detected as the image source
//! (file paths or embedded bytes), and pages of thumbnails are resolved on a
//! worker pool while the control thread keeps accepting page changes.

pub mod config;
pub mod dataset;
pub mod error;
pub mod file_utils;
pub mod image_cache;
pub mod image_loader;
pub mod placeholder;
pub mod services;
pub mod startup;
pub mod state;
pub mod ui;

pub use error::{AppError, Result};
