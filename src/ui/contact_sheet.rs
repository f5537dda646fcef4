//! Off-screen display surface that lays a page out as a contact sheet.
//!
//! Used by the command-line front end and the tests: placements are kept per
//! grid cell and can be composited into a single PNG.

use image::{Rgba, RgbaImage, imageops};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::THUMBNAIL_MAX_SIZE;
use crate::error::{AppError, Result};
use crate::ui::{DisplaySurface, GridPosition, Placement};

const CELL_PADDING: u32 = 4;
const SHEET_BACKGROUND: Rgba<u8> = Rgba([24, 24, 24, 255]);
/// Largest sheet side, in pixels.
const MAX_SHEET_SIDE: u32 = 32_768;

/// Grid of placed thumbnails held in memory.
#[derive(Debug, Default)]
pub struct ContactSheetSurface {
    cells: BTreeMap<GridPosition, Placement>,
    clears: usize,
    progress_max: usize,
    progress_value: usize,
    progress_visible: bool,
}

impl ContactSheetSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placements in grid order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.cells.values()
    }

    pub fn get(&self, position: GridPosition) -> Option<&Placement> {
        self.cells.get(&position)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// How many times the grid has been cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn progress_visible(&self) -> bool {
        self.progress_visible
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.progress_value, self.progress_max)
    }

    /// Composites the placed thumbnails into one image.
    ///
    /// Every cell is `cell_size` square; thumbnails are centred in their cell.
    /// Fails when the sheet would exceed the maximum side length.
    pub fn render(&self, columns_per_row: usize, cell_size: u32) -> Result<RgbaImage> {
        let columns = columns_per_row.max(1);
        let rows = self.cells.keys().map(|p| p.row + 1).max().unwrap_or(0);
        let too_large = || {
            AppError::Export(format!(
                "contact sheet of {}x{} cells of {} px exceeds {} px",
                columns, rows, cell_size, MAX_SHEET_SIDE
            ))
        };
        let stride = cell_size.checked_add(CELL_PADDING).ok_or_else(too_large)?;
        let width = sheet_side(columns, stride).ok_or_else(too_large)?;
        let height = sheet_side(rows, stride).ok_or_else(too_large)?;

        let mut sheet = RgbaImage::from_pixel(width, height, SHEET_BACKGROUND);

        for (position, placement) in &self.cells {
            if position.column >= columns {
                continue;
            }
            let pixels = placement.bitmap.pixels();
            let x = CELL_PADDING + position.column as u32 * stride
                + cell_size.saturating_sub(pixels.width()) / 2;
            let y = CELL_PADDING + position.row as u32 * stride
                + cell_size.saturating_sub(pixels.height()) / 2;
            imageops::overlay(&mut sheet, pixels, i64::from(x), i64::from(y));
        }
        Ok(sheet)
    }

    /// Renders with the default thumbnail cell size and writes a PNG.
    pub fn save(&self, path: &Path, columns_per_row: usize) -> Result<()> {
        let sheet = self.render(columns_per_row, THUMBNAIL_MAX_SIZE)?;
        sheet
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| AppError::Export(format!("{}: {}", path.display(), e)))?;
        info!(
            "Saved contact sheet {}x{} to {}",
            sheet.width(),
            sheet.height(),
            path.display()
        );
        Ok(())
    }
}

/// Side length for `cells` cells, padding included.
fn sheet_side(cells: usize, stride: u32) -> Option<u32> {
    u32::try_from(cells)
        .ok()?
        .checked_mul(stride)?
        .checked_add(CELL_PADDING)
        .filter(|side| *side <= MAX_SHEET_SIDE)
}

impl DisplaySurface for ContactSheetSurface {
    fn clear(&mut self) {
        self.cells.clear();
        self.clears += 1;
    }

    fn place(&mut self, placement: Placement) {
        self.cells.insert(placement.position, placement);
    }

    fn show_progress(&mut self, max: usize) {
        self.progress_max = max;
        self.progress_value = 0;
        self.progress_visible = true;
    }

    fn set_progress(&mut self, value: usize) {
        self.progress_value = value;
        if value % 10 == 0 || value == self.progress_max {
            debug!("Loaded {}/{}", value, self.progress_max);
        }
    }

    fn hide_progress(&mut self) {
        self.progress_visible = false;
    }
}
