//! The display surface the page coordinator draws into.

use std::sync::Arc;

use crate::dataset::Row;
use crate::image_loader::Bitmap;

/// Cell of the thumbnail grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

impl GridPosition {
    /// Grid cell for a view position: `divmod(position % page_size, columns)`.
    pub fn for_position(position: usize, page_size: usize, columns_per_row: usize) -> Self {
        let relative = position % page_size.max(1);
        let columns = columns_per_row.max(1);
        Self {
            row: relative / columns,
            column: relative % columns,
        }
    }
}

/// One thumbnail placed on the grid.
#[derive(Debug, Clone)]
pub struct Placement {
    pub position: GridPosition,
    pub bitmap: Bitmap,
    pub tooltip: String,
    /// Snapshot handed back to the coordinator when the cell is clicked.
    pub row: Arc<Row>,
}

/// Receives grid placements and progress from the page coordinator.
///
/// All calls happen on the control thread.
pub trait DisplaySurface {
    /// Removes every placed thumbnail.
    fn clear(&mut self);

    fn place(&mut self, placement: Placement);

    /// Shows the progress indicator with a range of `0..=max`.
    fn show_progress(&mut self, max: usize);

    fn set_progress(&mut self, value: usize);

    fn hide_progress(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_position_wraps_per_page() {
        assert_eq!(
            GridPosition::for_position(0, 50, 5),
            GridPosition { row: 0, column: 0 }
        );
        assert_eq!(
            GridPosition::for_position(7, 50, 5),
            GridPosition { row: 1, column: 2 }
        );
        assert_eq!(
            GridPosition::for_position(57, 50, 5),
            GridPosition { row: 1, column: 2 }
        );
        assert_eq!(
            GridPosition::for_position(99, 50, 5),
            GridPosition { row: 9, column: 4 }
        );
    }
}
