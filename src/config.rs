//! Application configuration constants.

/// Number of rows shown on one page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Grid columns used when placing thumbnails.
pub const DEFAULT_COLUMNS_PER_ROW: usize = 5;

/// Upper bounds accepted for the grid from the command line.
pub const MAX_COLUMNS_PER_ROW: usize = 64;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Neither side of a grid thumbnail exceeds this many pixels.
pub const THUMBNAIL_MAX_SIZE: u32 = 280;

/// Bound applied by the detail view when showing a single row.
pub const DETAIL_MAX_SIZE: u32 = 800;

/// Side length of placeholder bitmaps.
pub const PLACEHOLDER_SIZE: u32 = 260;

pub const PLACEHOLDER_BACKGROUND: [u8; 3] = [60, 60, 60];
pub const PLACEHOLDER_FOREGROUND: [u8; 3] = [200, 200, 200];

/// Extensions that mark a string column as holding image paths.
pub const DETECTABLE_IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".webp"];

/// Column used when no other heuristic matches.
pub const FALLBACK_IMAGE_COLUMN: &str = "image_path";

/// Field of a record value that carries the encoded image.
pub const BYTES_FIELD: &str = "bytes";

/// Timestamp-like columns tried, in order, by the recency sort.
pub const TIMESTAMP_COLUMNS: [&str; 3] = ["created_at", "modified_at", "timestamp"];

/// Columns tried, in order, when copying a row description.
pub const DESCRIPTION_COLUMNS: [&str; 5] = ["description", "caption", "prompt", "text", "alt_text"];

/// Thumbnails kept in memory across page changes.
pub const THUMBNAIL_CACHE_CAPACITY: usize = 150;

/// Worker threads in the decode pool.
pub const DECODE_WORKER_THREADS: usize = 2;

/// Supported data file extensions.
pub const SUPPORTED_DATA_EXTENSIONS: [&str; 2] = ["parquet", "pq"];

/// Tunable settings for paging and image loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerConfig {
    pub page_size: usize,
    pub columns_per_row: usize,
    pub thumbnail_max_size: u32,
    pub cache_capacity: usize,
    pub worker_threads: usize,
}

impl ViewerConfig {
    /// Returns a copy with a different grid width. Zero is ignored.
    pub fn with_columns_per_row(mut self, columns: usize) -> Self {
        if columns > 0 {
            self.columns_per_row = columns;
        }
        self
    }

    /// Returns a copy with a different page size. Zero is ignored.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            columns_per_row: DEFAULT_COLUMNS_PER_ROW,
            thumbnail_max_size: THUMBNAIL_MAX_SIZE,
            cache_capacity: THUMBNAIL_CACHE_CAPACITY,
            worker_threads: DECODE_WORKER_THREADS,
        }
    }
}
