//! Filtered and sorted view over a dataset, with paging arithmetic.

use log::{debug, warn};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::config::TIMESTAMP_COLUMNS;
use crate::dataset::{Dataset, ImageColumn, Row, Value, detect_image_column};
use crate::error::{AppError, Result};

/// Ordering applied on top of the filtered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortCriterion {
    /// Dataset order
    #[default]
    None,
    /// Image column value, ascending
    ImageNameAsc,
    /// First available timestamp-like column, newest first
    RecencyDesc,
}

impl SortCriterion {
    /// Parses the names accepted on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" | "default" => Some(SortCriterion::None),
            "name" | "by-image-name-asc" => Some(SortCriterion::ImageNameAsc),
            "recent" | "by-recency-desc" => Some(SortCriterion::RecencyDesc),
            _ => None,
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriterion::None => write!(f, "none"),
            SortCriterion::ImageNameAsc => write!(f, "by-image-name-asc"),
            SortCriterion::RecencyDesc => write!(f, "by-recency-desc"),
        }
    }
}

/// One row of a page, ready to be handed to a background job.
#[derive(Debug, Clone)]
pub struct PageEntry {
    /// Position of the row within the current view.
    pub position: usize,
    /// Index of the row within the dataset.
    pub row_index: usize,
    pub row: Arc<Row>,
}

/// Dataset plus the current filtered/sorted ordering of its rows.
///
/// The dataset itself is never modified; the view is a list of row indices
/// derived from the active query and sort criterion.
pub struct DatasetView {
    dataset: Arc<Dataset>,
    image_column: ImageColumn,
    page_size: usize,
    query: String,
    sort: SortCriterion,
    /// Rows matching the query, in dataset order.
    filtered: Vec<usize>,
    /// `filtered` with the sort applied.
    indices: Vec<usize>,
}

impl DatasetView {
    /// Detects the image column and builds an unfiltered, unsorted view.
    pub fn load(dataset: Dataset, page_size: usize) -> Result<Self> {
        let image_column = detect_image_column(&dataset)?;
        let all: Vec<usize> = (0..dataset.len()).collect();

        Ok(Self {
            dataset: Arc::new(dataset),
            image_column,
            page_size: page_size.max(1),
            query: String::new(),
            sort: SortCriterion::None,
            filtered: all.clone(),
            indices: all,
        })
    }

    pub fn image_column(&self) -> &ImageColumn {
        &self.image_column
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The criterion last applied successfully by [`DatasetView::sort`].
    ///
    /// This is the requested ordering: when a later filter brings back values
    /// it cannot order, the view falls back to filter order but keeps the
    /// criterion, and it is re-applied once the query makes it valid again.
    pub fn sort_criterion(&self) -> SortCriterion {
        self.sort
    }

    /// Dataset row indices in view order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Keeps rows where any stringified value contains the query,
    /// case-insensitively. An empty query selects every row.
    ///
    /// The active sort criterion is re-applied to the result.
    pub fn filter(&mut self, query: &str) -> &[usize] {
        let query = query.trim().to_lowercase();

        self.filtered = if query.is_empty() {
            (0..self.dataset.len()).collect()
        } else {
            self.dataset
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| row_matches(row, &query))
                .map(|(index, _)| index)
                .collect()
        };
        self.query = query;

        match self.sorted(self.sort) {
            Ok(indices) => self.indices = indices,
            Err(e) => {
                warn!("Keeping filter order, sort no longer applies: {}", e);
                self.indices = self.filtered.clone();
            }
        }

        debug!(
            "Filter '{}' matched {} of {} rows",
            self.query,
            self.indices.len(),
            self.dataset.len()
        );
        &self.indices
    }

    /// Orders the filtered rows by the criterion.
    ///
    /// On failure the view and the recorded criterion are left untouched.
    pub fn sort(&mut self, criterion: SortCriterion) -> Result<&[usize]> {
        let indices = self.sorted(criterion)?;
        self.indices = indices;
        self.sort = criterion;
        Ok(&self.indices)
    }

    fn sorted(&self, criterion: SortCriterion) -> Result<Vec<usize>> {
        let mut indices = self.filtered.clone();
        match criterion {
            SortCriterion::None => {}
            SortCriterion::ImageNameAsc => {
                if let Some(column) = self.dataset.column_index(&self.image_column.name) {
                    sort_by_column(&self.dataset, &mut indices, column, false)?;
                }
            }
            SortCriterion::RecencyDesc => {
                let column = TIMESTAMP_COLUMNS
                    .iter()
                    .find_map(|name| self.dataset.column_index(name));
                match column {
                    Some(column) => sort_by_column(&self.dataset, &mut indices, column, true)?,
                    None => debug!("No timestamp column, recency sort leaves order unchanged"),
                }
            }
        }
        Ok(indices)
    }

    /// Number of pages, never less than one.
    pub fn total_pages(&self) -> usize {
        self.indices.len().div_ceil(self.page_size).max(1)
    }

    /// Returns the entries of 1-based page `n`, clamped to the view bounds.
    pub fn page(&self, n: usize) -> Vec<PageEntry> {
        if n == 0 {
            return Vec::new();
        }
        let start = (n - 1).saturating_mul(self.page_size).min(self.indices.len());
        let end = start.saturating_add(self.page_size).min(self.indices.len());

        self.indices[start..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, &row_index)| {
                self.dataset.row(row_index).map(|row| PageEntry {
                    position: start + offset,
                    row_index,
                    row: row.clone(),
                })
            })
            .collect()
    }
}

fn sort_key(dataset: &Dataset, index: usize, column: usize) -> &Value {
    match dataset.row(index) {
        Some(row) => row.get_or_null(&dataset.columns()[column]),
        None => Value::null(),
    }
}

fn row_matches(row: &Row, query: &str) -> bool {
    row.iter()
        .any(|(_, value)| value.to_string().to_lowercase().contains(query))
}

/// Stable sort of `indices` by one column. Missing values go last in both
/// directions; values that cannot be ordered against each other are an error.
fn sort_by_column(
    dataset: &Dataset,
    indices: &mut [usize],
    column: usize,
    descending: bool,
) -> Result<()> {
    let key = |index: usize| sort_key(dataset, index, column);

    let mut present = indices.iter().map(|&i| key(i)).filter(|v| !v.is_missing());
    if let Some(first) = present.next() {
        for value in present {
            if first.compare(value).is_none() {
                return Err(AppError::FilterOrSort(format!(
                    "cannot compare {} with {} in column '{}'",
                    first.type_name(),
                    value.type_name(),
                    dataset.columns()[column]
                )));
            }
        }
    }

    indices.sort_by(|&a, &b| {
        let (a, b) = (key(a), key(b));
        match (a.is_missing(), b.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ordering = a.compare(b).unwrap_or(Ordering::Equal);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn path_dataset(count: usize) -> Dataset {
        let rows = (0..count)
            .map(|i| vec![Value::Int(i as i64), Value::Str(format!("img_{:03}.png", i))])
            .collect();
        Dataset::new(vec!["id".to_string(), "file_path".to_string()], rows)
    }

    fn view_of(names: &[&str]) -> DatasetView {
        let rows = names
            .iter()
            .map(|n| vec![Value::from(*n), Value::from("caption")])
            .collect();
        let dataset = Dataset::new(vec!["image_path".to_string(), "caption".to_string()], rows);
        DatasetView::load(dataset, 50).unwrap()
    }

    #[test]
    fn pages_of_120_rows() {
        let view = DatasetView::load(path_dataset(120), 50).unwrap();
        assert_eq!(view.total_pages(), 3);
        assert_eq!(view.page(1).len(), 50);
        assert_eq!(view.page(3).len(), 20);
        assert!(view.page(4).is_empty());
        assert!(view.page(0).is_empty());
    }

    #[test]
    fn pages_reconstruct_view() {
        for count in [1, 49, 50, 51, 137] {
            let view = DatasetView::load(path_dataset(count), 50).unwrap();
            let rebuilt: Vec<usize> = (1..=view.total_pages())
                .flat_map(|n| view.page(n))
                .map(|entry| entry.row_index)
                .collect();
            assert_eq!(rebuilt, view.indices());

            let positions: Vec<usize> = (1..=view.total_pages())
                .flat_map(|n| view.page(n))
                .map(|entry| entry.position)
                .collect();
            assert_eq!(positions, (0..count).collect::<Vec<_>>());
        }
    }

    #[test]
    fn empty_view_has_one_empty_page() {
        let mut view = DatasetView::load(path_dataset(10), 50).unwrap();
        view.filter("no row contains this");
        assert!(view.is_empty());
        assert_eq!(view.total_pages(), 1);
        assert!(view.page(1).is_empty());
    }

    #[test]
    fn empty_query_is_a_no_op() {
        let mut view = DatasetView::load(path_dataset(10), 50).unwrap();
        let before = view.indices().to_vec();
        assert_eq!(view.filter(""), before.as_slice());
        assert_eq!(view.filter("   "), before.as_slice());
    }

    #[test]
    fn filter_matches_any_column_case_insensitively() {
        let mut view = DatasetView::load(path_dataset(120), 50).unwrap();
        assert_eq!(view.filter("IMG_01").len(), 10);
        // integer column is stringified before matching
        assert_eq!(view.filter("119"), &[119]);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut view = DatasetView::load(path_dataset(120), 50).unwrap();
        let first = view.filter("img_1").to_vec();
        let second = view.filter("img_1").to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn sort_by_image_name_is_non_decreasing() {
        let mut view = view_of(&["c.png", "a.png", "b.png", "a.png"]);
        view.sort(SortCriterion::ImageNameAsc).unwrap();
        let names: Vec<String> = view
            .page(1)
            .iter()
            .map(|entry| entry.row.get("image_path").unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.png", "a.png", "b.png", "c.png"]);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(view.sort_criterion(), SortCriterion::ImageNameAsc);
    }

    #[test]
    fn recency_sort_without_timestamp_column_keeps_order() {
        let mut view = view_of(&["c.png", "a.png", "b.png"]);
        let before = view.indices().to_vec();
        assert_eq!(view.sort(SortCriterion::RecencyDesc).unwrap(), before.as_slice());
    }

    #[test]
    fn recency_sort_is_newest_first_with_nulls_last() {
        let ts = |secs| Value::Timestamp(DateTime::from_timestamp(secs, 0).unwrap());
        let dataset = Dataset::new(
            vec!["image_path".to_string(), "modified_at".to_string(), "created_at".to_string()],
            vec![
                vec![Value::from("a.png"), ts(1), Value::Null],
                vec![Value::from("b.png"), ts(9), ts(5)],
                vec![Value::from("c.png"), ts(3), ts(7)],
            ],
        );
        let mut view = DatasetView::load(dataset, 50).unwrap();
        // created_at wins over modified_at
        assert_eq!(view.sort(SortCriterion::RecencyDesc).unwrap(), &[2, 1, 0]);
    }

    #[test]
    fn failed_sort_preserves_view() {
        let dataset = Dataset::new(
            vec!["image_path".to_string()],
            vec![vec![Value::from("b.png")], vec![Value::Int(3)], vec![Value::from("a.png")]],
        );
        let mut view = DatasetView::load(dataset, 50).unwrap();
        let before = view.indices().to_vec();

        let result = view.sort(SortCriterion::ImageNameAsc);
        assert!(matches!(result, Err(AppError::FilterOrSort(_))));
        assert_eq!(view.indices(), before.as_slice());
        assert_eq!(view.sort_criterion(), SortCriterion::None);
    }

    #[test]
    fn filter_reapplies_active_sort() {
        let mut view = view_of(&["c.png", "a.png", "b.png", "d.jpg"]);
        view.sort(SortCriterion::ImageNameAsc).unwrap();
        assert_eq!(view.filter(".png"), &[1, 2, 0]);
        assert_eq!(view.filter(""), &[1, 2, 0, 3]);
    }

    #[test]
    fn filter_falls_back_to_filter_order_but_keeps_criterion() {
        let dataset = Dataset::new(
            vec!["image_path".to_string()],
            vec![
                vec![Value::from("b.png")],
                vec![Value::from("a.png")],
                vec![Value::Int(7)],
            ],
        );
        let mut view = DatasetView::load(dataset, 50).unwrap();

        assert_eq!(view.filter("PNG"), &[0, 1]);
        assert_eq!(view.query(), "png");
        assert_eq!(view.sort(SortCriterion::ImageNameAsc).unwrap(), &[1, 0]);

        // The Int row cannot be ordered against the names.
        assert_eq!(view.filter(""), &[0, 1, 2]);
        assert_eq!(view.query(), "");
        assert_eq!(view.sort_criterion(), SortCriterion::ImageNameAsc);

        assert_eq!(view.filter("png"), &[1, 0]);
    }

    #[test]
    fn search_matches_float_text_with_decimal_point() {
        let dataset = Dataset::new(
            vec!["image_path".to_string(), "score".to_string()],
            vec![
                vec![Value::from("a.png"), Value::Float(1.0)],
                vec![Value::from("b.png"), Value::Float(2.5)],
            ],
        );
        let mut view = DatasetView::load(dataset, 50).unwrap();
        assert_eq!(view.filter("1.0"), &[0]);
        assert_eq!(view.filter("2.5"), &[1]);
    }

    #[test]
    fn sort_none_restores_filter_order() {
        let mut view = view_of(&["c.png", "a.png", "b.png"]);
        view.sort(SortCriterion::ImageNameAsc).unwrap();
        assert_eq!(view.sort(SortCriterion::None).unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn parses_cli_sort_names() {
        assert_eq!(SortCriterion::parse("Name"), Some(SortCriterion::ImageNameAsc));
        assert_eq!(SortCriterion::parse("recent"), Some(SortCriterion::RecencyDesc));
        assert_eq!(SortCriterion::parse("none"), Some(SortCriterion::None));
        assert_eq!(SortCriterion::parse("size"), None);
    }
}
