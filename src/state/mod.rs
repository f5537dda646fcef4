//! State management for the viewer.
//!
//! All mutable page state lives in one [`Session`] owned by the page
//! coordinator. Background jobs never see it; they only receive copies of the
//! rows they have to resolve.

pub mod view;

pub use view::{DatasetView, PageEntry, SortCriterion};

use crate::services::page_loader::{Generation, JobHandle};

/// Progress of the page currently being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub value: usize,
    pub max: usize,
    pub visible: bool,
}

/// Page navigation and job bookkeeping for one viewer window.
#[derive(Default)]
pub struct Session {
    pub view: Option<DatasetView>,
    /// 1-based page on display.
    pub current_page: usize,
    /// Job whose events are currently applied to the display.
    pub active_job: Option<JobHandle>,
    pub progress: Progress,
    next_generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the tag for the next page request.
    pub fn next_generation(&mut self) -> Generation {
        self.next_generation += 1;
        Generation::new(self.next_generation)
    }

    /// Generation whose events are currently accepted, if a job is running.
    pub fn active_generation(&self) -> Option<Generation> {
        self.active_job.as_ref().map(JobHandle::generation)
    }

    pub fn total_pages(&self) -> usize {
        self.view.as_ref().map(DatasetView::total_pages).unwrap_or(1)
    }
}
