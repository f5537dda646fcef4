//! Page transitions and reconciliation of background results.
//!
//! Threading model:
//! - the coordinator and its display surface live on the control thread
//! - page load jobs run on a [`JobExecutor`] (a `rayon` pool in production)
//! - results come back over one `mpsc` channel, tagged with the generation of
//!   the request that produced them; anything not tagged with the active
//!   generation is dropped

use log::{debug, info, trace, warn};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use crate::config::ViewerConfig;
use crate::dataset::{Dataset, ImageColumn, Row, reader};
use crate::error::Result;
use crate::file_utils::PathExt;
use crate::image_cache::ImageCache;
use crate::services::detail_service::RowDetail;
use crate::services::executor::{JobExecutor, RayonExecutor};
use crate::services::page_loader::{JobEvent, JobMessage, PageLoadJob};
use crate::state::{DatasetView, Progress, Session, SortCriterion};
use crate::ui::{DisplaySurface, GridPosition, Placement};

/// Drives page loads for one display surface.
pub struct PageCoordinator<S: DisplaySurface> {
    session: Session,
    config: ViewerConfig,
    executor: Arc<dyn JobExecutor>,
    cache: Arc<Mutex<ImageCache>>,
    surface: S,
    sender: Sender<JobMessage>,
    receiver: Receiver<JobMessage>,
}

impl<S: DisplaySurface> PageCoordinator<S> {
    pub fn new(surface: S, config: ViewerConfig, executor: Arc<dyn JobExecutor>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            session: Session::new(),
            config,
            executor,
            cache: Arc::new(Mutex::new(ImageCache::new(config.cache_capacity))),
            surface,
            sender,
            receiver,
        }
    }

    /// Creates a coordinator backed by a `rayon` decode pool.
    pub fn with_thread_pool(surface: S, config: ViewerConfig) -> Result<Self> {
        let executor = RayonExecutor::new(config.worker_threads)?;
        Ok(Self::new(surface, config, Arc::new(executor)))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> Option<&DatasetView> {
        self.session.view.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn current_page(&self) -> usize {
        self.session.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.session.total_pages()
    }

    pub fn progress(&self) -> Progress {
        self.session.progress
    }

    /// True while a page job's results are still expected.
    pub fn is_loading(&self) -> bool {
        self.session.active_job.is_some()
    }

    /// Reads a Parquet file and shows its first page.
    ///
    /// On failure the previously loaded dataset stays on display.
    pub fn open_dataset(&mut self, path: &Path) -> Result<ImageColumn> {
        info!("Opening {}", path.format_for_log());
        let dataset = reader::read_parquet(path)?;
        self.load_dataset(dataset)
    }

    /// Replaces the dataset and shows its first page.
    ///
    /// Fails with `NoImageColumnFound` without touching the current dataset.
    pub fn load_dataset(&mut self, dataset: Dataset) -> Result<ImageColumn> {
        let view = DatasetView::load(dataset, self.config.page_size)?;
        let column = view.image_column().clone();
        info!(
            "Loaded {} rows, image column '{}' ({})",
            view.len(),
            column.name,
            column.mode
        );

        // Jobs of the previous dataset keep their own cache.
        self.cache = Arc::new(Mutex::new(ImageCache::new(self.config.cache_capacity)));
        self.session.view = Some(view);
        self.request_page(1);
        Ok(column)
    }

    /// Shows page `n`, superseding whatever page was loading.
    ///
    /// Pages outside `1..=total_pages` simply come out empty.
    pub fn request_page(&mut self, n: usize) {
        if let Some(job) = self.session.active_job.take() {
            job.cancel();
        }
        self.surface.clear();

        let (entries, column) = match &self.session.view {
            Some(view) => (view.page(n), view.image_column().clone()),
            None => {
                self.finish_progress();
                return;
            }
        };
        self.session.current_page = n;

        if entries.is_empty() {
            debug!("Page {} is empty, no job started", n);
            self.finish_progress();
            return;
        }

        let generation = self.session.next_generation();
        let (job, handle) = PageLoadJob::new(generation, n, entries, column, self.sender.clone());
        let job = job
            .with_cache(self.cache.clone())
            .with_thumbnail_max_size(self.config.thumbnail_max_size);

        info!(
            "Loading page {} of {} ({} rows) as job {}",
            n,
            self.total_pages(),
            handle.len(),
            generation
        );
        self.session.progress = Progress {
            value: 0,
            max: handle.len(),
            visible: true,
        };
        self.surface.show_progress(handle.len());
        self.session.active_job = Some(handle);

        self.executor.execute(Box::new(move || {
            job.run();
        }));
    }

    /// Moves one page forward; returns false on the last page.
    pub fn next_page(&mut self) -> bool {
        let current = self.session.current_page;
        if self.session.view.is_some() && current < self.total_pages() {
            self.request_page(current + 1);
            true
        } else {
            false
        }
    }

    /// Moves one page back; returns false on the first page.
    pub fn prev_page(&mut self) -> bool {
        let current = self.session.current_page;
        if self.session.view.is_some() && current > 1 {
            self.request_page(current - 1);
            true
        } else {
            false
        }
    }

    /// Jumps to an absolute page, as from a slider or page spinner.
    ///
    /// Out-of-range pages and the current page are ignored.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        if self.session.view.is_none() || n == 0 || n > self.total_pages() {
            return false;
        }
        if n == self.session.current_page {
            return false;
        }
        self.request_page(n);
        true
    }

    /// Filters the view and shows its first page.
    pub fn search(&mut self, query: &str) {
        let Some(view) = self.session.view.as_mut() else {
            return;
        };
        let matched = view.filter(query).len();
        info!("Search '{}' matched {} rows", query.trim(), matched);
        self.request_page(1);
    }

    /// Sorts the view and shows its first page.
    ///
    /// Returns false when the view is empty or the sort could not be applied;
    /// in both cases the view and the page on display are left as they were.
    pub fn sort(&mut self, criterion: SortCriterion) -> bool {
        let Some(view) = self.session.view.as_mut() else {
            return false;
        };
        if view.is_empty() {
            return false;
        }

        match view.sort(criterion) {
            Ok(_) => {
                info!("Sorted view {}", criterion);
                self.request_page(1);
                true
            }
            Err(e) => {
                warn!("Sort {} ignored: {}", criterion, e);
                false
            }
        }
    }

    /// Applies every message that has already arrived, without blocking.
    ///
    /// Returns the number of messages applied to the display.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if apply_message(&mut self.session, &mut self.surface, &self.config, message) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Blocks until the active job has reported done.
    pub fn wait_until_idle(&mut self) {
        while self.session.active_job.is_some() {
            match self.receiver.recv() {
                Ok(message) => {
                    apply_message(&mut self.session, &mut self.surface, &self.config, message);
                }
                Err(_) => break,
            }
        }
    }

    /// Builds the detail view for a clicked row.
    pub fn open_detail(&self, row: Arc<Row>) -> Option<RowDetail> {
        let view = self.session.view.as_ref()?;
        Some(RowDetail::new(row, view.image_column().clone()))
    }

    fn finish_progress(&mut self) {
        self.session.progress.visible = false;
        self.surface.hide_progress();
    }
}

/// Applies one job message to the session and display.
///
/// Messages from any generation other than the active one are discarded.
/// Returns true when the message changed the display.
pub fn apply_message<S: DisplaySurface + ?Sized>(
    session: &mut Session,
    surface: &mut S,
    config: &ViewerConfig,
    message: JobMessage,
) -> bool {
    if session.active_generation() != Some(message.generation) {
        trace!("Dropping stale message from job {}", message.generation);
        return false;
    }

    match message.event {
        JobEvent::ItemReady(item) => {
            let (page_size, tooltip) = match &session.view {
                Some(view) => (
                    view.page_size(),
                    item.row.get_or_null(&view.image_column().name).to_string(),
                ),
                None => (config.page_size, String::new()),
            };

            surface.place(Placement {
                position: GridPosition::for_position(item.position, page_size, config.columns_per_row),
                bitmap: item.bitmap,
                tooltip,
                row: item.row,
            });
            session.progress.value += 1;
            surface.set_progress(session.progress.value);
        }
        JobEvent::Done(outcome) => {
            debug!("Job {} done: {:?}", message.generation, outcome);
            session.progress.visible = false;
            surface.hide_progress();
            session.active_job = None;
        }
    }
    true
}
