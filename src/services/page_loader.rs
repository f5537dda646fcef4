//! Background resolution of one page of thumbnails.
//!
//! A [`PageLoadJob`] walks its entries in order, resolving each image and
//! sending an [`JobEvent::ItemReady`] per row, then a single
//! [`JobEvent::Done`]. Every message carries the [`Generation`] of the page
//! request that started the job so the receiver can drop stale results.

use log::{debug, trace};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::dataset::{ImageColumn, Row};
use crate::image_cache::ImageCache;
use crate::image_loader::{self, Bitmap};
use crate::state::PageEntry;

/// Tag identifying one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared flag asking a job to stop before its next item.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of a page load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Pending,
            1 => JobState::Running,
            2 => JobState::Completed,
            _ => JobState::Cancelled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Running => 1,
            JobState::Completed => 2,
            JobState::Cancelled => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

/// State cell shared between a job and its handle.
#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(JobState::Pending.as_u8())))
    }

    fn get(&self) -> JobState {
        JobState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: JobState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// One resolved row, ready to be placed on the grid.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Position of the row within the view.
    pub position: usize,
    /// Index of the row within the dataset.
    pub row_index: usize,
    pub bitmap: Bitmap,
    pub row: Arc<Row>,
}

/// Progress reported by a running job.
#[derive(Debug, Clone)]
pub enum JobEvent {
    ItemReady(LoadedImage),
    /// Terminal event, sent exactly once per job.
    Done(JobState),
}

/// A job event tagged with the generation of the request that produced it.
#[derive(Debug, Clone)]
pub struct JobMessage {
    pub generation: Generation,
    pub event: JobEvent,
}

/// Control-side view of an in-flight job.
#[derive(Debug)]
pub struct JobHandle {
    generation: Generation,
    page: usize,
    len: usize,
    cancel: CancellationToken,
    state: SharedState,
}

impl JobHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of rows the job was started with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn state(&self) -> JobState {
        self.state.get()
    }

    /// Asks the job to stop before its next item.
    pub fn cancel(&self) {
        debug!("Cancelling page {} job {}", self.page, self.generation);
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Resolves the images of one page in order.
pub struct PageLoadJob {
    generation: Generation,
    page: usize,
    entries: Vec<PageEntry>,
    column: ImageColumn,
    thumbnail_max_size: u32,
    cancel: CancellationToken,
    state: SharedState,
    cache: Option<Arc<Mutex<ImageCache>>>,
    events: Sender<JobMessage>,
}

impl PageLoadJob {
    /// Creates a pending job and the handle used to observe and cancel it.
    pub fn new(
        generation: Generation,
        page: usize,
        entries: Vec<PageEntry>,
        column: ImageColumn,
        events: Sender<JobMessage>,
    ) -> (Self, JobHandle) {
        let cancel = CancellationToken::new();
        let state = SharedState::new();
        let handle = JobHandle {
            generation,
            page,
            len: entries.len(),
            cancel: cancel.clone(),
            state: state.clone(),
        };
        let job = Self {
            generation,
            page,
            entries,
            column,
            thumbnail_max_size: crate::config::THUMBNAIL_MAX_SIZE,
            cancel,
            state,
            cache: None,
            events,
        };
        (job, handle)
    }

    /// Looks up and stores thumbnails in a shared cache.
    pub fn with_cache(mut self, cache: Arc<Mutex<ImageCache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_thumbnail_max_size(mut self, size: u32) -> Self {
        self.thumbnail_max_size = size;
        self
    }

    /// Processes every entry unless cancelled, then sends the terminal event.
    ///
    /// A receiver that has gone away is treated like a cancellation.
    pub fn run(self) -> JobState {
        self.state.set(JobState::Running);
        debug!(
            "Job {} started for page {} ({} rows)",
            self.generation,
            self.page,
            self.entries.len()
        );

        let mut outcome = JobState::Completed;
        for entry in &self.entries {
            if self.cancel.is_cancelled() {
                outcome = JobState::Cancelled;
                break;
            }

            let bitmap = self.thumbnail(entry);
            let message = JobMessage {
                generation: self.generation,
                event: JobEvent::ItemReady(LoadedImage {
                    position: entry.position,
                    row_index: entry.row_index,
                    bitmap,
                    row: entry.row.clone(),
                }),
            };
            if self.events.send(message).is_err() {
                outcome = JobState::Cancelled;
                break;
            }
        }

        self.state.set(outcome);
        let _ = self.events.send(JobMessage {
            generation: self.generation,
            event: JobEvent::Done(outcome),
        });
        debug!("Job {} finished: {:?}", self.generation, outcome);
        outcome
    }

    fn thumbnail(&self, entry: &PageEntry) -> Bitmap {
        if let Some(cache) = &self.cache {
            if let Some(bitmap) = cache.lock().ok().and_then(|mut c| c.get(entry.row_index)) {
                return bitmap;
            }
        }

        trace!("Resolving row {} (view position {})", entry.row_index, entry.position);
        let bitmap =
            image_loader::resolve_with_bound(&entry.row, &self.column, Some(self.thumbnail_max_size));

        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(entry.row_index, bitmap.clone());
            }
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, ImageMode, Value};
    use crate::placeholder::Placeholder;
    use crate::state::DatasetView;
    use std::sync::mpsc::{self, Receiver};

    fn missing_files_view(count: usize) -> DatasetView {
        let rows = (0..count)
            .map(|i| vec![Value::Str(format!("/nonexistent/{}.png", i))])
            .collect();
        DatasetView::load(Dataset::new(vec!["image_path".to_string()], rows), 50).unwrap()
    }

    fn column() -> ImageColumn {
        ImageColumn::new("image_path", ImageMode::Path)
    }

    fn drain(rx: &Receiver<JobMessage>) -> Vec<JobMessage> {
        rx.try_iter().collect()
    }

    #[test]
    fn emits_items_in_order_then_done() {
        let view = missing_files_view(5);
        let (tx, rx) = mpsc::channel();
        let (job, handle) = PageLoadJob::new(Generation::new(7), 1, view.page(1), column(), tx);
        assert_eq!(handle.state(), JobState::Pending);
        assert_eq!(handle.len(), 5);

        assert_eq!(job.run(), JobState::Completed);
        assert_eq!(handle.state(), JobState::Completed);

        let messages = drain(&rx);
        assert_eq!(messages.len(), 6);
        assert!(messages.iter().all(|m| m.generation == Generation::new(7)));

        let positions: Vec<usize> = messages
            .iter()
            .filter_map(|m| match &m.event {
                JobEvent::ItemReady(item) => {
                    assert_eq!(item.bitmap.placeholder_kind(), Some(Placeholder::FileMissing));
                    Some(item.position)
                }
                JobEvent::Done(_) => None,
            })
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
        assert!(matches!(
            messages.last().map(|m| &m.event),
            Some(JobEvent::Done(JobState::Completed))
        ));
    }

    #[test]
    fn cancelled_job_still_reports_done() {
        let view = missing_files_view(5);
        let (tx, rx) = mpsc::channel();
        let (job, handle) = PageLoadJob::new(Generation::new(1), 1, view.page(1), column(), tx);
        handle.cancel();

        assert_eq!(job.run(), JobState::Cancelled);
        assert!(handle.state().is_terminal());

        let messages = drain(&rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].event, JobEvent::Done(JobState::Cancelled)));
    }

    #[test]
    fn cancelling_mid_run_stops_before_the_next_item() {
        let count = 20_000;
        let rows = (0..count)
            .map(|i| vec![Value::Str(format!("/nonexistent/{}.png", i))])
            .collect();
        let view =
            DatasetView::load(Dataset::new(vec!["image_path".to_string()], rows), count).unwrap();
        let (tx, rx) = mpsc::channel();
        let (job, handle) = PageLoadJob::new(Generation::new(3), 1, view.page(1), column(), tx);
        assert_eq!(handle.len(), count);

        let worker = std::thread::spawn(move || job.run());

        let first = rx.recv().unwrap();
        assert!(matches!(first.event, JobEvent::ItemReady(ref item) if item.position == 0));
        handle.cancel();

        let outcome = worker.join().unwrap();
        assert_eq!(outcome, JobState::Cancelled);
        assert_eq!(handle.state(), JobState::Cancelled);

        let rest = drain(&rx);
        let (last, items) = rest.split_last().unwrap();
        assert!(matches!(last.event, JobEvent::Done(JobState::Cancelled)));

        // Items already under way are delivered in order, without gaps.
        let positions: Vec<usize> = items
            .iter()
            .map(|m| match &m.event {
                JobEvent::ItemReady(item) => item.position,
                JobEvent::Done(_) => panic!("more than one Done"),
            })
            .collect();
        assert_eq!(positions, (1..=positions.len()).collect::<Vec<_>>());
        assert!(positions.len() + 1 < count);
    }

    #[test]
    fn dropped_receiver_stops_the_job() {
        let view = missing_files_view(3);
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let (job, handle) = PageLoadJob::new(Generation::new(1), 1, view.page(1), column(), tx);
        assert_eq!(job.run(), JobState::Cancelled);
        assert_eq!(handle.state(), JobState::Cancelled);
    }

    #[test]
    fn cached_thumbnails_are_reused() {
        use image::{DynamicImage, RgbaImage};

        let view = missing_files_view(2);
        let cache = Arc::new(Mutex::new(ImageCache::new(10)));
        let cached = Bitmap::decoded(DynamicImage::ImageRgba8(RgbaImage::new(3, 3)));
        cache.lock().unwrap().put(1, cached.clone());

        let (tx, rx) = mpsc::channel();
        let (job, _handle) = PageLoadJob::new(Generation::new(1), 1, view.page(1), column(), tx);
        job.with_cache(cache).run();

        let bitmaps: Vec<Bitmap> = drain(&rx)
            .into_iter()
            .filter_map(|m| match m.event {
                JobEvent::ItemReady(item) => Some(item.bitmap),
                JobEvent::Done(_) => None,
            })
            .collect();
        assert!(bitmaps[0].is_placeholder());
        assert_eq!(bitmaps[1], cached);
    }
}
