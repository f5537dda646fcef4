//! Service layer for background loading and row actions.
//!
//! Keeps page scheduling and export logic out of the front end so both can be
//! driven from tests.

pub mod detail_service;
pub mod executor;
pub mod page_coordinator;
pub mod page_loader;
pub mod settings_service;

pub use detail_service::{DetailField, DragSource, RowDetail};
pub use executor::{JobExecutor, RayonExecutor};
pub use page_coordinator::PageCoordinator;
pub use page_loader::{Generation, JobEvent, JobHandle, JobMessage, JobState, PageLoadJob};
pub use settings_service::{Settings, SettingsStore, WindowGeometry};
