//! Display side of the viewer.
//!
//! Threading model:
//! - the page coordinator calls into a [`DisplaySurface`] from the control thread only
//! - `rayon` workers resolve thumbnails and never touch the surface
//! - results cross back over an `mpsc` channel drained by the coordinator

pub mod contact_sheet;
pub mod surface;

pub use contact_sheet::ContactSheetSurface;
pub use surface::{DisplaySurface, GridPosition, Placement};
