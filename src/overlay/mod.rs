pub mod arrow;
pub mod backend;
pub mod error;
pub mod headless;
pub mod model;
pub mod projector;
pub mod registry;
pub mod settings;
pub mod settings_store;
pub mod state;
pub mod svg;
pub mod sync;

pub use error::OverlayError;
pub use model::{ArrowStyle, CellAddress, Endpoint, GridSpec, HostRect, Orientation, PixelPoint};
pub use registry::{ReprojectReport, ShapeId};
pub use settings::{DisappearancePolicy, OverlaySettings};
pub use state::SyncState;
pub use sync::{Overlay, OverlayParts, SyncEvent, SyncOutcome};
