//! Arrow overlays for grid boards drawn inside a host surface.
//!
//! [`overlay::Overlay`] keeps a container of arrow primitives aligned with a
//! board element: it projects grid cells to pixel centres, builds arrow
//! polygons between them and re-projects on every host geometry change.

pub mod logging;
pub mod overlay;
