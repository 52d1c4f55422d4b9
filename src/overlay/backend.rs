//! Collaborator seams: the host page and the rendering primitive backend.

use crate::overlay::arrow::ArrowGeometry;
use crate::overlay::model::{HostRect, PixelPoint};
use std::fmt::Debug;
use std::time::Duration;

pub trait HostElement {
    fn rect(&self) -> HostRect;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    /// The board element itself.
    Board,
    /// A stable ancestor, for layout shifts that do not resize the board.
    Ancestor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Resize and layout change notifications.
///
/// A subscription is delivered back to the overlay as
/// [`SyncEvent::Resized`](crate::overlay::sync::SyncEvent::Resized).
pub trait ChangeSource {
    fn subscribe(&mut self, target: WatchTarget) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Periodic ticks, delivered as
/// [`SyncEvent::PollTick`](crate::overlay::sync::SyncEvent::PollTick).
pub trait Timer {
    fn every(&mut self, interval: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerAttrs {
    pub rect: HostRect,
    pub layer: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub degrees: f64,
    pub pivot: PixelPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonAttrs {
    pub points: Vec<PixelPoint>,
    pub transform: Rotation,
    pub style: String,
}

impl PolygonAttrs {
    pub fn from_arrow(geometry: ArrowGeometry, style: impl Into<String>) -> Self {
        Self {
            points: geometry.vertices,
            transform: Rotation {
                degrees: geometry.rotation_degrees,
                pivot: geometry.rotation_pivot,
            },
            style: style.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleAttrs {
    pub center: PixelPoint,
    pub radius: f64,
    pub fill: String,
}

/// Full attribute set of one primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    Container(ContainerAttrs),
    Polygon(PolygonAttrs),
    Circle(CircleAttrs),
}

/// Rendering primitive factory.
///
/// Handles stay valid after [`detach`](RenderBackend::detach) so a primitive
/// can be attached again with its identity intact.
pub trait RenderBackend {
    type Handle: Clone + PartialEq + Debug;

    fn create_container(&mut self, attrs: &ContainerAttrs) -> Self::Handle;
    fn create_polygon(&mut self, attrs: &PolygonAttrs) -> Self::Handle;
    fn create_circle(&mut self, attrs: &CircleAttrs) -> Self::Handle;
    fn attach(&mut self, handle: &Self::Handle, container: &Self::Handle);
    fn detach(&mut self, handle: &Self::Handle);
    /// Updates the primitive in place; never replaces it.
    fn set_attributes(&mut self, handle: &Self::Handle, attrs: &Attributes);

    /// Detaches the primitive and gives up its handle for good. Backends may
    /// hand the same handle out again from a later `create_*` call.
    fn release(&mut self, handle: &Self::Handle) {
        self.detach(handle);
    }

    fn create(&mut self, attrs: &Attributes) -> Self::Handle {
        match attrs {
            Attributes::Container(attrs) => self.create_container(attrs),
            Attributes::Polygon(attrs) => self.create_polygon(attrs),
            Attributes::Circle(attrs) => self.create_circle(attrs),
        }
    }
}
