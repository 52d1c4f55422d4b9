//! The overlay itself: lifecycle, change detection and re-projection.
//!
//! Host notifications and poll ticks are delivered through
//! [`Overlay::handle_event`], which takes `&mut self`; one event is fully
//! processed before the next can be delivered.

use crate::overlay::backend::{
    Attributes, ChangeSource, ContainerAttrs, HostElement, RenderBackend, SubscriptionId, Timer,
    TimerId, WatchTarget,
};
use crate::overlay::error::OverlayError;
use crate::overlay::model::{
    ArrowStyle, Endpoint, GridSpec, HostRect, Orientation, ShapeKind, ShapeSpec,
};
use crate::overlay::projector::{project, Projection};
use crate::overlay::registry::{ReprojectReport, ShapeId, ShapeRegistry};
use crate::overlay::settings::{DisappearancePolicy, OverlaySettings};
use crate::overlay::state::{can_transition, SyncState};

/// Collaborators handed to [`Overlay::new`]. A missing host element or parent
/// container leaves the overlay inert.
pub struct OverlayParts<H> {
    pub host: Option<Box<dyn HostElement>>,
    pub parent: Option<H>,
    pub changes: Box<dyn ChangeSource>,
    pub timer: Box<dyn Timer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    Resized { subscription: SubscriptionId },
    PollTick { timer: TimerId },
}

#[derive(Debug, PartialEq)]
pub enum SyncOutcome {
    Reprojected(ReprojectReport),
    /// The measured rectangle matched the one last applied.
    Unchanged,
    /// The board disappeared and the policy keeps the last geometry.
    Suspended,
    /// The board disappeared and the overlay tore itself down.
    Terminated,
    /// The overlay is not active, or the event came from a source it no
    /// longer listens to.
    Ignored,
}

pub struct Overlay<B: RenderBackend> {
    settings: OverlaySettings,
    grid: GridSpec,
    state: SyncState,
    init_error: Option<OverlayError>,
    backend: B,
    host: Option<Box<dyn HostElement>>,
    changes: Box<dyn ChangeSource>,
    timer: Box<dyn Timer>,
    container: Option<B::Handle>,
    projection: Option<Projection>,
    last_rect: Option<HostRect>,
    registry: ShapeRegistry<B::Handle>,
    markers: ShapeRegistry<B::Handle>,
    subscriptions: Vec<SubscriptionId>,
    poll_timer: Option<TimerId>,
}

impl<B: RenderBackend> Overlay<B> {
    /// Builds the overlay and, if its host is present and the grid valid,
    /// places the container and starts listening for geometry changes.
    ///
    /// Construction never fails outright; check [`Overlay::init_error`] or
    /// [`Overlay::container`] to see whether the overlay became active.
    pub fn new(mut settings: OverlaySettings, parts: OverlayParts<B::Handle>, backend: B) -> Self {
        settings.sanitize();
        let grid = GridSpec {
            width: settings.grid_width,
            height: settings.grid_height,
            orientation: settings.orientation,
        };
        let OverlayParts {
            host,
            parent,
            changes,
            timer,
        } = parts;

        let mut overlay = Self {
            settings,
            grid,
            state: SyncState::Uninitialized,
            init_error: None,
            backend,
            host,
            changes,
            timer,
            container: None,
            projection: None,
            last_rect: None,
            registry: ShapeRegistry::new(),
            markers: ShapeRegistry::new(),
            subscriptions: Vec::new(),
            poll_timer: None,
        };
        if let Err(err) = overlay.activate(parent) {
            tracing::warn!(%err, "board overlay failed to initialise");
            overlay.init_error = Some(err);
        }
        overlay
    }

    fn activate(&mut self, parent: Option<B::Handle>) -> Result<(), OverlayError> {
        let Some(host) = self.host.as_ref() else {
            return Err(OverlayError::MissingHost);
        };
        let Some(parent) = parent else {
            return Err(OverlayError::MissingHost);
        };
        self.grid.validate()?;

        let rect = host.rect();
        let projection = project(rect, self.grid)?;
        let container = self.backend.create_container(&ContainerAttrs {
            rect,
            layer: self.settings.layer,
        });
        self.backend.attach(&container, &parent);
        if self.settings.debug_markers {
            place_markers(&mut self.markers, &mut self.backend, &container, &projection);
        }
        self.container = Some(container);
        self.projection = Some(projection);
        self.last_rect = Some(rect);
        self.transition(SyncState::Active);

        self.subscriptions.push(self.changes.subscribe(WatchTarget::Board));
        if self.settings.watch_ancestor {
            self.subscriptions
                .push(self.changes.subscribe(WatchTarget::Ancestor));
        }
        self.poll_timer = Some(self.timer.every(self.settings.poll_interval()));
        tracing::debug!(?rect, grid = ?self.grid, "board overlay active");
        Ok(())
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn init_error(&self) -> Option<&OverlayError> {
        self.init_error.as_ref()
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn container(&self) -> Option<&B::Handle> {
        self.container.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn shape(&self, id: ShapeId) -> Option<&ShapeSpec> {
        self.registry.spec(id)
    }

    pub fn primitive(&self, id: ShapeId) -> Option<&B::Handle> {
        self.registry.primitive(id)
    }

    pub fn is_shape_attached(&self, id: ShapeId) -> bool {
        self.registry.is_attached(id)
    }

    pub fn arrow_count(&self) -> usize {
        self.registry.count_of_kind(ShapeKind::Arrow)
    }

    /// Number of debug markers currently placed.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    pub fn poll_timer(&self) -> Option<TimerId> {
        self.poll_timer
    }

    fn ensure_active(&self) -> Result<(), OverlayError> {
        match self.state {
            SyncState::Active => Ok(()),
            SyncState::Uninitialized => Err(OverlayError::NotReady),
            SyncState::Terminated => Err(OverlayError::Terminated),
        }
    }

    /// Places an arrow between two cells. Without a style the configured
    /// default arrow style is used.
    pub fn add_arrow(
        &mut self,
        from: impl Into<Endpoint>,
        to: impl Into<Endpoint>,
        style: Option<ArrowStyle>,
    ) -> Result<ShapeId, OverlayError> {
        self.ensure_active()?;
        let spec = ShapeSpec::Arrow {
            from: from.into(),
            to: to.into(),
            style: self.settings.resolved_arrow_style(style),
        };
        let (Some(container), Some(projection)) = (self.container.as_ref(), self.projection.as_ref())
        else {
            return Err(OverlayError::NotReady);
        };
        self.registry
            .add(&mut self.backend, container, projection, spec)
    }

    /// Returns whether a shape with this id was present.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<bool, OverlayError> {
        self.ensure_active()?;
        Ok(self.registry.remove(&mut self.backend, id))
    }

    /// Removes every arrow. Debug markers belong to the overlay and stay.
    pub fn remove_all_shapes(&mut self) -> Result<usize, OverlayError> {
        self.ensure_active()?;
        Ok(self
            .registry
            .remove_all_of_kind(&mut self.backend, ShapeKind::Arrow))
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<SyncOutcome, OverlayError> {
        self.ensure_active()?;
        self.grid.orientation = orientation;
        self.synchronize(true)
    }

    pub fn set_grid_dimensions(&mut self, width: u32, height: u32) -> Result<SyncOutcome, OverlayError> {
        self.ensure_active()?;
        self.grid = GridSpec::new(width, height, self.grid.orientation)?;
        self.synchronize(true)
    }

    /// Re-reads the host rectangle and re-projects even if it did not change.
    pub fn refresh(&mut self) -> Result<SyncOutcome, OverlayError> {
        self.ensure_active()?;
        self.synchronize(true)
    }

    pub fn handle_event(&mut self, event: SyncEvent) -> Result<SyncOutcome, OverlayError> {
        if !self.state.is_active() {
            return Ok(SyncOutcome::Ignored);
        }
        let known = match event {
            SyncEvent::Resized { subscription } => self.subscriptions.contains(&subscription),
            SyncEvent::PollTick { timer } => self.poll_timer == Some(timer),
        };
        if !known {
            tracing::trace!(?event, "ignoring event from unknown source");
            return Ok(SyncOutcome::Ignored);
        }
        self.synchronize(false)
    }

    fn synchronize(&mut self, force: bool) -> Result<SyncOutcome, OverlayError> {
        let Some(host) = self.host.as_ref() else {
            return Err(OverlayError::MissingHost);
        };
        let rect = host.rect();
        let retain = self.settings.disappearance == DisappearancePolicy::Retain;
        if rect.is_degenerate() && !retain {
            tracing::warn!("board element disappeared; terminating overlay");
            self.terminate();
            return Ok(SyncOutcome::Terminated);
        }
        if !force && self.last_rect == Some(rect) {
            return Ok(SyncOutcome::Unchanged);
        }

        if rect.is_degenerate() {
            tracing::debug!("board element disappeared; keeping last geometry");
            // Labels must follow a grid change even while the geometry is frozen.
            let kept = self
                .projection
                .as_ref()
                .filter(|projection| projection.grid() != self.grid)
                .map(Projection::rect);
            if let Some(kept) = kept {
                self.reproject(kept)?;
            }
            self.last_rect = Some(rect);
            return Ok(SyncOutcome::Suspended);
        }

        let report = self.reproject(rect)?;
        if !report.is_clean() {
            tracing::warn!(failed = report.failed.len(), "some shapes could not be reprojected");
        }
        Ok(SyncOutcome::Reprojected(report))
    }

    fn reproject(&mut self, rect: HostRect) -> Result<ReprojectReport, OverlayError> {
        let projection = project(rect, self.grid)?;
        let Some(container) = self.container.as_ref() else {
            return Err(OverlayError::NotReady);
        };

        self.backend.set_attributes(
            container,
            &Attributes::Container(ContainerAttrs {
                rect,
                layer: self.settings.layer,
            }),
        );
        let report = self
            .registry
            .reproject_all(&mut self.backend, container, &projection);
        if self.settings.debug_markers {
            self.markers
                .remove_all_of_kind(&mut self.backend, ShapeKind::Marker);
            place_markers(&mut self.markers, &mut self.backend, container, &projection);
        }
        tracing::debug!(?rect, grid = ?self.grid, updated = report.updated.len(), "reprojected overlay");

        self.projection = Some(projection);
        self.last_rect = Some(rect);
        Ok(report)
    }

    /// Disconnects every notification source, detaches the container and
    /// discards all shapes. Calling it again has no effect.
    pub fn terminate(&mut self) {
        if self.state.is_terminated() {
            return;
        }
        for id in self.subscriptions.drain(..) {
            self.changes.unsubscribe(id);
        }
        if let Some(timer) = self.poll_timer.take() {
            self.timer.cancel(timer);
        }
        if let Some(container) = self.container.take() {
            self.backend.detach(&container);
        }
        self.registry.forget_all();
        self.markers.forget_all();
        self.projection = None;
        self.transition(SyncState::Terminated);
    }

    fn transition(&mut self, to: SyncState) {
        if !can_transition(self.state, to) {
            tracing::warn!(from = ?self.state, ?to, "rejected overlay state transition");
            return;
        }
        tracing::debug!(from = ?self.state, ?to, "overlay state transition");
        self.state = to;
    }
}

impl<B: RenderBackend> Drop for Overlay<B> {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn place_markers<B: RenderBackend>(
    registry: &mut ShapeRegistry<B::Handle>,
    backend: &mut B,
    container: &B::Handle,
    projection: &Projection,
) {
    for cell in projection.cells() {
        if let Err(err) = registry.add(backend, container, projection, ShapeSpec::Marker { at: cell.center }) {
            tracing::warn!(%err, label = %cell.label, "failed to place debug marker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::headless::{ManualChanges, ManualTimer, SharedRect};
    use crate::overlay::svg::SvgDocument;

    fn overlay(settings: OverlaySettings) -> (Overlay<SvgDocument>, SharedRect) {
        let rect = SharedRect::new(HostRect::new(800.0, 800.0, 0.0, 0.0));
        let doc = SvgDocument::new();
        let parts = OverlayParts {
            host: Some(Box::new(rect.clone()) as Box<dyn HostElement>),
            parent: Some(doc.root()),
            changes: Box::new(ManualChanges::new()),
            timer: Box::new(ManualTimer::new()),
        };
        (Overlay::new(settings, parts, doc), rect)
    }

    #[test]
    fn construction_places_container_under_parent() {
        let (overlay, _) = overlay(OverlaySettings::new(DisappearancePolicy::Retain));
        let container = *overlay.container().unwrap();
        let root = overlay.backend().root();

        assert_eq!(overlay.state(), SyncState::Active);
        assert_eq!(overlay.backend().children(&root), vec![container]);
        assert_eq!(overlay.subscriptions().len(), 2);
        assert!(overlay.poll_timer().is_some());
    }

    #[test]
    fn degenerate_rect_with_retain_policy_suspends() {
        let (mut overlay, rect) = overlay(OverlaySettings::new(DisappearancePolicy::Retain));
        let id = overlay.add_arrow("e2", "e4", None).unwrap();
        let timer = overlay.poll_timer().unwrap();

        rect.set(HostRect::default());
        assert_eq!(
            overlay.handle_event(SyncEvent::PollTick { timer }),
            Ok(SyncOutcome::Suspended)
        );
        assert_eq!(
            overlay.handle_event(SyncEvent::PollTick { timer }),
            Ok(SyncOutcome::Unchanged)
        );

        rect.set(HostRect::new(400.0, 400.0, 0.0, 0.0));
        let outcome = overlay.handle_event(SyncEvent::PollTick { timer }).unwrap();
        let SyncOutcome::Reprojected(report) = outcome else {
            panic!("expected reprojection");
        };
        assert_eq!(report.updated, vec![id]);
        assert_eq!(overlay.state(), SyncState::Active);
    }

    #[test]
    fn invalid_dimensions_keep_previous_grid() {
        let (mut overlay, _) = overlay(OverlaySettings::new(DisappearancePolicy::Retain));
        assert_eq!(
            overlay.set_grid_dimensions(0, 8),
            Err(OverlayError::InvalidGrid {
                width: 0,
                height: 8
            })
        );
        assert_eq!(overlay.grid().width, 8);
        assert_eq!(overlay.projection().unwrap().cells().len(), 64);
    }

    #[test]
    fn visual_style_defaults_to_configured_fill() {
        let mut settings = OverlaySettings::new(DisappearancePolicy::Retain);
        settings.fill_color = "crimson".to_owned();
        settings.opacity = 0.5;
        let (mut overlay, _) = overlay(settings);

        let id = overlay
            .add_arrow("a2", "a3", Some(ArrowStyle::default()))
            .unwrap();
        let primitive = *overlay.primitive(id).unwrap();
        assert_eq!(
            overlay.backend().attribute(&primitive, "style"),
            Some("fill: crimson; opacity: 0.5")
        );
    }

    #[test]
    fn degenerate_rect_at_construction_terminates_on_first_tick() {
        let rect = SharedRect::new(HostRect::default());
        let doc = SvgDocument::new();
        let parts = OverlayParts {
            host: Some(Box::new(rect.clone()) as Box<dyn HostElement>),
            parent: Some(doc.root()),
            changes: Box::new(ManualChanges::new()),
            timer: Box::new(ManualTimer::new()),
        };
        let mut overlay = Overlay::new(
            OverlaySettings::new(DisappearancePolicy::Terminate),
            parts,
            doc,
        );
        assert_eq!(overlay.state(), SyncState::Active);

        let timer = overlay.poll_timer().unwrap();
        assert_eq!(
            overlay.handle_event(SyncEvent::PollTick { timer }),
            Ok(SyncOutcome::Terminated)
        );
        assert_eq!(overlay.state(), SyncState::Terminated);
    }

    #[test]
    fn grid_change_while_suspended_updates_labels() {
        let (mut overlay, rect) = overlay(OverlaySettings::new(DisappearancePolicy::Retain));
        rect.set(HostRect::default());

        assert_eq!(overlay.set_grid_dimensions(4, 4), Ok(SyncOutcome::Suspended));
        assert_eq!(
            overlay.add_arrow("h8", "g7", None),
            Err(OverlayError::unknown_address("h8"))
        );

        // Geometry stays on the last measured board until it reappears.
        let projection = overlay.projection().unwrap();
        assert_eq!(projection.grid().width, 4);
        assert_eq!(projection.rect(), HostRect::new(800.0, 800.0, 0.0, 0.0));
        assert!(overlay.add_arrow("d4", "a1", None).is_ok());
    }
}
